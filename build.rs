use std::collections::HashSet;
use std::path::Path;

fn main() {
    let catalog_path = Path::new("catalogs/ystr_markers.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    // Ensure catalog exists at build time
    assert!(
        catalog_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the marker catalog before building.\n",
        catalog_path.display()
    );

    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    let catalog: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    let names = validate_markers(&catalog);
    validate_panels(&catalog, &names);
}

fn validate_markers(catalog: &serde_json::Value) -> Vec<String> {
    assert!(
        catalog.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n"
    );

    let markers = catalog
        .get("markers")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!(
                "\n\nCATALOG BUILD ERROR: Missing or invalid 'markers' field\n\
                 The catalog must have a top-level 'markers' array.\n"
            );
        });

    assert!(
        !markers.is_empty(),
        "\n\nCATALOG BUILD ERROR: 'markers' array is empty\n"
    );

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(markers.len());
    for (i, marker) in markers.iter().enumerate() {
        let name = marker
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_else(|| {
                panic!("\n\nCATALOG BUILD ERROR: Marker at index {i} missing 'name' field\n");
            });

        assert!(
            seen.insert(name.to_string()),
            "\n\nCATALOG BUILD ERROR: Duplicate marker '{name}' (index {i})\n"
        );

        if let Some(copies) = marker.get("copies") {
            let copies = copies.as_u64().unwrap_or(0);
            assert!(
                copies >= 1,
                "\n\nCATALOG BUILD ERROR: Marker '{name}' has invalid 'copies'\n\
                 Copy count must be a positive integer.\n"
            );
        }

        names.push(name.to_string());
    }

    names
}

fn validate_panels(catalog: &serde_json::Value, names: &[String]) {
    let panels = catalog
        .get("panels")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!("\n\nCATALOG BUILD ERROR: Missing or invalid 'panels' field\n");
        });

    let known: HashSet<&str> = names.iter().map(String::as_str).collect();

    for (i, panel) in panels.iter().enumerate() {
        let panel_name = panel
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_else(|| {
                panic!("\n\nCATALOG BUILD ERROR: Panel at index {i} missing 'name' field\n");
            });

        match (panel.get("prefix"), panel.get("markers")) {
            (Some(prefix), None) => {
                let prefix = prefix.as_u64().unwrap_or(0);
                assert!(
                    prefix >= 1 && prefix <= names.len() as u64,
                    "\n\nCATALOG BUILD ERROR: Panel '{panel_name}' prefix out of range\n\
                     Prefix must be between 1 and {}.\n",
                    names.len()
                );
            }
            (None, Some(markers)) => {
                let markers = markers.as_array().unwrap_or_else(|| {
                    panic!("\n\nCATALOG BUILD ERROR: Panel '{panel_name}' 'markers' must be an array\n");
                });
                for marker in markers {
                    let name = marker.as_str().unwrap_or("<invalid>");
                    assert!(
                        known.contains(name),
                        "\n\nCATALOG BUILD ERROR: Panel '{panel_name}' references unknown marker '{name}'\n"
                    );
                }
            }
            _ => panic!(
                "\n\nCATALOG BUILD ERROR: Panel '{panel_name}' must have exactly one of 'prefix' or 'markers'\n"
            ),
        }
    }
}

fn set_build_dependencies() {
    // Tell cargo to rerun if catalog changes
    println!("cargo:rerun-if-changed=catalogs/ystr_markers.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
