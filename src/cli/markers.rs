use std::path::PathBuf;

use clap::Args;

use crate::catalog::store::MarkerCatalog;
use crate::cli::{load_catalog, OutputFormat};
use crate::core::marker::Marker;
use crate::core::types::MarkerId;
use crate::matching::mutation_order::{order_by_mutation_rate, MutationCategory};

#[derive(Args)]
pub struct MarkersArgs {
    /// Only list the markers of this panel (12, 25, 37, 67, 111, GP)
    #[arg(short, long)]
    pub panel: Option<String>,

    /// Order from slowest- to fastest-mutating instead of catalog order
    #[arg(long)]
    pub by_mutation_rate: bool,

    /// Path to custom catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

/// Execute markers subcommand
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the panel is unknown.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MarkersArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;

    if verbose {
        eprintln!(
            "Loaded catalog with {} markers and {} panels",
            catalog.len(),
            catalog.panels().len()
        );
    }

    let mut names: Vec<MarkerId> = match &args.panel {
        Some(panel) => catalog.panel(panel)?.markers().to_vec(),
        None => catalog.markers().iter().map(|m| m.name.clone()).collect(),
    };
    if args.by_mutation_rate {
        names = order_by_mutation_rate(&catalog, &names);
    }

    let markers: Vec<&Marker> = names
        .iter()
        .filter_map(|name| catalog.get(name.as_str()))
        .collect();

    match format {
        OutputFormat::Text => print_text_markers(&catalog, &markers, args.panel.is_none()),
        OutputFormat::Json => print_json_markers(&markers)?,
        OutputFormat::Tsv => print_tsv_markers(&markers),
    }

    Ok(())
}

fn rank_label(marker: &Marker) -> String {
    marker
        .mutation_rank
        .map_or_else(|| "-".to_string(), |r| r.to_string())
}

fn print_text_markers(catalog: &MarkerCatalog, markers: &[&Marker], show_panels: bool) {
    if show_panels {
        println!("Panels:");
        for panel in catalog.panels() {
            let max = panel
                .default_max_distance
                .map_or_else(|| "-".to_string(), |d| d.to_string());
            println!(
                "  {:<6} {:>3} markers  default max distance {}",
                panel.name(),
                panel.len(),
                max
            );
        }
        println!();
    }

    println!("Markers ({}):\n", markers.len());
    println!(
        "{:>4}  {:<12} {:>6} {:>5}  {:<10} Panels",
        "#", "Marker", "Copies", "Rank", "Speed"
    );
    println!("{}", "─".repeat(60));
    for marker in markers {
        println!(
            "{:>4}  {:<12} {:>6} {:>5}  {:<10} {}",
            marker.ordinal + 1,
            marker.name.as_str(),
            marker.copies,
            rank_label(marker),
            MutationCategory::from_rank(marker.mutation_rank).to_string(),
            marker.panels.join(",")
        );
    }
}

fn print_json_markers(markers: &[&Marker]) -> anyhow::Result<()> {
    let output: Vec<serde_json::Value> = markers
        .iter()
        .map(|m| {
            serde_json::json!({
                "name": m.name,
                "ordinal": m.ordinal,
                "copies": m.copies,
                "mutation_rank": m.mutation_rank,
                "mutation_category": MutationCategory::from_rank(m.mutation_rank),
                "panels": m.panels,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_markers(markers: &[&Marker]) {
    println!("ordinal\tname\tcopies\tmutation_rank\tmutation_category\tpanels");
    for m in markers {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            m.ordinal,
            m.name,
            m.copies,
            m.mutation_rank.map_or_else(String::new, |r| r.to_string()),
            MutationCategory::from_rank(m.mutation_rank),
            m.panels.join(",")
        );
    }
}
