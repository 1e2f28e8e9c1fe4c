use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::catalog::store::MarkerCatalog;
use crate::cli::{load_catalog, load_profile, OutputFormat};
use crate::core::profile::Profile;
use crate::core::types::{CalculationMode, MarkerId};
use crate::haplogroup::{
    HaplogroupFilter, HttpTreeService, StaticTree, TreeLookupCache, TreeService, TreeServiceConfig,
};
use crate::matching::engine::{MatchReport, MatchingConfig, MatchingEngine, DEFAULT_MAX_RESULTS};
use crate::matching::rarity::{RarityAnnotation, RarityTable, MIN_COHORT_SIZE};
use crate::repository::JsonProfileRepository;
use crate::utils::validation::{parse_marker_assignments, validate_query};

#[derive(Args)]
pub struct SearchArgs {
    /// Query profile (JSON file with one profile)
    #[arg(long, conflicts_with = "markers", required_unless_present = "markers")]
    pub query: Option<PathBuf>,

    /// Query marker values, e.g. "DYS393=13,DYS390=24,DYS385=11-14"
    #[arg(short, long)]
    pub markers: Option<String>,

    /// Profile database (JSON array, or JSON lines with a .jsonl/.ndjson extension)
    #[arg(long, required = true)]
    pub db: PathBuf,

    /// Panel to compare over (12, 25, 37, 67, 111, GP)
    #[arg(short, long, default_value = "37")]
    pub panel: String,

    /// Maximum genetic distance (defaults to the panel's default)
    #[arg(long)]
    pub max_distance: Option<u32>,

    /// Number of matches to return
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,

    /// Distance calculation mode
    #[arg(long, value_enum, default_value = "standard")]
    pub mode: CalculationMode,

    /// Only keep candidates in this haplogroup (and its subclades)
    #[arg(long)]
    pub haplogroup: Option<String>,

    /// Require an exact haplogroup label match instead of including subclades
    #[arg(long, requires = "haplogroup")]
    pub exact_haplogroup: bool,

    /// Haplogroup tree file: {"parents": {"child": "parent", ...}}
    #[arg(long, conflicts_with = "tree_url")]
    pub tree: Option<PathBuf>,

    /// Base URL of a haplogroup tree service
    #[arg(long)]
    pub tree_url: Option<String>,

    /// Timeout for tree service requests, in seconds
    #[arg(long, default_value = "15")]
    pub tree_timeout: u64,

    /// Remove a marker from the panel (repeatable)
    #[arg(long = "exclude", value_name = "MARKER")]
    pub exclude: Vec<String>,

    /// Annotate how common each query value is among the matches
    #[arg(long)]
    pub rarity: bool,

    /// Path to custom catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

/// Execute search subcommand
///
/// # Errors
///
/// Returns an error if the catalog, query, database or tree cannot be loaded,
/// the panel is unknown, or a subclade filter is requested without a tree.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: SearchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let query = build_query(&args)?;

    for issue in validate_query(&catalog, &query) {
        eprintln!("Warning: {issue}");
    }
    for name in args.exclude.iter().filter(|m| !catalog.contains(m.as_str())) {
        eprintln!("Warning: excluded marker '{name}' is not in the catalog");
    }

    let base_panel = catalog.panel(&args.panel)?;
    let panel = base_panel.without(&args.exclude);

    let mut config = MatchingConfig::for_panel(base_panel);
    config.panel = panel;
    config.max_results = args.max_results;
    config.mode = args.mode;
    if let Some(max_distance) = args.max_distance {
        config.max_distance = max_distance;
    }
    config.haplogroup_filter = args
        .haplogroup
        .as_deref()
        .map(|h| HaplogroupFilter::new(h, !args.exact_haplogroup));

    if verbose {
        eprintln!(
            "Panel {}: {} markers, max distance {}, {} mode",
            config.panel.name(),
            config.panel.len(),
            config.max_distance,
            config.mode
        );
    }

    let tree = build_tree_service(&args)?;
    let cache = TreeLookupCache::default();
    let repository = JsonProfileRepository::open(&args.db);

    let mut engine = MatchingEngine::new(&catalog, config).with_cache(&cache);
    if let Some(tree) = tree.as_deref() {
        engine = engine.with_tree_service(tree);
    }

    let report = engine.find_matches(&query, &repository)?;

    if report.is_haplogroup_filter_degraded() {
        let labels: Vec<&str> = report
            .haplogroup_failures
            .iter()
            .map(|f| f.label.as_str())
            .collect();
        eprintln!(
            "Warning: haplogroup filter is incomplete; candidates labeled {} could not be checked and were excluded",
            labels.join(", ")
        );
    }

    let rarity = args.rarity.then(|| {
        let table = RarityTable::build(&catalog, &report.matches);
        if verbose && table.cohort_size() < MIN_COHORT_SIZE {
            eprintln!(
                "Rarity needs at least {} matches; found {}",
                MIN_COHORT_SIZE,
                table.cohort_size()
            );
        }
        table.annotate(&catalog, &query)
    });

    match format {
        OutputFormat::Text => print_text_results(&catalog, engine.config(), &query, &report, rarity.as_ref()),
        OutputFormat::Json => print_json_results(engine.config(), &report, rarity.as_ref())?,
        OutputFormat::Tsv => print_tsv_results(&report),
    }

    Ok(())
}

fn build_query(args: &SearchArgs) -> anyhow::Result<Profile> {
    match (&args.query, &args.markers) {
        (Some(path), _) => load_profile(path),
        (None, Some(markers)) => Ok(Profile::query(parse_marker_assignments(markers)?)),
        (None, None) => anyhow::bail!("Either --query or --markers is required"),
    }
}

fn build_tree_service(args: &SearchArgs) -> anyhow::Result<Option<Box<dyn TreeService>>> {
    if let Some(path) = &args.tree {
        let tree = StaticTree::load_from_file(path)?;
        return Ok(Some(Box::new(tree)));
    }
    if let Some(url) = &args.tree_url {
        let mut config = TreeServiceConfig::new(url.as_str());
        config.timeout = Duration::from_secs(args.tree_timeout);
        return Ok(Some(Box::new(HttpTreeService::new(&config)?)));
    }
    Ok(None)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

fn print_text_results(
    catalog: &MarkerCatalog,
    config: &MatchingConfig,
    query: &Profile,
    report: &MatchReport,
    rarity: Option<&BTreeMap<MarkerId, RarityAnnotation>>,
) {
    println!(
        "Panel {} ({} markers), max distance {}",
        config.panel.name(),
        config.panel.len(),
        config.max_distance
    );
    println!(
        "Scanned {} profiles: {} matches, {} with too few shared markers, {} beyond distance",
        report.scanned,
        report.matches.len(),
        report.ineligible,
        report.beyond_distance
    );
    if config.haplogroup_filter.is_some() {
        println!("Haplogroup filter removed {} candidates", report.haplogroup_excluded);
    }

    if report.matches.is_empty() {
        println!("\nNo matches found.");
    } else {
        let id_width = report
            .matches
            .iter()
            .map(|m| m.candidate.id.as_str().len())
            .max()
            .unwrap_or(2)
            .max(2);

        println!(
            "\n{:>4}  {:<id_width$}  {:>3}  {:>9}  {:>7}  {:<12}  Name",
            "#", "ID", "GD", "Compared", "Ident%", "Haplogroup"
        );
        println!("{}", "─".repeat(id_width + 52));
        for (i, m) in report.matches.iter().enumerate() {
            println!(
                "{:>4}  {:<id_width$}  {:>3}  {:>9}  {:>6.1}%  {:<12}  {}",
                i + 1,
                m.candidate.id.as_str(),
                m.score.distance,
                m.score.compared_markers,
                m.score.percent_identical,
                truncate(m.candidate.haplogroup().unwrap_or("-"), 12),
                m.candidate.display_name.as_deref().unwrap_or(""),
            );
        }
    }

    if let Some(rarity) = rarity {
        println!();
        if rarity.is_empty() {
            println!(
                "Rarity: not enough matches to estimate (need at least {})",
                MIN_COHORT_SIZE
            );
        } else {
            println!("Rarity of query values among {} matches:", report.matches.len());
            for (marker, annotation) in rarity {
                let value = catalog
                    .get(marker.as_str())
                    .and_then(|m| query.value(m))
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                println!(
                    "  {:<12} {:>10}  {:>5.1}%  {}",
                    marker.as_str(),
                    value,
                    annotation.frequency_fraction * 100.0,
                    annotation.tier
                );
            }
        }
    }
}

fn print_json_results(
    config: &MatchingConfig,
    report: &MatchReport,
    rarity: Option<&BTreeMap<MarkerId, RarityAnnotation>>,
) -> anyhow::Result<()> {
    let matches: Vec<serde_json::Value> = report
        .matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            serde_json::json!({
                "rank": i + 1,
                "id": m.candidate.id,
                "name": m.candidate.display_name,
                "origin": m.candidate.origin,
                "haplogroup": m.candidate.haplogroup(),
                "distance": m.score.distance,
                "compared_markers": m.score.compared_markers,
                "identical_markers": m.score.identical_markers,
                "percent_identical": m.score.percent_identical,
            })
        })
        .collect();

    let mut output = serde_json::json!({
        "panel": config.panel.name(),
        "panel_markers": config.panel.len(),
        "max_distance": config.max_distance,
        "mode": config.mode,
        "scanned": report.scanned,
        "ineligible": report.ineligible,
        "beyond_distance": report.beyond_distance,
        "haplogroup_excluded": report.haplogroup_excluded,
        "haplogroup_filter_degraded": report.is_haplogroup_filter_degraded(),
        "haplogroup_failures": report.haplogroup_failures,
        "matches": matches,
    });

    if let Some(rarity) = rarity {
        output["rarity"] = serde_json::json!(rarity);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(report: &MatchReport) {
    println!("rank\tid\tname\thaplogroup\tdistance\tcompared\tidentical\tpercent_identical");
    for (i, m) in report.matches.iter().enumerate() {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}",
            i + 1,
            m.candidate.id,
            m.candidate.display_name.as_deref().unwrap_or(""),
            m.candidate.haplogroup().unwrap_or(""),
            m.score.distance,
            m.score.compared_markers,
            m.score.identical_markers,
            m.score.percent_identical,
        );
    }
}
