use std::path::PathBuf;

use clap::Args;

use crate::catalog::panel::Panel;
use crate::cli::{load_catalog, load_profile, OutputFormat};
use crate::core::profile::Profile;
use crate::core::types::CalculationMode;
use crate::core::value::MarkerValue;
use crate::matching::distance::{compare_markers, compute_distance, GeneticDistance, MarkerComparison};

#[derive(Args)]
pub struct CompareArgs {
    /// First profile (JSON)
    #[arg(required = true)]
    pub profile_a: PathBuf,

    /// Second profile (JSON)
    #[arg(required = true)]
    pub profile_b: PathBuf,

    /// Panel to compare over (12, 25, 37, 67, 111, GP)
    #[arg(short, long, default_value = "37")]
    pub panel: String,

    /// Distance calculation mode
    #[arg(long, value_enum, default_value = "standard")]
    pub mode: CalculationMode,

    /// Path to custom catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

/// Execute compare subcommand
///
/// # Errors
///
/// Returns an error if either profile or the catalog cannot be loaded, or the panel is unknown.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CompareArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let panel = catalog.panel(&args.panel)?;

    let profile_a = load_profile(&args.profile_a)?;
    let profile_b = load_profile(&args.profile_b)?;

    if verbose {
        eprintln!(
            "Comparing {} and {} over panel {} ({} markers, {} mode)",
            profile_a.id,
            profile_b.id,
            panel.name(),
            panel.len(),
            args.mode
        );
    }

    let breakdown = compare_markers(&catalog, &profile_a, &profile_b, panel, args.mode);
    let score = compute_distance(&catalog, &profile_a, &profile_b, panel, args.mode);

    match format {
        OutputFormat::Text => print_text_comparison(&profile_a, &profile_b, panel, &breakdown, &score),
        OutputFormat::Json => print_json_comparison(&profile_a, &profile_b, panel, args.mode, &breakdown, &score)?,
        OutputFormat::Tsv => print_tsv_comparison(&breakdown),
    }

    Ok(())
}

fn display_value(value: Option<&MarkerValue>) -> String {
    value.map_or_else(|| "-".to_string(), ToString::to_string)
}

fn print_text_comparison(
    profile_a: &Profile,
    profile_b: &Profile,
    panel: &Panel,
    breakdown: &[MarkerComparison],
    score: &GeneticDistance,
) {
    println!("Comparison Results");
    println!("{}", "=".repeat(60));

    println!("\nA: {}", profile_a.id);
    if let Some(h) = profile_a.haplogroup() {
        println!("  Haplogroup: {h}");
    }
    println!("B: {}", profile_b.id);
    if let Some(h) = profile_b.haplogroup() {
        println!("  Haplogroup: {h}");
    }

    println!("\nPanel {} ({} markers)\n", panel.name(), panel.len());
    println!("{:<12} {:>12} {:>12} {:>6}", "Marker", "A", "B", "Diff");
    println!("{}", "-".repeat(45));
    for row in breakdown {
        let diff = row
            .difference
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        let flag = if row.difference.is_some_and(|d| d > 0) { " *" } else { "" };
        println!(
            "{:<12} {:>12} {:>12} {:>6}{flag}",
            row.marker.as_str(),
            display_value(row.query_value.as_ref()),
            display_value(row.candidate_value.as_ref()),
            diff
        );
    }

    println!("\nSummary:");
    if score.is_eligible {
        println!("  Genetic distance: {}", score.distance);
        println!(
            "  Identical markers: {}/{} ({:.1}%)",
            score.identical_markers, score.compared_markers, score.percent_identical
        );
    } else {
        println!(
            "  Not comparable: only {} markers shared (insufficient coverage)",
            score.compared_markers
        );
    }
}

fn print_json_comparison(
    profile_a: &Profile,
    profile_b: &Profile,
    panel: &Panel,
    mode: CalculationMode,
    breakdown: &[MarkerComparison],
    score: &GeneticDistance,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "profile_a": profile_a.id,
        "profile_b": profile_b.id,
        "panel": panel.name(),
        "mode": mode,
        "score": score,
        "markers": breakdown,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_comparison(breakdown: &[MarkerComparison]) {
    println!("marker\tvalue_a\tvalue_b\tdifference");
    for row in breakdown {
        println!(
            "{}\t{}\t{}\t{}",
            row.marker,
            display_value(row.query_value.as_ref()),
            display_value(row.candidate_value.as_ref()),
            row.difference.map_or_else(String::new, |d| d.to_string()),
        );
    }
}
