//! Command-line interface for ystr-matcher.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **search**: Rank the closest matches to a query haplotype in a profile database
//! - **compare**: Show the marker-by-marker distance between two profiles
//! - **markers**: List catalog markers and panels, optionally by mutation rate
//!
//! ## Usage
//!
//! ```text
//! # Search a database with an ad-hoc query
//! ystr-matcher search --markers "DYS393=13,DYS390=24,DYS19=14" --db kits.jsonl --panel 12
//!
//! # Restrict to a haplogroup and its subclades using a local tree
//! ystr-matcher search --query me.json --db kits.json --haplogroup R-L21 --tree tree.json
//!
//! # JSON output for scripting
//! ystr-matcher search --query me.json --db kits.json --format json
//!
//! # Compare two kits on the 67-marker panel
//! ystr-matcher compare a.json b.json --panel 67
//!
//! # Slowest-mutating markers first
//! ystr-matcher markers --panel 37 --by-mutation-rate
//! ```

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::catalog::store::MarkerCatalog;
use crate::core::profile::Profile;

pub mod compare;
pub mod markers;
pub mod search;

#[derive(Parser)]
#[command(name = "ystr-matcher")]
#[command(version)]
#[command(about = "Genetic distance and match ranking for Y-STR haplotypes")]
#[command(
    long_about = "ystr-matcher compares Y-STR haplotypes marker by marker and ranks the closest relatives in a profile database.\n\nIt provides:\n- Genetic distance over standard panels (12, 25, 37, 67, 111, GP) or custom marker sets\n- Minimum marker coverage so sparse profiles do not look deceptively close\n- Optional haplogroup filtering through a phylogenetic tree\n- Rarity of the query's values among its matches"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find and rank the closest matches to a query haplotype
    Search(search::SearchArgs),

    /// Compare two profiles marker by marker
    Compare(compare::CompareArgs),

    /// List catalog markers and panels
    Markers(markers::MarkersArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load the catalog from `path`, or the embedded default
pub(crate) fn load_catalog(path: Option<&Path>) -> anyhow::Result<MarkerCatalog> {
    let catalog = match path {
        Some(path) => MarkerCatalog::load_from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => MarkerCatalog::load_embedded()?,
    };
    Ok(catalog)
}

/// Read a single profile from a JSON file
pub(crate) fn load_profile(path: &Path) -> anyhow::Result<Profile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    let profile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse profile {}", path.display()))?;
    Ok(profile)
}
