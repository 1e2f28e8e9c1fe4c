//! Core data types for Y-STR haplotype comparison.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Marker`]: A catalog entry describing one STR locus
//! - [`Profile`]: A haplotype record (kit) with raw marker values
//! - [`MarkerValue`]: A normalized, comparable marker value
//! - [`MarkerId`], [`ProfileId`], [`CalculationMode`]: Identifier and mode types
//!
//! ## Marker values
//!
//! Raw values arrive as strings from heterogeneous sources:
//!
//! | Marker kind  | Raw value   | Normalized         |
//! |--------------|-------------|--------------------|
//! | Simple       | `" 13 "`    | `Single(13)`       |
//! | Multi-copy   | `"11-14"`   | `Multi([11, 14])`  |
//! | Multi-copy   | `"11,14"`   | `Multi([11, 14])`  |
//! | Any          | `""`, `"x"` | no value           |
//!
//! Malformed values never raise errors; they are treated as missing.

pub mod marker;
pub mod profile;
pub mod types;
pub mod value;

pub use marker::Marker;
pub use profile::Profile;
pub use types::{CalculationMode, MarkerId, ProfileId};
pub use value::MarkerValue;
