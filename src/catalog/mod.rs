//! Marker catalog storage and panel definitions.
//!
//! The catalog holds the canonical ordering of Y-STR markers, which markers are
//! multi-copy (palindromic) and how many components they carry, each marker's
//! mutation-rate rank, and the predefined comparison panels. An embedded catalog
//! is compiled into the binary, but custom catalogs can also be loaded from JSON.
//!
//! ## Embedded Catalog
//!
//! - **Panels 12, 25, 37, 67, 111**: prefixes of the canonical marker order
//! - **GP**: a custom subset of markers
//!
//! ## Example
//!
//! ```rust,no_run
//! use ystr_matcher::MarkerCatalog;
//!
//! let catalog = MarkerCatalog::load_embedded().unwrap();
//! let panel = catalog.panel("37").unwrap();
//!
//! for marker in panel.markers() {
//!     let info = catalog.get(marker.as_str()).unwrap();
//!     println!("{} ({} copies)", info.name, info.copies);
//! }
//! ```

pub mod panel;
pub mod store;

pub use panel::Panel;
pub use store::{CatalogError, MarkerCatalog};
