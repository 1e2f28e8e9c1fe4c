//! Shared input helpers.

pub mod validation;
