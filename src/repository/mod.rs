//! Candidate profile repositories.
//!
//! The matching engine only needs forward iteration over profiles, so any
//! storage backend can be plugged in by implementing [`ProfileRepository`].
//! Opening the iterator or reading a record may fail; both are fatal for the
//! retrieval that triggered them.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::profile::Profile;

pub mod json;
pub mod memory;

pub use json::{JsonFormat, JsonProfileRepository};
pub use memory::InMemoryRepository;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Failed to open repository {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read repository: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid profile record at line {line}: {source}")]
    Record {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Invalid repository content: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Forward-only stream of profiles
pub type ProfileIter<'a> = Box<dyn Iterator<Item = Result<Profile, RepositoryError>> + 'a>;

/// A source of candidate profiles
pub trait ProfileRepository {
    /// Start a new pass over every profile
    fn profiles(&self) -> Result<ProfileIter<'_>, RepositoryError>;
}
