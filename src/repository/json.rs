use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::core::profile::Profile;
use crate::repository::{ProfileIter, ProfileRepository, RepositoryError};

/// On-disk layout of a JSON profile file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    /// A single JSON array of profiles, parsed in full before iteration
    Array,
    /// One profile object per line (`.jsonl` / `.ndjson`), parsed lazily
    Lines,
}

impl JsonFormat {
    /// Detect format from file extension, defaulting to [`JsonFormat::Array`]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("jsonl" | "ndjson") => Self::Lines,
            _ => Self::Array,
        }
    }
}

/// Profiles read from a JSON or JSON-lines file on every pass
#[derive(Debug, Clone)]
pub struct JsonProfileRepository {
    path: PathBuf,
    format: JsonFormat,
}

impl JsonProfileRepository {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = JsonFormat::from_path(&path);
        Self { path, format }
    }

    #[must_use]
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_file(&self) -> Result<File, RepositoryError> {
        File::open(&self.path).map_err(|source| RepositoryError::Open {
            path: self.path.clone(),
            source,
        })
    }
}

impl ProfileRepository for JsonProfileRepository {
    fn profiles(&self) -> Result<ProfileIter<'_>, RepositoryError> {
        let reader = BufReader::new(self.open_file()?);

        match self.format {
            JsonFormat::Array => {
                let profiles: Vec<Profile> = serde_json::from_reader(reader)?;
                Ok(Box::new(profiles.into_iter().map(Ok)))
            }
            JsonFormat::Lines => Ok(Box::new(
                reader
                    .lines()
                    .enumerate()
                    .filter_map(|(idx, line)| match line {
                        Ok(line) if line.trim().is_empty() => None,
                        Ok(line) => Some(serde_json::from_str::<Profile>(&line).map_err(
                            |source| RepositoryError::Record {
                                line: idx + 1,
                                source,
                            },
                        )),
                        Err(e) => Some(Err(RepositoryError::Read(e))),
                    }),
            )),
        }
    }
}
