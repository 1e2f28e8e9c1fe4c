use crate::core::profile::Profile;
use crate::repository::{ProfileIter, ProfileRepository, RepositoryError};

/// Profiles held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    profiles: Vec<Profile>,
}

impl InMemoryRepository {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self { profiles }
    }

    pub fn push(&mut self, profile: Profile) {
        self.profiles.push(profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl FromIterator<Profile> for InMemoryRepository {
    fn from_iter<T: IntoIterator<Item = Profile>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl ProfileRepository for InMemoryRepository {
    fn profiles(&self) -> Result<ProfileIter<'_>, RepositoryError> {
        Ok(Box::new(self.profiles.iter().cloned().map(Ok)))
    }
}
