//! Explicit scheme → repository table handed to a [`RequestRouter`](super::RequestRouter).

use std::sync::Arc;

use crate::error::ConfigError;

use super::identifier::is_valid_scheme;
use super::repository::Repository;

/// Repositories keyed by scheme, in registration order.
#[derive(Default, Clone)]
pub struct RepositoryRegistry {
    entries: Vec<(String, Arc<dyn Repository>)>,
}

impl RepositoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `repository` under `scheme`.
    ///
    /// # Errors
    /// [`ConfigError::InvalidScheme`] for a malformed token,
    /// [`ConfigError::DuplicateScheme`] if the scheme is taken.
    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        repository: Arc<dyn Repository>,
    ) -> Result<(), ConfigError> {
        let scheme = scheme.into();
        if !is_valid_scheme(&scheme) {
            return Err(ConfigError::InvalidScheme { scheme });
        }
        if self.get(&scheme).is_some() {
            return Err(ConfigError::DuplicateScheme { scheme });
        }
        self.entries.push((scheme, repository));
        Ok(())
    }

    /// Chaining form of [`register`](Self::register).
    pub fn with(
        mut self,
        scheme: impl Into<String>,
        repository: Arc<dyn Repository>,
    ) -> Result<Self, ConfigError> {
        self.register(scheme, repository)?;
        Ok(self)
    }

    /// Repository registered under `scheme`.
    pub fn get(&self, scheme: &str) -> Option<&Arc<dyn Repository>> {
        self.entries
            .iter()
            .find(|(s, _)| s == scheme)
            .map(|(_, repo)| repo)
    }

    /// Registered schemes, in registration order.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    /// Number of registered repositories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.schemes()).finish()
    }
}
