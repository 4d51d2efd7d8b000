//! Repository configuration
//!
//! Tunables for the repository layer. All bounds are configurable ceilings
//! rather than hardcoded constants; the defaults match the values the layer
//! was originally tuned with.

use serde::{Deserialize, Serialize};

use crate::sanitize::DEFAULT_MAX_SCALAR_LENGTH;
use crate::validation::DEFAULT_MAX_RELATIONS;

/// Limits applied by a repository instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Items per page when the request does not say
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Ceiling for items per page; larger requests are clamped, not rejected
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    /// Maximum relation joins considered per query; extras are dropped
    #[serde(default = "default_max_relations")]
    pub max_relations: usize,

    /// Maximum characters kept in a string-ish bound value
    #[serde(default = "default_max_scalar_length")]
    pub max_scalar_length: usize,
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    1000
}

fn default_max_relations() -> usize {
    DEFAULT_MAX_RELATIONS
}

fn default_max_scalar_length() -> usize {
    DEFAULT_MAX_SCALAR_LENGTH
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_relations: default_max_relations(),
            max_scalar_length: default_max_scalar_length(),
        }
    }
}
