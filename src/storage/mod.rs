//! Storage abstractions for the posted-ID set.
//!
//! The set is loaded once per run, mutated in memory while papers are
//! announced, and written back in full after each notification batch:
//!
//! ```text
//! posted-ids.json   ["http://arxiv.org/abs/2401.00001v1", "https://blog.example/p/42", ...]
//! ```
//!
//! Nothing locks the file. Runs must be serialized by whatever schedules them.

pub mod local;

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;

/// Identifiers of papers already announced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostedIds {
    ids: BTreeSet<String>,
}

impl PostedIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` if the ID was not present before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PostedIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Trait for posted-ID storage backends.
#[async_trait]
pub trait PostedIdStore: Send + Sync {
    /// Load the persisted set. A store that has never been written is empty.
    async fn load(&self) -> Result<PostedIds>;

    /// Overwrite the persisted set with `ids`.
    async fn save(&self, ids: &PostedIds) -> Result<()>;
}
