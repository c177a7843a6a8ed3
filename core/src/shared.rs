use crate::error::{RankError, Result};
use crate::index::RankingIndex;
use crate::search::{SearchHit, SearchOptions};
use parking_lot::RwLock;
use std::sync::Arc;

/// Holder for the index currently served. Readers take a cheap `Arc` snapshot,
/// a rebuild swaps the whole index in one write.
#[derive(Default)]
pub struct SharedIndex {
    current: RwLock<Option<Arc<RankingIndex>>>,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(index: RankingIndex) -> Self {
        Self { current: RwLock::new(Some(Arc::new(index))) }
    }

    pub fn snapshot(&self) -> Result<Arc<RankingIndex>> {
        self.current.read().clone().ok_or(RankError::ModelNotBuilt)
    }

    pub fn is_built(&self) -> bool {
        self.current.read().is_some()
    }

    /// Install a new index, returning the previous one.
    pub fn replace(&self, index: RankingIndex) -> Option<Arc<RankingIndex>> {
        self.current.write().replace(Arc::new(index))
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        self.snapshot()?.search(query, options)
    }
}
