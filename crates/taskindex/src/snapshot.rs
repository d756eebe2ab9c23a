//! Read snapshots and the shared snapshot cache.
//!
//! All readers share one [`Snapshot`] until the maintenance task commits and
//! calls [`SnapshotCache::invalidate`]. A snapshot that was handed out stays
//! usable after invalidation; only new callers get a fresh one.

use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;
use tantivy::{
    Searcher, TantivyDocument,
    collector::TopDocs,
    query::Query,
    schema::{Field, Value},
};

use crate::{error::IndexError, field::TaskField, store::IndexStore};

/// One search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Handle of the matching task.
    pub identifier: String,
    /// Engine relevance score.
    pub score: f32,
}

/// Point-in-time, read-only view of the index store.
pub struct Snapshot {
    /// Tantivy searcher over the committed segments.
    searcher: Searcher,
    /// Identifier field handle.
    identifier: Field,
}

impl Snapshot {
    /// Wraps a searcher.
    pub fn new(searcher: Searcher, identifier: Field) -> Self {
        Self {
            searcher,
            identifier,
        }
    }

    /// Runs a query and returns at most `limit` hits in ranking order.
    pub fn search(&self, query: &dyn Query, limit: usize) -> Result<Vec<SearchHit>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let top_docs = self
            .searcher
            .search(query, &TopDocs::with_limit(limit))
            .map_err(|e| IndexError::search(&e))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = self
                .searcher
                .doc(address)
                .map_err(|e| IndexError::search(&e))?;
            if let Some(identifier) = doc.get_first(self.identifier).and_then(|v| v.as_str()) {
                hits.push(SearchHit {
                    identifier: identifier.to_string(),
                    score,
                });
            }
        }
        Ok(hits)
    }

    /// Number of live documents.
    pub fn num_docs(&self) -> u64 {
        self.searcher.num_docs()
    }
}

/// The hit set of the last `matches` query.
struct CachedResults {
    /// Pattern the hits were computed for.
    pattern: String,
    /// Default field the pattern was translated against.
    field: TaskField,
    /// Snapshot generation the hits were computed against.
    generation: u64,
    /// Matching task handles.
    hits: Arc<HashSet<String>>,
}

/// State guarded by the cache lock.
#[derive(Default)]
struct CacheState {
    /// Shared snapshot, opened lazily.
    snapshot: Option<Arc<Snapshot>>,
    /// Bumped whenever the snapshot is invalidated.
    generation: u64,
    /// Single-entry result cache.
    results: Option<CachedResults>,
}

/// Holds the shared snapshot and the single-entry result cache.
#[derive(Default)]
pub struct SnapshotCache {
    /// Guarded state.
    state: Mutex<CacheState>,
}

impl SnapshotCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared snapshot, opening one if none is cached.
    pub fn snapshot(&self, store: &IndexStore) -> Result<Arc<Snapshot>, IndexError> {
        let mut state = self.state.lock();
        Self::current(&mut state, store)
    }

    /// Returns the hit set for `pattern` under `field`.
    ///
    /// `search` runs only when the cached entry is for a different pattern,
    /// field or snapshot.
    pub fn hits<F>(
        &self,
        store: &IndexStore,
        pattern: &str,
        field: TaskField,
        search: F,
    ) -> Result<Arc<HashSet<String>>, IndexError>
    where
        F: FnOnce(&Snapshot) -> Result<HashSet<String>, IndexError>,
    {
        let mut state = self.state.lock();
        let snapshot = Self::current(&mut state, store)?;

        if let Some(cached) = &state.results
            && cached.generation == state.generation
            && cached.field == field
            && cached.pattern == pattern
        {
            return Ok(Arc::clone(&cached.hits));
        }

        let hits = Arc::new(search(&snapshot)?);
        state.results = Some(CachedResults {
            pattern: pattern.to_string(),
            field,
            generation: state.generation,
            hits: Arc::clone(&hits),
        });
        Ok(hits)
    }

    /// Drops the cached snapshot and result set.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.snapshot = None;
        state.results = None;
        state.generation += 1;
    }

    /// Drops the cached result set, keeping the snapshot.
    pub fn clear_results(&self) {
        self.state.lock().results = None;
    }

    /// Cached snapshot, opening a new one under the held lock if needed.
    fn current(state: &mut CacheState, store: &IndexStore) -> Result<Arc<Snapshot>, IndexError> {
        if let Some(snapshot) = &state.snapshot {
            return Ok(Arc::clone(snapshot));
        }
        let snapshot = Arc::new(store.snapshot()?);
        state.snapshot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}
