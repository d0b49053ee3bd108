//! Local cache of the remote user directory.
//!
//! `UserStore` owns the authoritative `LocalCache` for the session. It is
//! written only by the bulk loader and by the mutation coordinator; every
//! other component borrows it read-only through `with_cache`.

pub mod loader;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::error::{Result, UserdeckError};
use crate::remote::DirectoryClient;
use crate::types::{UserId, UserRecord};

pub use loader::fetch_all_pages;

/// Ordered collection of users with unique identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalCache {
    records: Vec<UserRecord>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from server order. Later duplicates of an ID are dropped.
    pub fn from_records(records: Vec<UserRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let records = records
            .into_iter()
            .filter(|record| seen.insert(record.id))
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: UserId) -> Option<&UserRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.get(id).is_some()
    }

    /// Overwrite the record with the same ID in place. Returns false if absent.
    pub fn replace(&mut self, record: UserRecord) -> bool {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: UserId) -> Option<UserRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }
}

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<LocalCache>>>>;

struct InFlightLoad {
    generation: u64,
    future: SharedLoad,
}

#[derive(Default)]
struct StoreInner {
    cache: LocalCache,
    /// Set once a load has been applied in the current generation.
    loaded: bool,
    /// Bumped whenever the session ends; results tagged with an older value are discarded.
    generation: u64,
    in_flight: Option<InFlightLoad>,
    /// Mutations committed in this generation, replayed over every applied load.
    committed: HashMap<UserId, Committed>,
}

/// Latest local outcome for one ID.
#[derive(Debug, Clone)]
enum Committed {
    Updated(UserRecord),
    Deleted,
}

impl StoreInner {
    /// Replace the cache with `loaded`, then re-apply this session's mutations.
    fn apply_load(&mut self, loaded: &LocalCache) {
        let mut cache = loaded.clone();
        for (id, outcome) in &self.committed {
            match outcome {
                Committed::Updated(record) => {
                    cache.replace(record.clone());
                }
                Committed::Deleted => {
                    cache.remove(*id);
                }
            }
        }
        if !self.committed.is_empty() {
            tracing::debug!(replayed = self.committed.len(), "replayed local mutations over load");
        }
        self.cache = cache;
        self.loaded = true;
    }
}

/// Session-scoped owner of the local cache.
pub struct UserStore<C> {
    client: Arc<C>,
    inner: Mutex<StoreInner>,
}

impl<C> UserStore<C>
where
    C: DirectoryClient + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// Populate the cache from every remote page.
    ///
    /// Concurrent callers share one fetch sequence and observe the same
    /// result. Updates and deletes committed earlier in the session, including
    /// while the fetch was in flight, are re-applied over the fetched records.
    /// On failure the cache keeps its previous contents. A result that lands
    /// after `invalidate` is discarded.
    pub async fn load(&self) -> Result<LocalCache> {
        let (generation, future) = {
            let mut inner = self.inner.lock();
            match &inner.in_flight {
                Some(load) => {
                    tracing::debug!("joining in-flight directory load");
                    (load.generation, load.future.clone())
                }
                None => {
                    let client = Arc::clone(&self.client);
                    let future = async move { fetch_all_pages(client.as_ref()).await.map(Arc::new) }
                        .boxed()
                        .shared();
                    let generation = inner.generation;
                    inner.in_flight = Some(InFlightLoad {
                        generation,
                        future: future.clone(),
                    });
                    tracing::info!(generation, "starting directory load");
                    (generation, future)
                }
            }
        };

        let result = future.clone().await;

        let mut inner = self.inner.lock();
        let owns_slot = inner
            .in_flight
            .as_ref()
            .is_some_and(|load| load.future.ptr_eq(&future));

        if owns_slot {
            inner.in_flight = None;
        }

        match result {
            Ok(_) if inner.generation != generation => {
                tracing::warn!(generation, "discarding directory load from an ended session");
                Err(UserdeckError::SessionEnded("the directory load".to_string()))
            }
            Ok(cache) => {
                // Only the first waiter applies; the rest would overwrite later mutations.
                if owns_slot {
                    inner.apply_load(&cache);
                    tracing::info!(records = inner.cache.len(), "directory load applied");
                }
                Ok(inner.cache.clone())
            }
            Err(err) => {
                if owns_slot {
                    tracing::warn!(error = %err, "directory load failed");
                    if err.is_auth() {
                        invalidate_locked(&mut inner);
                    }
                }
                Err(err)
            }
        }
    }

    /// End the current session: drop cached data and orphan any in-flight load.
    pub fn invalidate(&self) {
        invalidate_locked(&mut self.inner.lock());
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().in_flight.is_some()
    }

    /// True once a load has been applied in this session.
    pub fn is_loaded(&self) -> bool {
        self.inner.lock().loaded
    }

    pub fn get(&self, id: UserId) -> Option<UserRecord> {
        self.inner.lock().cache.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> LocalCache {
        self.inner.lock().cache.clone()
    }

    /// Borrow the cache for a derived-view computation.
    pub fn with_cache<R>(&self, f: impl FnOnce(&LocalCache, bool) -> R) -> R {
        let inner = self.inner.lock();
        f(&inner.cache, inner.loaded)
    }

    /// Replace the record for `id` with `merge(current)` if the session that
    /// issued the mutation is still current.
    pub(crate) fn commit_update(
        &self,
        generation: u64,
        id: UserId,
        merge: impl FnOnce(&UserRecord) -> UserRecord,
    ) -> Result<UserRecord> {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return Err(stale_mutation());
        }
        let current = inner
            .cache
            .get(id)
            .ok_or_else(|| UserdeckError::NotFound(id.to_string()))?;
        let merged = merge(current);
        inner.cache.replace(merged.clone());
        inner.committed.insert(id, Committed::Updated(merged.clone()));
        Ok(merged)
    }

    pub(crate) fn commit_delete(&self, generation: u64, id: UserId) -> Result<UserRecord> {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return Err(stale_mutation());
        }
        let removed = inner
            .cache
            .remove(id)
            .ok_or_else(|| UserdeckError::NotFound(id.to_string()))?;
        inner.committed.insert(id, Committed::Deleted);
        Ok(removed)
    }
}

fn invalidate_locked(inner: &mut StoreInner) {
    inner.generation += 1;
    inner.cache = LocalCache::new();
    inner.loaded = false;
    inner.in_flight = None;
    inner.committed.clear();
    tracing::debug!(generation = inner.generation, "store invalidated");
}

fn stale_mutation() -> UserdeckError {
    UserdeckError::SessionEnded("the mutation".to_string())
}
