//! Edit-session state machine and its binding to the edit-identifier channel.
//!
//! `EditSessionSync` is the only place that translates between "a route
//! names user N" and "user N is open for editing". Identifiers that arrive
//! before the first load has been applied are parked and re-resolved once
//! the cache is populated.

use serde::Serialize;

use crate::error::{Result, UserdeckError};
use crate::store::LocalCache;
use crate::types::{UserId, UserRecord};

use super::link::EditLink;

/// At most one user open for editing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "record", rename_all = "snake_case")]
pub enum EditSession {
    #[default]
    Closed,
    Open(UserRecord),
}

impl EditSession {
    pub fn is_open(&self) -> bool {
        matches!(self, EditSession::Open(_))
    }

    pub fn record(&self) -> Option<&UserRecord> {
        match self {
            EditSession::Open(record) => Some(record),
            EditSession::Closed => None,
        }
    }

    pub fn id(&self) -> Option<UserId> {
        self.record().map(|r| r.id)
    }
}

/// Outcome of resolving an identifier from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkResolution {
    Opened(UserId),
    /// The cache has not been loaded yet; resolution is deferred.
    Pending,
    Closed,
    /// The identifier names no cached user; the channel was told to clear.
    NotFound(String),
}

pub struct EditSessionSync<L> {
    link: L,
    session: EditSession,
    /// Raw identifier last requested through the channel or `begin_edit`.
    requested: Option<String>,
}

impl<L: EditLink> EditSessionSync<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            session: EditSession::Closed,
            requested: None,
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn requested(&self) -> Option<&str> {
        self.requested.as_deref()
    }

    /// Open `id` for editing and point the channel at it.
    pub fn begin_edit(&mut self, cache: &LocalCache, id: UserId) -> Result<UserRecord> {
        let record = cache
            .get(id)
            .cloned()
            .ok_or_else(|| UserdeckError::NotFound(id.to_string()))?;

        self.open(record.clone());
        self.requested = Some(id.to_string());
        self.link.emit(Some(id));
        Ok(record)
    }

    /// Close the session and return the channel to the list view.
    pub fn cancel(&mut self) {
        self.close();
        self.link.emit(None);
    }

    /// Handle a value pushed by the channel.
    pub fn observe(&mut self, raw: Option<&str>, cache: &LocalCache, loaded: bool) -> LinkResolution {
        match raw {
            None => {
                self.close();
                LinkResolution::Closed
            }
            Some(raw) => {
                self.requested = Some(raw.to_string());
                self.resolve(cache, loaded)
            }
        }
    }

    /// Re-run resolution after a load has been applied.
    pub fn on_load_settled(&mut self, cache: &LocalCache) -> LinkResolution {
        self.resolve(cache, true)
    }

    /// An update of `id` completed; close if it was the open record.
    pub fn on_updated(&mut self, id: UserId) {
        if self.session.id() == Some(id) {
            self.cancel();
        }
    }

    /// `id` was deleted; close and clear the channel if it referenced that user.
    pub fn on_deleted(&mut self, id: UserId) {
        let linked = self
            .requested
            .as_deref()
            .and_then(|raw| raw.parse::<UserId>().ok())
            == Some(id);
        if linked || self.session.id() == Some(id) {
            self.cancel();
        }
    }

    /// Forget everything without signalling the channel (session ended).
    pub fn reset(&mut self) {
        self.close();
    }

    fn resolve(&mut self, cache: &LocalCache, loaded: bool) -> LinkResolution {
        let Some(raw) = self.requested.clone() else {
            return match self.session.id() {
                Some(id) => LinkResolution::Opened(id),
                None => LinkResolution::Closed,
            };
        };

        if !loaded {
            tracing::debug!(id = %raw, "deferring edit link until the directory is loaded");
            return LinkResolution::Pending;
        }

        match raw
            .parse::<UserId>()
            .ok()
            .and_then(|id| cache.get(id).cloned())
        {
            Some(record) => {
                let id = record.id;
                self.open(record);
                LinkResolution::Opened(id)
            }
            None => {
                tracing::info!(id = %raw, "edit link names no cached user, clearing");
                self.cancel();
                LinkResolution::NotFound(raw)
            }
        }
    }

    fn open(&mut self, record: UserRecord) {
        tracing::debug!(id = %record.id, "edit session opened");
        self.session = EditSession::Open(record);
    }

    fn close(&mut self) {
        if let EditSession::Open(record) = &self.session {
            tracing::debug!(id = %record.id, "edit session closed");
        }
        self.session = EditSession::Closed;
        self.requested = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{RecordingLink, make_users};

    fn setup() -> (Arc<RecordingLink>, EditSessionSync<Arc<RecordingLink>>, LocalCache) {
        let link = Arc::new(RecordingLink::new());
        let sync = EditSessionSync::new(Arc::clone(&link));
        (link, sync, LocalCache::from_records(make_users(12)))
    }

    #[test]
    fn test_begin_edit_opens_and_emits() {
        let (link, mut sync, cache) = setup();
        let record = sync.begin_edit(&cache, UserId::new(3)).unwrap();

        assert_eq!(record.first_name, "Emma");
        assert_eq!(sync.session().id(), Some(UserId::new(3)));
        assert_eq!(link.emissions(), vec![Some(UserId::new(3))]);
    }

    #[test]
    fn test_begin_edit_unknown_id_is_not_found() {
        let (link, mut sync, cache) = setup();
        let err = sync.begin_edit(&cache, UserId::new(99)).unwrap_err();
        assert!(matches!(err, UserdeckError::NotFound(_)));
        assert!(!sync.session().is_open());
        assert!(link.emissions().is_empty());
    }

    #[test]
    fn test_opening_another_record_replaces_the_first() {
        let (_link, mut sync, cache) = setup();
        sync.begin_edit(&cache, UserId::new(1)).unwrap();
        sync.begin_edit(&cache, UserId::new(2)).unwrap();
        assert_eq!(sync.session().id(), Some(UserId::new(2)));
    }

    #[test]
    fn test_cancel_closes_and_clears_channel() {
        let (link, mut sync, cache) = setup();
        sync.begin_edit(&cache, UserId::new(1)).unwrap();
        sync.cancel();
        assert_eq!(sync.session(), &EditSession::Closed);
        assert_eq!(link.last(), Some(None));
    }

    #[test]
    fn test_observe_resolves_against_loaded_cache() {
        let (link, mut sync, cache) = setup();
        let outcome = sync.observe(Some("7"), &cache, true);
        assert_eq!(outcome, LinkResolution::Opened(UserId::new(7)));
        assert_eq!(sync.session().record().unwrap().last_name, "Lawson");
        // no echo back to the router
        assert!(link.emissions().is_empty());
    }

    #[test]
    fn test_observe_before_load_is_deferred() {
        let (link, mut sync, cache) = setup();
        let outcome = sync.observe(Some("7"), &LocalCache::new(), false);
        assert_eq!(outcome, LinkResolution::Pending);
        assert!(!sync.session().is_open());
        assert!(link.emissions().is_empty());

        assert_eq!(
            sync.on_load_settled(&cache),
            LinkResolution::Opened(UserId::new(7))
        );
    }

    #[test]
    fn test_unknown_or_malformed_ids_clear_the_channel() {
        let (link, mut sync, cache) = setup();
        assert_eq!(
            sync.observe(Some("42"), &cache, true),
            LinkResolution::NotFound("42".to_string())
        );
        assert_eq!(
            sync.observe(Some("abc"), &cache, true),
            LinkResolution::NotFound("abc".to_string())
        );
        assert_eq!(link.emissions(), vec![None, None]);
        assert!(sync.requested().is_none());
    }

    #[test]
    fn test_observe_none_closes_without_emitting() {
        let (link, mut sync, cache) = setup();
        sync.observe(Some("1"), &cache, true);
        assert_eq!(sync.observe(None, &cache, true), LinkResolution::Closed);
        assert!(!sync.session().is_open());
        assert!(link.emissions().is_empty());
    }

    #[test]
    fn test_on_updated_only_closes_matching_record() {
        let (link, mut sync, cache) = setup();
        sync.begin_edit(&cache, UserId::new(4)).unwrap();

        sync.on_updated(UserId::new(5));
        assert!(sync.session().is_open());

        sync.on_updated(UserId::new(4));
        assert!(!sync.session().is_open());
        assert_eq!(link.last(), Some(None));
    }

    #[test]
    fn test_on_deleted_clears_pending_link() {
        let (link, mut sync, _cache) = setup();
        sync.observe(Some("5"), &LocalCache::new(), false);

        sync.on_deleted(UserId::new(5));
        assert!(sync.requested().is_none());
        assert_eq!(link.emissions(), vec![None]);
    }

    #[test]
    fn test_reset_forgets_pending_link_silently() {
        let (link, mut sync, cache) = setup();
        sync.observe(Some("5"), &LocalCache::new(), false);
        sync.reset();
        assert_eq!(sync.on_load_settled(&cache), LinkResolution::Closed);
        assert!(link.emissions().is_empty());
    }
}
