//! Outbound half of the edit-identifier channel.
//!
//! The routing layer feeds identifiers in through
//! `DirectorySession::observe_edit_id`; the engine answers through an
//! `EditLink`, asking the router to show a given edit URL or to return to the
//! list view (`None`).

use std::sync::Arc;

use tokio::sync::watch;

use crate::types::UserId;

pub trait EditLink: Send + Sync {
    fn emit(&self, id: Option<UserId>);
}

impl<L: EditLink + ?Sized> EditLink for Arc<L> {
    fn emit(&self, id: Option<UserId>) {
        (**self).emit(id);
    }
}

/// Edit link backed by a watch channel, for routers that poll or await changes.
#[derive(Clone, Debug)]
pub struct WatchEditLink {
    sender: Arc<watch::Sender<Option<UserId>>>,
    receiver: watch::Receiver<Option<UserId>>,
}

impl Default for WatchEditLink {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchEditLink {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn current(&self) -> Option<UserId> {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.receiver.clone()
    }
}

impl EditLink for WatchEditLink {
    fn emit(&self, id: Option<UserId>) {
        // Always notify: "clear" must reach the router even if it already holds None.
        self.sender.send_replace(id);
    }
}
