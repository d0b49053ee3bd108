//! Keeps the local cache, the edit session and the edit-identifier channel consistent.

pub mod edit_session;
pub mod link;
pub mod mutation;

pub use edit_session::{EditSession, EditSessionSync, LinkResolution};
pub use link::{EditLink, WatchEditLink};
pub use mutation::{MutationCoordinator, default_avatar_url, merge_update};
