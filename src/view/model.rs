//! Read model handed to the UI.
//!
//! Everything here is recomputed from the cache, the query, the page window
//! and the edit session. Nothing is stored between renders, so the view can
//! never drift from the cache.

use serde::Serialize;

use crate::store::LocalCache;
use crate::sync::EditSession;
use crate::types::UserRecord;

use super::filter::filter_users;
use super::paginate::PageWindow;

/// Snapshot of what the list view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryViewModel {
    /// Users on the current page
    pub displayed_records: Vec<UserRecord>,
    /// Page count of the filtered view (at least 1)
    pub total_pages: usize,
    /// 1-based current page, already clamped
    pub current_page: usize,
    /// Number of users matching the query across all pages
    pub result_count: usize,
    pub query: String,
    pub edit_session: EditSession,
    pub is_loading: bool,
}

/// Compute the view model from the authoritative state.
pub fn compute_view_model(
    cache: &LocalCache,
    query: &str,
    window: &PageWindow,
    edit_session: &EditSession,
    is_loading: bool,
) -> DirectoryViewModel {
    let filtered = filter_users(cache.records(), query);

    let mut window = *window;
    window.reclamp(filtered.len());

    DirectoryViewModel {
        displayed_records: window.slice(&filtered).iter().map(|u| (*u).clone()).collect(),
        total_pages: window.total_pages(filtered.len()),
        current_page: window.page(),
        result_count: filtered.len(),
        query: query.to_string(),
        edit_session: edit_session.clone(),
        is_loading,
    }
}
