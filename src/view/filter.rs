//! Search filtering over the local cache.
//!
//! A query matches a user when it is a case-insensitive substring of the
//! first name, the last name, or the email. The empty query matches everyone.

use crate::types::UserRecord;

/// True if `user` matches an already-lowercased query.
pub fn matches_lowercase(user: &UserRecord, needle: &str) -> bool {
    needle.is_empty()
        || user.first_name.to_lowercase().contains(needle)
        || user.last_name.to_lowercase().contains(needle)
        || user.email.to_lowercase().contains(needle)
}

pub fn matches_query(user: &UserRecord, query: &str) -> bool {
    matches_lowercase(user, &query.to_lowercase())
}

/// Filter users by a search query, keeping cache order.
pub fn filter_users<'a>(users: &'a [UserRecord], query: &str) -> Vec<&'a UserRecord> {
    if query.is_empty() {
        return users.iter().collect();
    }

    let needle = query.to_lowercase();
    users
        .iter()
        .filter(|user| matches_lowercase(user, &needle))
        .collect()
}
