//! Derived, read-only views over the local cache.

pub mod filter;
pub mod model;
pub mod paginate;

pub use filter::{filter_users, matches_query};
pub use model::{DirectoryViewModel, compute_view_model};
pub use paginate::{PageWindow, clamp_page, paginate, total_pages};
