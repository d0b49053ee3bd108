pub mod commands;
pub mod config;
pub mod error;
pub mod remote;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;
pub mod view;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::{Config, MergePolicy};
pub use error::{Result, UserdeckError};
pub use remote::{
    AuthState, AuthStateStore, Credentials, DirectoryClient, HttpDirectoryClient, TokenStore,
};
pub use session::DirectorySession;
pub use store::{LocalCache, UserStore, fetch_all_pages};
pub use sync::{
    EditLink, EditSession, EditSessionSync, LinkResolution, MutationCoordinator, WatchEditLink,
    merge_update,
};
pub use types::{PAGE_SIZE, UserId, UserPatch, UserRecord, UsersPage};
pub use view::{DirectoryViewModel, PageWindow, compute_view_model, filter_users, paginate};
