//! CLI command implementations.

mod edit;
mod login;
mod ls;
mod open;
mod rm;

pub use edit::cmd_edit;
pub use login::cmd_login;
pub use ls::cmd_ls;
pub use open::cmd_open;
pub use rm::cmd_rm;

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::remote::{HttpDirectoryClient, TokenStore};
use crate::session::DirectorySession;
use crate::sync::WatchEditLink;
use crate::types::UserRecord;

/// Session type every command drives.
pub type CliSession = DirectorySession<HttpDirectoryClient, WatchEditLink>;

/// Build a session from `.userdeck/config.yaml` and the environment.
pub fn connect() -> Result<CliSession> {
    let config = Config::load()?;
    let tokens = Arc::new(match Config::session_token() {
        Some(token) => TokenStore::with_token(token),
        None => TokenStore::new(),
    });
    let client = HttpDirectoryClient::from_config(&config, Arc::clone(&tokens))?;
    tracing::debug!(base_url = client.base_url(), policy = %config.merge_policy, "connecting");

    Ok(DirectorySession::new(
        Arc::new(client),
        tokens,
        WatchEditLink::new(),
        config.merge_policy,
    ))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line summary of a user.
pub fn format_user_line(user: &UserRecord) -> String {
    format!(
        "{} {} <{}>",
        format!("{:>4}", user.id.get()).cyan(),
        user.full_name(),
        user.email.dimmed()
    )
}

/// Multi-line detail block of a user.
pub fn format_user_detail(user: &UserRecord) -> String {
    format!(
        "{}\n  first name: {}\n  last name:  {}\n  email:      {}\n  avatar:     {}",
        format!("user {}", user.id).bold(),
        user.first_name,
        user.last_name,
        user.email,
        user.avatar.dimmed()
    )
}
