use owo_colors::OwoColorize;
use serde_json::json;

use crate::commands::{connect, format_user_line, print_json};
use crate::error::Result;
use crate::types::UserId;

/// Delete a user
pub async fn cmd_rm(id: UserId, output_json: bool) -> Result<()> {
    let session = connect()?;
    session.load().await?;

    let removed = session.request_delete(id).await?;
    let remaining = session.view().result_count;

    if output_json {
        return print_json(&json!({
            "deleted": removed,
            "remaining": remaining,
        }));
    }

    println!("{} {}", "Deleted".red(), format_user_line(&removed));
    println!("{remaining} user(s) remaining");
    Ok(())
}
