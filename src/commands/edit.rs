use owo_colors::OwoColorize;

use crate::commands::{connect, format_user_detail, print_json};
use crate::error::Result;
use crate::types::{UserId, UserPatch};

/// Update the given fields of a user
pub async fn cmd_edit(id: UserId, patch: UserPatch, output_json: bool) -> Result<()> {
    let session = connect()?;
    session.load().await?;

    session.begin_edit(id)?;
    let record = session.submit_edit(patch).await?;

    if output_json {
        return print_json(&record);
    }

    println!("{} user {}", "Updated".green(), id);
    println!("{}", format_user_detail(&record));
    Ok(())
}
