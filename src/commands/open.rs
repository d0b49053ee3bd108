use owo_colors::OwoColorize;

use crate::commands::{connect, format_user_detail, print_json};
use crate::error::{Result, UserdeckError};

/// Resolve an edit deep link (`/users/<segment>/edit`) and show the record it opens.
///
/// The segment is registered before the directory is loaded, the same order a
/// browser hitting the link directly would produce.
pub async fn cmd_open(segment: &str, output_json: bool) -> Result<()> {
    let session = connect()?;
    session.observe_edit_id(Some(segment));
    session.load().await?;

    let edit = session.edit_session();
    if output_json {
        return print_json(&edit);
    }

    match edit.record() {
        Some(record) => {
            println!("{}", format_user_detail(record));
            Ok(())
        }
        None => {
            eprintln!(
                "{} returning to the user list",
                UserdeckError::NotFound(segment.to_string()).yellow()
            );
            Ok(())
        }
    }
}
