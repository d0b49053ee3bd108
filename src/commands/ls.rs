use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::commands::{connect, print_json};
use crate::error::Result;

/// A row in the user table
#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
}

/// List one page of users, optionally narrowed by a search query
pub async fn cmd_ls(query: Option<&str>, page: usize, output_json: bool) -> Result<()> {
    let session = connect()?;
    session.load().await?;

    if let Some(query) = query {
        session.set_search_query(query);
    }
    session.set_page(page);
    let view = session.view();

    if output_json {
        return print_json(&view);
    }

    if view.displayed_records.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let rows: Vec<UserRow> = view
        .displayed_records
        .iter()
        .map(|u| UserRow {
            id: u.id.get(),
            name: u.full_name(),
            email: u.email.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    println!(
        "\nPage {} of {} ({} user(s))",
        view.current_page,
        view.total_pages,
        view.result_count
    );
    if view.current_page != page.max(1) {
        println!("{}", format!("page {page} is out of range").dimmed());
    }

    Ok(())
}
