use owo_colors::OwoColorize;
use secrecy::ExposeSecret;
use serde_json::json;

use crate::commands::{connect, print_json};
use crate::error::Result;
use crate::remote::Credentials;

/// Exchange credentials for a bearer token and print it.
///
/// The token is not persisted; export it as `USERDECK_TOKEN` for later commands.
pub async fn cmd_login(email: &str, password: &str, output_json: bool) -> Result<()> {
    let session = connect()?;
    let credentials = Credentials::new(email, password);
    let secret = session.login(&credentials).await?;
    let token = secret.expose_secret();

    if output_json {
        return print_json(&json!({ "email": email, "token": token }));
    }

    println!("{} as {}", "Logged in".green(), email);
    println!("export USERDECK_TOKEN={token}");
    Ok(())
}
