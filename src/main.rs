use clap::{ArgGroup, Parser, Subcommand};
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use userdeck::commands::{cmd_edit, cmd_login, cmd_ls, cmd_open, cmd_rm};
use userdeck::types::{UserId, UserPatch};

#[derive(Parser)]
#[command(name = "userdeck")]
#[command(about = "Browse, search, edit and delete users in a remote directory")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a bearer token for USERDECK_TOKEN
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List users, six per page
    Ls {
        /// Case-insensitive match on first name, last name or email
        #[arg(short, long)]
        query: Option<String>,

        /// Page to show (clamped to the available pages)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve an edit link segment, e.g. `userdeck open 7`
    Open {
        /// Raw route segment
        segment: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields of a user
    #[command(group(ArgGroup::new("fields").required(true).multiple(true)))]
    Edit {
        /// User ID
        id: UserId,

        #[arg(long, group = "fields")]
        first_name: Option<String>,

        #[arg(long, group = "fields")]
        last_name: Option<String>,

        #[arg(long, group = "fields")]
        email: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a user
    #[command(visible_alias = "delete")]
    Rm {
        /// User ID
        id: UserId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login {
            email,
            password,
            json,
        } => cmd_login(&email, &password, json).await,
        Commands::Ls { query, page, json } => cmd_ls(query.as_deref(), page, json).await,
        Commands::Open { segment, json } => cmd_open(&segment, json).await,
        Commands::Edit {
            id,
            first_name,
            last_name,
            email,
            json,
        } => {
            let patch = UserPatch {
                first_name,
                last_name,
                email,
                avatar: None,
            };
            cmd_edit(id, patch, json).await
        }
        Commands::Rm { id, json } => cmd_rm(id, json).await,
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
