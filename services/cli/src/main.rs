//! boardctl
//!
//! Terminal front end for the community board. The session is kept in a
//! credential file, so a login survives between invocations.

mod commands;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use board_client::{BoardClient, ClientConfig};
use clap::{Parser, Subcommand};
use common::ApiError;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Community board command-line client.
#[derive(Parser)]
#[command(name = "boardctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API base URL (overrides BOARD_API_BASE_URL)
    #[arg(global = true, long)]
    api_url: Option<String>,

    /// Credential file (overrides BOARD_CREDENTIAL_FILE)
    #[arg(global = true, long)]
    credentials: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session
    Login {
        email: String,
        #[arg(long, env = "BOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in
    Register {
        email: String,
        nickname: String,
        #[arg(long, env = "BOARD_PASSWORD", hide_env_values = true)]
        password: String,
        /// Profile image (JPG, PNG or GIF)
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// End the session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Update nickname or profile image
    Profile {
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long, conflicts_with = "remove_image")]
        image: Option<PathBuf>,
        #[arg(long)]
        remove_image: bool,
    },

    /// Change the password (logs out afterwards)
    Passwd {
        #[arg(long, env = "BOARD_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Deactivate the account
    Withdraw {
        /// Confirm the withdrawal
        #[arg(long)]
        yes: bool,
    },

    /// List the latest posts
    Feed {
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// Show a post with its comments
    Show { post_id: i64 },

    /// Like a post, or remove the like
    Like { post_id: i64 },

    /// Comment on a post
    Comment { post_id: i64, content: String },

    /// Change one of your comments
    EditComment {
        post_id: i64,
        comment_id: i64,
        content: String,
    },

    /// Delete one of your comments
    DeleteComment { post_id: i64, comment_id: i64 },

    /// Write a post
    Write {
        title: String,
        content: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Edit one of your posts
    Edit {
        post_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, conflicts_with = "remove_image")]
        image: Option<PathBuf>,
        #[arg(long)]
        remove_image: bool,
    },

    /// Delete one of your posts
    Delete { post_id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
    });
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Command failed: {:?}", e);
            eprintln!("error: {}", user_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(path) = cli.credentials {
        config.credential_file = Some(path);
    }

    let client = BoardClient::new(config)?;
    info!("Using API at {}", client.config().api_base_url);

    match cli.command {
        Commands::Login { email, password } => commands::login(&client, &email, &password).await,
        Commands::Register {
            email,
            nickname,
            password,
            image,
        } => commands::register(&client, email, nickname, password, image).await,
        Commands::Logout => commands::logout(&client).await,
        Commands::Whoami => commands::whoami(&client).await,
        Commands::Profile {
            nickname,
            image,
            remove_image,
        } => commands::profile(&client, nickname, image, remove_image).await,
        Commands::Passwd {
            new_password,
            confirm,
        } => {
            let confirm = confirm.unwrap_or_else(|| new_password.clone());
            commands::change_password(&client, &new_password, &confirm).await
        }
        Commands::Withdraw { yes } => commands::withdraw(&client, yes).await,
        Commands::Feed { pages } => commands::feed(&client, pages).await,
        Commands::Show { post_id } => commands::show(&client, post_id).await,
        Commands::Like { post_id } => commands::like(&client, post_id).await,
        Commands::Comment { post_id, content } => commands::comment(&client, post_id, &content).await,
        Commands::EditComment {
            post_id,
            comment_id,
            content,
        } => commands::edit_comment(&client, post_id, comment_id, &content).await,
        Commands::DeleteComment {
            post_id,
            comment_id,
        } => commands::delete_comment(&client, post_id, comment_id).await,
        Commands::Write {
            title,
            content,
            image,
        } => commands::write(&client, title, content, image).await,
        Commands::Edit {
            post_id,
            title,
            content,
            image,
            remove_image,
        } => commands::edit(&client, post_id, title, content, image, remove_image).await,
        Commands::Delete { post_id } => commands::delete(&client, post_id).await,
    }
}

/// Message to print for a failed command; API errors are translated
fn user_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<ApiError>() {
        Some(api_error) => api_error.user_message(),
        None => error.to_string(),
    }
}
