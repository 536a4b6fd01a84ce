//! Gundeshapur CLI - library management on top of a Google Sheets spreadsheet
//!
//! Usage:
//!   gundeshapur config init                 Store API key, client id and admin email
//!   gundeshapur config show                 Show stored settings (secrets masked)
//!   gundeshapur config reset                Forget every stored setting
//!   gundeshapur whoami [--admin|--user]     Show the signed-in account and its view
//!   gundeshapur sheet create [--title T]    Create and connect a new library spreadsheet
//!   gundeshapur sheet connect <ID>          Validate and connect an existing spreadsheet
//!   gundeshapur sheet disconnect            Forget the connected spreadsheet
//!   gundeshapur dashboard                   Library totals and recent loans
//!   gundeshapur books list|add|import
//!   gundeshapur users list|add|toggle
//!   gundeshapur loans list|create|return
//!
//! Remote commands need an OAuth access token in `--access-token` or
//! `GUNDESHAPUR_ACCESS_TOKEN`.

mod commands;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "gundeshapur")]
#[command(about = "Library management backed by a Google Sheets spreadsheet", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file
    #[arg(long, global = true, env = "GUNDESHAPUR_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// OAuth access token for Google APIs (never stored)
    #[arg(long, global = true, env = "GUNDESHAPUR_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Print records as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show the signed-in Google account and where it is routed
    Whoami {
        /// Sign in to the administrator view
        #[arg(long, conflicts_with = "user")]
        admin: bool,

        /// Sign in to the standard view
        #[arg(long)]
        user: bool,
    },
    /// Create, connect or disconnect the library spreadsheet
    Sheet {
        #[command(subcommand)]
        action: SheetAction,
    },
    /// Library totals and recent loans
    Dashboard,
    /// Catalogue commands
    Books {
        #[command(subcommand)]
        action: BooksAction,
    },
    /// Member commands
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Lending commands
    Loans {
        #[command(subcommand)]
        action: LoansAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Store credentials and the administrator email (prompts for missing values)
    Init {
        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        client_id: Option<String>,

        #[arg(long)]
        admin_email: Option<String>,
    },
    /// Show stored settings
    Show,
    /// Forget every stored setting
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SheetAction {
    /// Create a spreadsheet with the Books, Users and Loans tabs and connect it
    Create {
        /// Spreadsheet title (default: "Gundeshapur Library - <your name>")
        #[arg(long)]
        title: Option<String>,
    },
    /// Connect an existing spreadsheet after checking its tabs
    Connect {
        /// Spreadsheet ID
        spreadsheet_id: String,
    },
    /// Forget the connected spreadsheet
    Disconnect,
}

#[derive(Subcommand)]
pub enum BooksAction {
    /// List books
    List {
        /// Filter by title, author or ISBN
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add one book
    Add(commands::AddBookArgs),
    /// Add every book in a JSON file (an array of book objects) in one write
    Import {
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List members
    List {
        /// Filter by first name, last name or email
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Register a member
    Add {
        #[arg(long)]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Flip a member between active and inactive
    Toggle {
        /// Member id
        user_id: String,
    },
}

#[derive(Subcommand)]
pub enum LoansAction {
    /// List loans
    List {
        /// Filter by book title or borrower name
        #[arg(short, long)]
        search: Option<String>,

        /// Only loans not yet returned
        #[arg(long)]
        active: bool,
    },
    /// Lend a book to a member for 14 days
    Create {
        book_id: String,
        user_id: String,
    },
    /// Return a lent book
    Return {
        loan_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(commands::run(cli));
    if let Err(err) = &result {
        tracing::debug!(error = ?err, "Command failed");
    }
    result
}

/// Initialize logging; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}
