//! Command handlers

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;

use gundeshapur_common::{route, AppView, LibraryConfig, LibraryError, SignInMode};
use gundeshapur_library::search::{filter_books, filter_loans, filter_users};
use gundeshapur_library::{
    create_library_spreadsheet, default_title, validate_spreadsheet, CounterUpdate,
    DashboardStats, Library, LoanWrite, NewBook, NewUser,
};
use gundeshapur_sheets::{SheetsClient, SheetsClientConfig, SheetsError};

use crate::config::{initialize, mask, ConfigFile};
use crate::{
    BooksAction, Cli, Commands, ConfigAction, LoansAction, SheetAction, UsersAction,
};

/// Flags for `books add`
#[derive(Debug, Args)]
pub struct AddBookArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub author: String,

    #[arg(long, default_value = "")]
    pub isbn: String,

    /// Dewey decimal classification
    #[arg(long, default_value = "")]
    pub dewey: String,

    #[arg(long, default_value = "")]
    pub publisher: String,

    #[arg(long, default_value = "")]
    pub year: String,

    #[arg(long, default_value = "")]
    pub genre: String,

    /// Copies owned
    #[arg(long, default_value_t = 1)]
    pub copies: i64,

    /// Copies on the shelf (default: all of them)
    #[arg(long)]
    pub available: Option<i64>,

    #[arg(long, default_value = "")]
    pub cover_url: String,

    #[arg(long, default_value = "")]
    pub description: String,
}

impl From<AddBookArgs> for NewBook {
    fn from(args: AddBookArgs) -> Self {
        NewBook {
            title: args.title,
            author: args.author,
            isbn: args.isbn,
            dewey_decimal: args.dewey,
            publisher: args.publisher,
            publication_year: args.year,
            genre: args.genre,
            total_copies: args.copies,
            available_copies: args.available,
            cover_url: args.cover_url,
            description: args.description,
        }
    }
}

/// Turn library errors into the message shown to the user
trait UserFacing<T> {
    fn user_facing(self) -> Result<T>;
}

impl<T> UserFacing<T> for std::result::Result<T, LibraryError> {
    fn user_facing(self) -> Result<T> {
        self.map_err(|e| anyhow!(e.user_message()))
    }
}

impl<T> UserFacing<T> for std::result::Result<T, SheetsError> {
    fn user_facing(self) -> Result<T> {
        self.map_err(|e| anyhow!(LibraryError::from(e).user_message()))
    }
}

/// Message for a failed list load: the store's own message when it gave one
fn load_failure(what: &str, err: LibraryError) -> anyhow::Error {
    match err {
        LibraryError::RemoteStore(_) => anyhow!(err.user_message()),
        _ => anyhow!(
            "Failed to load {}. Please check your sheet and permissions.",
            what
        ),
    }
}

/// Everything a command needs from the command line and the config file
struct Session {
    file: ConfigFile,
    config: LibraryConfig,
    access_token: Option<String>,
    json: bool,
}

impl Session {
    fn client(&self) -> Result<SheetsClient> {
        let token = self
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "An OAuth access token is required. Pass --access-token or set GUNDESHAPUR_ACCESS_TOKEN."
                )
            })?;
        let api_key = self.config.require_api_key().user_facing()?;
        SheetsClient::new(SheetsClientConfig::new().api_key(api_key).access_token(token))
            .user_facing()
    }

    fn library(&self) -> Result<Library> {
        if !self.config.is_configured() {
            return Err(anyhow!(
                "Application is not configured. Run `gundeshapur config init` first."
            ));
        }
        let client = self.client()?;
        Library::from_config(Arc::new(client), &self.config).user_facing()
    }

    fn save(&self) -> Result<()> {
        self.file.save(&self.config)
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to serialize output")?
        );
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn run(cli: Cli) -> Result<()> {
    let file = ConfigFile::new(&cli.global.config);
    let config = file.load()?;
    let mut session = Session {
        file,
        config,
        access_token: cli.global.access_token,
        json: cli.global.json,
    };

    match cli.command {
        Commands::Config { action } => run_config(&mut session, action),
        Commands::Whoami { admin, user } => {
            let mode = if admin {
                SignInMode::Admin
            } else if user {
                SignInMode::User
            } else {
                SignInMode::Silent
            };
            run_whoami(&session, mode).await
        }
        Commands::Sheet { action } => run_sheet(&mut session, action).await,
        Commands::Dashboard => run_dashboard(&session).await,
        Commands::Books { action } => run_books(&session, action).await,
        Commands::Users { action } => run_users(&session, action).await,
        Commands::Loans { action } => run_loans(&session, action).await,
    }
}

fn run_config(session: &mut Session, action: ConfigAction) -> Result<()> {
    use dialoguer::{theme::ColorfulTheme, Confirm, Input};

    let theme = ColorfulTheme::default();
    match action {
        ConfigAction::Init {
            api_key,
            client_id,
            admin_email,
        } => {
            let ask = |value: Option<String>, prompt: &str| -> Result<String> {
                match value {
                    Some(v) => Ok(v),
                    None => Input::<String>::with_theme(&theme)
                        .with_prompt(prompt)
                        .allow_empty(true)
                        .interact_text()
                        .with_context(|| format!("Failed to read {}", prompt)),
                }
            };
            let api_key = ask(api_key, "Google API Key")?;
            let client_id = ask(client_id, "OAuth Client ID")?;
            let admin_email = ask(admin_email, "Administrator email")?;

            session.config = initialize(
                session.config.clone(),
                &api_key,
                &client_id,
                &admin_email,
            )?;
            session.save()?;
            println!("✅ Configuration saved to {}", session.file.path().display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = &session.config;
            if session.json {
                let masked = LibraryConfig {
                    api_key: config.api_key.as_deref().map(mask),
                    client_id: config.client_id.as_deref().map(mask),
                    ..config.clone()
                };
                return session.print_json(&masked);
            }
            let show = |value: &Option<String>, secret: bool| match value.as_deref() {
                Some(v) if secret => mask(v),
                Some(v) => v.to_string(),
                None => "(not set)".to_string(),
            };
            println!("Config file:   {}", session.file.path().display());
            println!("API key:       {}", show(&config.api_key, true));
            println!("Client ID:     {}", show(&config.client_id, true));
            println!("Admin email:   {}", show(&config.admin_email, false));
            println!("Spreadsheet:   {}", show(&config.spreadsheet_id, false));
            println!(
                "Configured:    {}",
                if config.is_configured() { "yes" } else { "no" }
            );
            Ok(())
        }
        ConfigAction::Reset { yes } => {
            let confirmed = yes
                || Confirm::with_theme(&theme)
                    .with_prompt("Forget the stored credentials and spreadsheet?")
                    .default(false)
                    .interact()
                    .context("Failed to read confirmation")?;
            if !confirmed {
                println!("Nothing changed.");
                return Ok(());
            }
            session.config.reset();
            if session.file.remove()? {
                println!("🗑  Removed {}", session.file.path().display());
            } else {
                println!("Nothing stored at {}", session.file.path().display());
            }
            Ok(())
        }
    }
}

fn view_label(view: AppView) -> &'static str {
    match view {
        AppView::Admin => "admin",
        AppView::User => "user",
        AppView::Setup => "setup",
    }
}

async fn run_whoami(session: &Session, mode: SignInMode) -> Result<()> {
    let client = session.client()?;
    let profile = client.user_profile().await.user_facing()?;
    let view = route(mode, &profile, &session.config).user_facing()?;

    if session.json {
        return session.print_json(&serde_json::json!({
            "profile": profile,
            "view": view_label(view),
        }));
    }
    println!("{} <{}>", profile.name, profile.email);
    println!("View: {}", view_label(view));
    if view == AppView::Setup {
        println!("No spreadsheet connected. Run `gundeshapur sheet create` or `gundeshapur sheet connect <ID>`.");
    }
    Ok(())
}

async fn run_sheet(session: &mut Session, action: SheetAction) -> Result<()> {
    match action {
        SheetAction::Create { title } => {
            let client = session.client()?;
            let title = match title {
                Some(t) => t,
                None => default_title(&client.user_profile().await.user_facing()?.name),
            };
            let id = create_library_spreadsheet(&client, &title)
                .await
                .map_err(|e| anyhow!("Failed to create a new sheet. {}", e.user_message()))?;
            session.config.spreadsheet_id = Some(id.clone());
            session.save()?;
            println!("✅ Created \"{}\" ({})", title, id);
            Ok(())
        }
        SheetAction::Connect { spreadsheet_id } => {
            let spreadsheet_id = spreadsheet_id.trim();
            if spreadsheet_id.is_empty() {
                anyhow::bail!("Please paste a Spreadsheet ID.");
            }
            let client = session.client()?;
            if !validate_spreadsheet(&client, spreadsheet_id).await {
                anyhow::bail!(
                    "Invalid sheet. Ensure it has 'Books', 'Users', and 'Loans' tabs, and that you can access it."
                );
            }
            session.config.spreadsheet_id = Some(spreadsheet_id.to_string());
            session.save()?;
            println!("✅ Connected spreadsheet {}", spreadsheet_id);
            Ok(())
        }
        SheetAction::Disconnect => {
            session.config.spreadsheet_id = None;
            session.save()?;
            println!("Disconnected.");
            Ok(())
        }
    }
}

async fn run_dashboard(session: &Session) -> Result<()> {
    let library = session.library()?;
    let snapshot = library
        .snapshot()
        .await
        .map_err(|e| load_failure("dashboard data", e))?;
    let stats = DashboardStats::from_snapshot(&snapshot, today());
    if session.json {
        return session.print_json(&stats);
    }

    println!("📚 Total books:     {}", stats.total_books);
    println!("   Available:       {}", stats.available_copies);
    println!("👥 Active users:    {}", stats.active_users);
    println!("📖 Active loans:    {}", stats.active_loans);
    println!("⏰ Overdue loans:   {}", stats.overdue_loans);
    println!();
    if stats.recent_loans.is_empty() {
        println!("No loan activity yet.");
    } else {
        println!("Recent activity:");
        for loan in &stats.recent_loans {
            println!(
                "  {} - loaned to {} on {} [{}]",
                loan.book_title,
                loan.user_name,
                loan.loan_date,
                if loan.is_returned { "Returned" } else { "On Loan" }
            );
        }
    }
    Ok(())
}

async fn run_books(session: &Session, action: BooksAction) -> Result<()> {
    let library = session.library()?;
    match action {
        BooksAction::List { search } => {
            let books = library
                .books()
                .await
                .map_err(|e| load_failure("books", e))?;
            let books = filter_books(&books, search.as_deref().unwrap_or(""));
            if session.json {
                return session.print_json(&books);
            }
            for book in &books {
                println!(
                    "{:<36}  {:<40}  {:<24}  {}/{}",
                    book.id, book.title, book.author, book.available_copies, book.total_copies
                );
            }
            println!("{} book(s)", books.len());
            Ok(())
        }
        BooksAction::Add(args) => {
            let book = library.add_book(args.into()).await.user_facing()?;
            if session.json {
                return session.print_json(&book);
            }
            println!("✅ Added \"{}\" ({})", book.title, book.id);
            Ok(())
        }
        BooksAction::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let books: Vec<NewBook> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let added = library.import_books(books).await.user_facing()?;
            if session.json {
                return session.print_json(&added);
            }
            println!("✅ Imported {} book(s)", added.len());
            Ok(())
        }
    }
}

async fn run_users(session: &Session, action: UsersAction) -> Result<()> {
    let library = session.library()?;
    match action {
        UsersAction::List { search } => {
            let users = library
                .users()
                .await
                .map_err(|e| load_failure("users", e))?;
            let users = filter_users(&users, search.as_deref().unwrap_or(""));
            if session.json {
                return session.print_json(&users);
            }
            for user in &users {
                println!(
                    "{:<36}  {:<30}  {:<30}  {}",
                    user.id,
                    user.full_name(),
                    user.email,
                    if user.is_active { "active" } else { "inactive" }
                );
            }
            println!("{} user(s)", users.len());
            Ok(())
        }
        UsersAction::Add {
            first_name,
            last_name,
            email,
            phone,
        } => {
            let user = library
                .add_user_on(
                    NewUser {
                        first_name,
                        last_name,
                        email,
                        phone,
                    },
                    today(),
                )
                .await
                .user_facing()?;
            if session.json {
                return session.print_json(&user);
            }
            println!("✅ Registered {} ({})", user.full_name(), user.id);
            Ok(())
        }
        UsersAction::Toggle { user_id } => {
            let users = library.users().await.user_facing()?;
            let user = users
                .iter()
                .find(|u| u.id == user_id)
                .ok_or_else(|| anyhow!("No user with id {}", user_id))?;
            let active = !user.is_active;
            library
                .set_user_active(user, active)
                .await
                .map_err(|e| anyhow!("Failed to update status. {}", e.user_message()))?;
            println!(
                "{} is now {}",
                user.full_name(),
                if active { "active" } else { "inactive" }
            );
            Ok(())
        }
    }
}

fn report_counter(write: &LoanWrite) {
    match &write.counter {
        CounterUpdate::Applied { .. } => {}
        CounterUpdate::Failed { cell, error } => eprintln!(
            "⚠️  The loan was saved but {} was not updated: {}",
            cell,
            error.user_message()
        ),
        CounterUpdate::Skipped { book_id } => eprintln!(
            "⚠️  Book {} was not found; available copies not updated.",
            book_id
        ),
    }
}

async fn run_loans(session: &Session, action: LoansAction) -> Result<()> {
    let library = session.library()?;
    match action {
        LoansAction::List { search, active } => {
            let loans = library
                .loans()
                .await
                .map_err(|e| load_failure("loans", e))?;
            let today = today();
            let loans: Vec<_> = filter_loans(&loans, search.as_deref().unwrap_or(""))
                .into_iter()
                .filter(|l| !active || !l.is_returned)
                .collect();
            if session.json {
                return session.print_json(&loans);
            }
            for loan in &loans {
                println!(
                    "{:<36}  {:<40}  {:<30}  due {:<10}  {}",
                    loan.id,
                    loan.book_title,
                    loan.user_name,
                    loan.due_date,
                    loan.status(today)
                );
            }
            println!("{} loan(s)", loans.len());
            Ok(())
        }
        LoansAction::Create { book_id, user_id } => {
            let snapshot = library.snapshot().await.user_facing()?;
            let book = snapshot
                .book(&book_id)
                .ok_or_else(|| anyhow!("No book with id {}", book_id))?;
            let user = snapshot
                .user(&user_id)
                .ok_or_else(|| anyhow!("No user with id {}", user_id))?;
            let write = library
                .create_loan_on(book, user, today())
                .await
                .user_facing()?;
            report_counter(&write);
            if session.json {
                return session.print_json(&write.loan);
            }
            println!(
                "✅ Loaned \"{}\" to {} until {} ({})",
                write.loan.book_title, write.loan.user_name, write.loan.due_date, write.loan.id
            );
            Ok(())
        }
        LoansAction::Return { loan_id } => {
            let snapshot = library.snapshot().await.user_facing()?;
            let loan = snapshot
                .loan(&loan_id)
                .ok_or_else(|| anyhow!("No loan with id {}", loan_id))?;
            let outcome = library
                .return_loan_on(loan, &snapshot.books, today())
                .await
                .map_err(|e| anyhow!("Failed to return book. {}", e.user_message()))?;
            report_counter(&outcome.write);
            if session.json {
                return session.print_json(&outcome.write.loan);
            }
            match &outcome.refreshed {
                Ok(lists) => {
                    let active = lists.loans.iter().filter(|l| !l.is_returned).count();
                    println!(
                        "✅ Returned \"{}\" ({} loan(s) still out)",
                        outcome.write.loan.book_title, active
                    );
                }
                Err(err) => {
                    println!("✅ Returned \"{}\"", outcome.write.loan.book_title);
                    eprintln!("⚠️  Could not reload loans: {}", err.user_message());
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_surfaces_upstream_message() {
        let err = load_failure(
            "users",
            LibraryError::RemoteStore("Requested entity was not found.".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Error from Google: Requested entity was not found. Please verify your Spreadsheet ID and permissions."
        );
    }

    #[test]
    fn test_load_failure_generic_without_upstream_message() {
        let err = load_failure("loans", LibraryError::Connection("dns error".to_string()));
        assert_eq!(
            err.to_string(),
            "Failed to load loans. Please check your sheet and permissions."
        );
    }
}
