//! Domain operations over one library spreadsheet
//!
//! Every workflow is composed from plain store calls with no transactional guarantee.
//! Multi-step writes report a [`LoanWrite`]: the primary write either succeeded (the
//! loan row exists) or the whole call is an `Err`; the follow-up counter write is
//! reported separately so a caller can tell "nothing happened" from "loan recorded,
//! counter not adjusted".

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use gundeshapur_common::{LibraryConfig, LibraryError, Result};
use gundeshapur_sheets::SpreadsheetStore;

use crate::dates::{format_date, timestamp};
use crate::mapper::bool_literal;
use crate::records::{Book, LibraryUser, Loan, NewBook, NewUser, SheetRow};
use crate::schema::{BOOKS, LOANS, USERS};

/// Fixed loan period
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Outcome of the available-copies write that follows a loan write
#[derive(Debug, Clone, PartialEq)]
pub enum CounterUpdate {
    /// `cell` now holds `value`
    Applied { cell: String, value: i64 },
    /// The write was attempted and rejected; the counter is stale
    Failed { cell: String, error: LibraryError },
    /// The book was not in the caller's snapshot, so nothing was written
    Skipped { book_id: String },
}

impl CounterUpdate {
    pub fn is_applied(&self) -> bool {
        matches!(self, CounterUpdate::Applied { .. })
    }
}

/// A loan write whose primary step succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct LoanWrite {
    /// The loan as written
    pub loan: Loan,
    pub counter: CounterUpdate,
}

impl LoanWrite {
    /// True when every step landed
    pub fn is_complete(&self) -> bool {
        self.counter.is_applied()
    }
}

/// Result of returning a loan, with the tabs re-read afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnOutcome {
    pub write: LoanWrite,
    /// The re-read; an `Err` here leaves every write in place
    pub refreshed: Result<RefreshedLists>,
}

/// Loans and Books as read back after a return
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshedLists {
    pub loans: Vec<Loan>,
    pub books: Vec<Book>,
}

/// All three tabs fetched together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibrarySnapshot {
    pub books: Vec<Book>,
    pub users: Vec<LibraryUser>,
    pub loans: Vec<Loan>,
}

impl LibrarySnapshot {
    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn user(&self, id: &str) -> Option<&LibraryUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn loan(&self, id: &str) -> Option<&Loan> {
        self.loans.iter().find(|l| l.id == id)
    }
}

/// Handle to one connected library spreadsheet
#[derive(Clone)]
pub struct Library {
    store: Arc<dyn SpreadsheetStore>,
    spreadsheet_id: String,
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .finish()
    }
}

impl Library {
    pub fn new(store: Arc<dyn SpreadsheetStore>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            store,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    /// Open the spreadsheet connected in `config`
    pub fn from_config(store: Arc<dyn SpreadsheetStore>, config: &LibraryConfig) -> Result<Self> {
        let spreadsheet_id = config.require_spreadsheet_id()?;
        Ok(Self::new(store, spreadsheet_id))
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Fetch and map every record of one tab
    pub async fn fetch<T: SheetRow>(&self) -> Result<Vec<T>> {
        let tab = T::SCHEMA.name;
        let grid = self.store.get_values(&self.spreadsheet_id, tab).await?;
        let records = T::from_grid(&grid);
        debug!(
            spreadsheet_id = %self.spreadsheet_id,
            tab,
            records = records.len(),
            "Fetched tab"
        );
        Ok(records)
    }

    pub async fn books(&self) -> Result<Vec<Book>> {
        self.fetch().await
    }

    pub async fn users(&self) -> Result<Vec<LibraryUser>> {
        self.fetch().await
    }

    pub async fn loans(&self) -> Result<Vec<Loan>> {
        self.fetch().await
    }

    /// Fetch the three tabs concurrently
    pub async fn snapshot(&self) -> Result<LibrarySnapshot> {
        let (books, users, loans) = tokio::try_join!(self.books(), self.users(), self.loans())?;
        Ok(LibrarySnapshot {
            books,
            users,
            loans,
        })
    }

    pub async fn add_book(&self, book: NewBook) -> Result<Book> {
        let mut added = self.import_books(vec![book]).await?;
        added
            .pop()
            .ok_or_else(|| LibraryError::Validation("no book was added".to_string()))
    }

    /// Append many books in a single call
    pub async fn import_books(&self, books: Vec<NewBook>) -> Result<Vec<Book>> {
        if books.is_empty() {
            return Ok(Vec::new());
        }
        for (index, book) in books.iter().enumerate() {
            if book.title.trim().is_empty() {
                return Err(LibraryError::Validation(format!(
                    "book {} has no title",
                    index + 1
                )));
            }
            if book.total_copies < 0 || book.available_copies.is_some_and(|a| a < 0) {
                return Err(LibraryError::Validation(format!(
                    "book {} has a negative copy count",
                    index + 1
                )));
            }
        }

        let created_at = timestamp(Utc::now());
        let books: Vec<Book> = books
            .into_iter()
            .map(|b| b.into_book(new_id(), created_at.clone()))
            .collect();
        let rows = self.append_records(&books).await?;
        Ok(with_rows(books, rows, |b, row| b.row = row))
    }

    /// Register a member as active from today
    pub async fn add_user(&self, user: NewUser) -> Result<LibraryUser> {
        self.add_user_on(user, Utc::now().date_naive()).await
    }

    pub async fn add_user_on(&self, user: NewUser, today: NaiveDate) -> Result<LibraryUser> {
        if user.first_name.trim().is_empty() || user.email.trim().is_empty() {
            return Err(LibraryError::Validation(
                "a user needs a first name and an email".to_string(),
            ));
        }
        let user = user.into_user(new_id(), format_date(today));
        let rows = self.append_records(std::slice::from_ref(&user)).await?;
        let mut users = with_rows(vec![user], rows, |u, row| u.row = row);
        users
            .pop()
            .ok_or_else(|| LibraryError::Validation("no user was added".to_string()))
    }

    /// Write a member's active flag
    pub async fn set_user_active(&self, user: &LibraryUser, active: bool) -> Result<()> {
        let cell = USERS.cell("is_active", user.row)?;
        self.store
            .update_cell(&self.spreadsheet_id, &cell, Value::from(bool_literal(active)))
            .await?;
        info!(user_id = %user.id, cell = %cell, active, "Updated user status");
        Ok(())
    }

    /// Lend a copy of `book` to `user`, due in [`LOAN_PERIOD_DAYS`]
    pub async fn create_loan(&self, book: &Book, user: &LibraryUser) -> Result<LoanWrite> {
        self.create_loan_on(book, user, Utc::now().date_naive()).await
    }

    /// Append the loan row, then write `available_copies - 1` to the book.
    ///
    /// Availability is checked against the caller's copy of `book` only; a concurrent
    /// borrower can oversell it.
    pub async fn create_loan_on(
        &self,
        book: &Book,
        user: &LibraryUser,
        today: NaiveDate,
    ) -> Result<LoanWrite> {
        if book.available_copies < 1 {
            return Err(LibraryError::Validation(format!(
                "\"{}\" has no available copies",
                book.title
            )));
        }
        let counter_cell = BOOKS.cell("available_copies", book.row)?;

        let mut loan = Loan {
            row: 0,
            id: new_id(),
            book_id: book.id.clone(),
            user_id: user.id.clone(),
            book_title: book.title.clone(),
            user_name: user.full_name(),
            loan_date: format_date(today),
            due_date: format_date(today + Duration::days(LOAN_PERIOD_DAYS)),
            return_date: String::new(),
            is_returned: false,
            overdue_days: 0,
            fine_amount: 0.0,
            created_at: timestamp(Utc::now()),
        };
        let rows = self.append_records(std::slice::from_ref(&loan)).await?;
        loan.row = rows.unwrap_or(0);
        info!(
            loan_id = %loan.id,
            book_id = %loan.book_id,
            user_id = %loan.user_id,
            due_date = %loan.due_date,
            "Recorded loan"
        );

        let counter = self
            .write_counter(counter_cell, book.available_copies - 1)
            .await;
        Ok(LoanWrite { loan, counter })
    }

    /// Mark `loan` returned today and give its copy back
    pub async fn return_loan(&self, loan: &Loan, books: &[Book]) -> Result<ReturnOutcome> {
        self.return_loan_on(loan, books, Utc::now().date_naive()).await
    }

    /// Write `is_returned` and `return_date`, then `available_copies + 1` for the book
    /// found by id in `books`, then re-read Loans and Books.
    ///
    /// A book missing from `books` is skipped with a warning. Once the loan cells are
    /// written the call is `Ok`, even if the re-read fails.
    pub async fn return_loan_on(
        &self,
        loan: &Loan,
        books: &[Book],
        today: NaiveDate,
    ) -> Result<ReturnOutcome> {
        if loan.is_returned {
            return Err(LibraryError::Validation(format!(
                "loan {} is already returned",
                loan.id
            )));
        }
        let returned_cell = LOANS.cell("is_returned", loan.row)?;
        let date_cell = LOANS.cell("return_date", loan.row)?;
        let return_date = format_date(today);

        let id = self.spreadsheet_id.as_str();
        tokio::try_join!(
            self.store
                .update_cell(id, &returned_cell, Value::from(bool_literal(true))),
            self.store
                .update_cell(id, &date_cell, Value::from(return_date.clone())),
        )?;
        info!(loan_id = %loan.id, return_date = %return_date, "Marked loan returned");

        let counter = match books.iter().find(|b| b.id == loan.book_id) {
            Some(book) => match BOOKS.cell("available_copies", book.row) {
                Ok(cell) => self.write_counter(cell, book.available_copies + 1).await,
                Err(error) => CounterUpdate::Failed {
                    cell: format!("{}!J{}", BOOKS.name, book.row),
                    error,
                },
            },
            None => {
                warn!(
                    book_id = %loan.book_id,
                    loan_id = %loan.id,
                    "Book not found for returned loan; available copies not updated"
                );
                CounterUpdate::Skipped {
                    book_id: loan.book_id.clone(),
                }
            }
        };

        let loan = Loan {
            is_returned: true,
            return_date,
            ..loan.clone()
        };
        let refreshed = match tokio::try_join!(self.loans(), self.books()) {
            Ok((loans, books)) => Ok(RefreshedLists { loans, books }),
            Err(err) => {
                warn!(loan_id = %loan.id, error = %err, "Could not re-read tabs after return");
                Err(err)
            }
        };
        Ok(ReturnOutcome {
            write: LoanWrite { loan, counter },
            refreshed,
        })
    }

    async fn write_counter(
        &self,
        cell: gundeshapur_sheets::CellAddress,
        value: i64,
    ) -> CounterUpdate {
        match self
            .store
            .update_cell(&self.spreadsheet_id, &cell, Value::from(value))
            .await
        {
            Ok(()) => {
                debug!(cell = %cell, value, "Updated available copies");
                CounterUpdate::Applied {
                    cell: cell.to_string(),
                    value,
                }
            }
            Err(err) => {
                warn!(
                    cell = %cell,
                    value,
                    error = %err.sanitized_message(),
                    "Available copies not updated"
                );
                CounterUpdate::Failed {
                    cell: cell.to_string(),
                    error: err.into(),
                }
            }
        }
    }

    /// Append records to their tab; the first row they landed on, when reported
    async fn append_records<T: SheetRow>(&self, records: &[T]) -> Result<Option<u32>> {
        let rows = records.iter().map(T::to_cells).collect();
        let outcome = self
            .store
            .append_rows(&self.spreadsheet_id, T::SCHEMA.name, rows)
            .await?;
        debug!(
            tab = T::SCHEMA.name,
            count = records.len(),
            range = ?outcome.updated_range,
            "Appended rows"
        );
        Ok(outcome.first_row())
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Number appended records consecutively from `first`
fn with_rows<T>(mut records: Vec<T>, first: Option<u32>, set: impl Fn(&mut T, u32)) -> Vec<T> {
    if let Some(first) = first {
        for (offset, record) in records.iter_mut().enumerate() {
            set(record, first + offset as u32);
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_rows() {
        let rows = with_rows(vec![0u32, 0, 0], Some(5), |r, row| *r = row);
        assert_eq!(rows, vec![5, 6, 7]);
        let rows = with_rows(vec![0u32], None, |r, row| *r = row);
        assert_eq!(rows, vec![0]);
    }

    #[test]
    fn test_counter_update_completion() {
        let applied = CounterUpdate::Applied {
            cell: "Books!J2".into(),
            value: 1,
        };
        assert!(applied.is_applied());
        assert!(!CounterUpdate::Skipped { book_id: "b".into() }.is_applied());
    }
}
