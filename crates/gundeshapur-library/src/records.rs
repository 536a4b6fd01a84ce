//! Typed records for the three tabs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dates::parse_date;
use crate::mapper::{map_rows, to_cell, FieldValue, SheetRecord};
use crate::schema::{TabSchema, BOOKS, LOANS, USERS};

/// A record stored as one row of a tab
pub trait SheetRow: Sized {
    const SCHEMA: TabSchema;

    /// Build from a mapped row; absent text is empty, absent numbers are 0
    fn from_record(record: &SheetRecord) -> Self;

    /// Field values in schema column order
    fn to_fields(&self) -> Vec<FieldValue>;

    /// Cells to append for this record
    fn to_cells(&self) -> Vec<Value> {
        self.to_fields().iter().map(to_cell).collect()
    }

    /// Parse every data row of a grid
    fn from_grid(grid: &[Vec<Value>]) -> Vec<Self> {
        map_rows(grid, Self::SCHEMA.columns)
            .iter()
            .map(Self::from_record)
            .collect()
    }
}

fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub row: u32,
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub dewey_decimal: String,
    pub publisher: String,
    pub publication_year: String,
    pub genre: String,
    pub total_copies: i64,
    pub available_copies: i64,
    pub cover_url: String,
    pub description: String,
    pub created_at: String,
}

impl SheetRow for Book {
    const SCHEMA: TabSchema = BOOKS;

    fn from_record(r: &SheetRecord) -> Self {
        Self {
            row: r.row,
            id: r.text("id"),
            title: r.text("title"),
            author: r.text("author"),
            isbn: r.text("isbn"),
            dewey_decimal: r.text("dewey_decimal"),
            publisher: r.text("publisher"),
            publication_year: r.text("publication_year"),
            genre: r.text("genre"),
            total_copies: r.integer("total_copies"),
            available_copies: r.integer("available_copies"),
            cover_url: r.text("cover_url"),
            description: r.text("description"),
            created_at: r.text("created_at"),
        }
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            text(&self.id),
            text(&self.title),
            text(&self.author),
            text(&self.isbn),
            text(&self.dewey_decimal),
            text(&self.publisher),
            text(&self.publication_year),
            text(&self.genre),
            FieldValue::Integer(self.total_copies),
            FieldValue::Integer(self.available_copies),
            text(&self.cover_url),
            text(&self.description),
            text(&self.created_at),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryUser {
    pub row: u32,
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub registration_date: String,
    pub is_active: bool,
}

impl LibraryUser {
    /// "First Last", skipping blank parts
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl SheetRow for LibraryUser {
    const SCHEMA: TabSchema = USERS;

    fn from_record(r: &SheetRecord) -> Self {
        Self {
            row: r.row,
            id: r.text("id"),
            first_name: r.text("first_name"),
            last_name: r.text("last_name"),
            email: r.text("email"),
            phone: r.text("phone"),
            registration_date: r.text("registration_date"),
            is_active: r.boolean("is_active"),
        }
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            text(&self.id),
            text(&self.first_name),
            text(&self.last_name),
            text(&self.email),
            text(&self.phone),
            text(&self.registration_date),
            FieldValue::Boolean(self.is_active),
        ]
    }
}

/// Display status of a loan; derived, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoanStatus {
    OnLoan,
    Overdue,
    Returned,
}

impl LoanStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::OnLoan => "On Loan",
            LoanStatus::Overdue => "Overdue",
            LoanStatus::Returned => "Returned",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub row: u32,
    pub id: String,
    pub book_id: String,
    pub user_id: String,
    /// Captured at loan time; not kept in sync with later renames
    pub book_title: String,
    pub user_name: String,
    pub loan_date: String,
    pub due_date: String,
    /// Empty until returned
    pub return_date: String,
    pub is_returned: bool,
    pub overdue_days: i64,
    pub fine_amount: f64,
    pub created_at: String,
}

impl Loan {
    /// Returned wins; otherwise overdue from the due date on
    pub fn status(&self, today: NaiveDate) -> LoanStatus {
        if self.is_returned {
            return LoanStatus::Returned;
        }
        match parse_date(&self.due_date) {
            Some(due) if due <= today => LoanStatus::Overdue,
            _ => LoanStatus::OnLoan,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status(today) == LoanStatus::Overdue
    }
}

impl SheetRow for Loan {
    const SCHEMA: TabSchema = LOANS;

    fn from_record(r: &SheetRecord) -> Self {
        Self {
            row: r.row,
            id: r.text("id"),
            book_id: r.text("book_id"),
            user_id: r.text("user_id"),
            book_title: r.text("book_title"),
            user_name: r.text("user_name"),
            loan_date: r.text("loan_date"),
            due_date: r.text("due_date"),
            return_date: r.text("return_date"),
            is_returned: r.boolean("is_returned"),
            overdue_days: r.integer("overdue_days"),
            fine_amount: r.number("fine_amount"),
            created_at: r.text("created_at"),
        }
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            text(&self.id),
            text(&self.book_id),
            text(&self.user_id),
            text(&self.book_title),
            text(&self.user_name),
            text(&self.loan_date),
            text(&self.due_date),
            text(&self.return_date),
            FieldValue::Boolean(self.is_returned),
            FieldValue::Integer(self.overdue_days),
            FieldValue::Number(self.fine_amount),
            text(&self.created_at),
        ]
    }
}

/// Input for a new catalogue entry.
///
/// Deserializes from the JSON the import command reads; only `title` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub dewey_decimal: String,
    pub publisher: String,
    pub publication_year: String,
    pub genre: String,
    pub total_copies: i64,
    /// Defaults to `total_copies`
    pub available_copies: Option<i64>,
    pub cover_url: String,
    pub description: String,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>, total_copies: i64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            total_copies,
            ..Self::default()
        }
    }

    /// Book row with a fresh id; the row number is assigned by the append
    pub fn into_book(self, id: String, created_at: String) -> Book {
        Book {
            row: 0,
            id,
            available_copies: self.available_copies.unwrap_or(self.total_copies),
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            dewey_decimal: self.dewey_decimal,
            publisher: self.publisher,
            publication_year: self.publication_year,
            genre: self.genre,
            total_copies: self.total_copies,
            cover_url: self.cover_url,
            description: self.description,
            created_at,
        }
    }
}

/// Input for registering a member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl NewUser {
    pub fn into_user(self, id: String, registration_date: String) -> LibraryUser {
        LibraryUser {
            row: 0,
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            registration_date,
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_book_defaults_available_to_total() {
        let book: NewBook = serde_json::from_value(json!({"title": "Emma", "total_copies": 3})).unwrap();
        let book = book.into_book("b-9".into(), "2025-01-01T00:00:00.000Z".into());
        assert_eq!(book.available_copies, 3);
        assert_eq!(book.author, "");

        let partial = NewBook {
            available_copies: Some(1),
            ..NewBook::new("Emma", "Jane Austen", 3)
        };
        assert_eq!(partial.into_book("b-10".into(), String::new()).available_copies, 1);
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(due: &str, returned: bool) -> Loan {
        Loan {
            row: 2,
            id: "l-1".into(),
            book_id: "b-1".into(),
            user_id: "u-1".into(),
            book_title: "Dune".into(),
            user_name: "Ada Lovelace".into(),
            loan_date: "2025-01-01".into(),
            due_date: due.into(),
            return_date: String::new(),
            is_returned: returned,
            overdue_days: 0,
            fine_amount: 0.0,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_book_from_grid() {
        let grid = vec![
            BOOKS.headers().into_iter().map(|h| json!(h)).collect::<Vec<_>>(),
            vec![
                json!("b-1"), json!("Dune"), json!("Frank Herbert"), json!("978-0441"),
                json!("813.54"), json!("Ace"), json!("1965"), json!("SF"),
                json!("4"), json!("3"), json!(""), json!("Spice"), json!("2025-01-01T00:00:00.000Z"),
            ],
        ];
        let books = Book::from_grid(&grid);
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].row, 2);
        assert_eq!(books[0].author, "Frank Herbert");
        assert_eq!(books[0].total_copies, 4);
        assert_eq!(books[0].available_copies, 3);
    }

    #[test]
    fn test_cells_follow_schema_order() {
        let user = LibraryUser {
            row: 3,
            id: "u-1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "".into(),
            registration_date: "2025-01-02".into(),
            is_active: true,
        };
        assert_eq!(
            user.to_cells(),
            vec![
                json!("u-1"), json!("Ada"), json!("Lovelace"), json!("ada@example.com"),
                json!(""), json!("2025-01-02"), json!("TRUE"),
            ]
        );
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_loan_status() {
        let today = day(2025, 2, 1);
        assert_eq!(loan("2025-01-15", false).status(today), LoanStatus::Overdue);
        assert_eq!(loan("2025-02-01", false).status(today), LoanStatus::Overdue);
        assert_eq!(loan("2025-02-02", false).status(today), LoanStatus::OnLoan);
        assert_eq!(loan("2025-01-15", true).status(today), LoanStatus::Returned);
        assert_eq!(loan("", false).status(today), LoanStatus::OnLoan);
        assert_eq!(loan("1/15/2025", false).status(today), LoanStatus::Overdue);
    }
}
