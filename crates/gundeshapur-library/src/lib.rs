//! Sheet-backed library records and loan workflows
//!
//! A library lives in one spreadsheet with three tabs (Books, Users, Loans). This crate
//! maps their rows to typed records and runs the lending workflows against any
//! [`gundeshapur_sheets::SpreadsheetStore`].

pub mod dates;
pub mod library;
pub mod mapper;
pub mod records;
pub mod report;
pub mod schema;
pub mod search;
pub mod setup;

pub use library::{
    CounterUpdate, Library, LibrarySnapshot, LoanWrite, RefreshedLists, ReturnOutcome,
    LOAN_PERIOD_DAYS,
};
pub use mapper::{map_rows, FieldValue, SheetRecord};
pub use records::{Book, LibraryUser, Loan, LoanStatus, NewBook, NewUser, SheetRow};
pub use report::DashboardStats;
pub use schema::{Column, ColumnType, TabSchema, ALL_TABS, BOOKS, LOANS, USERS};
pub use setup::{create_library_spreadsheet, default_title, validate_spreadsheet};
