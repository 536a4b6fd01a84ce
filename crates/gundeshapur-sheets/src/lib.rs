//! gundeshapur-sheets: remote spreadsheet access
//!
//! # Architecture
//!
//! - `SpreadsheetStore`: the seam every higher layer talks to (fetch tab, append rows,
//!   update a cell, list tabs, create a spreadsheet, batch-write ranges)
//! - `SheetsClient`: reqwest-backed implementation against the Google Sheets v4 REST API,
//!   plus the OAuth userinfo lookup
//! - `MemoryStore`: in-process implementation with the same addressing and
//!   "user-entered" value interpretation, used by tests
//! - `a1`: tab + column letter + row addressing

pub mod a1;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod response;
pub mod store;

pub use a1::{column_index, column_letter, CellAddress};
pub use api::ValueRange;
pub use client::SheetsClient;
pub use config::SheetsClientConfig;
pub use error::{SheetsError, SheetsErrorCategory, SheetsResult};
pub use memory::{MemoryStore, StoreCall, StoreOp};
pub use response::HttpResponse;
pub use store::{AppendOutcome, Grid, SpreadsheetStore};
