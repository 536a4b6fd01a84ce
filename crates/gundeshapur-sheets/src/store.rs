//! The remote store seam

use async_trait::async_trait;
use serde_json::Value;

use crate::a1::{self, CellAddress};
use crate::api::ValueRange;
use crate::error::SheetsResult;

/// Raw cell grid: rows of cells, header first
pub type Grid = Vec<Vec<Value>>;

/// What an append call reports back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Range the rows landed in, e.g. `Loans!A5:L5`
    pub updated_range: Option<String>,
}

impl AppendOutcome {
    /// Row number of the first appended row, when the store reported it
    pub fn first_row(&self) -> Option<u32> {
        self.updated_range.as_deref().and_then(a1::first_row)
    }
}

/// Operations against a remote spreadsheet identified by an opaque handle.
///
/// Writes use the store's "user-entered" interpretation. There is no locking: appends
/// are atomic per call, cell updates are last-write-wins.
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    /// Fetch the raw grid of a range (a bare tab name fetches the whole tab)
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> SheetsResult<Grid>;

    /// Append rows after the last row of a tab
    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        rows: Vec<Vec<Value>>,
    ) -> SheetsResult<AppendOutcome>;

    /// Write one value to one cell
    async fn update_cell(
        &self,
        spreadsheet_id: &str,
        cell: &CellAddress,
        value: Value,
    ) -> SheetsResult<()>;

    /// Titles of every tab in the spreadsheet
    async fn tab_titles(&self, spreadsheet_id: &str) -> SheetsResult<Vec<String>>;

    /// Create a spreadsheet with pre-titled tabs and return its handle
    async fn create_spreadsheet(&self, title: &str, tabs: &[&str]) -> SheetsResult<String>;

    /// Write several ranges in one call
    async fn batch_update(&self, spreadsheet_id: &str, data: Vec<ValueRange>) -> SheetsResult<()>;
}
