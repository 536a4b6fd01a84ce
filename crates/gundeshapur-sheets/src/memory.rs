//! In-memory spreadsheet store
//!
//! Behaves like the remote store where callers can observe it: values written are
//! interpreted as user-entered input ("TRUE" becomes a boolean, "12" a number) and read
//! back in their formatted string form, appends land after the last row, and unknown
//! handles or tabs fail the way the Sheets API does. Every call is recorded, and
//! failures can be injected per operation.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::a1::{column_letter, quote_tab, split_range, CellAddress};
use crate::api::ValueRange;
use crate::error::{SheetsError, SheetsResult};
use crate::store::{AppendOutcome, Grid, SpreadsheetStore};

/// Kind of store operation, used for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetValues,
    Append,
    UpdateCell,
    TabTitles,
    Create,
    BatchUpdate,
}

/// A call as it was issued against the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    GetValues {
        spreadsheet_id: String,
        range: String,
    },
    Append {
        spreadsheet_id: String,
        tab: String,
        rows: Vec<Vec<Value>>,
    },
    UpdateCell {
        spreadsheet_id: String,
        range: String,
        value: Value,
    },
    TabTitles {
        spreadsheet_id: String,
    },
    Create {
        title: String,
        tabs: Vec<String>,
    },
    BatchUpdate {
        spreadsheet_id: String,
        ranges: Vec<String>,
    },
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::GetValues { .. } => StoreOp::GetValues,
            StoreCall::Append { .. } => StoreOp::Append,
            StoreCall::UpdateCell { .. } => StoreOp::UpdateCell,
            StoreCall::TabTitles { .. } => StoreOp::TabTitles,
            StoreCall::Create { .. } => StoreOp::Create,
            StoreCall::BatchUpdate { .. } => StoreOp::BatchUpdate,
        }
    }
}

#[derive(Default)]
struct MemoryState {
    /// Tabs per spreadsheet, in creation order
    spreadsheets: HashMap<String, Vec<(String, Grid)>>,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, VecDeque<(u16, String)>>,
    created: u64,
}

impl MemoryState {
    fn spreadsheet_mut(&mut self, spreadsheet_id: &str) -> SheetsResult<&mut Vec<(String, Grid)>> {
        self.spreadsheets
            .get_mut(spreadsheet_id)
            .ok_or_else(not_found)
    }

    fn tab_mut(&mut self, spreadsheet_id: &str, tab: &str) -> SheetsResult<&mut Grid> {
        self.spreadsheet_mut(spreadsheet_id)?
            .iter_mut()
            .find(|(title, _)| title == tab)
            .map(|(_, grid)| grid)
            .ok_or_else(|| unparsable_range(tab))
    }

    fn injected_failure(&mut self, op: StoreOp) -> SheetsResult<()> {
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some((status, message)) => Err(SheetsError::Remote { status, message }),
            None => Ok(()),
        }
    }
}

/// Spreadsheet store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a spreadsheet with empty tabs
    pub fn with_spreadsheet(self, spreadsheet_id: &str, tabs: &[&str]) -> Self {
        self.state.lock().spreadsheets.insert(
            spreadsheet_id.to_string(),
            tabs.iter().map(|t| (t.to_string(), Grid::new())).collect(),
        );
        self
    }

    /// Replace (or add) a tab's contents; values are stored as given
    pub fn put_tab(&self, spreadsheet_id: &str, tab: &str, grid: Grid) {
        let mut state = self.state.lock();
        let tabs = state
            .spreadsheets
            .entry(spreadsheet_id.to_string())
            .or_default();
        match tabs.iter_mut().find(|(title, _)| title == tab) {
            Some((_, existing)) => *existing = grid,
            None => tabs.push((tab.to_string(), grid)),
        }
    }

    /// Stored (typed) contents of a tab
    pub fn tab(&self, spreadsheet_id: &str, tab: &str) -> Option<Grid> {
        let state = self.state.lock();
        state
            .spreadsheets
            .get(spreadsheet_id)?
            .iter()
            .find(|(title, _)| title == tab)
            .map(|(_, grid)| grid.clone())
    }

    /// Stored value of a single cell
    pub fn cell(&self, spreadsheet_id: &str, range: &str) -> Option<Value> {
        let address = CellAddress::parse(range).ok()?;
        let grid = self.tab(spreadsheet_id, &address.tab)?;
        grid.get(address.row_index().ok()?)?
            .get(address.column)
            .cloned()
    }

    /// Make the next call of `op` fail with the given status and upstream message
    pub fn fail_next(&self, op: StoreOp, status: u16, message: impl Into<String>) {
        self.state
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back((status, message.into()));
    }

    /// Every call issued so far, including failed ones
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    /// Calls of one kind
    pub fn calls_of(&self, op: StoreOp) -> Vec<StoreCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }
}

#[async_trait]
impl SpreadsheetStore for MemoryStore {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> SheetsResult<Grid> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::GetValues {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
        });
        state.injected_failure(StoreOp::GetValues)?;

        let (tab, _) = split_range(range);
        let grid = state.tab_mut(spreadsheet_id, &tab)?;
        Ok(render_grid(grid))
    }

    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        rows: Vec<Vec<Value>>,
    ) -> SheetsResult<AppendOutcome> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::Append {
            spreadsheet_id: spreadsheet_id.to_string(),
            tab: tab.to_string(),
            rows: rows.clone(),
        });
        state.injected_failure(StoreOp::Append)?;

        let grid = state.tab_mut(spreadsheet_id, tab)?;
        let last_used = grid
            .iter()
            .rposition(|row| row.iter().any(|v| !is_blank(v)))
            .map(|i| i + 1)
            .unwrap_or(0);
        grid.truncate(last_used);

        if rows.is_empty() {
            return Ok(AppendOutcome::default());
        }

        let first = grid.len() as u32 + 1;
        let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let count = rows.len() as u32;
        grid.extend(
            rows.into_iter()
                .map(|row| row.into_iter().map(user_entered).collect()),
        );

        Ok(AppendOutcome {
            updated_range: Some(format!(
                "{}!A{}:{}{}",
                quote_tab(tab),
                first,
                column_letter(width - 1),
                first + count - 1
            )),
        })
    }

    async fn update_cell(
        &self,
        spreadsheet_id: &str,
        cell: &CellAddress,
        value: Value,
    ) -> SheetsResult<()> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::UpdateCell {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: cell.to_string(),
            value: value.clone(),
        });
        state.injected_failure(StoreOp::UpdateCell)?;

        let row = cell.row_index()?;
        let grid = state.tab_mut(spreadsheet_id, &cell.tab)?;
        write_block(grid, row, cell.column, vec![vec![value]]);
        Ok(())
    }

    async fn tab_titles(&self, spreadsheet_id: &str) -> SheetsResult<Vec<String>> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::TabTitles {
            spreadsheet_id: spreadsheet_id.to_string(),
        });
        state.injected_failure(StoreOp::TabTitles)?;

        Ok(state
            .spreadsheet_mut(spreadsheet_id)?
            .iter()
            .map(|(title, _)| title.clone())
            .collect())
    }

    async fn create_spreadsheet(&self, title: &str, tabs: &[&str]) -> SheetsResult<String> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::Create {
            title: title.to_string(),
            tabs: tabs.iter().map(|t| t.to_string()).collect(),
        });
        state.injected_failure(StoreOp::Create)?;

        state.created += 1;
        let id = format!("memory-sheet-{}", state.created);
        state.spreadsheets.insert(
            id.clone(),
            tabs.iter().map(|t| (t.to_string(), Grid::new())).collect(),
        );
        Ok(id)
    }

    async fn batch_update(&self, spreadsheet_id: &str, data: Vec<ValueRange>) -> SheetsResult<()> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::BatchUpdate {
            spreadsheet_id: spreadsheet_id.to_string(),
            ranges: data.iter().filter_map(|d| d.range.clone()).collect(),
        });
        state.injected_failure(StoreOp::BatchUpdate)?;

        // Resolve every target first so a bad range writes nothing
        let mut targets = Vec::with_capacity(data.len());
        for block in &data {
            let range = block
                .range
                .as_deref()
                .ok_or_else(|| SheetsError::InvalidRange("missing range".to_string()))?;
            let (tab, origin) = match split_range(range) {
                (tab, None) => (tab, (0, 0)),
                (tab, Some(cells)) => {
                    let start = cells.split(':').next().unwrap_or(cells);
                    let address = CellAddress::parse(&format!("{}!{}", quote_tab(&tab), start))?;
                    let row = address.row_index()?;
                    (address.tab, (row, address.column))
                }
            };
            state.tab_mut(spreadsheet_id, &tab)?;
            targets.push((tab, origin));
        }

        for ((tab, (row, column)), block) in targets.into_iter().zip(data) {
            let grid = state.tab_mut(spreadsheet_id, &tab)?;
            write_block(grid, row, column, block.values);
        }
        Ok(())
    }
}

fn not_found() -> SheetsError {
    SheetsError::Remote {
        status: 404,
        message: "Requested entity was not found.".to_string(),
    }
}

fn unparsable_range(range: &str) -> SheetsError {
    SheetsError::Remote {
        status: 400,
        message: format!("Unable to parse range: {}", range),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Interpret a written value the way the store does for user-entered input
fn user_entered(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.eq_ignore_ascii_case("TRUE") {
                Value::Bool(true)
            } else if trimmed.eq_ignore_ascii_case("FALSE") {
                Value::Bool(false)
            } else if let Some(n) = trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && !trimmed.is_empty())
                .and_then(serde_json::Number::from_f64)
            {
                if let Ok(i) = trimmed.parse::<i64>() {
                    Value::from(i)
                } else {
                    Value::Number(n)
                }
            } else {
                Value::String(s)
            }
        }
        other => other,
    }
}

/// Formatted (string) form of a stored value
fn render(value: &Value) -> Value {
    let text = match value {
        Value::Null => String::new(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Value::String(text)
}

/// Rendered grid with trailing blank cells and rows dropped
fn render_grid(grid: &Grid) -> Grid {
    let mut rendered: Grid = grid
        .iter()
        .map(|row| {
            let len = row
                .iter()
                .rposition(|v| !is_blank(v))
                .map(|i| i + 1)
                .unwrap_or(0);
            row[..len].iter().map(render).collect()
        })
        .collect();
    while rendered.last().is_some_and(|row: &Vec<Value>| row.is_empty()) {
        rendered.pop();
    }
    rendered
}

fn write_block(grid: &mut Grid, row: usize, column: usize, values: Vec<Vec<Value>>) {
    for (r, cells) in values.into_iter().enumerate() {
        let target_row = row + r;
        if grid.len() <= target_row {
            grid.resize(target_row + 1, Vec::new());
        }
        let target = &mut grid[target_row];
        for (c, value) in cells.into_iter().enumerate() {
            let target_col = column + c;
            if target.len() <= target_col {
                target.resize(target_col + 1, Value::Null);
            }
            target[target_col] = user_entered(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_entered_interpretation() {
        assert_eq!(user_entered(json!("TRUE")), json!(true));
        assert_eq!(user_entered(json!("false")), json!(false));
        assert_eq!(user_entered(json!("12")), json!(12));
        assert_eq!(user_entered(json!("2.5")), json!(2.5));
        assert_eq!(user_entered(json!("978-0-13")), json!("978-0-13"));
        assert_eq!(user_entered(json!("")), json!(""));
        assert_eq!(user_entered(json!(3)), json!(3));
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&json!(true)), json!("TRUE"));
        assert_eq!(render(&json!(2.0)), json!("2"));
        assert_eq!(render(&json!(2.5)), json!("2.5"));
        assert_eq!(render(&Value::Null), json!(""));
    }

    #[tokio::test]
    async fn test_append_then_read_back_formatted() {
        let store = MemoryStore::new().with_spreadsheet("s1", &["Books"]);
        store.put_tab("s1", "Books", vec![vec![json!("id"), json!("available_copies")]]);

        let outcome = store
            .append_rows("s1", "Books", vec![vec![json!("b-1"), json!(3)]])
            .await
            .unwrap();
        assert_eq!(outcome.updated_range.as_deref(), Some("Books!A2:B2"));
        assert_eq!(outcome.first_row(), Some(2));

        let grid = store.get_values("s1", "Books").await.unwrap();
        assert_eq!(grid[1], vec![json!("b-1"), json!("3")]);
    }

    #[tokio::test]
    async fn test_update_cell_grows_grid() {
        let store = MemoryStore::new().with_spreadsheet("s1", &["Loans"]);
        let cell = CellAddress::parse("Loans!I3").unwrap();
        store.update_cell("s1", &cell, json!("TRUE")).await.unwrap();

        assert_eq!(store.cell("s1", "Loans!I3"), Some(json!(true)));
        let grid = store.get_values("s1", "Loans").await.unwrap();
        assert_eq!(grid.len(), 3);
        assert!(grid[0].is_empty());
    }

    #[tokio::test]
    async fn test_update_cell_rejects_row_zero() {
        let store = MemoryStore::new().with_spreadsheet("s1", &["Books"]);
        let cell = CellAddress::new("Books", 9, 0);

        let err = store.update_cell("s1", &cell, json!(1)).await.unwrap_err();
        assert!(matches!(err, SheetsError::InvalidRange(_)));
        assert_eq!(store.tab("s1", "Books"), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_unknown_handle_and_tab() {
        let store = MemoryStore::new().with_spreadsheet("s1", &["Books"]);

        let err = store.get_values("nope", "Books").await.unwrap_err();
        assert_eq!(err.upstream_message(), Some("Requested entity was not found."));

        let err = store.get_values("s1", "Loans").await.unwrap_err();
        assert_eq!(err.upstream_message(), Some("Unable to parse range: Loans"));
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let store = MemoryStore::new().with_spreadsheet("s1", &["Books"]);
        store.fail_next(StoreOp::TabTitles, 403, "The caller does not have permission");

        assert!(store.tab_titles("s1").await.is_err());
        assert_eq!(store.tab_titles("s1").await.unwrap(), vec!["Books"]);
        assert_eq!(store.calls_of(StoreOp::TabTitles).len(), 2);
    }

    #[tokio::test]
    async fn test_create_and_batch_update() {
        let store = MemoryStore::new();
        let id = store.create_spreadsheet("Lib", &["Books", "Users"]).await.unwrap();

        store
            .batch_update(
                &id,
                vec![
                    ValueRange::new("Books!A1", vec![vec![json!("id"), json!("title")]]),
                    ValueRange::new("Users!A1", vec![vec![json!("id")]]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(
            store.tab(&id, "Books").unwrap(),
            vec![vec![json!("id"), json!("title")]]
        );
        assert_eq!(store.tab_titles(&id).await.unwrap(), vec!["Books", "Users"]);
    }

    #[tokio::test]
    async fn test_batch_update_with_bad_tab_writes_nothing() {
        let store = MemoryStore::new().with_spreadsheet("s1", &["Books"]);
        let result = store
            .batch_update(
                "s1",
                vec![
                    ValueRange::new("Books!A1", vec![vec![json!("id")]]),
                    ValueRange::new("Loans!A1", vec![vec![json!("id")]]),
                ],
            )
            .await;
        assert!(result.is_err());
        assert_eq!(store.tab("s1", "Books").unwrap(), Grid::new());
    }
}
