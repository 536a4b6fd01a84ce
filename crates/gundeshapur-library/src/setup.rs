//! Connecting and creating library spreadsheets

use serde_json::Value;
use tracing::{info, warn};

use gundeshapur_common::Result;
use gundeshapur_sheets::{SpreadsheetStore, ValueRange};

use crate::schema::ALL_TABS;

/// Title for a spreadsheet created on behalf of `owner`
pub fn default_title(owner: &str) -> String {
    let owner = owner.trim();
    if owner.is_empty() {
        "Gundeshapur Library".to_string()
    } else {
        format!("Gundeshapur Library - {}", owner)
    }
}

/// Whether `spreadsheet_id` names a spreadsheet holding every library tab.
///
/// Never fails: an unreachable or unknown spreadsheet is simply not valid. Tab names
/// must match exactly.
pub async fn validate_spreadsheet(store: &dyn SpreadsheetStore, spreadsheet_id: &str) -> bool {
    let titles = match store.tab_titles(spreadsheet_id).await {
        Ok(titles) => titles,
        Err(err) => {
            warn!(
                spreadsheet_id,
                error = %err.sanitized_message(),
                "Spreadsheet validation failed"
            );
            return false;
        }
    };

    let missing: Vec<&str> = ALL_TABS
        .iter()
        .map(|tab| tab.name)
        .filter(|name| !titles.iter().any(|t| t == name))
        .collect();
    if !missing.is_empty() {
        warn!(spreadsheet_id, ?missing, "Spreadsheet is missing library tabs");
        return false;
    }
    true
}

/// Create a spreadsheet with the three tabs and write their header rows in one batch.
///
/// If the header write fails the spreadsheet still exists; its handle is only logged.
pub async fn create_library_spreadsheet(store: &dyn SpreadsheetStore, title: &str) -> Result<String> {
    let tabs: Vec<&str> = ALL_TABS.iter().map(|tab| tab.name).collect();
    let spreadsheet_id = store.create_spreadsheet(title, &tabs).await?;

    let headers = ALL_TABS
        .iter()
        .map(|tab| {
            ValueRange::new(
                format!("{}!A1", tab.name),
                vec![tab.headers().into_iter().map(Value::from).collect()],
            )
        })
        .collect();
    if let Err(err) = store.batch_update(&spreadsheet_id, headers).await {
        warn!(
            spreadsheet_id = %spreadsheet_id,
            error = %err.sanitized_message(),
            "Created spreadsheet but could not write headers"
        );
        return Err(err.into());
    }

    info!(spreadsheet_id = %spreadsheet_id, title, "Created library spreadsheet");
    Ok(spreadsheet_id)
}
