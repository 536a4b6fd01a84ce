//! Wire types for the Sheets v4 REST API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How written values are interpreted by the store
pub const USER_ENTERED: &str = "USER_ENTERED";

/// A block of cell values addressed by an A1 range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,

    /// Omitted by the API when the range is empty
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    pub fn new(range: impl Into<String>, values: Vec<Vec<Value>>) -> Self {
        Self {
            range: Some(range.into()),
            major_dimension: None,
            values,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub updated_range: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    #[serde(default)]
    pub updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest {
    pub value_input_option: String,
    pub data: Vec<ValueRange>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<i64>,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    #[serde(default)]
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpreadsheetProperties {
    #[serde(default)]
    pub title: String,
}

/// Spreadsheet resource, used both to create a spreadsheet and to read its tabs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SpreadsheetProperties>,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Spreadsheet {
    /// Request body for a new spreadsheet with pre-titled tabs
    pub fn with_tabs(title: &str, tabs: &[&str]) -> Self {
        Self {
            spreadsheet_id: None,
            properties: Some(SpreadsheetProperties {
                title: title.to_string(),
            }),
            sheets: tabs
                .iter()
                .map(|tab| Sheet {
                    properties: SheetProperties {
                        sheet_id: None,
                        title: tab.to_string(),
                    },
                })
                .collect(),
        }
    }

    /// Titles of every tab, in order
    pub fn tab_titles(&self) -> Vec<String> {
        self.sheets
            .iter()
            .map(|s| s.properties.title.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_range_without_values() {
        let vr: ValueRange =
            serde_json::from_value(json!({"range": "Books!A1:Z1000", "majorDimension": "ROWS"}))
                .unwrap();
        assert!(vr.values.is_empty());
        assert_eq!(vr.major_dimension.as_deref(), Some("ROWS"));
    }

    #[test]
    fn test_create_body_shape() {
        let body = serde_json::to_value(Spreadsheet::with_tabs("Lib", &["Books", "Users"])).unwrap();
        assert_eq!(
            body,
            json!({
                "properties": {"title": "Lib"},
                "sheets": [
                    {"properties": {"title": "Books"}},
                    {"properties": {"title": "Users"}}
                ]
            })
        );
    }

    #[test]
    fn test_batch_update_body_shape() {
        let body = serde_json::to_value(BatchUpdateValuesRequest {
            value_input_option: USER_ENTERED.to_string(),
            data: vec![ValueRange::new("Books!A1", vec![vec![json!("id")]])],
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "valueInputOption": "USER_ENTERED",
                "data": [{"range": "Books!A1", "values": [["id"]]}]
            })
        );
    }

    #[test]
    fn test_tab_titles() {
        let sheet: Spreadsheet = serde_json::from_value(json!({
            "spreadsheetId": "1AbC",
            "sheets": [
                {"properties": {"sheetId": 0, "title": "Books", "index": 0}},
                {"properties": {"sheetId": 7, "title": "Loans", "index": 1}}
            ]
        }))
        .unwrap();
        assert_eq!(sheet.tab_titles(), vec!["Books", "Loans"]);
    }
}
