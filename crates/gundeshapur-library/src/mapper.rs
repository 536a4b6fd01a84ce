//! Row mapper: raw cell grid <-> typed field values
//!
//! Row 0 of a grid is the sheet's actual header row. Each expected column is located in
//! it by case-insensitive exact match, so the sheet's column order does not matter. A
//! column the sheet lacks is [`FieldValue::Absent`] in every record.

use serde_json::Value;

use crate::schema::{Column, ColumnType};

/// One typed cell
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Column missing from the sheet, or a blank pass-through cell
    Absent,
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Text form; absent is the empty string
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Absent => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Boolean(b) => bool_literal(*b).to_string(),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            FieldValue::Integer(i) => *i,
            FieldValue::Number(n) => *n as i64,
            _ => 0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Integer(i) => *i as f64,
            FieldValue::Number(n) => *n,
            _ => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, FieldValue::Boolean(true))
    }
}

static ABSENT: FieldValue = FieldValue::Absent;

/// A parsed data row
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRecord {
    /// 1-based row in the tab; the header is row 1, so data starts at 2
    pub row: u32,
    fields: Vec<(&'static str, FieldValue)>,
}

impl SheetRecord {
    /// Field by column name; unknown names are absent
    pub fn get(&self, name: &str) -> &FieldValue {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .unwrap_or(&ABSENT)
    }

    pub fn text(&self, name: &str) -> String {
        self.get(name).as_text()
    }

    pub fn integer(&self, name: &str) -> i64 {
        self.get(name).as_i64()
    }

    pub fn number(&self, name: &str) -> f64 {
        self.get(name).as_f64()
    }

    pub fn boolean(&self, name: &str) -> bool {
        self.get(name).as_bool()
    }

    /// Fields in schema order
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }
}

/// Map a grid to records for the given expected columns.
///
/// Grids with fewer than two rows (no header or no data) yield nothing.
pub fn map_rows(grid: &[Vec<Value>], columns: &[Column]) -> Vec<SheetRecord> {
    if grid.len() < 2 {
        return Vec::new();
    }

    let header: Vec<String> = grid[0].iter().map(|v| cell_text(v).to_lowercase()).collect();
    let positions: Vec<Option<usize>> = columns
        .iter()
        .map(|c| {
            let wanted = c.name.to_lowercase();
            header.iter().position(|h| *h == wanted)
        })
        .collect();

    grid[1..]
        .iter()
        .enumerate()
        .map(|(index, row)| SheetRecord {
            row: index as u32 + 2,
            fields: columns
                .iter()
                .zip(&positions)
                .map(|(column, position)| {
                    let value = match position {
                        Some(p) => coerce(row.get(*p), column.kind),
                        None => FieldValue::Absent,
                    };
                    (column.name, value)
                })
                .collect(),
        })
        .collect()
}

/// Coerce one cell according to its column type.
///
/// Integer columns drop any fractional part, so a copies cell holding `2.5` reads as 2.
pub fn coerce(cell: Option<&Value>, kind: ColumnType) -> FieldValue {
    match kind {
        ColumnType::Integer => FieldValue::Integer(numeric(cell).trunc() as i64),
        ColumnType::Number => FieldValue::Number(numeric(cell)),
        ColumnType::Boolean => FieldValue::Boolean(match cell {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "TRUE",
            _ => false,
        }),
        ColumnType::Text | ColumnType::Date => match cell {
            None | Some(Value::Null) => FieldValue::Absent,
            Some(v) => FieldValue::Text(cell_text(v)),
        },
    }
}

/// Cell value to write for a field (inverse of [`coerce`])
pub fn to_cell(value: &FieldValue) -> Value {
    match value {
        FieldValue::Absent => Value::String(String::new()),
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Integer(i) => Value::from(*i),
        FieldValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(0)),
        FieldValue::Boolean(b) => Value::String(bool_literal(*b).to_string()),
    }
}

/// The literal the store uses for booleans
pub fn bool_literal(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Number in a cell; empty, non-numeric and non-finite values are 0
fn numeric(cell: Option<&Value>) -> f64 {
    let n = match cell {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => bool_literal(*b).to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BOOKS, LOANS, USERS};
    use serde_json::json;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<Value>> {
        rows.iter()
            .map(|r| r.iter().map(|c| json!(c)).collect())
            .collect()
    }

    #[test]
    fn test_record_count_and_row_numbers() {
        let g = grid(&[
            &["id", "title"],
            &["b-1", "Dune"],
            &["b-2", "Emma"],
            &["b-3", "Ulysses"],
        ]);
        let records = map_rows(&g, BOOKS.columns);
        assert_eq!(records.len(), 3);
        let rows: Vec<u32> = records.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
        assert_eq!(records[2].text("title"), "Ulysses");
    }

    #[test]
    fn test_headers_match_regardless_of_case_and_order() {
        let g = grid(&[&["Title", "ID"], &["Dune", "b-1"]]);
        let records = map_rows(&g, BOOKS.columns);
        assert_eq!(records[0].get("id"), &FieldValue::Text("b-1".to_string()));
        assert_eq!(records[0].get("title"), &FieldValue::Text("Dune".to_string()));
    }

    #[test]
    fn test_missing_header_is_absent_everywhere() {
        let g = grid(&[&["id"], &["b-1"], &["b-2"]]);
        let records = map_rows(&g, BOOKS.columns);
        for record in &records {
            assert!(record.get("author").is_absent());
            assert!(record.get("available_copies").is_absent());
        }
    }

    #[test]
    fn test_boolean_only_for_literal_true() {
        let g = grid(&[
            &["id", "is_active"],
            &["u-1", "TRUE"],
            &["u-2", "FALSE"],
            &["u-3", "yes"],
            &["u-4", "true"],
        ]);
        let active: Vec<bool> = map_rows(&g, USERS.columns)
            .iter()
            .map(|r| r.boolean("is_active"))
            .collect();
        assert_eq!(active, vec![true, false, false, false]);

        assert_eq!(coerce(Some(&json!(true)), ColumnType::Boolean), FieldValue::Boolean(true));
        assert_eq!(coerce(None, ColumnType::Boolean), FieldValue::Boolean(false));
    }

    #[test]
    fn test_non_numeric_copies_are_zero() {
        let g = grid(&[
            &["id", "total_copies", "available_copies"],
            &["b-1", "many", ""],
            &["b-2", "4", "3"],
        ]);
        let records = map_rows(&g, BOOKS.columns);
        assert_eq!(records[0].get("total_copies"), &FieldValue::Integer(0));
        assert_eq!(records[0].get("available_copies"), &FieldValue::Integer(0));
        assert_eq!(records[1].integer("available_copies"), 3);
    }

    #[test]
    fn test_fractional_copies_truncate() {
        let g = grid(&[&["id", "available_copies"], &["b-1", "2.5"], &["b-2", "-1.5"]]);
        let records = map_rows(&g, BOOKS.columns);
        assert_eq!(records[0].get("available_copies"), &FieldValue::Integer(2));
        assert_eq!(records[1].get("available_copies"), &FieldValue::Integer(-1));
    }

    #[test]
    fn test_amount_is_decimal() {
        let g = grid(&[&["id", "fine_amount", "overdue_days"], &["l-1", "2.5", "3"]]);
        let records = map_rows(&g, LOANS.columns);
        assert_eq!(records[0].number("fine_amount"), 2.5);
        assert_eq!(records[0].integer("overdue_days"), 3);
    }

    #[test]
    fn test_short_rows_and_missing_cells() {
        let g = grid(&[&["id", "title", "author"], &["b-1"]]);
        let records = map_rows(&g, BOOKS.columns);
        assert_eq!(records[0].text("id"), "b-1");
        assert!(records[0].get("title").is_absent());
    }

    #[test]
    fn test_grids_without_data_rows_are_empty() {
        assert!(map_rows(&[], BOOKS.columns).is_empty());
        assert!(map_rows(&grid(&[&["id", "title"]]), BOOKS.columns).is_empty());
    }

    #[test]
    fn test_to_cell() {
        assert_eq!(to_cell(&FieldValue::Boolean(true)), json!("TRUE"));
        assert_eq!(to_cell(&FieldValue::Integer(2)), json!(2));
        assert_eq!(to_cell(&FieldValue::Absent), json!(""));
        assert_eq!(to_cell(&FieldValue::Number(f64::NAN)), json!(0));
    }
}
