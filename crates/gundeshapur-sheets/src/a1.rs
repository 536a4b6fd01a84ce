//! A1-style addressing: `Tab!ColumnRow`
//!
//! Columns are lettered from `A` (index 0); rows are 1-based with the header on row 1.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{SheetsError, SheetsResult};

/// Column letter for a 0-based column index (`0 -> A`, `25 -> Z`, `26 -> AA`)
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// 0-based column index for a column label; `None` if it is not all ASCII letters
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut n: usize = 0;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// Render a tab name for use in a range, quoting when required
pub fn quote_tab(tab: &str) -> String {
    if !tab.is_empty() && tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        tab.to_string()
    } else {
        format!("'{}'", tab.replace('\'', "''"))
    }
}

/// Split a range into its tab name and the optional cell part after `!`
pub fn split_range(range: &str) -> (String, Option<&str>) {
    let (tab, cells) = if let Some(rest) = range.strip_prefix('\'') {
        // Quoted tab: find the closing quote that is not a doubled ''
        let mut end = None;
        let bytes = rest.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                end = Some(i);
                break;
            }
            i += 1;
        }
        match end {
            Some(end) => {
                let tab = rest[..end].replace("''", "'");
                let cells = rest[end + 1..].strip_prefix('!');
                (tab, cells)
            }
            None => (rest.to_string(), None),
        }
    } else {
        match range.split_once('!') {
            Some((tab, cells)) => (tab.to_string(), Some(cells)),
            None => (range.to_string(), None),
        }
    };
    (tab, cells.filter(|c| !c.is_empty()))
}

fn cell_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| Regex::new(r"^([A-Za-z]{1,3})([1-9][0-9]*)$").expect("valid regex"))
}

fn parse_cell(cell: &str) -> Option<(usize, u32)> {
    let caps = cell_re().captures(cell)?;
    let column = column_index(&caps[1])?;
    let row = caps[2].parse().ok()?;
    Some((column, row))
}

/// First row number of a range such as `Loans!A5:L5`
pub fn first_row(range: &str) -> Option<u32> {
    let (_, cells) = split_range(range);
    let start = cells?.split(':').next()?;
    parse_cell(start).map(|(_, row)| row)
}

/// A single cell: tab name, 0-based column, 1-based row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub tab: String,
    pub column: usize,
    pub row: u32,
}

impl CellAddress {
    pub fn new(tab: impl Into<String>, column: usize, row: u32) -> Self {
        Self {
            tab: tab.into(),
            column,
            row,
        }
    }

    /// Parse `Tab!J5`
    pub fn parse(range: &str) -> SheetsResult<Self> {
        let (tab, cells) = split_range(range);
        let cell = cells.ok_or_else(|| SheetsError::InvalidRange(range.to_string()))?;
        let (column, row) =
            parse_cell(cell).ok_or_else(|| SheetsError::InvalidRange(range.to_string()))?;
        if tab.is_empty() {
            return Err(SheetsError::InvalidRange(range.to_string()));
        }
        Ok(Self { tab, column, row })
    }

    /// Column letter of this address
    pub fn column_letter(&self) -> String {
        column_letter(self.column)
    }

    /// 0-based grid row; row 0 does not exist
    pub fn row_index(&self) -> SheetsResult<usize> {
        (self.row as usize)
            .checked_sub(1)
            .ok_or_else(|| SheetsError::InvalidRange(self.to_string()))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}{}",
            quote_tab(&self.tab),
            column_letter(self.column),
            self.row
        )
    }
}
