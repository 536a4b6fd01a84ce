//! Sheet schema registry
//!
//! Static description of the three tabs: name, ordered headers, and a type tag per
//! column. Header order fixes the column letters used for single-cell writes
//! (Books `available_copies` is J, Users `is_active` is G, Loans `return_date` is H and
//! `is_returned` is I).

use gundeshapur_common::{LibraryError, Result};
use gundeshapur_sheets::CellAddress;

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    /// Whole number; non-numeric cells read as 0
    Integer,
    /// Decimal number; non-numeric cells read as 0
    Number,
    /// True only for the literal `TRUE`
    Boolean,
    /// Calendar date, kept in the store's formatted string form
    Date,
}

impl ColumnType {
    /// Type implied by the header naming convention ("copies", "amount", "days" are
    /// numeric, an `is_` prefix is boolean, anything else is passed through).
    pub fn from_header_convention(header: &str) -> Self {
        if header.contains("amount") {
            ColumnType::Number
        } else if header.contains("copies") || header.contains("days") {
            ColumnType::Integer
        } else if header.starts_with("is_") {
            ColumnType::Boolean
        } else {
            ColumnType::Text
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
}

const fn col(name: &'static str, kind: ColumnType) -> Column {
    Column { name, kind }
}

/// One tab of the spreadsheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl TabSchema {
    /// Header row, in order
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// 0-based position of a column
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Address of `column` on `row` of this tab
    pub fn cell(&self, column: &str, row: u32) -> Result<CellAddress> {
        let position = self.position(column).ok_or_else(|| {
            LibraryError::NotFound(format!("column {} in tab {}", column, self.name))
        })?;
        if row < 2 {
            return Err(LibraryError::Validation(format!(
                "row {} of {} is not a data row",
                row, self.name
            )));
        }
        Ok(CellAddress::new(self.name, position, row))
    }
}

use ColumnType::{Boolean, Date, Integer, Number, Text};

pub const BOOKS: TabSchema = TabSchema {
    name: "Books",
    columns: &[
        col("id", Text),
        col("title", Text),
        col("author", Text),
        col("isbn", Text),
        col("dewey_decimal", Text),
        col("publisher", Text),
        col("publication_year", Text),
        col("genre", Text),
        col("total_copies", Integer),
        col("available_copies", Integer),
        col("cover_url", Text),
        col("description", Text),
        col("created_at", Text),
    ],
};

pub const USERS: TabSchema = TabSchema {
    name: "Users",
    columns: &[
        col("id", Text),
        col("first_name", Text),
        col("last_name", Text),
        col("email", Text),
        col("phone", Text),
        col("registration_date", Date),
        col("is_active", Boolean),
    ],
};

pub const LOANS: TabSchema = TabSchema {
    name: "Loans",
    columns: &[
        col("id", Text),
        col("book_id", Text),
        col("user_id", Text),
        col("book_title", Text),
        col("user_name", Text),
        col("loan_date", Date),
        col("due_date", Date),
        col("return_date", Date),
        col("is_returned", Boolean),
        col("overdue_days", Integer),
        col("fine_amount", Number),
        col("created_at", Text),
    ],
};

/// Every tab a library spreadsheet must contain
pub const ALL_TABS: [TabSchema; 3] = [BOOKS, USERS, LOANS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_column_letters() {
        assert_eq!(BOOKS.cell("available_copies", 4).unwrap().to_string(), "Books!J4");
        assert_eq!(USERS.cell("is_active", 2).unwrap().to_string(), "Users!G2");
        assert_eq!(LOANS.cell("is_returned", 9).unwrap().to_string(), "Loans!I9");
        assert_eq!(LOANS.cell("return_date", 9).unwrap().to_string(), "Loans!H9");
    }

    #[test]
    fn test_cell_rejects_header_row_and_unknown_column() {
        assert!(matches!(
            BOOKS.cell("available_copies", 1),
            Err(LibraryError::Validation(_))
        ));
        assert!(matches!(
            BOOKS.cell("shelf", 3),
            Err(LibraryError::NotFound(_))
        ));
    }

    #[test]
    fn test_headers_in_order() {
        assert_eq!(
            USERS.headers(),
            vec!["id", "first_name", "last_name", "email", "phone", "registration_date", "is_active"]
        );
        assert_eq!(BOOKS.columns.len(), 13);
        assert_eq!(LOANS.columns.len(), 12);
    }

    #[test]
    fn test_type_tags_agree_with_naming_convention() {
        for tab in ALL_TABS {
            for column in tab.columns {
                let convention = ColumnType::from_header_convention(column.name);
                let agrees = column.kind == convention
                    || (column.kind == ColumnType::Date && convention == ColumnType::Text);
                assert!(agrees, "{}.{} is tagged {:?}", tab.name, column.name, column.kind);
            }
        }
    }
}
