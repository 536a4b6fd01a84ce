//! Dashboard statistics

use chrono::NaiveDate;
use serde::Serialize;

use crate::library::LibrarySnapshot;
use crate::records::Loan;

const RECENT_LOANS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_books: usize,
    /// Sum of `available_copies` over every book
    pub available_copies: i64,
    pub active_users: usize,
    /// Loans not yet returned
    pub active_loans: usize,
    pub overdue_loans: usize,
    /// Last loans in sheet order, newest first
    pub recent_loans: Vec<Loan>,
}

impl DashboardStats {
    pub fn from_snapshot(snapshot: &LibrarySnapshot, today: NaiveDate) -> Self {
        let loans = &snapshot.loans;
        Self {
            total_books: snapshot.books.len(),
            available_copies: snapshot.books.iter().map(|b| b.available_copies).sum(),
            active_users: snapshot.users.iter().filter(|u| u.is_active).count(),
            active_loans: loans.iter().filter(|l| !l.is_returned).count(),
            overdue_loans: loans.iter().filter(|l| l.is_overdue(today)).count(),
            recent_loans: loans.iter().rev().take(RECENT_LOANS).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Book, LibraryUser};

    fn book(available: i64) -> Book {
        Book {
            row: 2,
            id: format!("b-{}", available),
            title: "Dune".into(),
            author: String::new(),
            isbn: String::new(),
            dewey_decimal: String::new(),
            publisher: String::new(),
            publication_year: String::new(),
            genre: String::new(),
            total_copies: 5,
            available_copies: available,
            cover_url: String::new(),
            description: String::new(),
            created_at: String::new(),
        }
    }

    fn user(active: bool) -> LibraryUser {
        LibraryUser {
            row: 2,
            id: "u".into(),
            first_name: "Ada".into(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            registration_date: String::new(),
            is_active: active,
        }
    }

    fn loan(n: u32, due: &str, returned: bool) -> Loan {
        Loan {
            row: n + 1,
            id: format!("l-{}", n),
            book_id: "b-1".into(),
            user_id: "u".into(),
            book_title: "Dune".into(),
            user_name: "Ada".into(),
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
    fn test_dashboard_counts() {
        let snapshot = LibrarySnapshot {
            books: vec![book(2), book(0), book(3)],
            users: vec![user(true), user(false), user(true)],
            loans: vec![
                loan(1, "2025-01-10", false),
                loan(2, "2025-01-10", true),
                loan(3, "2025-03-01", false),
                loan(4, "", false),
            ],
        };
        let stats = DashboardStats::from_snapshot(&snapshot, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.available_copies, 5);
        assert_eq!(stats.active_users, 2);
        assert_eq!(stats.active_loans, 3);
        assert_eq!(stats.overdue_loans, 1);
    }

    #[test]
    fn test_recent_loans_newest_first() {
        let snapshot = LibrarySnapshot {
            loans: (1..=7).map(|n| loan(n, "2025-01-10", false)).collect(),
            ..LibrarySnapshot::default()
        };
        let stats = DashboardStats::from_snapshot(&snapshot, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let ids: Vec<&str> = stats.recent_loans.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l-7", "l-6", "l-5", "l-4", "l-3"]);
        assert_eq!(stats.overdue_loans, 0);
    }
}
