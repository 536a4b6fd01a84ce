//! Case-insensitive substring filters over fetched records
//!
//! An empty or blank query matches everything.

use crate::records::{Book, LibraryUser, Loan};

fn matches_any(query: &str, fields: &[&str]) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&query))
}

/// Books whose title, author or isbn contain `query`
pub fn filter_books<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    books
        .iter()
        .filter(|b| matches_any(query, &[b.title.as_str(), b.author.as_str(), b.isbn.as_str()]))
        .collect()
}

pub fn filter_users<'a>(users: &'a [LibraryUser], query: &str) -> Vec<&'a LibraryUser> {
    users
        .iter()
        .filter(|u| matches_any(query, &[u.first_name.as_str(), u.last_name.as_str(), u.email.as_str()]))
        .collect()
}

/// Loans by the book title or borrower name captured on the loan
pub fn filter_loans<'a>(loans: &'a [Loan], query: &str) -> Vec<&'a Loan> {
    loans
        .iter()
        .filter(|l| matches_any(query, &[l.book_title.as_str(), l.user_name.as_str()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NewBook;

    fn books() -> Vec<Book> {
        vec![
            NewBook {
                isbn: "978-0441".into(),
                ..NewBook::new("Dune", "Frank Herbert", 2)
            }
            .into_book("b-1".into(), String::new()),
            NewBook::new("Emma", "Jane Austen", 1).into_book("b-2".into(), String::new()),
        ]
    }

    #[test]
    fn test_filter_books() {
        let books = books();
        let titles = |q: &str| -> Vec<String> {
            filter_books(&books, q).iter().map(|b| b.title.clone()).collect()
        };
        assert_eq!(titles("dune"), vec!["Dune"]);
        assert_eq!(titles("AUSTEN"), vec!["Emma"]);
        assert_eq!(titles("0441"), vec!["Dune"]);
        assert_eq!(titles("  "), vec!["Dune", "Emma"]);
        assert!(titles("tolkien").is_empty());
    }

    #[test]
    fn test_filter_users() {
        let users = vec![
            crate::records::NewUser {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                phone: String::new(),
            }
            .into_user("u-1".into(), "2025-01-01".into()),
        ];
        assert_eq!(filter_users(&users, "love").len(), 1);
        assert_eq!(filter_users(&users, "EXAMPLE.COM").len(), 1);
        assert!(filter_users(&users, "babbage").is_empty());
    }
}
