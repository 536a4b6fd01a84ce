use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use gundeshapur_library::{
    create_library_spreadsheet, default_title, validate_spreadsheet, DashboardStats, Library, BOOKS,
    LOANS, USERS,
};
use gundeshapur_sheets::{MemoryStore, StoreCall, StoreOp};

#[tokio::test]
async fn test_validate_requires_all_three_tabs() {
    let store = MemoryStore::new()
        .with_spreadsheet("complete", &["Books", "Users", "Loans", "Notes"])
        .with_spreadsheet("partial", &["Books", "Users"])
        .with_spreadsheet("no-users", &["Books", "Loans"])
        .with_spreadsheet("lowercase", &["books", "users", "loans"]);

    assert!(validate_spreadsheet(&store, "complete").await);
    assert!(!validate_spreadsheet(&store, "partial").await);
    assert!(!validate_spreadsheet(&store, "no-users").await);
    assert!(!validate_spreadsheet(&store, "lowercase").await);
}

#[tokio::test]
async fn test_validate_swallows_store_errors() {
    let store = MemoryStore::new().with_spreadsheet("complete", &["Books", "Users", "Loans"]);

    assert!(!validate_spreadsheet(&store, "unknown").await);

    store.fail_next(StoreOp::TabTitles, 403, "The caller does not have permission");
    assert!(!validate_spreadsheet(&store, "complete").await);
    assert!(validate_spreadsheet(&store, "complete").await);
}

#[tokio::test]
async fn test_create_writes_headers_in_one_batch() {
    let store = MemoryStore::new();

    let id = create_library_spreadsheet(&store, &default_title("Ada Lovelace"))
        .await
        .unwrap();

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        StoreCall::Create {
            title: "Gundeshapur Library - Ada Lovelace".to_string(),
            tabs: vec!["Books".to_string(), "Users".to_string(), "Loans".to_string()],
        }
    );
    assert_eq!(
        calls[1],
        StoreCall::BatchUpdate {
            spreadsheet_id: id.clone(),
            ranges: vec![
                "Books!A1".to_string(),
                "Users!A1".to_string(),
                "Loans!A1".to_string()
            ],
        }
    );

    for tab in [BOOKS, USERS, LOANS] {
        let grid = store.tab(&id, tab.name).unwrap();
        let header: Vec<&str> = grid[0].iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(header, tab.headers());
    }
    assert!(validate_spreadsheet(&store, &id).await);
}

#[tokio::test]
async fn test_create_reports_header_failure() {
    let store = MemoryStore::new();
    store.fail_next(StoreOp::BatchUpdate, 429, "Quota exceeded");

    let err = create_library_spreadsheet(&store, "Library").await.unwrap_err();
    assert!(err.to_string().contains("Quota exceeded"));
}

#[test]
fn test_default_title() {
    assert_eq!(default_title("Ada"), "Gundeshapur Library - Ada");
    assert_eq!(default_title("  "), "Gundeshapur Library");
}

#[tokio::test]
async fn test_dashboard_over_fresh_spreadsheet() {
    let store = Arc::new(MemoryStore::new());
    let id = create_library_spreadsheet(store.as_ref(), "Library").await.unwrap();
    let library = Library::new(store.clone(), id.clone());

    let snapshot = library.snapshot().await.unwrap();
    let stats = DashboardStats::from_snapshot(&snapshot, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    assert_eq!(stats.total_books, 0);
    assert!(stats.recent_loans.is_empty());
    assert_eq!(store.calls_of(StoreOp::GetValues).len(), 3);

    let rendered = store.cell(&id, "Loans!I1");
    assert_eq!(rendered, Some(json!("is_returned")));
}
