use std::sync::{Arc, Mutex};

use crate::{
    book::{Book, BookId},
    caller::Caller,
    error::LedgerError,
    events::LedgerEvent,
    ledger::Ledger,
    observers::LedgerObserver,
};

/// Observer that keeps every event it sees
#[derive(Debug, Clone, Default)]
struct RecordingObserver {
    /// Events in commit order
    events: Arc<Mutex<Vec<LedgerEvent>>>,
}

impl RecordingObserver {
    /// Events seen so far
    #[allow(clippy::unwrap_used)]
    fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LedgerObserver for RecordingObserver {
    #[allow(clippy::unwrap_used)]
    fn on_commit(&self, event: &LedgerEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// First test account
fn alice() -> Caller {
    Caller::new("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
}

/// Second test account
fn bob() -> Caller {
    Caller::new("0x70997970c51812dc3a010c7d01b50e0d17dc79c8")
}

/// Helper function to set up a ledger holding one book with `count` copies
#[allow(clippy::unwrap_used)]
fn setup_ledger(count: u64) -> Ledger {
    let mut ledger = Ledger::new();
    ledger.add_book(&alice(), "Book1", count).unwrap();
    ledger
}

#[test]
fn test_new_ledger_is_empty() {
    let ledger = Ledger::new();
    assert_eq!(ledger.book_count(), 0);
    assert!(ledger.view_book_list().is_empty());
    assert!(ledger.view_past_borrowings().is_empty());
    assert!(ledger.outstanding_borrows().is_empty());
}

#[test]
fn test_add_book_rejects_empty_name() {
    let mut ledger = Ledger::new();

    let result = ledger.add_book(&alice(), "", 100);
    assert_eq!(result, Err(LedgerError::NameCannotBeEmpty));
    assert_eq!(ledger.book_count(), 0);
}

#[test]
fn test_add_book_rejects_zero_count() {
    let mut ledger = Ledger::new();

    let result = ledger.add_book(&alice(), "Book1", 0);
    assert_eq!(result, Err(LedgerError::CountCannotBeZero));
    assert_eq!(ledger.book_count(), 0);
}

#[test]
fn test_empty_name_is_reported_before_zero_count() {
    let mut ledger = Ledger::new();
    assert_eq!(ledger.add_book(&alice(), "", 0), Err(LedgerError::NameCannotBeEmpty));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_add_book_assigns_dense_ids() {
    let mut ledger = Ledger::new();

    assert_eq!(ledger.add_book(&alice(), "Book1", 100).unwrap(), BookId(0));
    assert_eq!(ledger.add_book(&bob(), "Book2", 5).unwrap(), BookId(1));
    assert_eq!(ledger.book_count(), 2);

    let book = ledger.get_book_by_id(BookId(0)).unwrap();
    assert_eq!(book, Book { id: BookId(0), name: "Book1".to_string(), count: 100 });
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_borrow_book() {
    let mut ledger = setup_ledger(100);

    ledger.borrow_book(&alice(), BookId(0)).unwrap();

    assert!(ledger.check_borrower(&alice(), BookId(0)).unwrap());
    assert!(!ledger.check_borrower(&bob(), BookId(0)).unwrap());
    assert_eq!(ledger.get_book_by_id(BookId(0)).unwrap().count, 99);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_borrow_twice_is_rejected_without_side_effects() {
    let mut ledger = setup_ledger(100);
    ledger.borrow_book(&alice(), BookId(0)).unwrap();

    let result = ledger.borrow_book(&alice(), BookId(0));
    assert_eq!(
        result,
        Err(LedgerError::UserAlreadyBorrowedBook { book_id: BookId(0), caller: alice() })
    );

    // No double decrement, no second history entry
    assert_eq!(ledger.get_book_by_id(BookId(0)).unwrap().count, 99);
    assert_eq!(ledger.view_past_borrowings().len(), 1);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_borrow_out_of_stock() {
    let mut ledger = setup_ledger(1);
    ledger.borrow_book(&bob(), BookId(0)).unwrap();

    let result = ledger.borrow_book(&alice(), BookId(0));
    assert_eq!(result, Err(LedgerError::BookOutOfStock { book_id: BookId(0) }));

    assert_eq!(ledger.get_book_by_id(BookId(0)).unwrap().count, 0);
    assert!(ledger.check_borrower(&bob(), BookId(0)).unwrap());
    assert!(!ledger.check_borrower(&alice(), BookId(0)).unwrap());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_already_borrowed_wins_over_out_of_stock() {
    let mut ledger = setup_ledger(1);
    ledger.borrow_book(&alice(), BookId(0)).unwrap();

    assert!(matches!(
        ledger.borrow_book(&alice(), BookId(0)),
        Err(LedgerError::UserAlreadyBorrowedBook { .. })
    ));
}

#[test]
fn test_borrow_unknown_book() {
    let mut ledger = setup_ledger(1);

    let result = ledger.borrow_book(&alice(), BookId(3));
    assert_eq!(result, Err(LedgerError::IndexOutOfRange { book_id: BookId(3), book_count: 1 }));
    assert!(ledger.view_past_borrowings().is_empty());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_return_book() {
    let mut ledger = setup_ledger(100);
    ledger.borrow_book(&alice(), BookId(0)).unwrap();

    ledger.return_book(&alice(), BookId(0)).unwrap();

    assert!(!ledger.check_borrower(&alice(), BookId(0)).unwrap());
    assert_eq!(ledger.get_book_by_id(BookId(0)).unwrap().count, 100);

    // Returns never touch the history
    assert_eq!(ledger.view_past_borrowings().len(), 1);

    let result = ledger.return_book(&alice(), BookId(0));
    assert_eq!(result, Err(LedgerError::BookNotBorrowed { book_id: BookId(0), caller: alice() }));
    assert_eq!(ledger.get_book_by_id(BookId(0)).unwrap().count, 100);
}

#[test]
fn test_return_without_any_books() {
    let mut ledger = Ledger::new();

    let result = ledger.return_book(&alice(), BookId(0));
    assert_eq!(result, Err(LedgerError::BookNotBorrowed { book_id: BookId(0), caller: alice() }));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_return_by_someone_else_is_rejected() {
    let mut ledger = setup_ledger(2);
    ledger.borrow_book(&alice(), BookId(0)).unwrap();

    assert!(matches!(
        ledger.return_book(&bob(), BookId(0)),
        Err(LedgerError::BookNotBorrowed { .. })
    ));
    assert!(ledger.check_borrower(&alice(), BookId(0)).unwrap());
    assert_eq!(ledger.get_book_by_id(BookId(0)).unwrap().count, 1);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_borrow_again_after_return() {
    let mut ledger = setup_ledger(1);

    ledger.borrow_book(&alice(), BookId(0)).unwrap();
    ledger.return_book(&alice(), BookId(0)).unwrap();
    ledger.borrow_book(&alice(), BookId(0)).unwrap();

    assert_eq!(ledger.get_book_by_id(BookId(0)).unwrap().count, 0);
    assert_eq!(ledger.view_past_borrowings().len(), 2);
}

#[test]
fn test_read_views_reject_unknown_ids() {
    let ledger = setup_ledger(1);

    assert_eq!(
        ledger.get_book_by_id(BookId(1)),
        Err(LedgerError::IndexOutOfRange { book_id: BookId(1), book_count: 1 })
    );
    assert_eq!(
        ledger.check_borrower(&alice(), BookId(7)),
        Err(LedgerError::IndexOutOfRange { book_id: BookId(7), book_count: 1 })
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_book_list_keeps_insertion_order() {
    let mut ledger = Ledger::new();
    ledger.add_book(&alice(), "Book1", 100).unwrap();
    ledger.add_book(&alice(), "Book2", 100).unwrap();
    ledger.add_book(&alice(), "Book3", 100).unwrap();

    let names: Vec<String> = ledger.view_book_list().into_iter().map(|book| book.name).collect();
    assert_eq!(names, ["Book1", "Book2", "Book3"]);
}

#[test]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
fn test_history_tracking() {
    let mut ledger = Ledger::new();
    ledger.add_book(&alice(), "Book1", 100).unwrap();
    ledger.add_book(&alice(), "Book2", 100).unwrap();
    ledger.add_book(&alice(), "Book3", 100).unwrap();

    ledger.borrow_book(&alice(), BookId(0)).unwrap();
    ledger.borrow_book(&bob(), BookId(1)).unwrap();

    let history = ledger.view_past_borrowings();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].borrower, alice());
    assert_eq!(history[0].book_name, "Book1");
    assert_eq!(history[0].book_id, BookId(0));
    assert_eq!(history[1].borrower, bob());
    assert_eq!(history[1].book_name, "Book2");
    assert_eq!(history[1].book_id, BookId(1));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_views_are_snapshots() {
    let mut ledger = setup_ledger(3);

    let before = ledger.view_book_list();
    ledger.borrow_book(&alice(), BookId(0)).unwrap();

    assert_eq!(before.first().map(|book| book.count), Some(3));
    assert_eq!(ledger.view_book_list().first().map(|book| book.count), Some(2));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_outstanding_borrows() {
    let mut ledger = setup_ledger(5);
    ledger.add_book(&alice(), "Book2", 5).unwrap();

    ledger.borrow_book(&bob(), BookId(1)).unwrap();
    ledger.borrow_book(&alice(), BookId(1)).unwrap();
    ledger.borrow_book(&alice(), BookId(0)).unwrap();
    ledger.return_book(&alice(), BookId(0)).unwrap();

    // bob's address sorts before alice's
    assert_eq!(ledger.outstanding_borrows(), vec![(BookId(1), bob()), (BookId(1), alice())]);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_observers_only_see_commits() {
    let recorder = RecordingObserver::default();
    let mut ledger = Ledger::new();
    ledger.register_observer(Box::new(recorder.clone()));

    ledger.add_book(&alice(), "Book1", 1).unwrap();
    ledger.borrow_book(&alice(), BookId(0)).unwrap();
    assert!(ledger.borrow_book(&bob(), BookId(0)).is_err());
    ledger.return_book(&alice(), BookId(0)).unwrap();
    assert!(ledger.add_book(&alice(), "", 1).is_err());

    assert_eq!(
        recorder.events(),
        vec![
            LedgerEvent::BookAdded {
                book_id: BookId(0),
                name: "Book1".to_string(),
                count: 1,
                added_by: alice(),
            },
            LedgerEvent::BookBorrowed { book_id: BookId(0), borrower: alice(), remaining: 0 },
            LedgerEvent::BookReturned { book_id: BookId(0), borrower: alice(), remaining: 1 },
        ]
    );
}
