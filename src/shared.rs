use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    book::{Book, BookId, HistoryEntry},
    caller::Caller,
    error::LedgerError,
    ledger::Ledger,
    persistence::LedgerSnapshot,
};

/// Thread-safe handle to a single ledger
///
/// Mutating calls are serialized on a write lock, so their total order is
/// the order in which they acquire it. Reads share a read lock and always
/// observe a fully committed state. Cloning the handle shares the ledger.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    /// The one ledger every clone points at
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    /// Wrap a ledger for shared use
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self { inner: Arc::new(RwLock::new(ledger)) }
    }

    /// Acquire the write lock
    ///
    /// Commits never panic half-way, so a poisoned lock still guards a
    /// consistent ledger.
    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the read lock
    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`Ledger::add_book`]
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::add_book`].
    pub fn add_book(&self, caller: &Caller, name: &str, count: u64) -> Result<BookId, LedgerError> {
        self.write().add_book(caller, name, count)
    }

    /// See [`Ledger::borrow_book`]
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::borrow_book`].
    pub fn borrow_book(&self, caller: &Caller, book_id: BookId) -> Result<(), LedgerError> {
        self.write().borrow_book(caller, book_id)
    }

    /// See [`Ledger::return_book`]
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::return_book`].
    pub fn return_book(&self, caller: &Caller, book_id: BookId) -> Result<(), LedgerError> {
        self.write().return_book(caller, book_id)
    }

    /// See [`Ledger::check_borrower`]
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::check_borrower`].
    pub fn check_borrower(&self, caller: &Caller, book_id: BookId) -> Result<bool, LedgerError> {
        self.read().check_borrower(caller, book_id)
    }

    /// See [`Ledger::get_book_by_id`]
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::get_book_by_id`].
    pub fn get_book_by_id(&self, book_id: BookId) -> Result<Book, LedgerError> {
        self.read().get_book_by_id(book_id)
    }

    /// See [`Ledger::book_count`]
    #[must_use]
    pub fn book_count(&self) -> usize {
        self.read().book_count()
    }

    /// See [`Ledger::view_book_list`]
    #[must_use]
    pub fn view_book_list(&self) -> Vec<Book> {
        self.read().view_book_list()
    }

    /// See [`Ledger::view_past_borrowings`]
    #[must_use]
    pub fn view_past_borrowings(&self) -> Vec<HistoryEntry> {
        self.read().view_past_borrowings()
    }

    /// The whole state, captured under one read lock
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.read().snapshot()
    }
}
