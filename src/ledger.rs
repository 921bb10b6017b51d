use std::{collections::HashMap, fmt};

use crate::{
    book::{Book, BookId, HistoryEntry},
    caller::Caller,
    error::LedgerError,
    events::LedgerEvent,
    observers::LedgerObserver,
};

/// A fully validated state change, ready to be applied
///
/// Building one only reads the ledger. Applying one cannot fail, so a call
/// either commits every effect or none.
#[derive(Debug)]
enum Mutation {
    /// Append a new book to the catalog
    AddBook {
        /// The book exactly as it will be stored
        book: Book,
        /// Who asked for it
        added_by: Caller,
    },
    /// Hand one copy to a caller
    Borrow {
        /// Borrowed book
        book_id: BookId,
        /// New holder of the copy
        borrower: Caller,
        /// Shelf count after the borrow
        remaining: u64,
        /// Title snapshot for the history entry
        book_name: String,
    },
    /// Take one copy back from a caller
    Return {
        /// Returned book
        book_id: BookId,
        /// Caller giving the copy back
        borrower: Caller,
        /// Shelf count after the return
        remaining: u64,
    },
}

/// The lending ledger: catalog, borrow flags and borrow history
///
/// Every mutating call takes the caller identity explicitly and runs as one
/// indivisible step. Read-only views hand out owned copies.
pub struct Ledger {
    /// Catalog in creation order; a book's id is its position
    books: Vec<Book>,
    /// Per book, per caller "currently holds a copy" flags
    borrow_records: HashMap<BookId, HashMap<Caller, bool>>,
    /// Successful borrows in the order they happened
    history: Vec<HistoryEntry>,
    /// Registered commit observers
    observers: Vec<Box<dyn LedgerObserver>>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("books", &self.books)
            .field("borrow_records", &self.borrow_records)
            .field("history", &self.history)
            .field("observers_count", &self.observers.len())
            .finish()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create an empty ledger: no books, no borrows, no history
    #[must_use]
    pub fn new() -> Self {
        Self {
            books: Vec::new(),
            borrow_records: HashMap::new(),
            history: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Rebuild a ledger from already validated parts
    pub(crate) fn from_parts(
        books: Vec<Book>,
        borrow_records: HashMap<BookId, HashMap<Caller, bool>>,
        history: Vec<HistoryEntry>,
    ) -> Self {
        Self { books, borrow_records, history, observers: Vec::new() }
    }

    /// Register an observer to be notified of committed calls
    pub fn register_observer(&mut self, observer: Box<dyn LedgerObserver>) {
        self.observers.push(observer);
    }

    /// Add a new title with `count` copies and return its id
    ///
    /// Anyone may add books; `caller` is only reported to observers.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NameCannotBeEmpty`] if `name` is empty
    /// - [`LedgerError::CountCannotBeZero`] if `count` is zero
    pub fn add_book(
        &mut self,
        caller: &Caller,
        name: &str,
        count: u64,
    ) -> Result<BookId, LedgerError> {
        let mutation = self.validate_add(caller, name, count);
        let event = self.execute("add_book", mutation)?;
        Ok(event.book_id())
    }

    /// Borrow one copy of `book_id` for `caller`
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`LedgerError::UserAlreadyBorrowedBook`] if `caller` already holds a copy
    /// - [`LedgerError::IndexOutOfRange`] if no such book exists
    /// - [`LedgerError::BookOutOfStock`] if no copies are left
    pub fn borrow_book(&mut self, caller: &Caller, book_id: BookId) -> Result<(), LedgerError> {
        let mutation = self.validate_borrow(caller, book_id);
        self.execute("borrow_book", mutation).map(drop)
    }

    /// Give back the copy of `book_id` held by `caller`
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BookNotBorrowed`] if `caller` holds no copy,
    /// including when the book does not exist at all.
    pub fn return_book(&mut self, caller: &Caller, book_id: BookId) -> Result<(), LedgerError> {
        let mutation = self.validate_return(caller, book_id);
        self.execute("return_book", mutation).map(drop)
    }

    /// Whether `caller` currently holds a copy of `book_id`
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::IndexOutOfRange`] if no such book exists.
    pub fn check_borrower(&self, caller: &Caller, book_id: BookId) -> Result<bool, LedgerError> {
        self.book(book_id)?;
        Ok(self.is_borrowed(caller, book_id))
    }

    /// A copy of the book stored under `book_id`
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::IndexOutOfRange`] if no such book exists.
    pub fn get_book_by_id(&self, book_id: BookId) -> Result<Book, LedgerError> {
        self.book(book_id).cloned()
    }

    /// Number of books in the catalog
    #[must_use]
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// Every book in the order it was added
    #[must_use]
    pub fn view_book_list(&self) -> Vec<Book> {
        self.books.clone()
    }

    /// Every successful borrow in the order it happened
    #[must_use]
    pub fn view_past_borrowings(&self) -> Vec<HistoryEntry> {
        self.history.clone()
    }

    /// All copies currently out, ordered by book id then caller
    #[must_use]
    pub fn outstanding_borrows(&self) -> Vec<(BookId, Caller)> {
        let mut outstanding: Vec<(BookId, Caller)> = self
            .borrow_records()
            .filter(|(_, _, borrowed)| *borrowed)
            .map(|(book_id, caller, _)| (book_id, caller.clone()))
            .collect();
        outstanding.sort();
        outstanding
    }

    /// Every recorded flag, including ones that went back to `false`
    pub(crate) fn borrow_records(&self) -> impl Iterator<Item = (BookId, &Caller, bool)> {
        self.borrow_records.iter().flat_map(|(book_id, holders)| {
            holders.iter().map(move |(caller, borrowed)| (*book_id, caller, *borrowed))
        })
    }

    /// Look up a stored book
    fn book(&self, book_id: BookId) -> Result<&Book, LedgerError> {
        self.books.get(book_id.index()).ok_or(LedgerError::IndexOutOfRange {
            book_id,
            book_count: self.books.len(),
        })
    }

    /// Read a borrow flag, absent meaning `false`
    fn is_borrowed(&self, caller: &Caller, book_id: BookId) -> bool {
        self.borrow_records
            .get(&book_id)
            .and_then(|holders| holders.get(caller))
            .copied()
            .unwrap_or(false)
    }

    /// Check an `add_book` call
    fn validate_add(&self, caller: &Caller, name: &str, count: u64) -> Result<Mutation, LedgerError> {
        if name.is_empty() {
            return Err(LedgerError::NameCannotBeEmpty);
        }
        if count == 0 {
            return Err(LedgerError::CountCannotBeZero);
        }

        let book = Book { id: BookId(self.books.len()), name: name.to_string(), count };
        Ok(Mutation::AddBook { book, added_by: caller.clone() })
    }

    /// Check a `borrow_book` call
    fn validate_borrow(&self, caller: &Caller, book_id: BookId) -> Result<Mutation, LedgerError> {
        if self.is_borrowed(caller, book_id) {
            return Err(LedgerError::UserAlreadyBorrowedBook { book_id, caller: caller.clone() });
        }

        let book = self.book(book_id)?;
        let remaining = book.count.checked_sub(1).ok_or(LedgerError::BookOutOfStock { book_id })?;

        Ok(Mutation::Borrow {
            book_id,
            borrower: caller.clone(),
            remaining,
            book_name: book.name.clone(),
        })
    }

    /// Check a `return_book` call
    fn validate_return(&self, caller: &Caller, book_id: BookId) -> Result<Mutation, LedgerError> {
        if !self.is_borrowed(caller, book_id) {
            return Err(LedgerError::BookNotBorrowed { book_id, caller: caller.clone() });
        }

        // A set flag implies the book exists and has at least one copy out.
        let book = self.book(book_id)?;
        Ok(Mutation::Return {
            book_id,
            borrower: caller.clone(),
            remaining: book.count.saturating_add(1),
        })
    }

    /// Apply a validated call, then notify observers
    fn execute(
        &mut self,
        call: &'static str,
        validated: Result<Mutation, LedgerError>,
    ) -> Result<LedgerEvent, LedgerError> {
        let mutation = validated.inspect_err(|error| {
            tracing::debug!(call, %error, "call rejected");
        })?;

        let event = self.commit(mutation);

        for observer in &self.observers {
            observer.on_commit(&event);
        }

        Ok(event)
    }

    /// Write a mutation into the ledger
    fn commit(&mut self, mutation: Mutation) -> LedgerEvent {
        match mutation {
            Mutation::AddBook { book, added_by } => {
                let event = LedgerEvent::BookAdded {
                    book_id: book.id,
                    name: book.name.clone(),
                    count: book.count,
                    added_by,
                };
                self.books.push(book);
                event
            }
            Mutation::Borrow { book_id, borrower, remaining, book_name } => {
                self.set_count(book_id, remaining);
                self.set_borrowed(book_id, borrower.clone(), true);
                self.history.push(HistoryEntry { borrower: borrower.clone(), book_name, book_id });
                LedgerEvent::BookBorrowed { book_id, borrower, remaining }
            }
            Mutation::Return { book_id, borrower, remaining } => {
                self.set_count(book_id, remaining);
                self.set_borrowed(book_id, borrower.clone(), false);
                LedgerEvent::BookReturned { book_id, borrower, remaining }
            }
        }
    }

    /// Overwrite a book's shelf count
    fn set_count(&mut self, book_id: BookId, count: u64) {
        if let Some(book) = self.books.get_mut(book_id.index()) {
            book.count = count;
        }
    }

    /// Overwrite a borrow flag
    fn set_borrowed(&mut self, book_id: BookId, caller: Caller, borrowed: bool) {
        self.borrow_records.entry(book_id).or_default().insert(caller, borrowed);
    }
}

// Include tests module
#[cfg(test)]
mod tests;
