use std::fmt;

use serde::{Deserialize, Serialize};

use crate::caller::Caller;

/// Positional index of a book in the ledger's catalog
///
/// Ids are assigned densely from zero in the order books are added and never
/// change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct BookId(pub usize);

impl BookId {
    /// The position of this book in the catalog
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for BookId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A catalog entry and its remaining stock
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Book {
    /// Position in the catalog
    pub id: BookId,
    /// Title, never empty for a stored book
    pub name: String,
    /// Copies currently on the shelf
    pub count: u64,
}

impl Book {
    /// Whether at least one copy can be borrowed right now
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.count > 0
    }
}

/// One successful borrow, recorded at the moment it happened
///
/// The title is copied out of the catalog so the entry stays meaningful no
/// matter what happens to the book later.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryEntry {
    /// Who took the copy
    pub borrower: Caller,
    /// Title at borrow time
    pub book_name: String,
    /// Which book was borrowed
    pub book_id: BookId,
}
