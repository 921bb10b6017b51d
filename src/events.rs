use serde::{Deserialize, Serialize};

use crate::{book::BookId, caller::Caller};

/// Notifications emitted after a ledger call commits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum LedgerEvent {
    /// A new title entered the catalog
    BookAdded {
        /// Assigned id
        book_id: BookId,
        /// Title
        name: String,
        /// Initial copies
        count: u64,
        /// Who added it
        added_by: Caller,
    },
    /// A copy left the shelf
    BookBorrowed {
        /// Borrowed book
        book_id: BookId,
        /// Who took it
        borrower: Caller,
        /// Copies left afterwards
        remaining: u64,
    },
    /// A copy came back
    BookReturned {
        /// Returned book
        book_id: BookId,
        /// Who brought it back
        borrower: Caller,
        /// Copies on the shelf afterwards
        remaining: u64,
    },
}

impl LedgerEvent {
    /// The book this event concerns
    #[must_use]
    pub fn book_id(&self) -> BookId {
        match self {
            Self::BookAdded { book_id, .. }
            | Self::BookBorrowed { book_id, .. }
            | Self::BookReturned { book_id, .. } => *book_id,
        }
    }
}
