//! Error types for the ledger and the tooling around it.
//!
//! [`LedgerError`] is the only error the state machine itself produces. The
//! rest belong to the state file, the network configuration and caller
//! parsing.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{book::BookId, caller::Caller};

/// Reasons a ledger call is rejected
///
/// A rejected call never leaves any trace in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// `add_book` was given an empty title
    #[error("book name cannot be empty")]
    NameCannotBeEmpty,
    /// `add_book` was given zero copies
    #[error("book count cannot be zero")]
    CountCannotBeZero,
    /// The caller already holds a copy of this book
    #[error("{caller} has already borrowed book {book_id}")]
    UserAlreadyBorrowedBook {
        /// Book the caller tried to borrow again
        book_id: BookId,
        /// Caller holding the outstanding copy
        caller: Caller,
    },
    /// No copies left on the shelf
    #[error("book {book_id} is out of stock")]
    BookOutOfStock {
        /// Book with no remaining copies
        book_id: BookId,
    },
    /// The caller does not hold a copy of this book
    #[error("{caller} has not borrowed book {book_id}")]
    BookNotBorrowed {
        /// Book the caller tried to return
        book_id: BookId,
        /// Caller without an outstanding copy
        caller: Caller,
    },
    /// The id does not name a book in the catalog
    #[error("book {book_id} is out of range, the catalog holds {book_count} books")]
    IndexOutOfRange {
        /// Requested id
        book_id: BookId,
        /// Catalog size at the time of the call
        book_count: usize,
    },
}

/// Failures reading or writing a ledger state file
#[derive(Debug, Error)]
pub enum StateFileError {
    /// No ledger has been deployed at this path
    #[error("no ledger deployed at {}", .0.display())]
    Missing(PathBuf),
    /// Deploying would overwrite an existing ledger
    #[error("a ledger is already deployed at {}", .0.display())]
    AlreadyExists(PathBuf),
    /// The file exists but could not be read
    #[error("failed to read {}", .path.display())]
    Read {
        /// File being read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
    /// The file could not be written
    #[error("failed to write {}", .path.display())]
    Write {
        /// File being written
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
    /// The file is not a valid JSON snapshot
    #[error("failed to parse ledger state")]
    Decode(#[source] serde_json::Error),
    /// The snapshot could not be serialized
    #[error("failed to serialize ledger state")]
    Encode(#[source] serde_json::Error),
    /// The snapshot parsed but breaks a ledger invariant
    #[error("ledger state is corrupt: {0}")]
    Corrupt(String),
    /// The writer lock beside the state file could not be taken
    #[error("failed to lock {}", .path.display())]
    Lock {
        /// Lock file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
}

/// Failure of one load, call and save session on a state file
#[derive(Debug, Error)]
pub enum SessionError {
    /// The ledger rejected the call; the state file is unchanged
    #[error(transparent)]
    Rejected(#[from] LedgerError),
    /// The state file could not be locked, read or written
    #[error(transparent)]
    State(#[from] StateFileError),
}

/// A caller identity that is blank once surrounding whitespace is removed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("caller identity cannot be empty")]
pub struct EmptyCaller;

/// Failures resolving the network configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file {}", .path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
    /// The config file is not valid JSON for [`crate::config::LedgerConfig`]
    #[error("failed to parse config file {}", .path.display())]
    Decode {
        /// Config file path
        path: PathBuf,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },
    /// The requested network has no profile
    #[error("unknown network `{0}`")]
    UnknownNetwork(String),
    /// No caller identity was supplied anywhere
    #[error("no caller identity for network `{0}`, pass --caller or set LEDGER_CALLER")]
    MissingCaller(String),
}
