//! Lending ledger for a fixed catalog of books.
//!
//! The [`Ledger`] tracks how many copies of each title are on the shelf,
//! which caller currently holds a copy of which title, and an append-only
//! log of every borrow. Each call runs as one all-or-nothing step and takes
//! the caller identity explicitly.

pub mod book;
pub mod caller;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod observers;
pub mod persistence;
pub mod report;
pub mod shared;

pub use book::{Book, BookId, HistoryEntry};
pub use caller::Caller;
pub use error::{ConfigError, EmptyCaller, LedgerError, SessionError, StateFileError};
pub use events::LedgerEvent;
pub use ledger::Ledger;
pub use observers::{ConsoleNotifier, LedgerObserver, TracingLogger};
pub use persistence::{BorrowRecord, LedgerSnapshot, StateFile};
pub use report::LedgerReport;
pub use shared::SharedLedger;
