//! JSON state files: a deployed ledger lives in one file for its lifetime.
//!
//! Saves go to a temporary sibling that is renamed over the state file, so a
//! reader sees either the old or the new state and never a partial one.
//! Writers that load, call and save go through [`StateFile`], which holds an
//! exclusive lock on a `.lock` sibling for the whole session.

use std::{
    collections::{HashMap, HashSet},
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fd_lock::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use crate::{
    book::{Book, BookId, HistoryEntry},
    caller::Caller,
    error::{LedgerError, SessionError, StateFileError},
    ledger::Ledger,
};

/// One borrow flag as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub struct BorrowRecord {
    /// Book the flag belongs to
    pub book_id: BookId,
    /// Caller the flag belongs to
    pub borrower: Caller,
    /// Whether the caller currently holds a copy
    pub borrowed: bool,
}

/// Serializable representation of the ledger state
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerSnapshot {
    /// Catalog in id order
    pub books: Vec<Book>,
    /// Every flag ever written, sorted by book id then borrower
    pub borrow_records: Vec<BorrowRecord>,
    /// Borrow history in chronological order
    pub history: Vec<HistoryEntry>,
}

impl LedgerSnapshot {
    /// Check the invariants a live ledger always upholds
    ///
    /// # Errors
    ///
    /// Returns [`StateFileError::Corrupt`] describing the first violation found.
    pub fn validate(&self) -> Result<(), StateFileError> {
        for (index, book) in self.books.iter().enumerate() {
            if book.id != BookId(index) {
                return Err(corrupt(format!("book at position {index} has id {}", book.id)));
            }
            if book.name.is_empty() {
                return Err(corrupt(format!("book {} has an empty name", book.id)));
            }
        }

        let mut seen = HashSet::new();
        for record in &self.borrow_records {
            if record.book_id.index() >= self.books.len() {
                return Err(corrupt(format!(
                    "borrow record for {} references missing book {}",
                    record.borrower, record.book_id
                )));
            }
            if !seen.insert((record.book_id, &record.borrower)) {
                return Err(corrupt(format!(
                    "duplicate borrow record for {} on book {}",
                    record.borrower, record.book_id
                )));
            }
        }

        for (position, entry) in self.history.iter().enumerate() {
            if entry.book_id.index() >= self.books.len() {
                return Err(corrupt(format!(
                    "history entry for {} references missing book {}",
                    entry.borrower, entry.book_id
                )));
            }
            if entry.book_name.is_empty() {
                return Err(corrupt(format!("history entry {position} has an empty book name")));
            }
        }

        Ok(())
    }
}

/// Build a corruption error
fn corrupt(reason: String) -> StateFileError {
    StateFileError::Corrupt(reason)
}

/// `path` with `suffix` appended to its file name
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// A deployed ledger's state file
///
/// Every mutating session holds an exclusive lock on `<state file>.lock`
/// from the load to the save, so concurrent sessions on the same file run
/// one after another and none of their writes is lost. The lock file is
/// left in place; only the lock on it matters.
#[derive(Debug, Clone)]
pub struct StateFile {
    /// The JSON state file
    path: PathBuf,
}

impl StateFile {
    /// Handle on the state file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The JSON state file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file whose lock serializes writers
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    /// Open (creating if needed) the lock file
    fn open_lock(&self) -> Result<RwLock<File>, StateFileError> {
        let path = self.lock_path();
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map(RwLock::new)
            .map_err(|source| StateFileError::Lock { path, source })
    }

    /// Block until this process holds the writer lock
    fn lock<'lock>(
        &self,
        lock: &'lock mut RwLock<File>,
    ) -> Result<RwLockWriteGuard<'lock, File>, StateFileError> {
        lock.write().map_err(|source| StateFileError::Lock { path: self.lock_path(), source })
    }

    /// Write a fresh, empty ledger
    ///
    /// # Errors
    ///
    /// Returns [`StateFileError::AlreadyExists`] if a ledger is already
    /// deployed and `force` is not set, or a lock or write error.
    pub fn deploy(&self, force: bool) -> Result<Ledger, StateFileError> {
        let mut lock = self.open_lock()?;
        let _guard = self.lock(&mut lock)?;

        if self.path.exists() && !force {
            return Err(StateFileError::AlreadyExists(self.path.clone()));
        }

        let ledger = Ledger::new();
        ledger.save_to_file(&self.path)?;
        tracing::info!(path = %self.path.display(), "ledger deployed");
        Ok(ledger)
    }

    /// Read the current state
    ///
    /// Saves replace the file in one rename, so no lock is needed to read.
    ///
    /// # Errors
    ///
    /// See [`Ledger::load_from_file`].
    pub fn load(&self) -> Result<Ledger, StateFileError> {
        Ledger::load_from_file(&self.path)
    }

    /// Load the ledger, run one call against it and save the result, all
    /// under the writer lock
    ///
    /// Nothing is written back when the call is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] with the ledger's error, or
    /// [`SessionError::State`] if the file cannot be locked, read or written.
    pub fn transact<T>(
        &self,
        call: impl FnOnce(&mut Ledger) -> Result<T, LedgerError>,
    ) -> Result<T, SessionError> {
        let mut lock = self.open_lock()?;
        let _guard = self.lock(&mut lock)?;

        let mut ledger = Ledger::load_from_file(&self.path)?;
        let output = call(&mut ledger)?;
        ledger.save_to_file(&self.path)?;
        Ok(output)
    }
}

impl Ledger {
    /// Capture the current state in serializable form
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut borrow_records: Vec<BorrowRecord> = self
            .borrow_records()
            .map(|(book_id, borrower, borrowed)| BorrowRecord {
                book_id,
                borrower: borrower.clone(),
                borrowed,
            })
            .collect();
        borrow_records.sort();

        LedgerSnapshot {
            books: self.view_book_list(),
            borrow_records,
            history: self.view_past_borrowings(),
        }
    }

    /// Rebuild a ledger from a snapshot
    ///
    /// Observers are not part of the state and need to be registered again.
    ///
    /// # Errors
    ///
    /// Returns [`StateFileError::Corrupt`] if the snapshot breaks an invariant.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, StateFileError> {
        snapshot.validate()?;

        let mut borrow_records: HashMap<BookId, HashMap<Caller, bool>> = HashMap::new();
        for record in snapshot.borrow_records {
            borrow_records.entry(record.book_id).or_default().insert(record.borrower, record.borrowed);
        }

        Ok(Self::from_parts(snapshot.books, borrow_records, snapshot.history))
    }

    /// Save the ledger state to a JSON file
    ///
    /// The state is written to `<path>.tmp` first and then renamed over
    /// `path`. Callers racing on the same path must serialize themselves,
    /// as [`StateFile::transact`] does.
    ///
    /// # Errors
    ///
    /// Returns a [`StateFileError`] if:
    /// - The state cannot be serialized to JSON
    /// - The temporary file cannot be written or renamed
    pub fn save_to_file(&self, path: &Path) -> Result<(), StateFileError> {
        let serialized =
            serde_json::to_string_pretty(&self.snapshot()).map_err(StateFileError::Encode)?;

        let tmp_path = sibling(path, ".tmp");
        fs::write(&tmp_path, serialized)
            .map_err(|source| StateFileError::Write { path: tmp_path.clone(), source })?;
        fs::rename(&tmp_path, path)
            .map_err(|source| StateFileError::Write { path: path.to_path_buf(), source })?;

        tracing::debug!(path = %path.display(), books = self.book_count(), "ledger state saved");
        Ok(())
    }

    /// Load the ledger state from a JSON file
    ///
    /// # Errors
    ///
    /// Returns a [`StateFileError`] if:
    /// - No file exists at `path`
    /// - The file cannot be read
    /// - The JSON parsing fails
    /// - The parsed state breaks a ledger invariant
    pub fn load_from_file(path: &Path) -> Result<Self, StateFileError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                StateFileError::Missing(path.to_path_buf())
            } else {
                StateFileError::Read { path: path.to_path_buf(), source }
            }
        })?;

        let snapshot: LedgerSnapshot =
            serde_json::from_str(&contents).map_err(StateFileError::Decode)?;
        let ledger = Self::from_snapshot(snapshot)?;

        tracing::debug!(path = %path.display(), books = ledger.book_count(), "ledger state loaded");
        Ok(ledger)
    }
}
