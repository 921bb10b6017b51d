use colored::Colorize;

use crate::events::LedgerEvent;

/// Trait for commit observation
///
/// Observers run after the ledger has applied a call and only for calls that
/// succeeded.
pub trait LedgerObserver: Send + Sync {
    /// Called once per committed call
    fn on_commit(&self, event: &LedgerEvent);
}

/// Logs every committed call through `tracing`
#[derive(Debug)]
pub struct TracingLogger;

impl LedgerObserver for TracingLogger {
    fn on_commit(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::BookAdded { book_id, name, count, added_by } => {
                tracing::info!(%book_id, title = %name, count, %added_by, "book added");
            }
            LedgerEvent::BookBorrowed { book_id, borrower, remaining } => {
                tracing::info!(%book_id, %borrower, remaining, "book borrowed");
            }
            LedgerEvent::BookReturned { book_id, borrower, remaining } => {
                tracing::info!(%book_id, %borrower, remaining, "book returned");
            }
        }
    }
}

/// Prints a console notice for stock changes worth a human's attention
#[derive(Debug)]
pub struct ConsoleNotifier;

impl LedgerObserver for ConsoleNotifier {
    fn on_commit(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::BookBorrowed { book_id, remaining: 0, .. } => {
                println!("{} book {book_id} is now out of stock", "NOTIFICATION:".yellow().bold());
            }
            LedgerEvent::BookReturned { book_id, remaining: 1, .. } => {
                println!("{} book {book_id} is available again", "NOTIFICATION:".green().bold());
            }
            _ => {}
        }
    }
}
