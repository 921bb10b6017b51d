use std::{collections::BTreeMap, fs, io, path::Path};

use crate::{
    book::{Book, HistoryEntry},
    ledger::Ledger,
};

/// Human-readable renderings of ledger state
#[derive(Debug)]
pub struct LedgerReport;

impl LedgerReport {
    /// One book with its availability
    #[must_use]
    pub fn book_summary(book: &Book) -> String {
        format!(
            "Book {}: {}\n  Is book available: {}\n  Remaining book copies: {}\n",
            book.id,
            book.name,
            book.is_available(),
            book.count
        )
    }

    /// The catalog as a markdown table
    #[must_use]
    pub fn book_table(books: &[Book]) -> String {
        if books.is_empty() {
            return "No books in the library yet.".to_string();
        }

        let mut table = String::from("| Id | Name | Copies |\n");
        table.push_str("|----|------|--------|\n");

        for book in books {
            table.push_str(&format!("| {} | {} | {} |\n", book.id.index(), book.name, book.count));
        }

        table
    }

    /// Borrow history as a markdown table
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn history_table(history: &[HistoryEntry]) -> String {
        if history.is_empty() {
            return "No borrowings recorded yet.".to_string();
        }

        let mut table = String::from("| # | Borrower | Book | Id |\n");
        table.push_str("|---|----------|------|----|\n");

        for (i, entry) in history.iter().enumerate() {
            table.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                i + 1,
                entry.borrower,
                entry.book_name,
                entry.book_id.index()
            ));
        }

        table
    }

    /// Summary statistics
    #[must_use]
    pub fn stats(ledger: &Ledger) -> String {
        let books = ledger.view_book_list();
        let history = ledger.view_past_borrowings();

        let mut borrows_per_book: BTreeMap<usize, usize> = BTreeMap::new();
        for entry in &history {
            let borrows = borrows_per_book.entry(entry.book_id.index()).or_default();
            *borrows = borrows.saturating_add(1);
        }

        let mut out = String::new();
        out.push_str(&format!("Total books: {}\n", ledger.book_count()));
        let on_shelf = books.iter().map(|book| book.count).fold(0_u64, u64::saturating_add);
        out.push_str(&format!("Copies on the shelf: {on_shelf}\n"));
        out.push_str(&format!("Copies out: {}\n", ledger.outstanding_borrows().len()));
        out.push_str(&format!("Borrowings recorded: {}\n", history.len()));

        for book in &books {
            let borrows = borrows_per_book.get(&book.id.index()).copied().unwrap_or(0);
            out.push_str(&format!("  {} {}: borrowed {borrows} times\n", book.id, book.name));
        }

        out
    }

    /// DOT graph linking callers to the books they currently hold
    ///
    /// Books without copies left are drawn in red.
    #[must_use]
    pub fn generate_dot(ledger: &Ledger) -> String {
        let mut dot = String::from("digraph ledger {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=filled, fillcolor=lightblue];\n");

        for book in ledger.view_book_list() {
            let label = escape(&format!("{} ({} left)", book.name, book.count));
            let fill = if book.is_available() { "lightblue" } else { "lightcoral" };
            dot.push_str(&format!("  b{} [label=\"{label}\", fillcolor={fill}];\n", book.id.index()));
        }

        for (book_id, caller) in ledger.outstanding_borrows() {
            let caller = escape(caller.as_str());
            dot.push_str(&format!("  \"{caller}\" [shape=ellipse, fillcolor=palegreen];\n"));
            dot.push_str(&format!("  \"{caller}\" -> b{};\n", book_id.index()));
        }

        dot.push_str("}\n");
        dot
    }

    /// Save a DOT graph to a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to
    pub fn save_dot_to_file(dot: &str, path: &Path) -> Result<(), io::Error> {
        fs::write(path, dot)
    }
}

/// Escape backslashes and quotes for a quoted DOT id
fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
