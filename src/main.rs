use std::path::PathBuf;

use anyhow::Context;
use book_ledger::{
    BookId, Caller, ConsoleNotifier, Ledger, LedgerError, LedgerReport, StateFile, TracingLogger,
    config::{LedgerConfig, Network},
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

/// Command-line access to a deployed book lending ledger
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network profile to act on
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// JSON file with network profiles
    #[arg(short, long, global = true, env = "LEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Identity to act as, overriding the network's default caller
    #[arg(long, global = true, env = "LEDGER_CALLER")]
    caller: Option<Caller>,

    /// Enable verbose output with detailed operation logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// What to do
    #[command(subcommand)]
    command: Command,
}

/// Ledger calls and views
#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy a fresh, empty ledger to the network
    Deploy {
        /// Replace an existing ledger
        #[arg(long)]
        force: bool,
    },
    /// Add a title with a number of copies
    Add {
        /// Title of the book
        name: String,
        /// Copies to put on the shelf
        count: u64,
    },
    /// Borrow one copy of a book
    Borrow {
        /// Id of the book
        book_id: usize,
    },
    /// Return a borrowed copy
    Return {
        /// Id of the book
        book_id: usize,
    },
    /// Show whether the caller holds a copy of a book
    Check {
        /// Id of the book
        book_id: usize,
    },
    /// Show one book
    Book {
        /// Id of the book
        book_id: usize,
    },
    /// Show how many books the catalog holds
    Count,
    /// List every book
    List,
    /// List every past borrowing
    History,
    /// Show summary statistics
    Stats,
    /// Render a DOT graph of who holds which book
    Graph {
        /// Write the graph to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Walk through adding, borrowing and returning a book
    Interact,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = LedgerConfig::load(args.config.as_deref())?;
    let network = config.network(args.network.as_deref())?;
    let state_file = StateFile::new(network.state_file());

    match args.command {
        Command::Deploy { force } => {
            state_file.deploy(force)?;
            println!("{} {}", "BookLibrary deployed to:".green().bold(), state_file.path().display());
        }
        Command::Add { name, count } => {
            let caller = network.caller(args.caller)?;
            let book_id = transact(&state_file, |ledger| ledger.add_book(&caller, &name, count))?;
            println!("Added {name} as book {book_id}");
        }
        Command::Borrow { book_id } => {
            let caller = network.caller(args.caller)?;
            transact(&state_file, |ledger| ledger.borrow_book(&caller, BookId(book_id)))?;
            println!("{caller} borrowed book {}", BookId(book_id));
        }
        Command::Return { book_id } => {
            let caller = network.caller(args.caller)?;
            transact(&state_file, |ledger| ledger.return_book(&caller, BookId(book_id)))?;
            println!("{caller} returned book {}", BookId(book_id));
        }
        Command::Check { book_id } => {
            let caller = network.caller(args.caller)?;
            let ledger = state_file.load()?;
            let holds = ledger.check_borrower(&caller, BookId(book_id))?;
            println!("Does {caller} have book {}: {holds}", BookId(book_id));
        }
        Command::Book { book_id } => {
            print_book(&state_file, BookId(book_id))?;
        }
        Command::Count => {
            println!("Book count: {}", state_file.load()?.book_count());
        }
        Command::List => {
            let books = state_file.load()?.view_book_list();
            println!("{}", LedgerReport::book_table(&books));
        }
        Command::History => {
            let history = state_file.load()?.view_past_borrowings();
            println!("{}", LedgerReport::history_table(&history));
        }
        Command::Stats => {
            print!("{}", LedgerReport::stats(&state_file.load()?));
        }
        Command::Graph { output } => {
            let dot = LedgerReport::generate_dot(&state_file.load()?);
            if let Some(path) = output {
                LedgerReport::save_dot_to_file(&dot, &path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Graph written to {}", path.display());
            } else {
                print!("{dot}");
            }
        }
        Command::Interact => interact(&network, args.caller)?,
    }

    Ok(())
}

/// Install the `tracing` subscriber, honoring `RUST_LOG` when set
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "book_ledger=debug" } else { "book_ledger=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Run one call in a locked session on the state file, with the CLI's
/// observers attached
fn transact<T>(
    state_file: &StateFile,
    call: impl FnOnce(&mut Ledger) -> Result<T, LedgerError>,
) -> anyhow::Result<T> {
    let output = state_file.transact(|ledger| {
        ledger.register_observer(Box::new(TracingLogger));
        ledger.register_observer(Box::new(ConsoleNotifier));
        call(ledger)
    })?;
    Ok(output)
}

/// Add a book, borrow it and return it, printing the catalog along the way
fn interact(network: &Network, caller: Option<Caller>) -> anyhow::Result<()> {
    let caller = network.caller(caller)?;
    let state_file = StateFile::new(network.state_file());
    let separator = "=================";

    println!("{} {}", "BookLibrary deployed to:".green().bold(), state_file.path().display());
    println!("Acting as: {caller}");
    println!("{separator}");

    println!("{}", "Adding a book".yellow().bold());
    let book_id = transact(&state_file, |ledger| ledger.add_book(&caller, "The Hobbit", 10))?;

    let ledger = state_file.load()?;
    println!("Book count: {}", ledger.book_count());
    println!("{separator}");

    println!("{}", LedgerReport::book_table(&ledger.view_book_list()));
    print_book(&state_file, book_id)?;
    println!("{separator}");

    println!("{}", format!("Borrowing book at index {}", book_id.index()).yellow().bold());
    println!("{separator}");
    transact(&state_file, |ledger| ledger.borrow_book(&caller, book_id))?;
    print_book(&state_file, book_id)?;
    println!("{separator}");

    println!("{}", format!("Returning book at index {}", book_id.index()).yellow().bold());
    println!("{separator}");
    transact(&state_file, |ledger| ledger.return_book(&caller, book_id))?;
    print_book(&state_file, book_id)?;
    println!("{separator}");

    println!("\n{}", "Interaction complete!".green().bold());
    Ok(())
}

/// Print one book's availability as currently stored
fn print_book(state_file: &StateFile, book_id: BookId) -> anyhow::Result<()> {
    let book = state_file.load()?.get_book_by_id(book_id)?;
    print!("{}", LedgerReport::book_summary(&book));
    Ok(())
}
