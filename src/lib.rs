// Personal Finance Tracker - Core Library
// Exposes the transaction store, its queries and persistence for the CLI and tests

pub mod error;
pub mod transaction;
pub mod store;
pub mod query;       // search, table rows, column ordering
pub mod summary;
pub mod persistence; // JSON store file + delimited import/export
pub mod console;
pub mod config;

// Re-export commonly used types
pub use error::{FinanceError, Result};
pub use transaction::{
    Category, Direction, Transaction, TransactionField, TransactionType,
    format_amount, parse_amount, parse_date, DATE_FORMAT,
};
pub use store::TransactionStore;
pub use query::{
    search, compare, sort_key, sort_rows,
    Column, SearchCriterion, SortDirection, SortState, TransactionRow,
};
pub use summary::{summarize, narrate, Summary};
pub use persistence::{
    Persistence, JsonFile,
    import_delimited, export_delimited,
};
pub use console::{Console, MenuChoice};
pub use config::{Cli, Command};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
