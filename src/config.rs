// Command-line configuration and logging setup

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

/// Default store file, relative to the working directory
pub const DEFAULT_DATA_FILE: &str = "transactions.json";

/// Personal finance tracker: record income and expenses by category.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// File path to the JSON transactions file.
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// More log output (-v info, -vv debug). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive text menu (default)
    Menu,

    /// Open the terminal table view
    Table,

    /// Print the category narrative and totals
    Summary,

    /// Bulk-import a `type,category,amount,date` file and save
    Import {
        /// Delimited text file to read
        file: PathBuf,
    },

    /// Write every transaction to a `type,category,amount,date` file
    Export {
        /// Delimited text file to write
        file: PathBuf,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Menu)
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

/// Initialise env_logger once; RUST_LOG wins over `level`.
pub fn init_logging(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["finance-tracker"]).unwrap();
        assert_eq!(cli.data_file, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(cli.command(), Command::Menu);
        assert_eq!(cli.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_subcommands_and_verbosity() {
        let cli = Cli::try_parse_from([
            "finance-tracker",
            "-vv",
            "--data-file",
            "money.json",
            "import",
            "bulk.txt",
        ])
        .unwrap();

        assert_eq!(cli.data_file, PathBuf::from("money.json"));
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        assert_eq!(
            cli.command(),
            Command::Import {
                file: PathBuf::from("bulk.txt")
            }
        );
    }

    #[test]
    fn test_import_requires_file() {
        assert!(Cli::try_parse_from(["finance-tracker", "import"]).is_err());
    }
}
