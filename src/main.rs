// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use finance_tracker::config::init_logging;
use finance_tracker::{
    export_delimited, import_delimited, narrate, summarize, Cli, Command, Console, JsonFile,
    Persistence, TransactionStore,
};
use log::info;
use std::io;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let persistence = JsonFile::new(&cli.data_file);
    let mut store = persistence.load();
    info!("using data file {}", persistence.path().display());

    match cli.command() {
        Command::Menu => run_menu(&mut store, &persistence)?,
        Command::Table => run_table(&store)?,
        Command::Summary => print_summary(&store),
        Command::Import { file } => run_import(&mut store, &persistence, &file)?,
        Command::Export { file } => run_export(&store, &file)?,
    }

    Ok(())
}

fn run_menu(store: &mut TransactionStore, persistence: &JsonFile) -> Result<()> {
    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    console.run(store, persistence, &mut run_table)
}

fn run_import(store: &mut TransactionStore, persistence: &JsonFile, file: &Path) -> Result<()> {
    let imported = import_delimited(file)
        .with_context(|| format!("Failed to import {}", file.display()))?;
    let count = imported.transaction_count();
    store.merge(imported);

    persistence
        .save(store)
        .with_context(|| format!("Failed to save {}", persistence.path().display()))?;

    println!("✓ Imported {} transactions from {}", count, file.display());
    Ok(())
}

fn run_export(store: &TransactionStore, file: &Path) -> Result<()> {
    let count = export_delimited(file, store)
        .with_context(|| format!("Failed to export to {}", file.display()))?;
    println!("✓ Exported {} transactions to {}", count, file.display());
    Ok(())
}

fn print_summary(store: &TransactionStore) {
    for line in narrate(store) {
        println!("{}", line);
    }
    println!("\nSummary:");
    println!("{}", summarize(store));
}

#[cfg(feature = "tui")]
fn run_table(store: &TransactionStore) -> Result<()> {
    let mut app = ui::App::new(store);
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_table(_store: &TransactionStore) -> Result<()> {
    anyhow::bail!("table view not available, rebuild with: cargo build --features tui")
}
