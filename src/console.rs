// Console UI - numbered text menu over the store
// Reads from any BufRead and writes to any Write so the whole flow can be scripted.

use crate::error::{FinanceError, Result as FinanceResult};
use crate::persistence::{export_delimited, import_delimited, Persistence};
use crate::store::TransactionStore;
use crate::summary::{narrate, summarize};
use crate::transaction::{
    format_amount, parse_amount, parse_date, Category, TransactionField, TransactionType,
    DATE_FORMAT,
};
use anyhow::Result;
use log::error;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

/// Characters not allowed in an export file name
const FORBIDDEN_FILE_CHARS: &str = r#"\/.,:*?"<>|"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Add,
    View,
    Update,
    Delete,
    Export,
    Import,
    Summary,
    Table,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 9] = [
        MenuChoice::Add,
        MenuChoice::View,
        MenuChoice::Update,
        MenuChoice::Delete,
        MenuChoice::Export,
        MenuChoice::Import,
        MenuChoice::Summary,
        MenuChoice::Table,
        MenuChoice::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::Add => "Add Transaction",
            MenuChoice::View => "View Transactions",
            MenuChoice::Update => "Update Transaction",
            MenuChoice::Delete => "Delete Transaction",
            MenuChoice::Export => "Export Transactions to Text File",
            MenuChoice::Import => "Read Transactions in Bulk from Text File",
            MenuChoice::Summary => "Display Summary",
            MenuChoice::Table => "Open Table View",
            MenuChoice::Exit => "Save and Exit",
        }
    }

    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0) + 1
    }
}

impl FromStr for MenuChoice {
    type Err = FinanceError;

    fn from_str(s: &str) -> FinanceResult<Self> {
        s.trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| FinanceError::validation("choice", "invalid choice"))
    }
}

/// Export file names are entered without extension; `.txt` is appended.
pub fn export_file_name(name: &str) -> FinanceResult<String> {
    let name = name.trim();
    if name.chars().any(|c| FORBIDDEN_FILE_CHARS.contains(c)) {
        return Err(FinanceError::validation(
            "file name",
            r#"cannot contain symbols like . / \ " : , * ? < > |"#,
        ));
    }
    if name.is_empty() {
        return Err(FinanceError::validation("file name", "cannot be empty"));
    }
    Ok(format!("{}.txt", name))
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Menu loop until Exit or end of input. Either way the store is saved.
    pub fn run<P: Persistence>(
        &mut self,
        store: &mut TransactionStore,
        persistence: &P,
        table: &mut dyn FnMut(&TransactionStore) -> Result<()>,
    ) -> Result<()> {
        loop {
            self.print_menu()?;

            let Some(line) = self.prompt("Enter your choice: ")? else {
                self.exit(store, persistence)?;
                return Ok(());
            };

            let choice = match line.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(_) => {
                    writeln!(self.output, "Invalid choice. Please try again.")?;
                    continue;
                }
            };

            let finished = match choice {
                MenuChoice::Add => self.add(store, persistence)?,
                MenuChoice::View => {
                    self.view(store)?;
                    false
                }
                MenuChoice::Update => self.update(store, persistence)?,
                MenuChoice::Delete => self.delete(store, persistence)?,
                MenuChoice::Export => self.export(store)?,
                MenuChoice::Import => self.import(store)?,
                MenuChoice::Summary => {
                    self.summary(store)?;
                    false
                }
                MenuChoice::Table => {
                    if store.has_transactions() {
                        if let Err(e) = table(store) {
                            error!("table view failed: {:#}", e);
                            writeln!(self.output, "Error opening table view: {}", e)?;
                        }
                    } else {
                        writeln!(
                            self.output,
                            "No transactions loaded yet. Please add transactions or load from a file."
                        )?;
                    }
                    false
                }
                MenuChoice::Exit => {
                    self.exit(store, persistence)?;
                    return Ok(());
                }
            };

            // input ran out in the middle of a prompt
            if finished {
                self.exit(store, persistence)?;
                return Ok(());
            }
        }
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(self.output, "\nPersonal Finance Tracker")?;
        for choice in MenuChoice::ALL {
            writeln!(self.output, "{}. {}", choice.number(), choice.label())?;
        }
        Ok(())
    }

    // ========================================================================
    // PROMPTS
    // ========================================================================

    /// One line of input, `None` at end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask until `parse` accepts the answer
    fn prompt_valid<T>(
        &mut self,
        text: &str,
        parse: impl Fn(&str) -> FinanceResult<T>,
    ) -> Result<Option<T>> {
        loop {
            let Some(line) = self.prompt(text)? else {
                return Ok(None);
            };
            match parse(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "Error! {}. Please try again.", e)?,
            }
        }
    }

    fn prompt_index(&mut self, len: usize) -> Result<Option<usize>> {
        self.prompt_valid("Enter the index of the transaction: ", |s| {
            let index: usize = s
                .trim()
                .parse()
                .map_err(|_| FinanceError::validation("index", "please enter a valid index"))?;
            if index < 1 || index > len {
                return Err(FinanceError::IndexOutOfRange { index, len });
            }
            Ok(index)
        })
    }

    // ========================================================================
    // ACTIONS - each returns true when input ended mid-way
    // ========================================================================

    fn add<P: Persistence>(&mut self, store: &mut TransactionStore, persistence: &P) -> Result<bool> {
        let Some(amount) = self.prompt_valid("Enter transaction amount: ", parse_amount)? else {
            return Ok(true);
        };
        let Some(tx_type) = self.prompt_valid(
            "Enter transaction type (Income/Expense): ",
            TransactionType::parse,
        )?
        else {
            return Ok(true);
        };
        let Some(category) = self.prompt_valid("Enter transaction category: ", Category::parse)?
        else {
            return Ok(true);
        };
        let Some(date) = self.prompt_valid("Enter transaction date (YYYY-MM-DD): ", parse_date)?
        else {
            return Ok(true);
        };

        let date = date.format(DATE_FORMAT).to_string();
        match store.add(category.as_str(), tx_type.as_str(), amount, &date) {
            Ok(()) => {
                writeln!(self.output, "Transaction added successfully.")?;
                self.save(store, persistence)?;
            }
            Err(e) => writeln!(self.output, "Error! {}", e)?,
        }
        Ok(false)
    }

    fn view(&mut self, store: &TransactionStore) -> Result<()> {
        if store.is_empty() {
            writeln!(self.output, "No transactions available.")?;
            return Ok(());
        }

        for (category, transactions) in store.iter() {
            writeln!(self.output, "\nCategory: {}", category)?;
            for (i, tx) in transactions.iter().enumerate() {
                writeln!(
                    self.output,
                    "{}. Amount: ${}, Type: {}, Date: {}",
                    i + 1,
                    format_amount(tx.amount()),
                    tx.transaction_type().direction().title(),
                    tx.date_string()
                )?;
            }
        }
        Ok(())
    }

    /// Ask for a category and a position in it
    fn select_transaction(
        &mut self,
        store: &TransactionStore,
        action: &str,
    ) -> Result<Option<Option<(String, usize)>>> {
        self.view(store)?;

        let Some(category) =
            self.prompt(&format!("Enter the category of the transaction you want to {}: ", action))?
        else {
            return Ok(None);
        };
        let category = category.trim().to_string();

        let len = match store.get(&category) {
            Some(transactions) => transactions.len(),
            None => {
                writeln!(self.output, "Category not found.")?;
                return Ok(Some(None));
            }
        };
        if len == 0 {
            writeln!(self.output, "No transactions in this category.")?;
            return Ok(Some(None));
        }

        let Some(index) = self.prompt_index(len)? else {
            return Ok(None);
        };
        Ok(Some(Some((category, index))))
    }

    fn update<P: Persistence>(
        &mut self,
        store: &mut TransactionStore,
        persistence: &P,
    ) -> Result<bool> {
        let (category, index) = match self.select_transaction(store, "update")? {
            None => return Ok(true),
            Some(None) => return Ok(false),
            Some(Some(selected)) => selected,
        };

        if let Some(tx) = store.get(&category).and_then(|t| t.get(index - 1)) {
            writeln!(self.output, "\nCurrent Transaction Details:")?;
            writeln!(self.output, "1. Amount: ${}", format_amount(tx.amount()))?;
            writeln!(self.output, "2. Type: {}", tx.transaction_type().direction().title())?;
            writeln!(self.output, "3. Date: {}", tx.date_string())?;
        }

        let Some(field) = self.prompt_valid(
            "Enter the number corresponding to the field you want to update: ",
            TransactionField::from_str,
        )?
        else {
            return Ok(true);
        };

        loop {
            let Some(value) = self.prompt(&format!("Enter new {}: ", field.name()))? else {
                return Ok(true);
            };
            match store.update_field(&category, index, field, &value) {
                Ok(()) => break,
                Err(e) if e.is_validation() => {
                    writeln!(self.output, "Error! {}. Please try again.", e)?
                }
                Err(e) => {
                    writeln!(self.output, "Error! {}", e)?;
                    return Ok(false);
                }
            }
        }

        writeln!(self.output, "Transaction updated successfully.")?;
        self.save(store, persistence)?;
        Ok(false)
    }

    fn delete<P: Persistence>(
        &mut self,
        store: &mut TransactionStore,
        persistence: &P,
    ) -> Result<bool> {
        let (category, index) = match self.select_transaction(store, "delete")? {
            None => return Ok(true),
            Some(None) => return Ok(false),
            Some(Some(selected)) => selected,
        };

        match store.delete(&category, index) {
            Ok(_) => {
                writeln!(self.output, "Transaction deleted successfully.")?;
                self.save(store, persistence)?;
            }
            Err(e) => writeln!(self.output, "Error! {}", e)?,
        }
        Ok(false)
    }

    fn export(&mut self, store: &TransactionStore) -> Result<bool> {
        let Some(file_name) = self.prompt_valid(
            "Enter file name (Do not include .txt extension): ",
            export_file_name,
        )?
        else {
            return Ok(true);
        };

        match export_delimited(Path::new(&file_name), store) {
            Ok(count) => writeln!(
                self.output,
                "{} transactions exported successfully to {}.",
                count, file_name
            )?,
            Err(e) => {
                error!("export to {} failed: {}", file_name, e);
                writeln!(self.output, "Error exporting transactions: {}", e)?;
            }
        }
        Ok(false)
    }

    fn import(&mut self, store: &mut TransactionStore) -> Result<bool> {
        let Some(file_name) = self.prompt("Enter the name of the text file: ")? else {
            return Ok(true);
        };

        match import_delimited(Path::new(file_name.trim())) {
            Ok(imported) => {
                let count = imported.transaction_count();
                store.merge(imported);
                writeln!(
                    self.output,
                    "{} transactions read from file successfully.",
                    count
                )?;
            }
            Err(FinanceError::ImportFileNotFound(path)) => {
                writeln!(self.output, "File {} not found.", path.display())?
            }
            Err(e @ FinanceError::ImportParse { .. }) => writeln!(
                self.output,
                "Error parsing transaction data ({}). Please check the data format in the file.",
                e
            )?,
            Err(e) => writeln!(self.output, "Error reading transactions: {}", e)?,
        }
        Ok(false)
    }

    fn summary(&mut self, store: &TransactionStore) -> Result<()> {
        for line in narrate(store) {
            writeln!(self.output, "{}", line)?;
        }
        writeln!(self.output, "\nSummary:")?;
        writeln!(self.output, "{}", summarize(store))?;
        Ok(())
    }

    fn save<P: Persistence>(&mut self, store: &TransactionStore, persistence: &P) -> Result<()> {
        if let Err(e) = persistence.save(store) {
            error!("saving transactions failed: {}", e);
            writeln!(self.output, "Error saving transactions: {}", e)?;
        }
        Ok(())
    }

    fn exit<P: Persistence>(&mut self, store: &TransactionStore, persistence: &P) -> Result<()> {
        match persistence.save(store) {
            Ok(()) => writeln!(self.output, "Transactions saved successfully")?,
            Err(e) => {
                error!("saving transactions failed: {}", e);
                writeln!(self.output, "Error saving transactions: {}", e)?;
            }
        }
        writeln!(self.output, "Exiting program.")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;

    /// Keeps the last saved store in memory
    #[derive(Default)]
    struct MemoryPersistence {
        saved: RefCell<Option<TransactionStore>>,
        saves: RefCell<usize>,
    }

    impl Persistence for MemoryPersistence {
        fn load(&self) -> TransactionStore {
            self.saved.borrow().clone().unwrap_or_default()
        }

        fn save(&self, store: &TransactionStore) -> FinanceResult<()> {
            *self.saved.borrow_mut() = Some(store.clone());
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    fn run_script(script: &str, store: &mut TransactionStore) -> (String, MemoryPersistence) {
        let persistence = MemoryPersistence::default();
        let mut console = Console::new(Cursor::new(script.to_string()), Vec::new());
        let mut no_table = |_: &TransactionStore| -> Result<()> { Ok(()) };
        console.run(store, &persistence, &mut no_table).unwrap();
        let output = String::from_utf8(console.into_output()).unwrap();
        (output, persistence)
    }

    fn create_test_store() -> TransactionStore {
        let mut store = TransactionStore::new();
        store.add("Food", "expense", 20.0, "2024-01-01").unwrap();
        store
    }

    #[test]
    fn test_menu_choice_numbers() {
        assert_eq!("1".parse::<MenuChoice>().unwrap(), MenuChoice::Add);
        assert_eq!("6".parse::<MenuChoice>().unwrap(), MenuChoice::Import);
        assert_eq!("7".parse::<MenuChoice>().unwrap(), MenuChoice::Summary);
        assert_eq!(MenuChoice::Exit.number(), 9);
        assert!("0".parse::<MenuChoice>().is_err());
        assert!("10".parse::<MenuChoice>().is_err());
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("january").unwrap(), "january.txt");
        assert!(export_file_name("jan.txt").is_err());
        assert!(export_file_name("a/b").is_err());
        assert!(export_file_name("").is_err());
    }

    #[test]
    fn test_add_with_reprompts() {
        let mut store = TransactionStore::new();
        let script = "1\nabc\n-5\n25.5\ngift\nIncome\nPay 1\nPay\n2024-02-30\n2024-02-01\n9\n";
        let (output, persistence) = run_script(script, &mut store);

        assert_eq!(store.get("Pay").unwrap()[0].amount(), 25.5);
        assert_eq!(store.get("Pay").unwrap()[0].transaction_type().as_str(), "Income");
        assert_eq!(output.matches("Please try again").count(), 5);
        assert!(output.contains("Transaction added successfully."));
        assert_eq!(*persistence.saves.borrow(), 2);
        assert_eq!(persistence.load(), store);
    }

    #[test]
    fn test_view_lists_categories() {
        let mut store = create_test_store();
        let (output, _) = run_script("2\n9\n", &mut store);

        assert!(output.contains("Category: Food"));
        assert!(output.contains("1. Amount: $20.00, Type: Expense, Date: 2024-01-01"));
    }

    #[test]
    fn test_update_amount() {
        let mut store = create_test_store();
        let (output, _) = run_script("3\nFood\n2\n1\n1\nxyz\n30\n9\n", &mut store);

        assert!(output.contains("Transaction updated successfully."));
        assert_eq!(store.get("Food").unwrap()[0].amount(), 30.0);
    }

    #[test]
    fn test_delete_unknown_category() {
        let mut store = create_test_store();
        let (output, _) = run_script("4\nTravel\n4\nFood\n1\n9\n", &mut store);

        assert!(output.contains("Category not found."));
        assert!(output.contains("Transaction deleted successfully."));
        assert_eq!(store.get("Food").unwrap().len(), 0);
    }

    #[test]
    fn test_summary_and_invalid_choice() {
        let mut store = create_test_store();
        let (output, _) = run_script("x\n7\n9\n", &mut store);

        assert!(output.contains("Invalid choice. Please try again."));
        assert!(output.contains("You spent $20.00 on Food, on 2024-01-01."));
        assert!(output.contains("Net Balance: $-20.00"));
    }

    #[test]
    fn test_end_of_input_saves() {
        let mut store = create_test_store();
        let (output, persistence) = run_script("1\n12\n", &mut store);

        assert!(output.contains("Exiting program."));
        assert_eq!(persistence.load(), create_test_store());
    }

    #[test]
    fn test_table_requires_transactions() {
        let mut store = TransactionStore::new();
        let (output, _) = run_script("8\n9\n", &mut store);
        assert!(output.contains("No transactions loaded yet."));
    }
}
