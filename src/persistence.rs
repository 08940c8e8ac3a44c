// Persistence - structured JSON store file + delimited bulk import/export
//
// JSON file: the full store, rewritten on every save.
// Delimited file: one `type,category,amount,date` line per transaction, no header.

use crate::error::{FinanceError, Result};
use crate::store::TransactionStore;
use crate::transaction::{Category, Transaction};
use log::{info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Number of fields in a delimited line
pub const DELIMITED_FIELDS: usize = 4;

// ============================================================================
// STORE FILE
// ============================================================================

/// Where the store lives between runs
pub trait Persistence {
    /// Load the saved store.
    ///
    /// Never fails: a missing, empty or unreadable file gives an empty store
    /// and a logged warning.
    fn load(&self) -> TransactionStore;

    /// Overwrite the saved store with `store`
    fn save(&self, store: &TransactionStore) -> Result<()>;
}

/// Store file in JSON: `{"Food": [{"amount": 20.0, "type": "expense", "date": "2024-01-01"}]}`
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFile {
    fn load(&self) -> TransactionStore {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} does not exist yet, starting empty", self.path.display());
                return TransactionStore::new();
            }
            Err(e) => {
                warn!("could not read {}: {}", self.path.display(), e);
                return TransactionStore::new();
            }
        };

        if data.trim().is_empty() {
            warn!("file {} is empty", self.path.display());
            return TransactionStore::new();
        }

        match serde_json::from_str::<TransactionStore>(&data) {
            Ok(store) => {
                info!(
                    "loaded {} transactions in {} categories from {}",
                    store.transaction_count(),
                    store.category_count(),
                    self.path.display()
                );
                store
            }
            Err(e) => {
                warn!("error decoding JSON data in file {}: {}", self.path.display(), e);
                TransactionStore::new()
            }
        }
    }

    fn save(&self, store: &TransactionStore) -> Result<()> {
        let json = serde_json::to_string_pretty(store)?;
        fs::write(&self.path, json)?;
        info!(
            "saved {} transactions to {}",
            store.transaction_count(),
            self.path.display()
        );
        Ok(())
    }
}

// ============================================================================
// DELIMITED IMPORT / EXPORT
// ============================================================================

/// Read a whole delimited file into a new store.
///
/// All-or-nothing: the first bad line aborts with [`FinanceError::ImportParse`]
/// and nothing is returned. Blank lines are skipped. Types are lower-cased.
pub fn import_delimited(path: &Path) -> Result<TransactionStore> {
    if !path.exists() {
        return Err(FinanceError::ImportFileNotFound(path.to_path_buf()));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .quoting(false)
        .from_path(path)?;

    let mut store = TransactionStore::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| record_error(e, i + 1))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 1);

        // whitespace-only line
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }

        if record.len() != DELIMITED_FIELDS {
            return Err(FinanceError::ImportParse {
                line,
                message: format!(
                    "expected {} fields (type,category,amount,date), found {}",
                    DELIMITED_FIELDS,
                    record.len()
                ),
            });
        }

        let (category, transaction) = parse_line(&record).map_err(|e| FinanceError::ImportParse {
            line,
            message: e.to_string(),
        })?;
        store.push(category, transaction.with_lowercase_type());
    }

    info!(
        "read {} transactions from {}",
        store.transaction_count(),
        path.display()
    );
    Ok(store)
}

/// Undecodable lines (bad UTF-8) are parse errors at their line; I/O stays I/O.
fn record_error(err: csv::Error, fallback_line: usize) -> FinanceError {
    if err.is_io_error() {
        return FinanceError::Csv(err);
    }
    FinanceError::ImportParse {
        line: err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line),
        message: err.to_string(),
    }
}

fn parse_line(record: &csv::StringRecord) -> Result<(Category, Transaction)> {
    let field = |i: usize| record.get(i).unwrap_or("");

    let amount: f64 = field(2).parse().map_err(|_| {
        FinanceError::validation("amount", format!("'{}' is not a numeric value", field(2)))
    })?;
    let category = Category::parse(field(1))?;
    let transaction = Transaction::new(field(0), amount, field(3))?;
    Ok((category, transaction))
}

/// Write every transaction as one delimited line, category order then
/// insertion order. Returns the number of lines written.
pub fn export_delimited(path: &Path, store: &TransactionStore) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    let mut written = 0;
    for (category, tx) in store.transactions() {
        let amount = tx.amount().to_string();
        let date = tx.date_string();
        wtr.write_record([
            tx.transaction_type().as_str(),
            category.as_str(),
            amount.as_str(),
            date.as_str(),
        ])?;
        written += 1;
    }
    wtr.flush()?;

    info!("exported {} transactions to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> TransactionStore {
        let mut store = TransactionStore::new();
        store.add("Rent", "Expense", 800.0, "2024-01-03").unwrap();
        store.add("Food", "expense", 20.0, "2024-01-01").unwrap();
        store.add("Food", "expense", 12.75, "2024-01-08").unwrap();
        store.add("Salary", "income", 2500.0, "2024-01-31").unwrap();
        store
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("transactions.json"));
        assert!(file.load().is_empty());
    }

    #[test]
    fn test_load_empty_or_malformed_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.json");
        let file = JsonFile::new(&path);

        fs::write(&path, "   \n").unwrap();
        assert!(file.load().is_empty());

        fs::write(&path, "{not json").unwrap();
        assert!(file.load().is_empty());

        fs::write(&path, r#"{"Food": [{"amount": 0, "type": "expense", "date": "2024-01-01"}]}"#).unwrap();
        assert!(file.load().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("transactions.json"));
        let store = create_test_store();

        file.save(&store).unwrap();
        assert_eq!(file.load(), store);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("nope").join("transactions.json"));
        assert!(matches!(
            file.save(&create_test_store()),
            Err(FinanceError::Io(_))
        ));
    }

    #[test]
    fn test_import_delimited() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bulk.txt");
        fs::write(
            &path,
            "Expense,Food,20,2024-01-01\n\nincome, Salary ,2500.50,2024-01-31\nexpense,Food,4.5,2024-01-02\n",
        )
        .unwrap();

        let store = import_delimited(&path).unwrap();
        assert_eq!(store.transaction_count(), 3);
        let food = store.get("Food").unwrap();
        assert_eq!(food[0].transaction_type().as_str(), "expense");
        assert_eq!(food[1].amount(), 4.5);
        assert_eq!(store.get("Salary").unwrap()[0].amount(), 2500.5);
    }

    #[test]
    fn test_import_aborts_on_short_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bulk.txt");
        fs::write(&path, "expense,Food,20,2024-01-01\nexpense,Food,20\n").unwrap();

        let err = import_delimited(&path).unwrap_err();
        assert!(matches!(err, FinanceError::ImportParse { line: 2, .. }));
    }

    #[test]
    fn test_import_aborts_on_non_numeric_amount() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bulk.txt");
        fs::write(&path, "expense,Food,twenty,2024-01-01\n").unwrap();

        assert!(matches!(
            import_delimited(&path),
            Err(FinanceError::ImportParse { line: 1, .. })
        ));
    }

    #[test]
    fn test_import_skips_whitespace_only_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bulk.txt");
        fs::write(
            &path,
            "expense,Food,20,2024-01-01\n   \nincome,Pay,5,2024-01-02\n\t\n",
        )
        .unwrap();

        let store = import_delimited(&path).unwrap();
        assert_eq!(store.transaction_count(), 2);
        assert_eq!(store.get("Pay").unwrap()[0].amount(), 5.0);
    }

    #[test]
    fn test_import_invalid_utf8_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bulk.txt");
        fs::write(
            &path,
            b"income,Pay,5,2024-01-02\nexpense,Fo\xffod,20,2024-01-01\n".as_slice(),
        )
        .unwrap();

        assert!(matches!(
            import_delimited(&path),
            Err(FinanceError::ImportParse { line: 2, .. })
        ));
    }

    #[test]
    fn test_import_quoted_amount_is_not_numeric() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bulk.txt");
        fs::write(&path, "expense,Food,\"20\",2024-01-01\n").unwrap();

        let err = import_delimited(&path).unwrap_err();
        assert!(matches!(err, FinanceError::ImportParse { line: 1, .. }));
    }

    #[test]
    fn test_json_round_trip_keeps_exact_amounts() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("transactions.json"));

        let mut store = TransactionStore::new();
        store
            .add("Food", "expense", 237.57999999999998, "2024-01-01")
            .unwrap();
        store
            .add("Salary", "income", 480587.87404949276, "2024-01-31")
            .unwrap();
        let mut amount = 0.0;
        for i in 0..200u32 {
            amount += 0.1 * f64::from(i);
            store.add("Misc", "expense", amount + 0.01, "2024-02-01").unwrap();
        }

        file.save(&store).unwrap();
        let loaded = file.load();

        assert_eq!(loaded, store);
        assert_eq!(loaded.get("Food").unwrap()[0].amount(), 237.57999999999998);
        assert_eq!(loaded.get("Salary").unwrap()[0].amount(), 480587.87404949276);
    }

    #[test]
    fn test_import_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            import_delimited(&dir.path().join("missing.txt")),
            Err(FinanceError::ImportFileNotFound(_))
        ));
    }

    #[test]
    fn test_export_then_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.txt");
        let store = create_test_store();

        assert_eq!(export_delimited(&path, &store).unwrap(), 4);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("Expense,Rent,800,2024-01-03"));

        let back = import_delimited(&path).unwrap();
        let rows: Vec<_> = back.rows().into_iter().map(|r| (r.category, r.amount, r.date)).collect();
        let expected: Vec<_> = store.rows().into_iter().map(|r| (r.category, r.amount, r.date)).collect();
        assert_eq!(rows, expected);
    }
}
