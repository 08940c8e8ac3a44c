// Transaction Store - category → transactions mapping
// Categories keep insertion order; transactions keep insertion order within a category.

use crate::error::{FinanceError, Result};
use crate::transaction::{Category, Transaction, TransactionField};
use log::debug;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// All recorded transactions, grouped by category.
///
/// Owned by the caller; there is no process-wide instance. Every mutating
/// operation validates its input completely before touching the store, so a
/// failed call leaves the store exactly as it was.
///
/// User-facing positions are 1-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionStore {
    entries: Vec<(Category, Vec<Transaction>)>,
}

impl TransactionStore {
    /// Create new empty store
    pub fn new() -> Self {
        TransactionStore {
            entries: Vec::new(),
        }
    }

    pub(crate) fn from_entries(entries: Vec<(Category, Vec<Transaction>)>) -> Self {
        TransactionStore { entries }
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Validate and append a transaction, creating the category if needed
    pub fn add(
        &mut self,
        category: &str,
        transaction_type: &str,
        amount: f64,
        date: &str,
    ) -> Result<()> {
        let category = Category::parse(category)?;
        let transaction = Transaction::new(transaction_type, amount, date)?;
        self.push(category, transaction);
        Ok(())
    }

    /// Append an already validated transaction
    pub fn push(&mut self, category: Category, transaction: Transaction) {
        debug!(
            "adding {} {} on {} to {}",
            transaction.transaction_type(),
            transaction.amount(),
            transaction.date_string(),
            category
        );

        match self.entries.iter_mut().find(|(c, _)| *c == category) {
            Some((_, transactions)) => transactions.push(transaction),
            None => self.entries.push((category, vec![transaction])),
        }
    }

    /// Replace one field of the transaction at `index` (1-based)
    pub fn update_field(
        &mut self,
        category: &str,
        index: usize,
        field: TransactionField,
        new_value: &str,
    ) -> Result<()> {
        let transaction = self.slot_mut(category, index)?;
        transaction.set_field(field, new_value)?;
        debug!("updated {} of {} #{}", field.name(), category, index);
        Ok(())
    }

    /// Remove the transaction at `index` (1-based).
    ///
    /// The category stays in the store even when its last transaction is removed.
    pub fn delete(&mut self, category: &str, index: usize) -> Result<Transaction> {
        let transactions = self.category_mut(category)?;
        check_index(index, transactions.len())?;
        let removed = transactions.remove(index - 1);
        debug!("deleted {} #{}", category, index);
        Ok(removed)
    }

    /// Merge another store into this one.
    ///
    /// Transactions of categories that already exist are appended after the
    /// existing ones; new categories are added at the end in `other`'s order.
    pub fn merge(&mut self, other: TransactionStore) {
        for (category, transactions) in other.entries {
            match self.entries.iter_mut().find(|(c, _)| *c == category) {
                Some((_, existing)) => existing.extend(transactions),
                None => self.entries.push((category, transactions)),
            }
        }
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    /// Transactions of a category (exact, case-sensitive name)
    pub fn get(&self, category: &str) -> Option<&[Transaction]> {
        self.entries
            .iter()
            .find(|(c, _)| c.as_str() == category)
            .map(|(_, transactions)| transactions.as_slice())
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.entries.iter().map(|(c, _)| c)
    }

    /// Categories with their transactions, in stored order
    pub fn iter(&self) -> impl Iterator<Item = (&Category, &[Transaction])> {
        self.entries.iter().map(|(c, t)| (c, t.as_slice()))
    }

    /// Every transaction with its category, category order then insertion order
    pub fn transactions(&self) -> impl Iterator<Item = (&Category, &Transaction)> {
        self.entries
            .iter()
            .flat_map(|(c, t)| t.iter().map(move |tx| (c, tx)))
    }

    pub fn category_count(&self) -> usize {
        self.entries.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.entries.iter().map(|(_, t)| t.len()).sum()
    }

    /// No categories at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// At least one category holds at least one transaction
    pub fn has_transactions(&self) -> bool {
        self.entries.iter().any(|(_, t)| !t.is_empty())
    }

    fn category_mut(&mut self, category: &str) -> Result<&mut Vec<Transaction>> {
        self.entries
            .iter_mut()
            .find(|(c, _)| c.as_str() == category)
            .map(|(_, transactions)| transactions)
            .ok_or_else(|| FinanceError::CategoryNotFound(category.to_string()))
    }

    fn slot_mut(&mut self, category: &str, index: usize) -> Result<&mut Transaction> {
        let transactions = self.category_mut(category)?;
        let len = transactions.len();
        index
            .checked_sub(1)
            .and_then(|i| transactions.get_mut(i))
            .ok_or(FinanceError::IndexOutOfRange { index, len })
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index < 1 || index > len {
        return Err(FinanceError::IndexOutOfRange { index, len });
    }
    Ok(())
}

// ============================================================================
// SERDE - a JSON object keyed by category, in stored order
// ============================================================================

impl Serialize for TransactionStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, transactions) in &self.entries {
            map.serialize_entry(category, transactions)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TransactionStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(StoreVisitor)
    }
}

struct StoreVisitor;

impl<'de> Visitor<'de> for StoreVisitor {
    type Value = TransactionStore;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of category to a list of transactions")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> std::result::Result<Self::Value, M::Error> {
        let mut store = TransactionStore::new();
        while let Some((category, transactions)) =
            access.next_entry::<Category, Vec<Transaction>>()?
        {
            match store.entries.iter_mut().find(|(c, _)| *c == category) {
                Some((_, existing)) => existing.extend(transactions),
                None => store.entries.push((category, transactions)),
            }
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> TransactionStore {
        let mut store = TransactionStore::new();
        store.add("Food", "expense", 20.0, "2024-01-01").unwrap();
        store
    }

    #[test]
    fn test_add_creates_category_and_appends() {
        let mut store = create_test_store();
        store.add("Salary", "Income", 1000.0, "2024-01-31").unwrap();
        store.add("Food", "Expense", 12.5, "2024-01-05").unwrap();

        let categories: Vec<&str> = store.categories().map(|c| c.as_str()).collect();
        assert_eq!(categories, vec!["Food", "Salary"]);

        let food = store.get("Food").unwrap();
        assert_eq!(food.len(), 2);
        assert_eq!(food[1].amount(), 12.5);
        assert_eq!(store.transaction_count(), 3);
    }

    #[test]
    fn test_add_is_atomic() {
        let mut store = create_test_store();
        let before = store.clone();

        assert!(store.add("Food", "expense", -1.0, "2024-01-01").is_err());
        assert!(store.add("Rent", "gift", 10.0, "2024-01-01").is_err());
        assert!(store.add("Rent", "expense", 10.0, "2024-02-30").is_err());
        assert!(store.add("Rent42", "expense", 10.0, "2024-01-01").is_err());

        assert_eq!(store, before);
        assert!(!store.contains_category("Rent"));
    }

    #[test]
    fn test_update_field_changes_only_that_field() {
        let mut store = create_test_store();
        store
            .update_field("Food", 1, TransactionField::Amount, "30")
            .unwrap();

        let tx = &store.get("Food").unwrap()[0];
        assert_eq!(tx.amount(), 30.0);
        assert_eq!(tx.transaction_type().as_str(), "expense");
        assert_eq!(tx.date_string(), "2024-01-01");

        let err = store
            .update_field("Food", 2, TransactionField::Amount, "40")
            .unwrap_err();
        assert!(matches!(err, FinanceError::IndexOutOfRange { index: 2, len: 1 }));
    }

    #[test]
    fn test_update_field_errors() {
        let mut store = create_test_store();
        let before = store.clone();

        assert!(matches!(
            store.update_field("Travel", 1, TransactionField::Date, "2024-01-02"),
            Err(FinanceError::CategoryNotFound(_))
        ));
        assert!(matches!(
            store.update_field("Food", 0, TransactionField::Date, "2024-01-02"),
            Err(FinanceError::IndexOutOfRange { index: 0, len: 1 })
        ));
        assert!(store
            .update_field("Food", 1, TransactionField::Type, "refund")
            .unwrap_err()
            .is_validation());

        assert_eq!(store, before);
    }

    #[test]
    fn test_add_then_delete_restores_sequence() {
        let mut store = create_test_store();
        let before: Vec<Transaction> = store.get("Food").unwrap().to_vec();

        store.add("Food", "income", 5.0, "2024-01-02").unwrap();
        let removed = store.delete("Food", 2).unwrap();

        assert_eq!(removed.amount(), 5.0);
        assert_eq!(store.get("Food").unwrap(), before.as_slice());
    }

    #[test]
    fn test_delete_keeps_empty_category() {
        let mut store = create_test_store();
        store.delete("Food", 1).unwrap();

        assert_eq!(store.get("Food").unwrap().len(), 0);
        assert!(!store.is_empty());
        assert!(!store.has_transactions());

        assert!(matches!(
            store.delete("Food", 1),
            Err(FinanceError::IndexOutOfRange { index: 1, len: 0 })
        ));
        assert!(matches!(
            store.delete("food", 1),
            Err(FinanceError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn test_merge_appends_and_keeps_order() {
        let mut store = create_test_store();
        store.add("Rent", "expense", 800.0, "2024-01-03").unwrap();

        let mut imported = TransactionStore::new();
        imported.add("Salary", "income", 1000.0, "2024-01-31").unwrap();
        imported.add("Food", "expense", 7.0, "2024-01-09").unwrap();

        store.merge(imported);

        let categories: Vec<&str> = store.categories().map(|c| c.as_str()).collect();
        assert_eq!(categories, vec!["Food", "Rent", "Salary"]);
        let food: Vec<f64> = store.get("Food").unwrap().iter().map(|t| t.amount()).collect();
        assert_eq!(food, vec![20.0, 7.0]);
    }

    #[test]
    fn test_json_preserves_order() {
        let mut store = TransactionStore::new();
        store.add("Rent", "expense", 800.0, "2024-01-03").unwrap();
        store.add("Food", "expense", 20.0, "2024-01-01").unwrap();
        store.add("Bonus", "Income", 50.0, "2024-01-04").unwrap();
        store.add("Rent", "expense", 810.0, "2024-02-03").unwrap();

        let json = serde_json::to_string(&store).unwrap();
        assert!(json.find("Rent").unwrap() < json.find("Food").unwrap());
        assert!(json.find("Food").unwrap() < json.find("Bonus").unwrap());

        let back: TransactionStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn test_json_rejects_bad_category() {
        let json = r#"{"Food1": [{"amount": 1.0, "type": "expense", "date": "2024-01-01"}]}"#;
        assert!(serde_json::from_str::<TransactionStore>(json).is_err());
    }
}
