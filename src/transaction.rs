// Transaction value types
// Validation happens at construction, so a Transaction that exists is valid.

use crate::error::{FinanceError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar date format used everywhere (files, prompts, table)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// DIRECTION / TRANSACTION TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Money coming in
    Income,

    /// Money going out
    Expense,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Direction::Income => "Income",
            Direction::Expense => "Expense",
        }
    }
}

/// Income or expense, keeping the casing the caller typed.
///
/// `"Income"`, `"INCOME"` and `"income"` all have the same [`Direction`];
/// only the stored text differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionType {
    raw: String,
    direction: Direction,
}

impl TransactionType {
    pub fn parse(value: &str) -> Result<Self> {
        let raw = value.trim();
        let direction = if raw.eq_ignore_ascii_case("income") {
            Direction::Income
        } else if raw.eq_ignore_ascii_case("expense") {
            Direction::Expense
        } else {
            return Err(FinanceError::validation(
                "type",
                format!("'{}' must be 'Income' or 'Expense'", value),
            ));
        };

        Ok(TransactionType {
            raw: raw.to_string(),
            direction,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_income(&self) -> bool {
        self.direction == Direction::Income
    }

    pub fn is_expense(&self) -> bool {
        self.direction == Direction::Expense
    }

    /// Text as given by the caller
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Case-insensitive comparison against a query string
    pub fn matches(&self, query: &str) -> bool {
        self.raw.eq_ignore_ascii_case(query.trim())
    }

    pub fn to_lowercase(&self) -> Self {
        TransactionType {
            raw: self.raw.to_lowercase(),
            direction: self.direction,
        }
    }
}

impl TryFrom<String> for TransactionType {
    type Error = FinanceError;

    fn try_from(value: String) -> Result<Self> {
        TransactionType::parse(&value)
    }
}

impl From<TransactionType> for String {
    fn from(value: TransactionType) -> Self {
        value.raw
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

/// Non-empty, letters-only label grouping transactions (e.g. "Food", "Rent").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    pub fn parse(value: &str) -> Result<Self> {
        let name = value.trim();
        if name.is_empty() {
            return Err(FinanceError::validation("category", "must not be empty"));
        }
        if !name.chars().all(char::is_alphabetic) {
            return Err(FinanceError::validation(
                "category",
                format!(
                    "'{}' must contain only letters (no numbers or special characters)",
                    value
                ),
            ));
        }
        Ok(Category(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, query: &str) -> bool {
        self.0.to_lowercase() == query.trim().to_lowercase()
    }
}

impl TryFrom<String> for Category {
    type Error = FinanceError;

    fn try_from(value: String) -> Result<Self> {
        Category::parse(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// FIELD PARSERS
// ============================================================================

/// Amounts are strictly positive and finite; direction lives in the type.
pub fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() {
        return Err(FinanceError::validation("amount", "must be a finite number"));
    }
    if amount <= 0.0 {
        return Err(FinanceError::validation(
            "amount",
            "must be a positive number",
        ));
    }
    Ok(amount)
}

pub fn parse_amount(value: &str) -> Result<f64> {
    let amount: f64 = value.trim().parse().map_err(|_| {
        FinanceError::validation("amount", format!("'{}' is not a numeric value", value.trim()))
    })?;
    validate_amount(amount)
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        FinanceError::validation(
            "date",
            format!("'{}' is not a valid date, use YYYY-MM-DD", value.trim()),
        )
    })
}

/// Two decimals, as amounts are shown to the user
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// One recorded monetary event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct Transaction {
    amount: f64,

    #[serde(rename = "type")]
    transaction_type: TransactionType,

    #[serde(serialize_with = "serialize_date")]
    date: NaiveDate,
}

/// Unvalidated shape of a transaction as found in the data file
#[derive(Deserialize)]
struct RawTransaction {
    amount: f64,
    #[serde(rename = "type")]
    transaction_type: String,
    date: String,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = FinanceError;

    fn try_from(raw: RawTransaction) -> Result<Self> {
        Transaction::new(&raw.transaction_type, raw.amount, &raw.date)
    }
}

impl Transaction {
    pub fn new(transaction_type: &str, amount: f64, date: &str) -> Result<Self> {
        Ok(Transaction {
            amount: validate_amount(amount)?,
            transaction_type: TransactionType::parse(transaction_type)?,
            date: parse_date(date)?,
        })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn transaction_type(&self) -> &TransactionType {
        &self.transaction_type
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type.is_income()
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type.is_expense()
    }

    /// Replace one field from user text. The transaction is untouched on error.
    pub fn set_field(&mut self, field: TransactionField, value: &str) -> Result<()> {
        match field {
            TransactionField::Amount => self.amount = parse_amount(value)?,
            TransactionField::Type => self.transaction_type = TransactionType::parse(value)?,
            TransactionField::Date => self.date = parse_date(value)?,
        }
        Ok(())
    }

    pub(crate) fn with_lowercase_type(mut self) -> Self {
        self.transaction_type = self.transaction_type.to_lowercase();
        self
    }
}

fn serialize_date<S: serde::Serializer>(date: &NaiveDate, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
}

// ============================================================================
// EDITABLE FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionField {
    Amount,
    Type,
    Date,
}

impl TransactionField {
    pub fn name(&self) -> &'static str {
        match self {
            TransactionField::Amount => "amount",
            TransactionField::Type => "type",
            TransactionField::Date => "date",
        }
    }
}

impl FromStr for TransactionField {
    type Err = FinanceError;

    /// Accepts field names or the menu numbers 1-3
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "amount" => Ok(TransactionField::Amount),
            "2" | "type" => Ok(TransactionField::Type),
            "3" | "date" => Ok(TransactionField::Date),
            other => Err(FinanceError::validation(
                "field",
                format!("'{}' must be one of amount, type, date", other),
            )),
        }
    }
}
