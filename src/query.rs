// Queries over the store: field search, table rows, column ordering
// All functions here are pure; nothing mutates the store.

use crate::error::{FinanceError, Result};
use crate::store::TransactionStore;
use crate::transaction::{format_amount, parse_date, Category, TransactionType, DATE_FORMAT};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SEARCH
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchCriterion {
    Amount,
    Type,
    Category,
    Date,
}

impl SearchCriterion {
    pub const ALL: [SearchCriterion; 4] = [
        SearchCriterion::Amount,
        SearchCriterion::Type,
        SearchCriterion::Category,
        SearchCriterion::Date,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SearchCriterion::Amount => "Amount",
            SearchCriterion::Type => "Type",
            SearchCriterion::Category => "Category",
            SearchCriterion::Date => "Date",
        }
    }

    /// Cycle Amount → Type → Category → Date → Amount
    pub fn next(&self) -> Self {
        match self {
            SearchCriterion::Amount => SearchCriterion::Type,
            SearchCriterion::Type => SearchCriterion::Category,
            SearchCriterion::Category => SearchCriterion::Date,
            SearchCriterion::Date => SearchCriterion::Amount,
        }
    }
}

impl fmt::Display for SearchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchCriterion {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self> {
        SearchCriterion::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                FinanceError::validation("criterion", format!("'{}' is not a search criterion", s))
            })
    }
}

/// Matching transactions per category.
///
/// Every category of `store` is present in the result, with an empty list when
/// nothing in it matched; use [`TransactionStore::has_transactions`] to check
/// for any hit. The query is validated for the criterion before anything is
/// matched.
pub fn search(
    store: &TransactionStore,
    criterion: SearchCriterion,
    query: &str,
) -> Result<TransactionStore> {
    let query = query.trim();
    if query.is_empty() {
        return Err(FinanceError::validation("query", "please enter a search query"));
    }

    let matcher = Matcher::new(criterion, query)?;

    let entries = store
        .iter()
        .map(|(category, transactions)| {
            let hits = transactions
                .iter()
                .filter(|tx| matcher.matches(category, tx))
                .cloned()
                .collect();
            (category.clone(), hits)
        })
        .collect();

    Ok(TransactionStore::from_entries(entries))
}

/// Parsed query, one variant per criterion
enum Matcher<'q> {
    Amount(f64),
    Type(&'q str),
    Category(&'q str),
    Date(NaiveDate),
}

impl<'q> Matcher<'q> {
    fn new(criterion: SearchCriterion, query: &'q str) -> Result<Self> {
        match criterion {
            SearchCriterion::Amount => query
                .parse::<f64>()
                .map(Matcher::Amount)
                .map_err(|_| FinanceError::validation("amount", "must be a numeric value")),
            SearchCriterion::Type => {
                TransactionType::parse(query)?;
                Ok(Matcher::Type(query))
            }
            SearchCriterion::Category => Ok(Matcher::Category(query)),
            SearchCriterion::Date => parse_date(query).map(Matcher::Date),
        }
    }

    fn matches(&self, category: &Category, tx: &crate::transaction::Transaction) -> bool {
        match self {
            Matcher::Amount(amount) => tx.amount() == *amount,
            Matcher::Type(query) => tx.transaction_type().matches(query),
            Matcher::Category(query) => category.matches(query),
            Matcher::Date(date) => tx.date() == *date,
        }
    }
}

// ============================================================================
// TABLE ROWS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Amount,
    Date,
    Type,
    Category,
}

impl Column {
    pub const ALL: [Column; 4] = [Column::Amount, Column::Date, Column::Type, Column::Category];

    pub fn title(&self) -> &'static str {
        match self {
            Column::Amount => "Amount",
            Column::Date => "Date",
            Column::Type => "Type",
            Column::Category => "Category",
        }
    }
}

/// One displayed line of the table, every cell as shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    pub amount: String,
    pub date: String,
    pub transaction_type: String,
    pub category: String,
}

impl TransactionRow {
    pub fn cell(&self, column: Column) -> &str {
        match column {
            Column::Amount => &self.amount,
            Column::Date => &self.date,
            Column::Type => &self.transaction_type,
            Column::Category => &self.category,
        }
    }
}

impl TransactionStore {
    /// Flatten to table rows, category order then insertion order
    pub fn rows(&self) -> Vec<TransactionRow> {
        self.transactions()
            .map(|(category, tx)| TransactionRow {
                amount: format_amount(tx.amount()),
                date: tx.date_string(),
                transaction_type: tx.transaction_type().to_string(),
                category: category.to_string(),
            })
            .collect()
    }
}

// ============================================================================
// ORDERING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Compare two rows on one column.
///
/// Amount is numeric, Date chronological, Type and Category lexicographic.
/// A cell that does not parse falls back to text comparison.
pub fn compare(a: &TransactionRow, b: &TransactionRow, column: Column) -> Ordering {
    let (left, right) = (a.cell(column), b.cell(column));
    match column {
        Column::Amount => match (left.parse::<f64>(), right.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.total_cmp(&y),
            _ => left.cmp(right),
        },
        Column::Date => match (
            NaiveDate::parse_from_str(left, DATE_FORMAT),
            NaiveDate::parse_from_str(right, DATE_FORMAT),
        ) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => left.cmp(right),
        },
        Column::Type | Column::Category => left.cmp(right),
    }
}

/// Row indices in display order. Stable in both directions: rows with equal
/// keys keep their relative order.
pub fn sort_key(rows: &[TransactionRow], column: Column, direction: SortDirection) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&i, &j| {
        let ordering = compare(&rows[i], &rows[j], column);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    order
}

/// Reorder rows in place by a column
pub fn sort_rows(rows: &mut Vec<TransactionRow>, column: Column, direction: SortDirection) {
    let order = sort_key(rows, column, direction);
    let mut taken: Vec<Option<TransactionRow>> = rows.drain(..).map(Some).collect();
    rows.extend(order.into_iter().filter_map(|i| taken.get_mut(i).and_then(Option::take)));
}

/// Per-column sort direction of a table session.
///
/// The first request for a column sorts ascending; each further request for
/// the same column flips it. Columns do not affect each other.
#[derive(Debug, Clone, Default)]
pub struct SortState {
    next: HashMap<Column, SortDirection>,
    last: Option<(Column, SortDirection)>,
}

impl SortState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direction to apply now for `column`
    pub fn request(&mut self, column: Column) -> SortDirection {
        let direction = self
            .next
            .get(&column)
            .copied()
            .unwrap_or(SortDirection::Ascending);
        self.next.insert(column, direction.reversed());
        self.last = Some((column, direction));
        direction
    }

    /// Most recently applied column and direction
    pub fn last(&self) -> Option<(Column, SortDirection)> {
        self.last
    }

    pub fn reset(&mut self) {
        self.next.clear();
        self.last = None;
    }
}
