// Summary - income/expense totals and the per-category narrative
//
//   net_balance = total_income - total_expense
//
// Amounts are always positive; the transaction type decides the side.

use crate::store::TransactionStore;
use crate::transaction::format_amount;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub net_balance: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Income: ${}", format_amount(self.total_income))?;
        writeln!(f, "Total Expense: ${}", format_amount(self.total_expense))?;
        write!(f, "Net Balance: ${}", format_amount(self.net_balance))
    }
}

/// Totals across every category of the store
pub fn summarize(store: &TransactionStore) -> Summary {
    let mut summary = Summary::default();

    for (_, tx) in store.transactions() {
        if tx.is_income() {
            summary.total_income += tx.amount();
        } else {
            summary.total_expense += tx.amount();
        }
    }

    summary.net_balance = summary.total_income - summary.total_expense;
    summary
}

/// One sentence per transaction, category order then insertion order.
///
/// Single-entry categories name the date; longer categories name the range
/// from their first to their last transaction.
pub fn narrate(store: &TransactionStore) -> Vec<String> {
    let mut lines = Vec::new();

    for (category, transactions) in store.iter() {
        let (first, last) = match (transactions.first(), transactions.last()) {
            (Some(first), Some(last)) => (first.date_string(), last.date_string()),
            _ => continue,
        };
        let single = transactions.len() == 1;

        for tx in transactions {
            let amount = format_amount(tx.amount());
            let line = match (tx.is_income(), single) {
                (true, true) => format!(
                    "You received ${} on {} as {}.",
                    amount,
                    tx.date_string(),
                    category
                ),
                (true, false) => format!(
                    "You received ${} between {} and {} as {}.",
                    amount, first, last, category
                ),
                (false, true) => format!(
                    "You spent ${} on {}, on {}.",
                    amount,
                    category,
                    tx.date_string()
                ),
                (false, false) => format!(
                    "You spent ${} on {}, between {} and {}.",
                    amount, category, first, last
                ),
            };
            lines.push(line);
        }
    }

    lines
}
