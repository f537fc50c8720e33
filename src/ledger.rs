// 📒 Ledger - Transaction records, search and sorting
// The whole ledger is an owned list; callers rebuild it per request
// (seeded mode) or load it from the SQLite store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================================================
// TRANSACTION
// ============================================================================

/// A single ledger record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,

    /// Business date of the transaction (YYYY-MM-DD)
    pub date: NaiveDate,

    pub amount: f64,

    pub description: String,

    pub merchant: String,
}

impl Transaction {
    pub fn new(id: i64, date: NaiveDate, amount: f64, description: &str, merchant: &str) -> Self {
        Self {
            id,
            date,
            amount,
            description: description.to_string(),
            merchant: merchant.to_string(),
        }
    }

    /// Whole days between the transaction date and `today`
    pub fn days_since(&self, today: NaiveDate) -> i64 {
        days_since(self.date, today)
    }
}

/// Whole days between the transaction date and the current moment.
/// Future dates are measured from some time during `today` to midnight of
/// `date`, so they come out one day short of the calendar difference.
pub fn days_since(date: NaiveDate, today: NaiveDate) -> i64 {
    let days = (today - date).num_days();
    if days >= 0 {
        days
    } else {
        -days - 1
    }
}

// ============================================================================
// SORT KEY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Newest first
    Date,
    /// Largest first
    Amount,
}

impl SortKey {
    /// Parse the `sort` query value. Unknown values mean "leave the order alone".
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "date" => Some(SortKey::Date),
            "amount" => Some(SortKey::Amount),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Amount => "amount",
        }
    }

    fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        match self {
            SortKey::Date => b.date.cmp(&a.date),
            SortKey::Amount => b.amount.total_cmp(&a.amount),
        }
    }
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// The two demo records every fresh ledger starts with
    pub fn seeded() -> Self {
        Self::new(seed_transactions())
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn find_by_id(&self, id: i64) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    /// Case-insensitive substring search over descriptions, in ledger order
    pub fn find_by_description(&self, part: &str) -> Vec<Transaction> {
        let needle = part.to_lowercase();

        self.transactions
            .iter()
            .filter(|tx| tx.description.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Stable sort: records with equal keys keep their relative order
    pub fn sort(&mut self, key: SortKey) {
        self.transactions.sort_by(|a, b| key.compare(a, b));
    }

    /// Append a record with the next sequential id (len + 1)
    pub fn add(&mut self, date: NaiveDate, amount: f64, description: &str, merchant: &str) -> &Transaction {
        let id = self.next_id();
        self.push(Transaction::new(id, date, amount, description, merchant))
    }

    /// Append an already-identified record (used when the store assigns ids)
    pub fn push(&mut self, transaction: Transaction) -> &Transaction {
        self.transactions.push(transaction);
        &self.transactions[self.transactions.len() - 1]
    }

    pub fn next_id(&self) -> i64 {
        self.transactions.len() as i64 + 1
    }

    pub fn total_amount(&self) -> f64 {
        total_amount(&self.transactions)
    }
}

pub fn total_amount(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(|tx| tx.amount).sum()
}

pub fn seed_transactions() -> Vec<Transaction> {
    vec![
        Transaction::new(
            1,
            NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default(),
            100.00,
            "Payment for groceries",
            "SuperMart",
        ),
        Transaction::new(
            2,
            NaiveDate::from_ymd_opt(2020, 2, 15).unwrap_or_default(),
            75.50,
            "Dinner with friends",
            "Local Restaurant",
        ),
    ]
}
