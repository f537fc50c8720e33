use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::ledger::{seed_transactions, Ledger, Transaction};

/// One row of an import CSV (`Date,Amount,Description,Merchant`)
#[derive(Debug, Deserialize, Clone)]
pub struct CsvRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,

    #[serde(rename = "Amount")]
    pub amount: f64,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Merchant")]
    pub merchant: String,
}

/// Outcome of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Compute idempotency hash for duplicate detection.
/// Ids are assigned by the store, so they are not part of the hash.
pub fn compute_idempotency_hash(
    date: NaiveDate,
    amount: f64,
    description: &str,
    merchant: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}{:.2}{}{}",
        date.format("%Y-%m-%d"),
        amount,
        description,
        merchant
    ));
    format!("{:x}", hasher.finalize())
}

pub fn open_database(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            -- NULL for records added by hand; only imports are deduplicated
            idempotency_hash TEXT UNIQUE,
            date TEXT NOT NULL,
            amount REAL NOT NULL,
            description TEXT NOT NULL,
            merchant TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_date ON transactions(date)",
        [],
    )?;

    Ok(())
}

/// Populate an empty store with the demo records so both modes start alike
pub fn seed_if_empty(conn: &Connection) -> Result<usize> {
    if verify_count(conn)? > 0 {
        return Ok(0);
    }

    let mut inserted = 0;
    for tx in seed_transactions() {
        if insert_transaction(conn, tx.date, tx.amount, &tx.description, &tx.merchant)?.is_some() {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Insert one record and return it with its store-assigned id.
/// Returns `None` when an identical record already exists.
pub fn insert_transaction(
    conn: &Connection,
    date: NaiveDate,
    amount: f64,
    description: &str,
    merchant: &str,
) -> Result<Option<Transaction>> {
    let hash = compute_idempotency_hash(date, amount, description, merchant);

    let result = conn.execute(
        "INSERT INTO transactions (idempotency_hash, date, amount, description, merchant)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            hash,
            date.format("%Y-%m-%d").to_string(),
            amount,
            description,
            merchant,
        ],
    );

    match result {
        Ok(_) => Ok(Some(Transaction::new(
            conn.last_insert_rowid(),
            date,
            amount,
            description,
            merchant,
        ))),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Append a record entered by hand. Unlike `insert_transaction` this never
/// deduplicates: two identical purchases are two rows.
pub fn append_transaction(
    conn: &Connection,
    date: NaiveDate,
    amount: f64,
    description: &str,
    merchant: &str,
) -> Result<Transaction> {
    conn.execute(
        "INSERT INTO transactions (idempotency_hash, date, amount, description, merchant)
         VALUES (NULL, ?1, ?2, ?3, ?4)",
        params![
            date.format("%Y-%m-%d").to_string(),
            amount,
            description,
            merchant,
        ],
    )?;

    Ok(Transaction::new(
        conn.last_insert_rowid(),
        date,
        amount,
        description,
        merchant,
    ))
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<CsvRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: CsvRecord = result.context("Failed to deserialize transaction")?;
        records.push(record);
    }

    Ok(records)
}

pub fn insert_records(conn: &Connection, records: &[CsvRecord]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for record in records {
        match insert_transaction(conn, record.date, record.amount, &record.description, &record.merchant)? {
            Some(_) => summary.inserted += 1,
            None => summary.duplicates += 1,
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "import finished"
    );

    Ok(summary)
}

/// All records in insertion order
pub fn get_all_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, amount, description, merchant
         FROM transactions
         ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        let date_str: String = row.get(1)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Transaction {
            id: row.get(0)?,
            date,
            amount: row.get(2)?,
            description: row.get(3)?,
            merchant: row.get(4)?,
        })
    })?;

    let transactions = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(transactions)
}

pub fn load_ledger(conn: &Connection) -> Result<Ledger> {
    Ok(Ledger::new(get_all_transactions(conn)?))
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
    Ok(count)
}
