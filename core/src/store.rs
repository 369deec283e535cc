//! SQLite persistence for users and transactions.
//!
//! RULE: Only store.rs talks to the database. Everything else goes
//! through the TransactionSource trait or the store's typed methods.

use crate::{
    error::AssessResult,
    source::{TransactionSource, UserProfile},
    transaction::{Channel, Transaction, TxnStatus},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use std::sync::Mutex;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id           TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    registration_date TEXT NOT NULL,
    risk_segment      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    txn_id    TEXT NOT NULL UNIQUE,
    user_id   TEXT NOT NULL REFERENCES users(user_id),
    timestamp TEXT NOT NULL,
    amount    REAL NOT NULL,
    category  TEXT NOT NULL,
    status    TEXT NOT NULL,
    channel   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_txn_user_ts
    ON transactions(user_id, timestamp);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> AssessResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AssessResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn migrate(&self) -> AssessResult<()> {
        self.conn.lock().unwrap().execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn insert_user(&self, profile: &UserProfile) -> AssessResult<()> {
        self.conn.lock().unwrap().execute(
            "INSERT INTO users (user_id, name, registration_date, risk_segment)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                profile.user_id,
                profile.name,
                profile.registration_date.to_rfc3339(),
                profile.risk_segment,
            ],
        )?;
        Ok(())
    }

    pub fn insert_transaction(&self, txn: &Transaction) -> AssessResult<()> {
        self.conn.lock().unwrap().execute(
            "INSERT INTO transactions
                (txn_id, user_id, timestamp, amount, category, status, channel)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                txn.id,
                txn.user_id,
                txn.timestamp.to_rfc3339(),
                txn.amount,
                txn.category,
                txn.status.as_str(),
                txn.channel.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn user_count(&self) -> AssessResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn get_user(&self, user_id: &str) -> AssessResult<Option<UserProfile>> {
        let conn = self.conn.lock().unwrap();
        let profile = conn
            .query_row(
                "SELECT user_id, name, registration_date, risk_segment
                 FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserProfile {
                        user_id: row.get(0)?,
                        name: row.get(1)?,
                        registration_date: parse_timestamp(row.get::<_, String>(2)?, 2)?,
                        risk_segment: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    pub fn all_users(&self) -> AssessResult<Vec<UserProfile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, name, registration_date, risk_segment
             FROM users ORDER BY user_id ASC",
        )?;
        let users = stmt
            .query_map([], |row| {
                Ok(UserProfile {
                    user_id: row.get(0)?,
                    name: row.get(1)?,
                    registration_date: parse_timestamp(row.get::<_, String>(2)?, 2)?,
                    risk_segment: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn transactions_for_user(&self, user_id: &str) -> AssessResult<Vec<Transaction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT txn_id, user_id, timestamp, amount, category, status, channel
             FROM transactions WHERE user_id = ?1
             ORDER BY timestamp ASC",
        )?;
        let txns = stmt
            .query_map(params![user_id], |row| {
                Ok(Transaction {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    timestamp: parse_timestamp(row.get::<_, String>(2)?, 2)?,
                    amount: row.get(3)?,
                    category: row.get(4)?,
                    status: parse_enum::<TxnStatus>(row.get::<_, String>(5)?, 5)?,
                    channel: parse_enum::<Channel>(row.get::<_, String>(6)?, 6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(txns)
    }
}

impl TransactionSource for SqliteStore {
    fn user_profile(&self, user_id: &str) -> AssessResult<Option<UserProfile>> {
        self.get_user(user_id)
    }

    fn user_transactions(&self, user_id: &str) -> AssessResult<Vec<Transaction>> {
        self.transactions_for_user(user_id)
    }
}

fn parse_timestamp(raw: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn parse_enum<T>(raw: String, column: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = crate::transaction::ParseEnumError>,
{
    T::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}
