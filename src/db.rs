use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    account_type TEXT NOT NULL,
    institution TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount_cents INTEGER NOT NULL,
    payee_key TEXT NOT NULL,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_account_payee
    ON transactions(account_id, payee_key);

CREATE TABLE IF NOT EXISTS recurrence_patterns (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    payee_key TEXT NOT NULL,
    description TEXT NOT NULL,
    amount_min_cents INTEGER NOT NULL,
    amount_max_cents INTEGER NOT NULL,
    typical_amount_cents INTEGER NOT NULL,
    interval_kind TEXT NOT NULL,
    interval_count INTEGER NOT NULL DEFAULT 1,
    anchor_date TEXT NOT NULL,
    confidence REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'candidate',
    occurrences INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    UNIQUE (account_id, payee_key),
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS generated_transactions (
    id INTEGER PRIMARY KEY,
    recurrence_id INTEGER NOT NULL,
    projected_date TEXT NOT NULL,
    amount_cents INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    transaction_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (recurrence_id, projected_date),
    FOREIGN KEY (recurrence_id) REFERENCES recurrence_patterns(id),
    FOREIGN KEY (transaction_id) REFERENCES transactions(id)
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn find_account_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE name = ?1")?;
    let mut rows = stmt.query_map([name], |row| row.get(0))?;
    Ok(rows.next().transpose()?)
}
