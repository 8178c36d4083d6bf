use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::{PennyError, Result};
use crate::models::ParsedRow;
use crate::payee::payee_key;

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Parse a ledger amount into signed minor units.
///
/// Accepts "$1,234.56", "(42.00)" for negatives, and bare integers.
/// Returns None for anything that does not parse — callers exclude such rows
/// instead of failing the import.
pub fn parse_amount_cents(raw: &str) -> Option<i64> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return parse_amount_cents(inner).map(|c| -c);
    }

    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, s.strip_prefix('+').unwrap_or(s)),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    // "1.5" means 50 cents, "1.50" too; anything past two places is truncated.
    let mut frac_str = format!("{frac:0<2}");
    frac_str.truncate(2);
    let frac: i64 = frac_str.parse().ok()?;

    Some(sign * (whole * 100 + frac))
}

/// Parse a date as either ISO (2026-03-01) or US (3/1/2026) into ISO form.
pub fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d.format("%Y-%m-%d").to_string());
    }
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let m: u32 = parts[0].parse().ok()?;
    let d: u32 = parts[1].parse().ok()?;
    let y: i32 = parts[2].parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(y, m, d).map(|dt| dt.format("%Y-%m-%d").to_string())
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn is_duplicate_row(conn: &Connection, account_id: i64, row: &ParsedRow) -> bool {
    let mut stmt = conn
        .prepare_cached(
            "SELECT 1 FROM transactions WHERE account_id = ?1 AND date = ?2 \
             AND amount_cents = ?3 AND description = ?4",
        )
        .unwrap();
    stmt.exists(rusqlite::params![
        account_id,
        row.date,
        row.amount_cents,
        row.description
    ])
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Parse a ledger CSV with date, description, and amount columns
/// (any order, case-insensitive headers). Rows with an unparseable date or
/// amount are counted and excluded rather than failing the file.
pub fn parse_csv(file_path: &Path) -> Result<(Vec<ParsedRow>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(file_path)?;

    let headers = reader.headers()?.clone();
    let find_col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let date_col = find_col("date")
        .ok_or_else(|| PennyError::Other(format!("{}: no 'date' column", file_path.display())))?;
    let desc_col = find_col("description").ok_or_else(|| {
        PennyError::Other(format!("{}: no 'description' column", file_path.display()))
    })?;
    let amount_col = find_col("amount")
        .ok_or_else(|| PennyError::Other(format!("{}: no 'amount' column", file_path.display())))?;

    let mut rows = Vec::new();
    let mut invalid = 0usize;
    for record in reader.records() {
        let record = record?;
        let date = record.get(date_col).and_then(parse_date);
        let amount = record.get(amount_col).and_then(parse_amount_cents);
        let description = record.get(desc_col).unwrap_or("").trim().to_string();

        match (date, amount) {
            (Some(date), Some(amount_cents)) if amount_cents != 0 && !description.is_empty() => {
                rows.push(ParsedRow {
                    date,
                    description,
                    amount_cents,
                });
            }
            _ => invalid += 1,
        }
    }
    Ok((rows, invalid))
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub duplicate_file: bool,
}

pub fn import_file(
    conn: &Connection,
    file_path: &Path,
    account_name: &str,
) -> Result<ImportResult> {
    let account_id = crate::db::find_account_id(conn, account_name)?
        .ok_or_else(|| PennyError::UnknownAccount(account_name.to_string()))?;

    let checksum = compute_checksum(file_path)?;
    let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
    let already_imported = stmt.exists([&checksum])?;
    if already_imported {
        return Ok(ImportResult {
            imported: 0,
            skipped: 0,
            invalid: 0,
            duplicate_file: true,
        });
    }

    let (rows, invalid) = parse_csv(file_path)?;

    let date_range_start = rows.iter().map(|r| r.date.as_str()).min().map(String::from);
    let date_range_end = rows.iter().map(|r| r.date.as_str()).max().map(String::from);

    conn.execute(
        "INSERT INTO imports (filename, account_id, record_count, date_range_start, date_range_end, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file_path.display().to_string()),
            account_id,
            rows.len() as i64,
            date_range_start,
            date_range_end,
            checksum
        ],
    )?;
    let import_id = conn.last_insert_rowid();

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for row in &rows {
        if is_duplicate_row(conn, account_id, row) {
            skipped += 1;
            continue;
        }
        conn.execute(
            "INSERT INTO transactions (account_id, date, description, amount_cents, payee_key, import_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                account_id,
                row.date,
                row.description,
                row.amount_cents,
                payee_key(&row.description),
                import_id
            ],
        )?;
        imported += 1;
    }

    Ok(ImportResult {
        imported,
        skipped,
        invalid,
        duplicate_file: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use std::io::Write;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn add_account(conn: &Connection, name: &str) {
        conn.execute(
            "INSERT INTO accounts (name, account_type) VALUES (?1, 'checking')",
            [name],
        )
        .unwrap();
    }

    #[test]
    fn test_parse_amount_cents() {
        assert_eq!(parse_amount_cents("1,234.56"), Some(123456));
        assert_eq!(parse_amount_cents("-12.00"), Some(-1200));
        assert_eq!(parse_amount_cents("(42.00)"), Some(-4200));
        assert_eq!(parse_amount_cents("$5"), Some(500));
        assert_eq!(parse_amount_cents("1.5"), Some(150));
        assert_eq!(parse_amount_cents(""), None);
        assert_eq!(parse_amount_cents("abc"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2026-03-01"), Some("2026-03-01".to_string()));
        assert_eq!(parse_date("3/1/2026"), Some("2026-03-01".to_string()));
        assert_eq!(parse_date("13/40/2026"), None);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_import_inserts_rows_with_payee_key() {
        let (dir, conn) = test_db();
        add_account(&conn, "Checking");
        let path = write_csv(
            dir.path(),
            "jan.csv",
            "Date,Description,Amount\n2026-01-05,NETFLIX.COM 12345,-10.99\n2026-01-07,SALARY ACME CORP,2500.00\n",
        );
        let result = import_file(&conn, &path, "Checking").unwrap();
        assert_eq!(result.imported, 2);
        assert_eq!(result.invalid, 0);
        let payee: String = conn
            .query_row(
                "SELECT payee_key FROM transactions WHERE description LIKE 'NETFLIX%'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(payee, "NETFLIX.COM");
        let cents: i64 = conn
            .query_row(
                "SELECT amount_cents FROM transactions WHERE description LIKE 'NETFLIX%'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(cents, -1099);
    }

    #[test]
    fn test_import_skips_malformed_rows() {
        let (dir, conn) = test_db();
        add_account(&conn, "Checking");
        let path = write_csv(
            dir.path(),
            "bad.csv",
            "Date,Description,Amount\nnot-a-date,COFFEE,-4.50\n2026-01-05,,−1.00\n2026-01-06,OK ROW,-2.00\n",
        );
        let result = import_file(&conn, &path, "Checking").unwrap();
        assert_eq!(result.imported, 1);
        assert_eq!(result.invalid, 2);
    }

    #[test]
    fn test_duplicate_file_rejected_by_checksum() {
        let (dir, conn) = test_db();
        add_account(&conn, "Checking");
        let path = write_csv(
            dir.path(),
            "jan.csv",
            "Date,Description,Amount\n2026-01-05,NETFLIX.COM,-10.99\n",
        );
        assert!(!import_file(&conn, &path, "Checking").unwrap().duplicate_file);
        assert!(import_file(&conn, &path, "Checking").unwrap().duplicate_file);
        let count: i64 = conn
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_duplicate_rows_skipped() {
        let (dir, conn) = test_db();
        add_account(&conn, "Checking");
        let a = write_csv(
            dir.path(),
            "a.csv",
            "Date,Description,Amount\n2026-01-05,NETFLIX.COM,-10.99\n",
        );
        // Same row, different file contents so the checksum differs.
        let b = write_csv(
            dir.path(),
            "b.csv",
            "Date,Description,Amount\n2026-01-05,NETFLIX.COM,-10.99\n2026-01-06,SPOTIFY,-9.99\n",
        );
        import_file(&conn, &a, "Checking").unwrap();
        let result = import_file(&conn, &b, "Checking").unwrap();
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_unknown_account_errors() {
        let (dir, conn) = test_db();
        let path = write_csv(dir.path(), "x.csv", "Date,Description,Amount\n");
        assert!(import_file(&conn, &path, "Nope").is_err());
    }
}
