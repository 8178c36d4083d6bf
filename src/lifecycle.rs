use rusqlite::Connection;

use crate::error::{PennyError, Result};
use crate::models::PatternStatus;

/// One row of `patterns list`.
pub struct PatternSummary {
    pub id: i64,
    pub account_name: String,
    pub payee_key: String,
    pub interval_kind: String,
    pub typical_amount_cents: i64,
    pub confidence: f64,
    pub status: String,
    pub anchor_date: String,
}

pub fn list_patterns(
    conn: &Connection,
    account: Option<&str>,
    status: Option<&str>,
) -> Result<Vec<PatternSummary>> {
    let mut sql = String::from(
        "SELECT p.id, a.name, p.payee_key, p.interval_kind, p.typical_amount_cents, \
                p.confidence, p.status, p.anchor_date \
         FROM recurrence_patterns p JOIN accounts a ON p.account_id = a.id",
    );
    let mut clauses = Vec::new();
    let mut params: Vec<String> = Vec::new();
    if let Some(account) = account {
        params.push(account.to_string());
        clauses.push(format!("a.name = ?{}", params.len()));
    }
    if let Some(status) = status {
        PatternStatus::parse(status)?;
        params.push(status.to_string());
        clauses.push(format!("p.status = ?{}", params.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY a.name, p.payee_key");

    let mut stmt = conn.prepare(&sql)?;
    let param_values: Vec<&dyn rusqlite::types::ToSql> = params
        .iter()
        .map(|p| p as &dyn rusqlite::types::ToSql)
        .collect();
    let rows = stmt
        .query_map(param_values.as_slice(), |row| {
            Ok(PatternSummary {
                id: row.get(0)?,
                account_name: row.get(1)?,
                payee_key: row.get(2)?,
                interval_kind: row.get(3)?,
                typical_amount_cents: row.get(4)?,
                confidence: row.get(5)?,
                status: row.get(6)?,
                anchor_date: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn pattern_status(conn: &Connection, id: i64) -> Result<PatternStatus> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM recurrence_patterns WHERE id = ?1",
            [id],
            |r| r.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;
    let status = status.ok_or(PennyError::UnknownPattern(id))?;
    PatternStatus::parse(&status)
}

fn set_status(conn: &Connection, id: i64, status: PatternStatus) -> Result<()> {
    conn.execute(
        "UPDATE recurrence_patterns SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        rusqlite::params![status.as_str(), id],
    )?;
    Ok(())
}

/// Confirm a pattern: candidate → active, or re-activate a dismissed one.
/// Re-activation is user-only; the detector never does this.
pub fn confirm_pattern(conn: &Connection, id: i64) -> Result<PatternStatus> {
    pattern_status(conn, id)?;
    set_status(conn, id, PatternStatus::Active)?;
    Ok(PatternStatus::Active)
}

/// Dismiss a pattern and mark its still-pending projections skipped so the
/// daily run will not materialize them.
pub fn dismiss_pattern(conn: &Connection, id: i64) -> Result<PatternStatus> {
    pattern_status(conn, id)?;
    set_status(conn, id, PatternStatus::Dismissed)?;
    conn.execute(
        "UPDATE generated_transactions SET status = 'skipped' \
         WHERE recurrence_id = ?1 AND status = 'pending'",
        [id],
    )?;
    Ok(PatternStatus::Dismissed)
}

/// Mark one pending projection skipped. Materialized rows are immutable.
pub fn skip_projection(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE generated_transactions SET status = 'skipped' \
         WHERE id = ?1 AND status = 'pending'",
        [id],
    )?;
    if changed == 0 {
        return Err(PennyError::UnknownProjection(id));
    }
    Ok(())
}
