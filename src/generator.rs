use chrono::{Duration, Months, NaiveDate};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{IntervalKind, PatternStatus};

/// Advance a projected date by one interval. Month-based cadences step by
/// calendar months so a charge anchored on the 1st stays on the 1st; chrono
/// clamps short months (Jan 31 + 1 month = Feb 28).
pub fn step_date(date: NaiveDate, kind: IntervalKind, count: i64) -> NaiveDate {
    match kind {
        IntervalKind::Weekly => date + Duration::days(7 * count),
        IntervalKind::Biweekly => date + Duration::days(14 * count),
        IntervalKind::Monthly => date + Months::new(count as u32),
        IntervalKind::Quarterly => date + Months::new(3 * count as u32),
        IntervalKind::Yearly => date + Months::new(12 * count as u32),
    }
}

struct ActivePattern {
    id: i64,
    interval_kind: IntervalKind,
    interval_count: i64,
    anchor_date: String,
    typical_amount_cents: i64,
}

/// Project future instances for every active pattern, up to `horizon_days`
/// ahead of `today`. Stepping starts from the later of the anchor date and
/// the last materialized instance. Dates that already have a row are left
/// alone (idempotent re-run); nothing beyond the horizon is created.
/// This only inserts rows — materialized and skipped rows are never touched.
pub fn generate(conn: &Connection, horizon_days: i64, today: NaiveDate) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT id, interval_kind, interval_count, anchor_date, typical_amount_cents \
         FROM recurrence_patterns WHERE status = ?1",
    )?;
    let patterns: Vec<ActivePattern> = stmt
        .query_map([PatternStatus::Active.as_str()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .filter_map(|(id, kind, count, anchor, typical)| {
            match IntervalKind::parse(&kind) {
                Ok(interval_kind) => Some(ActivePattern {
                    id,
                    interval_kind,
                    interval_count: count.max(1),
                    anchor_date: anchor,
                    typical_amount_cents: typical,
                }),
                Err(_) => {
                    warn!(pattern = id, kind, "unrecognized interval kind, skipping");
                    None
                }
            }
        })
        .collect();

    let horizon = today + Duration::days(horizon_days);
    let mut created = 0usize;

    for pattern in &patterns {
        let Ok(anchor) = NaiveDate::parse_from_str(&pattern.anchor_date, "%Y-%m-%d") else {
            warn!(pattern = pattern.id, anchor = %pattern.anchor_date, "bad anchor date, skipping");
            continue;
        };

        let last_materialized: Option<String> = conn.query_row(
            "SELECT MAX(projected_date) FROM generated_transactions \
             WHERE recurrence_id = ?1 AND status = 'materialized'",
            [pattern.id],
            |r| r.get(0),
        )?;
        let start = last_materialized
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
            .map(|d| d.max(anchor))
            .unwrap_or(anchor);

        let mut date = step_date(start, pattern.interval_kind, pattern.interval_count);
        while date <= horizon {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO generated_transactions \
                 (recurrence_id, projected_date, amount_cents) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    pattern.id,
                    date.format("%Y-%m-%d").to_string(),
                    pattern.typical_amount_cents
                ],
            )?;
            created += inserted;
            date = step_date(date, pattern.interval_kind, pattern.interval_count);
        }
    }

    info!(created, horizon_days, "projection pass complete");
    Ok(created)
}

struct DueProjection {
    id: i64,
    projected_date: String,
    amount_cents: i64,
    account_id: i64,
    description: String,
    payee_key: String,
}

/// Convert every pending instance of an active pattern whose projected date
/// has passed into a real ledger transaction, linking the new row back.
/// Skipped instances and instances of dismissed patterns are left alone.
pub fn materialize_due(conn: &Connection, today: NaiveDate) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.projected_date, g.amount_cents, p.account_id, p.description, p.payee_key \
         FROM generated_transactions g \
         JOIN recurrence_patterns p ON g.recurrence_id = p.id \
         WHERE g.status = 'pending' AND p.status = 'active' AND g.projected_date <= ?1 \
         ORDER BY g.projected_date",
    )?;
    let due: Vec<DueProjection> = stmt
        .query_map([today.format("%Y-%m-%d").to_string()], |row| {
            Ok(DueProjection {
                id: row.get(0)?,
                projected_date: row.get(1)?,
                amount_cents: row.get(2)?,
                account_id: row.get(3)?,
                description: row.get(4)?,
                payee_key: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for projection in &due {
        conn.execute(
            "INSERT INTO transactions (account_id, date, description, amount_cents, payee_key) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                projection.account_id,
                projection.projected_date,
                projection.description,
                projection.amount_cents,
                projection.payee_key
            ],
        )?;
        let transaction_id = conn.last_insert_rowid();
        conn.execute(
            "UPDATE generated_transactions SET status = 'materialized', transaction_id = ?1 \
             WHERE id = ?2",
            rusqlite::params![transaction_id, projection.id],
        )?;
        info!(
            projection = projection.id,
            date = %projection.projected_date,
            payee = %projection.payee_key,
            "materialized projected transaction"
        );
    }

    Ok(due.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn add_pattern(
        conn: &Connection,
        payee: &str,
        kind: &str,
        anchor: &str,
        cents: i64,
        status: &str,
    ) -> i64 {
        conn.execute(
            "INSERT INTO accounts (name, account_type) VALUES (?1, 'checking') \
             ON CONFLICT(name) DO NOTHING",
            ["Checking"],
        )
        .unwrap();
        let account_id: i64 = conn
            .query_row("SELECT id FROM accounts WHERE name = 'Checking'", [], |r| r.get(0))
            .unwrap();
        conn.execute(
            "INSERT INTO recurrence_patterns \
             (account_id, payee_key, description, amount_min_cents, amount_max_cents, \
              typical_amount_cents, interval_kind, anchor_date, confidence, status, occurrences) \
             VALUES (?1, ?2, ?3, ?4, ?4, ?4, ?5, ?6, 0.9, ?7, 4)",
            rusqlite::params![account_id, payee, payee, cents, kind, anchor, status],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn projection_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT count(*) FROM generated_transactions", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_weekly_horizon_respected() {
        // Weekly pattern anchored today, 60-day horizon: 8 projections,
        // none beyond day 60.
        let (_dir, conn) = test_db();
        let today = day(2026, 3, 1);
        add_pattern(&conn, "CLEANING CO", "weekly", "2026-03-01", -8500, "active");
        let created = generate(&conn, 60, today).unwrap();
        assert_eq!(created, 8);
        let latest: String = conn
            .query_row("SELECT MAX(projected_date) FROM generated_transactions", [], |r| r.get(0))
            .unwrap();
        assert!(latest.as_str() <= "2026-04-30", "projection {latest} beyond horizon");
    }

    #[test]
    fn test_generate_is_idempotent() {
        let (_dir, conn) = test_db();
        let today = day(2026, 3, 1);
        add_pattern(&conn, "NETFLIX.COM", "monthly", "2026-02-05", -1099, "active");
        let first = generate(&conn, 90, today).unwrap();
        assert!(first > 0);
        let second = generate(&conn, 90, today).unwrap();
        assert_eq!(second, 0);
        assert_eq!(projection_count(&conn), first as i64);
    }

    #[test]
    fn test_monthly_steps_stay_on_same_day() {
        let (_dir, conn) = test_db();
        add_pattern(&conn, "RENT LLC", "monthly", "2026-01-01", -120000, "active");
        generate(&conn, 120, day(2026, 1, 1)).unwrap();
        let mut stmt = conn
            .prepare("SELECT projected_date FROM generated_transactions ORDER BY projected_date")
            .unwrap();
        let dates: Vec<String> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(dates, vec!["2026-02-01", "2026-03-01", "2026-04-01", "2026-05-01"]);
    }

    #[test]
    fn test_dismissed_patterns_not_projected() {
        let (_dir, conn) = test_db();
        add_pattern(&conn, "OLD GYM", "monthly", "2026-02-01", -3000, "dismissed");
        add_pattern(&conn, "NEW GYM", "monthly", "2026-02-01", -4500, "candidate");
        let created = generate(&conn, 90, day(2026, 3, 1)).unwrap();
        assert_eq!(created, 0);
    }

    #[test]
    fn test_materialize_due_converts_and_links() {
        let (_dir, conn) = test_db();
        let pattern = add_pattern(&conn, "NETFLIX.COM", "monthly", "2026-01-05", -1099, "active");
        generate(&conn, 90, day(2026, 1, 5)).unwrap();

        let materialized = materialize_due(&conn, day(2026, 3, 6)).unwrap();
        assert_eq!(materialized, 2); // Feb 5 and Mar 5 have passed

        let txns: i64 = conn
            .query_row("SELECT count(*) FROM transactions WHERE payee_key = 'NETFLIX.COM'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(txns, 2);

        let unlinked: i64 = conn
            .query_row(
                "SELECT count(*) FROM generated_transactions \
                 WHERE status = 'materialized' AND transaction_id IS NULL",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(unlinked, 0);

        // Re-running materializes nothing new.
        assert_eq!(materialize_due(&conn, day(2026, 3, 6)).unwrap(), 0);
        let _ = pattern;
    }

    #[test]
    fn test_generation_resumes_after_materialization() {
        let (_dir, conn) = test_db();
        add_pattern(&conn, "NETFLIX.COM", "monthly", "2026-01-05", -1099, "active");
        generate(&conn, 35, day(2026, 1, 5)).unwrap(); // Feb 5 only
        materialize_due(&conn, day(2026, 2, 6)).unwrap();

        // Next daily run: stepping resumes from the materialized Feb 5.
        let created = generate(&conn, 35, day(2026, 2, 6)).unwrap();
        assert_eq!(created, 1);
        let latest: String = conn
            .query_row("SELECT MAX(projected_date) FROM generated_transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(latest, "2026-03-05");
    }

    #[test]
    fn test_skipped_rows_never_materialized_or_recreated() {
        let (_dir, conn) = test_db();
        add_pattern(&conn, "NETFLIX.COM", "monthly", "2026-01-05", -1099, "active");
        generate(&conn, 35, day(2026, 1, 5)).unwrap();
        conn.execute(
            "UPDATE generated_transactions SET status = 'skipped' WHERE projected_date = '2026-02-05'",
            [],
        )
        .unwrap();

        assert_eq!(materialize_due(&conn, day(2026, 3, 1)).unwrap(), 0);
        // The skipped date is not re-projected.
        generate(&conn, 35, day(2026, 1, 5)).unwrap();
        let status: String = conn
            .query_row(
                "SELECT status FROM generated_transactions WHERE projected_date = '2026-02-05'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(status, "skipped");
    }

    #[test]
    fn test_step_date_month_end_clamps() {
        assert_eq!(
            step_date(day(2026, 1, 31), IntervalKind::Monthly, 1),
            day(2026, 2, 28)
        );
        assert_eq!(
            step_date(day(2026, 3, 10), IntervalKind::Biweekly, 1),
            day(2026, 3, 24)
        );
        assert_eq!(
            step_date(day(2026, 3, 10), IntervalKind::Quarterly, 1),
            day(2026, 6, 10)
        );
    }
}
