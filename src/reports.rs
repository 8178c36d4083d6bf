use chrono::{Duration, NaiveDate};
use rusqlite::Connection;

use crate::error::Result;
use crate::models::IntervalKind;

// ---------------------------------------------------------------------------
// Upcoming projections
// ---------------------------------------------------------------------------

pub struct UpcomingItem {
    pub id: i64,
    pub projected_date: String,
    pub account_name: String,
    pub description: String,
    pub amount_cents: i64,
    pub confidence: f64,
}

/// Pending projected transactions inside the window, soonest first.
pub fn get_upcoming(conn: &Connection, days: i64, today: NaiveDate) -> Result<Vec<UpcomingItem>> {
    let until = today + Duration::days(days);
    let mut stmt = conn.prepare(
        "SELECT g.id, g.projected_date, a.name, p.description, g.amount_cents, p.confidence \
         FROM generated_transactions g \
         JOIN recurrence_patterns p ON g.recurrence_id = p.id \
         JOIN accounts a ON p.account_id = a.id \
         WHERE g.status = 'pending' AND g.projected_date <= ?1 \
         ORDER BY g.projected_date, a.name",
    )?;
    let rows = stmt
        .query_map([until.format("%Y-%m-%d").to_string()], |row| {
            Ok(UpcomingItem {
                id: row.get(0)?,
                projected_date: row.get(1)?,
                account_name: row.get(2)?,
                description: row.get(3)?,
                amount_cents: row.get(4)?,
                confidence: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Recurring cost rollup
// ---------------------------------------------------------------------------

pub struct RecurringCostItem {
    pub account_name: String,
    pub payee_key: String,
    pub interval_kind: String,
    pub typical_amount_cents: i64,
    pub monthly_equivalent_cents: i64,
}

pub struct RecurringCostReport {
    pub items: Vec<RecurringCostItem>,
    pub total_monthly_outflow_cents: i64,
    pub total_monthly_inflow_cents: i64,
}

/// Normalize an amount on some cadence to a per-month figure.
fn monthly_equivalent(cents: i64, kind: IntervalKind, count: i64) -> i64 {
    let days = (kind.base_days() * count.max(1)) as f64;
    (cents as f64 * 30.0 / days).round() as i64
}

/// Monthly-equivalent cost of every active pattern, biggest outflow first.
pub fn get_recurring_costs(conn: &Connection, account: Option<&str>) -> Result<RecurringCostReport> {
    let mut sql = String::from(
        "SELECT a.name, p.payee_key, p.interval_kind, p.interval_count, p.typical_amount_cents \
         FROM recurrence_patterns p JOIN accounts a ON p.account_id = a.id \
         WHERE p.status = 'active'",
    );
    let mut params: Vec<String> = Vec::new();
    if let Some(account) = account {
        params.push(account.to_string());
        sql.push_str(" AND a.name = ?1");
    }

    let mut stmt = conn.prepare(&sql)?;
    let param_values: Vec<&dyn rusqlite::types::ToSql> = params
        .iter()
        .map(|p| p as &dyn rusqlite::types::ToSql)
        .collect();
    let raw: Vec<(String, String, String, i64, i64)> = stmt
        .query_map(param_values.as_slice(), |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut items = Vec::new();
    for (account_name, payee_key, kind_str, count, typical) in raw {
        let kind = IntervalKind::parse(&kind_str)?;
        items.push(RecurringCostItem {
            account_name,
            payee_key,
            monthly_equivalent_cents: monthly_equivalent(typical, kind, count),
            interval_kind: kind_str,
            typical_amount_cents: typical,
        });
    }
    items.sort_by_key(|i| i.monthly_equivalent_cents);

    let total_monthly_outflow_cents = items
        .iter()
        .filter(|i| i.monthly_equivalent_cents < 0)
        .map(|i| i.monthly_equivalent_cents)
        .sum();
    let total_monthly_inflow_cents = items
        .iter()
        .filter(|i| i.monthly_equivalent_cents > 0)
        .map(|i| i.monthly_equivalent_cents)
        .sum();

    Ok(RecurringCostReport {
        items,
        total_monthly_outflow_cents,
        total_monthly_inflow_cents,
    })
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

    fn seed(conn: &Connection) -> i64 {
        conn.execute(
            "INSERT INTO accounts (name, account_type) VALUES ('Checking', 'checking')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO recurrence_patterns \
             (account_id, payee_key, description, amount_min_cents, amount_max_cents, \
              typical_amount_cents, interval_kind, anchor_date, confidence, status) \
             VALUES (1, 'NETFLIX.COM', 'NETFLIX.COM', -1099, -1099, -1099, 'monthly', '2026-01-05', 0.9, 'active')",
            [],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn test_upcoming_window_and_order() {
        let (_dir, conn) = test_db();
        let id = seed(&conn);
        for date in ["2026-03-05", "2026-02-05", "2026-06-05"] {
            conn.execute(
                "INSERT INTO generated_transactions (recurrence_id, projected_date, amount_cents) \
                 VALUES (?1, ?2, -1099)",
                rusqlite::params![id, date],
            )
            .unwrap();
        }
        let items =
            get_upcoming(&conn, 60, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()).unwrap();
        let dates: Vec<&str> = items.iter().map(|i| i.projected_date.as_str()).collect();
        assert_eq!(dates, vec!["2026-02-05", "2026-03-05"]);
    }

    #[test]
    fn test_monthly_equivalent() {
        assert_eq!(monthly_equivalent(-1099, IntervalKind::Monthly, 1), -1099);
        assert_eq!(monthly_equivalent(-700, IntervalKind::Weekly, 1), -3000);
        assert_eq!(monthly_equivalent(-36500, IntervalKind::Yearly, 1), -3000);
        assert_eq!(monthly_equivalent(-9100, IntervalKind::Quarterly, 1), -3000);
    }

    #[test]
    fn test_recurring_costs_totals() {
        let (_dir, conn) = test_db();
        seed(&conn);
        conn.execute(
            "INSERT INTO recurrence_patterns \
             (account_id, payee_key, description, amount_min_cents, amount_max_cents, \
              typical_amount_cents, interval_kind, anchor_date, confidence, status) \
             VALUES (1, 'ACME PAYROLL', 'ACME PAYROLL', 520000, 520000, 520000, 'monthly', '2026-01-01', 0.9, 'active'), \
                    (1, 'OLD GYM', 'OLD GYM', -3000, -3000, -3000, 'monthly', '2026-01-01', 0.9, 'dismissed')",
            [],
        )
        .unwrap();
        let report = get_recurring_costs(&conn, None).unwrap();
        assert_eq!(report.items.len(), 2, "dismissed pattern included");
        assert_eq!(report.total_monthly_outflow_cents, -1099);
        assert_eq!(report.total_monthly_inflow_cents, 520000);
    }
}
