use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{IntervalKind, PatternStatus};

/// Share of deltas that must land within tolerance of the chosen interval.
const MIN_INTERVAL_SHARE: f64 = 0.8;

/// Occurrence count at which the count half of the confidence score saturates.
const COUNT_SATURATION: f64 = 6.0;

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub lookback_months: u32,
    pub min_occurrences: usize,
    pub interval_tolerance_days: i64,
    pub amount_tolerance: f64,
    pub activation_confidence: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            lookback_months: 12,
            min_occurrences: 3,
            interval_tolerance_days: 3,
            amount_tolerance: 0.15,
            activation_confidence: 0.6,
        }
    }
}

#[derive(Debug, Default)]
pub struct DetectionSummary {
    pub accounts_scanned: usize,
    pub accounts_skipped: usize,
    pub groups_scanned: usize,
    pub created: usize,
    pub updated: usize,
    pub activated: usize,
    pub invalid_rows: usize,
}

impl DetectionSummary {
    fn absorb(&mut self, other: DetectionSummary) {
        self.accounts_scanned += other.accounts_scanned;
        self.accounts_skipped += other.accounts_skipped;
        self.groups_scanned += other.groups_scanned;
        self.created += other.created;
        self.updated += other.updated;
        self.activated += other.activated;
        self.invalid_rows += other.invalid_rows;
    }
}

struct Observation {
    date: NaiveDate,
    amount_cents: i64,
    description: String,
}

/// A qualifying fit of a payee group against one recognized interval.
struct IntervalFit {
    kind: IntervalKind,
    variance: f64,
}

fn median_i64(values: &mut [i64]) -> i64 {
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2
    } else {
        values[mid]
    }
}

fn median_f64(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Pick the recognized interval whose base the deltas cluster around.
/// Ties between qualifying intervals prefer the lowest variance.
fn best_interval(deltas: &[i64], tolerance: i64) -> Option<IntervalFit> {
    if deltas.is_empty() {
        return None;
    }
    let mut best: Option<IntervalFit> = None;
    for kind in IntervalKind::ALL {
        let base = kind.base_days();
        let within = deltas
            .iter()
            .filter(|&&d| (d - base).abs() <= tolerance)
            .count();
        let share = within as f64 / deltas.len() as f64;
        if share < MIN_INTERVAL_SHARE {
            continue;
        }
        let variance = deltas
            .iter()
            .map(|&d| {
                let diff = (d - base) as f64;
                diff * diff
            })
            .sum::<f64>()
            / deltas.len() as f64;
        if best.as_ref().map(|b| variance < b.variance).unwrap_or(true) {
            best = Some(IntervalFit { kind: *kind, variance });
        }
    }
    best
}

/// Amounts qualify when every one sits within the relative tolerance band
/// around the median. Mixed-sign groups never qualify.
fn amounts_stable(amounts: &[i64], tolerance: f64) -> Option<i64> {
    let mut sorted = amounts.to_vec();
    let median = median_i64(&mut sorted);
    if median == 0 {
        return None;
    }
    let band = tolerance * median.abs() as f64;
    let stable = amounts
        .iter()
        .all(|&a| (a - median).abs() as f64 <= band && a.signum() == median.signum());
    stable.then_some(median)
}

/// Weighted blend of how many occurrences back the pattern and how tightly
/// the deltas cluster. Both halves are in 0..=1.
fn confidence_score(occurrences: usize, deltas: &[i64], tolerance: i64) -> f64 {
    let count_score = (occurrences as f64 / COUNT_SATURATION).min(1.0);

    let mut sorted: Vec<f64> = deltas.iter().map(|&d| d as f64).collect();
    let median_delta = median_f64(&mut sorted);
    let mad = deltas
        .iter()
        .map(|&d| (d as f64 - median_delta).abs())
        .sum::<f64>()
        / deltas.len() as f64;
    let regularity = (1.0 - mad / tolerance as f64).clamp(0.0, 1.0);

    0.5 * count_score + 0.5 * regularity
}

/// Most frequent raw description in the group; ties go to the later charge.
fn dominant_description(observations: &[Observation]) -> String {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, obs) in observations.iter().enumerate() {
        let entry = counts.entry(obs.description.as_str()).or_insert((0, idx));
        entry.0 += 1;
        entry.1 = idx;
    }
    counts
        .into_iter()
        .max_by_key(|(_, (count, last))| (*count, *last))
        .map(|(desc, _)| desc.to_string())
        .unwrap_or_default()
}

fn load_groups(
    conn: &Connection,
    account_id: i64,
    since: NaiveDate,
) -> Result<(HashMap<String, Vec<Observation>>, usize)> {
    let mut stmt = conn.prepare(
        "SELECT date, description, amount_cents, payee_key FROM transactions \
         WHERE account_id = ?1 AND date >= ?2 ORDER BY date",
    )?;
    let rows: Vec<(String, String, i64, String)> = stmt
        .query_map(
            rusqlite::params![account_id, since.format("%Y-%m-%d").to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut groups: HashMap<String, Vec<Observation>> = HashMap::new();
    let mut invalid = 0usize;
    for (date, description, amount_cents, payee) in rows {
        // Malformed rows are excluded from pattern computation, not fatal.
        let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok();
        match parsed {
            Some(d) if amount_cents != 0 && !payee.is_empty() => {
                groups.entry(payee).or_default().push(Observation {
                    date: d,
                    amount_cents,
                    description,
                });
            }
            _ => invalid += 1,
        }
    }
    Ok((groups, invalid))
}

/// Scan one account's history and upsert recurrence patterns.
///
/// Existing rows keep their status: a dismissed pattern is never re-activated
/// here, and a candidate is promoted only when its recomputed confidence
/// reaches the activation threshold.
pub fn detect_account(
    conn: &Connection,
    account_id: i64,
    config: &DetectorConfig,
    today: NaiveDate,
) -> Result<DetectionSummary> {
    let since = today
        .checked_sub_months(Months::new(config.lookback_months))
        .unwrap_or(NaiveDate::MIN);

    let (groups, invalid_rows) = load_groups(conn, account_id, since)?;

    let mut summary = DetectionSummary {
        accounts_scanned: 1,
        invalid_rows,
        ..Default::default()
    };

    for (payee, mut observations) in groups {
        if observations.len() < config.min_occurrences {
            continue;
        }
        summary.groups_scanned += 1;
        observations.sort_by_key(|o| o.date);

        let deltas: Vec<i64> = observations
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .collect();

        let Some(fit) = best_interval(&deltas, config.interval_tolerance_days) else {
            debug!(payee = %payee, "deltas do not cluster around a recognized interval");
            continue;
        };

        let amounts: Vec<i64> = observations.iter().map(|o| o.amount_cents).collect();
        let Some(typical) = amounts_stable(&amounts, config.amount_tolerance) else {
            debug!(payee = %payee, "amounts outside the tolerance band");
            continue;
        };

        let confidence =
            confidence_score(observations.len(), &deltas, config.interval_tolerance_days);
        // A qualifying group has at least two observations.
        let Some(anchor) = observations.last().map(|o| o.date) else {
            continue;
        };
        let min = amounts.iter().copied().min().unwrap_or(typical);
        let max = amounts.iter().copied().max().unwrap_or(typical);
        let description = dominant_description(&observations);

        upsert_pattern(
            conn,
            account_id,
            &payee,
            &description,
            (min, max, typical),
            fit.kind,
            anchor,
            confidence,
            observations.len() as i64,
            config.activation_confidence,
            &mut summary,
        )?;
    }

    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
fn upsert_pattern(
    conn: &Connection,
    account_id: i64,
    payee: &str,
    description: &str,
    (min, max, typical): (i64, i64, i64),
    kind: IntervalKind,
    anchor: NaiveDate,
    confidence: f64,
    occurrences: i64,
    activation_confidence: f64,
    summary: &mut DetectionSummary,
) -> Result<()> {
    let anchor = anchor.format("%Y-%m-%d").to_string();
    let mut stmt = conn.prepare(
        "SELECT id, status FROM recurrence_patterns WHERE account_id = ?1 AND payee_key = ?2",
    )?;
    let existing: Option<(i64, String)> = stmt
        .query_map(rusqlite::params![account_id, payee], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .next()
        .transpose()?;

    match existing {
        Some((id, status)) => {
            let status = PatternStatus::parse(&status)?;
            let promote =
                status == PatternStatus::Candidate && confidence >= activation_confidence;
            let new_status = if promote { PatternStatus::Active } else { status };
            conn.execute(
                "UPDATE recurrence_patterns SET description = ?1, amount_min_cents = ?2, \
                 amount_max_cents = ?3, typical_amount_cents = ?4, interval_kind = ?5, \
                 anchor_date = ?6, confidence = ?7, status = ?8, occurrences = ?9, \
                 updated_at = datetime('now') WHERE id = ?10",
                rusqlite::params![
                    description,
                    min,
                    max,
                    typical,
                    kind.as_str(),
                    anchor,
                    confidence,
                    new_status.as_str(),
                    occurrences,
                    id
                ],
            )?;
            summary.updated += 1;
            if promote {
                summary.activated += 1;
                info!(payee, confidence, "pattern confirmed automatically");
            }
        }
        None => {
            let status = if confidence >= activation_confidence {
                PatternStatus::Active
            } else {
                PatternStatus::Candidate
            };
            conn.execute(
                "INSERT INTO recurrence_patterns \
                 (account_id, payee_key, description, amount_min_cents, amount_max_cents, \
                  typical_amount_cents, interval_kind, anchor_date, confidence, status, occurrences) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    account_id,
                    payee,
                    description,
                    min,
                    max,
                    typical,
                    kind.as_str(),
                    anchor,
                    confidence,
                    status.as_str(),
                    occurrences
                ],
            )?;
            summary.created += 1;
            if status == PatternStatus::Active {
                summary.activated += 1;
            }
            info!(
                payee,
                interval = kind.as_str(),
                confidence,
                status = status.as_str(),
                "new recurring pattern"
            );
        }
    }
    Ok(())
}

/// Run detection across every account. Accounts with fewer than
/// `min_occurrences` transactions are skipped, not errored.
pub fn detect_all(
    conn: &Connection,
    config: &DetectorConfig,
    today: NaiveDate,
) -> Result<DetectionSummary> {
    let mut stmt = conn.prepare("SELECT id FROM accounts ORDER BY id")?;
    let accounts: Vec<i64> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut summary = DetectionSummary::default();
    for account_id in accounts {
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM transactions WHERE account_id = ?1",
            [account_id],
            |r| r.get(0),
        )?;
        if (count as usize) < config.min_occurrences {
            summary.accounts_skipped += 1;
            debug!(account_id, count, "too few transactions, skipping");
            continue;
        }
        summary.absorb(detect_account(conn, account_id, config, today)?);
    }
    Ok(summary)
}
