use crate::error::PennyError;

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_type: String,
    pub institution: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub account_id: i64,
    pub date: String,
    pub description: String,
    pub amount_cents: i64,
    pub payee_key: String,
    pub import_id: Option<i64>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub id: Option<i64>,
    pub filename: String,
    pub account_id: i64,
    pub record_count: Option<i64>,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
    pub checksum: Option<String>,
}

/// Intermediate representation from the CSV parser before DB insert.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub date: String,
    pub description: String,
    pub amount_cents: i64,
}

/// Recognized cadences for recurring charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalKind {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl IntervalKind {
    pub const ALL: &'static [IntervalKind] = &[
        Self::Weekly,
        Self::Biweekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Yearly,
    ];

    /// Nominal length in days, used for delta clustering and cost rollups.
    pub fn base_days(&self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Biweekly => 14,
            Self::Monthly => 30,
            Self::Quarterly => 91,
            Self::Yearly => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PennyError> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(PennyError::Other(format!("unknown interval kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternStatus {
    Candidate,
    Active,
    Dismissed,
}

impl PatternStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::Active => "active",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PennyError> {
        match s {
            "candidate" => Ok(Self::Candidate),
            "active" => Ok(Self::Active),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(PennyError::Other(format!("unknown pattern status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedStatus {
    Pending,
    Materialized,
    Skipped,
}

impl GeneratedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Materialized => "materialized",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PennyError> {
        match s {
            "pending" => Ok(Self::Pending),
            "materialized" => Ok(Self::Materialized),
            "skipped" => Ok(Self::Skipped),
            other => Err(PennyError::Other(format!(
                "unknown projection status: {other}"
            ))),
        }
    }
}

/// A detected recurring relationship for one (account, payee) pair.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecurrencePattern {
    pub id: Option<i64>,
    pub account_id: i64,
    pub payee_key: String,
    pub description: String,
    pub amount_min_cents: i64,
    pub amount_max_cents: i64,
    pub typical_amount_cents: i64,
    pub interval_kind: IntervalKind,
    pub interval_count: i64,
    pub anchor_date: String,
    pub confidence: f64,
    pub status: PatternStatus,
    pub occurrences: i64,
}

/// A projected future instance of a recurrence pattern.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct GeneratedTransaction {
    pub id: Option<i64>,
    pub recurrence_id: i64,
    pub projected_date: String,
    pub amount_cents: i64,
    pub status: GeneratedStatus,
    pub transaction_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_kind_roundtrip() {
        for kind in IntervalKind::ALL {
            assert_eq!(IntervalKind::parse(kind.as_str()).unwrap(), *kind);
        }
        assert!(IntervalKind::parse("fortnightly").is_err());
    }

    #[test]
    fn test_interval_base_days() {
        assert_eq!(IntervalKind::Weekly.base_days(), 7);
        assert_eq!(IntervalKind::Biweekly.base_days(), 14);
        assert_eq!(IntervalKind::Monthly.base_days(), 30);
        assert_eq!(IntervalKind::Quarterly.base_days(), 91);
        assert_eq!(IntervalKind::Yearly.base_days(), 365);
    }

    #[test]
    fn test_status_roundtrip() {
        for s in ["candidate", "active", "dismissed"] {
            assert_eq!(PatternStatus::parse(s).unwrap().as_str(), s);
        }
        for s in ["pending", "materialized", "skipped"] {
            assert_eq!(GeneratedStatus::parse(s).unwrap().as_str(), s);
        }
    }
}
