use chrono::Local;
use colored::Colorize;
use tracing::{error, info};

use crate::db::{find_account_id, get_connection};
use crate::detector::{detect_account, detect_all, DetectionSummary, DetectorConfig};
use crate::error::{PennyError, Result};
use crate::logging::init_job_log;
use crate::settings::{db_path, get_data_dir};

fn config(months: u32, min_occurrences: usize) -> DetectorConfig {
    DetectorConfig {
        lookback_months: months,
        min_occurrences,
        ..Default::default()
    }
}

fn print_summary(summary: &DetectionSummary) {
    println!(
        "{} new, {} updated, {} activated ({} payee groups scanned)",
        summary.created.to_string().green(),
        summary.updated,
        summary.activated,
        summary.groups_scanned
    );
    if summary.invalid_rows > 0 {
        println!("{} malformed rows excluded", summary.invalid_rows);
    }
    if summary.accounts_skipped > 0 {
        println!("{} accounts skipped (too little history)", summary.accounts_skipped);
    }
}

pub fn run(account: &str, months: u32, min_occurrences: usize) -> Result<()> {
    let _guard = init_job_log(&get_data_dir(), "identify");
    let result = (|| {
        let conn = get_connection(&db_path())?;
        let account_id = find_account_id(&conn, account)?
            .ok_or_else(|| PennyError::UnknownAccount(account.to_string()))?;
        info!(account, months, min_occurrences, "identify run starting");
        detect_account(
            &conn,
            account_id,
            &config(months, min_occurrences),
            Local::now().date_naive(),
        )
    })();

    match result {
        Ok(summary) => {
            info!(
                created = summary.created,
                updated = summary.updated,
                activated = summary.activated,
                "identify run finished"
            );
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "identify run failed");
            Err(e)
        }
    }
}

pub fn run_all(months: u32, min_occurrences: usize) -> Result<()> {
    let _guard = init_job_log(&get_data_dir(), "identify");
    let result = (|| {
        let conn = get_connection(&db_path())?;
        info!(months, min_occurrences, "identify-all run starting");
        detect_all(
            &conn,
            &config(months, min_occurrences),
            Local::now().date_naive(),
        )
    })();

    match result {
        Ok(summary) => {
            info!(
                accounts = summary.accounts_scanned,
                skipped = summary.accounts_skipped,
                created = summary.created,
                updated = summary.updated,
                activated = summary.activated,
                "identify-all run finished"
            );
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "identify-all run failed");
            Err(e)
        }
    }
}
