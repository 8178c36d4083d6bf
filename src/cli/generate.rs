use chrono::Local;
use colored::Colorize;
use tracing::{error, info};

use crate::db::get_connection;
use crate::error::Result;
use crate::generator::{generate, materialize_due};
use crate::logging::init_job_log;
use crate::settings::{db_path, get_data_dir};

pub fn run(days: i64) -> Result<()> {
    let _guard = init_job_log(&get_data_dir(), "generate");
    let today = Local::now().date_naive();

    let result: Result<(usize, usize)> = (|| {
        let conn = get_connection(&db_path())?;
        info!(days, "generate run starting");
        let materialized = materialize_due(&conn, today)?;
        let projected = generate(&conn, days, today)?;
        Ok((materialized, projected))
    })();

    match result {
        Ok((materialized, projected)) => {
            info!(materialized, projected, "generate run finished");
            println!(
                "{} materialized, {} projected over the next {days} days",
                materialized.to_string().green(),
                projected
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "generate run failed");
            Err(e)
        }
    }
}
