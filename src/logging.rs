use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging for a scheduled batch command.
///
/// Output goes to stderr and is appended to `<data_dir>/logs/<job>.log`.
/// Returns a `WorkerGuard` that must stay alive for the duration of the run so
/// buffered lines are flushed on exit. If the log directory cannot be created,
/// falls back to stderr-only logging — never panics.
pub fn init_job_log(data_dir: &Path, job: &str) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = data_dir.join("logs");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!(
            "warn: could not create log directory '{}': {e} — logging to stderr only",
            log_dir.display()
        );
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .compact()
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::never(&log_dir, format!("{job}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Some(guard)
}
