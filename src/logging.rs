use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "import.log";
const DEFAULT_DIRECTIVES: &str = "observatory_import=debug,info";

/// Install the global subscriber: human-readable lines on stderr plus one
/// JSON object per event in `logs/import.log.<date>`.
pub fn init_logging() {
    init_logging_in(Path::new(LOG_DIR));
}

/// Same as [`init_logging`] with the JSON log files placed under `dir`.
/// `RUST_LOG` overrides the default filter.
pub fn init_logging_in(dir: &Path) {
    // A missing log directory only loses the file output
    let _ = std::fs::create_dir_all(dir);

    let (import_log, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // stdout carries the command's JSON result
    let stderr_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
    let json_layer = fmt::layer().json().with_writer(import_log);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // The CLI logs until exit; the worker thread must outlive main
    std::mem::forget(guard);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_created_under_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested");
        init_logging_in(&logs);
        tracing::info!("logging initialised");

        let names: Vec<String> = std::fs::read_dir(&logs)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with(LOG_FILE_PREFIX)), "{names:?}");
    }
}
