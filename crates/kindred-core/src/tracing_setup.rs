use std::fs::OpenOptions;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Env var holding the stderr filter directive (e.g. `kindred_core=debug`)
pub const LOG_FILTER_ENV: &str = "KINDRED_LOG";

/// Env var naming a file that additionally receives DEBUG output
pub const LOG_FILE_ENV: &str = "KINDRED_LOG_FILE";

pub fn init_tracing() {
    let directive = std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| "info".to_string());
    init_tracing_with_filter(&directive);
}

pub fn init_tracing_with_filter(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("Invalid {} directive {:?}: {}", LOG_FILTER_ENV, directive, e);
        EnvFilter::new("info")
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file_layer = std::env::var(LOG_FILE_ENV).ok().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => Some((log_path, file)),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", log_path, e);
                None
            }
        }
    });

    let result = match file_layer {
        Some((log_path, file)) => {
            let layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);
            let result = registry.with(layer).try_init();
            if result.is_ok() {
                eprintln!("File logging enabled: {}", log_path);
            }
            result
        }
        None => registry.try_init(),
    };

    // A subscriber installed earlier (tests, embedding app) wins
    if let Err(e) = result {
        tracing::debug!("tracing: subscriber already set: {}", e);
    }
}
