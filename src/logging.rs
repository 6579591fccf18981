use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILE_NAME: &str = "tablet_ink.log";

/// `debug` lets `RUST_LOG` override the level; otherwise the level is
/// pinned to `info` so a stray environment variable stays quiet.
pub fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    }
}

/// Builds the fmt subscriber, writing to `log_file` when given and to
/// stderr otherwise.
pub fn subscriber(debug: bool, log_file: Option<&Path>) -> Box<dyn Subscriber + Send + Sync> {
    let writer = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_NAME));
            BoxMakeWriter::new(tracing_appender::rolling::never(dir, name))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    Box::new(
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(debug))
            .with_ansi(log_file.is_none())
            .with_writer(writer)
            .finish(),
    )
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(debug: bool, log_file: Option<&Path>) {
    let _ = tracing::subscriber::set_global_default(subscriber(debug, log_file));
}
