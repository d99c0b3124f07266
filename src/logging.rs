//! Logging setup.
//!
//! The terminal UI owns the screen, so in TUI mode logs go to a file next to
//! the state database; headless mode logs to stderr and keeps stdout for
//! results. `RUST_LOG` overrides the default `info` filter.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "query-console.log";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to this file after moving the previous run's log aside.
    File(PathBuf),
    /// Compact lines without timestamps on stderr.
    Stderr,
}

impl LogTarget {
    /// File logging for the TUI, stderr otherwise.
    pub fn for_mode(headless: bool) -> Self {
        if headless {
            Self::Stderr
        } else {
            Self::File(log_path())
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. A log file that cannot be opened leaves
/// logging off rather than writing over the terminal UI.
pub fn init(target: LogTarget) {
    match target {
        LogTarget::File(path) => match open_log_file(&path) {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(file)
                .with_ansi(false)
                .init(),
            Err(e) => eprintln!("Warning: logging disabled, cannot open {}: {e}", path.display()),
        },
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(io::stderr)
            .without_time()
            .compact()
            .init(),
    }
}

/// Opens `path` for a new run. The previous run's log is kept as
/// `<name>.1`, replacing any older one.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if path.exists() {
        let previous = previous_log_path(path);
        if previous.exists() {
            fs::remove_file(&previous)?;
        }
        fs::rename(path, previous)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn previous_log_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".1");
    path.with_file_name(name)
}

/// `~/.local/state/query-console/query-console.log` on Linux, the config
/// directory where there is no state directory, the temp dir as a last resort.
pub fn log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("query-console").join(LOG_FILE_NAME))
        .unwrap_or_else(|| std::env::temp_dir().join(LOG_FILE_NAME))
}
