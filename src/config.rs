//! Runtime configuration and logging setup.
//!
//! Configuration comes from the global command line flags (which also read
//! `TODO_DIR`), falling back to `~/.todo` and the `todos` key. Log output is
//! controlled with `RUST_LOG`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::storage::FileStorage;
use crate::store::{Store, DEFAULT_KEY};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn";

/// File the TUI logs to, inside the data directory.
const TUI_LOG_FILE: &str = "todo.log";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub key: String,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let data_dir = cli.dir.clone().unwrap_or_else(default_data_dir);
        let key = cli.key.clone().unwrap_or_else(|| DEFAULT_KEY.to_string());
        Config { data_dir, key }
    }

    /// Make sure the data directory exists.
    pub fn prepare(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }

    /// Open the store this configuration points at.
    pub fn open_store(&self) -> Store<FileStorage> {
        Store::new(FileStorage::new(&self.data_dir), self.key.clone())
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(TUI_LOG_FILE)
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".todo")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Log to stderr.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to a file so the terminal UI is not drawn over.
pub fn init_file_logging(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
