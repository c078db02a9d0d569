use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Local todo list with sub-tasks.
/// Storage defaults to ~/.todo/todos.json or a directory passed via --dir.
#[derive(Parser)]
#[command(name = "todo", version, about = "Local todo list manager")]
pub struct Cli {
    /// Directory holding the todo files.
    #[arg(long, global = true, env = "TODO_DIR")]
    pub dir: Option<PathBuf>,

    /// Storage key; each key is an independent list.
    #[arg(long, global = true)]
    pub key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
