//! # todo - Local Todo List
//!
//! A command-line todo manager with sub-tasks and an optional terminal user
//! interface (TUI).
//!
//! ## Key Features
//!
//! - **Sub-tasks**: Break a todo into ordered steps, each with its own completion state
//! - **Cascade completion**: Completing a todo completes all of its steps
//! - **Filter, search and sort**: By status, category, text, creation time or due date
//! - **Multiple Interfaces**: Full CLI for automation + interactive TUI for visual management
//! - **Local File Storage**: One JSON file per list, rewritten atomically on every change
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a todo
//! todo add "장보기" --category shopping --due tomorrow
//!
//! # Break it down
//! todo sub add 장보기 "milk"
//! todo sub add 장보기 "bread"
//!
//! # List what is still open, soonest first
//! todo list --status active --sort due --subtasks
//!
//! # Launch the TUI
//! todo ui
//! ```
//!
//! Data is stored locally in `~/.todo/` (or `--dir` / `TODO_DIR`). Use
//! `--key` to keep several independent lists side by side.

use clap::Parser;

use todo_manager::cli::Cli;
use todo_manager::cmd::*;
use todo_manager::config::{init_file_logging, init_logging, Config};
use todo_manager::error::AppResult;
use todo_manager::storage::FileStorage;
use todo_manager::store::Store;
use todo_manager::view::ViewParams;

fn main() {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli);

    if let Err(e) = run(cli.command, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &Config) -> AppResult<()> {
    match command {
        // Completions need neither storage nor logging.
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }

        Commands::Ui => {
            config.prepare()?;
            init_file_logging(&config.log_path())?;
            cmd_ui(config)
        }

        Commands::Add { text, priority, due, category } =>
            cmd_add(&mut open_store(config)?, text, priority, due, category),

        Commands::List { status, category, search, sort, subtasks } => {
            let params = ViewParams {
                status,
                category: category.into(),
                search: search.unwrap_or_default(),
                sort,
            };
            cmd_list(&mut open_store(config)?, &params, subtasks)
        }

        Commands::View { id } => cmd_view(&mut open_store(config)?, &id),

        Commands::Toggle { id } => cmd_toggle(&mut open_store(config)?, &id),

        Commands::Edit { id, text } => cmd_edit(&mut open_store(config)?, &id, &text),

        Commands::Delete { id } => cmd_delete(&mut open_store(config)?, &id),

        Commands::Sub { action } => cmd_sub(&mut open_store(config)?, action),
    }
}

/// Store for one-shot commands, logging to stderr.
fn open_store(config: &Config) -> AppResult<Store<FileStorage>> {
    config.prepare()?;
    init_logging();
    Ok(config.open_store())
}
