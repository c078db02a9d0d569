//! Local todo list engine.
//!
//! [`store::Store`] owns the persisted list, [`ops`] holds the mutation
//! operations, and [`view`] turns the list plus the user's filter, search
//! and sort choices into the rows to display. The CLI and the TUI are thin
//! layers on top.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod ops;
pub mod storage;
pub mod store;
pub mod task;
pub mod util;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod utils;
}
