pub mod commands;
mod context;
mod help;
pub mod io;
pub mod output;
mod shell;

pub use context::{CliError, CliMode, CliSink, CommandError, CommandResult, ShellContext};
pub use shell::run_cli;
