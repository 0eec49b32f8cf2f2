//! Library side of the `fna` binary: argument definitions, command
//! dispatch, exit codes and log setup.

mod cli;
mod commands;
mod exit;
pub mod logging;

pub use cli::{Cli, Command, IllustrationsArgs, NavPatchArg, OutputFormat, SlideshowArgs};
pub use commands::run;
pub use exit::{exit_code, usage_exit_code};
