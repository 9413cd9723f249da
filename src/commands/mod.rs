//! Command-line interface definitions and command implementations.

pub mod arg_parsing;
pub mod args;
pub mod run;

pub use args::{Cli, Commands};
pub use run::{cmd_export, cmd_log, cmd_reset, cmd_status, cmd_sync, cmd_themes, AppContext};
