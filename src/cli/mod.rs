//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, config management,
//! and the server runner.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;

// Re-export commonly used types
pub use app::{
    config_store, load_merged_config, run_server, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction};
pub use presenter::Presenter;
