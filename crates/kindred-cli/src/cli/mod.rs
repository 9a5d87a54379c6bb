pub mod commands;
pub mod config;

pub use commands::{execute, parse_field, render, CliCommand};
pub use config::{default_data_dir, CliConfig};
