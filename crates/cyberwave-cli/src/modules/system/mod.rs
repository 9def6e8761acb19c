mod actions;
pub(crate) mod args;
mod config;
mod paths;
mod types;

pub(crate) use actions::{handle_status, handle_sync, handle_whoami};
pub(crate) use config::{handle_config_command, load_config, save_config};
pub(crate) use paths::{write_atomic, write_secret_atomic, Paths};
pub(crate) use types::CliConfig;
