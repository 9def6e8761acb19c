use clap::{ArgAction, Parser, Subcommand};

pub use crate::modules::auth::args::*;
pub use crate::modules::system::args::*;

#[derive(Parser)]
#[command(name = "cyberwave")]
#[command(about = "Cyberwave edge CLI", version)]
pub struct Cli {
    /// Backend URL override; takes precedence over env vars and config.
    #[arg(long)]
    pub backend_url: Option<String>,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Authorize this device against the backend (browser device flow).
    Login(LoginArgs),
    /// Remove stored credentials from this machine.
    Logout,
    /// Show environment, connectivity and authentication state.
    Status,
    /// Show this node's identity.
    Whoami,
    /// Upload queued offline records now.
    Sync,
    /// Read and write persisted CLI configuration.
    Config(ConfigArgs),
}
