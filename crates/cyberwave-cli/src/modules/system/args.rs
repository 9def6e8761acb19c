use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print one configuration value.
    Get(GetConfigArgs),
    /// Set a configuration value.
    Set(SetConfigArgs),
    /// Print all configuration values.
    List,
}

#[derive(Args)]
pub struct GetConfigArgs {
    pub key: String,
}

#[derive(Args)]
pub struct SetConfigArgs {
    pub key: String,
    pub value: String,
}
