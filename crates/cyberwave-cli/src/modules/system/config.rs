use std::fs;

use cyberwave_core::EnvironmentName;

use super::paths::{write_atomic, Paths};
use super::types::CliConfig;
use crate::cli_args::{ConfigArgs, ConfigCommand};

pub(crate) fn load_config(paths: &Paths) -> anyhow::Result<CliConfig> {
    let path = paths.config_file();
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let config = serde_json::from_str(&contents)?;
    Ok(config)
}

pub(crate) fn save_config(paths: &Paths, config: &CliConfig) -> anyhow::Result<()> {
    let contents = serde_json::to_string_pretty(config)?;
    write_atomic(&paths.config_file(), &contents)?;
    Ok(())
}

pub(crate) fn handle_config_command(
    args: ConfigArgs,
    config: &mut CliConfig,
) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Get(args) => {
            let value = config_value(config, &args.key)?;
            match value {
                Some(value) => println!("{value}"),
                None => println!(),
            }
        }
        ConfigCommand::Set(args) => {
            set_config_value(config, &args.key, &args.value)?;
        }
        ConfigCommand::List => {
            for key in CONFIG_KEYS {
                let value = config_value(config, key)?.unwrap_or_default();
                println!("{key}={value}");
            }
        }
    }
    Ok(())
}

const CONFIG_KEYS: &[&str] = &[
    "environment",
    "backend_url",
    "frontend_url",
    "workspace_id",
    "project_id",
];

fn config_value(config: &CliConfig, key: &str) -> anyhow::Result<Option<String>> {
    let value = match key {
        "environment" => config.environment.clone(),
        "backend_url" => config.backend_url.clone(),
        "frontend_url" => config.frontend_url.clone(),
        "workspace_id" => config.workspace_id.clone(),
        "project_id" => config.project_id.clone(),
        _ => anyhow::bail!("unknown config key: {key} (known: {})", CONFIG_KEYS.join(", ")),
    };
    Ok(value)
}

fn set_config_value(config: &mut CliConfig, key: &str, value: &str) -> anyhow::Result<()> {
    let value = value.trim();
    let slot = match key {
        "environment" => {
            if EnvironmentName::parse(value).is_none() {
                anyhow::bail!("unknown environment: {value} (known: production, staging, local)");
            }
            &mut config.environment
        }
        "backend_url" => &mut config.backend_url,
        "frontend_url" => &mut config.frontend_url,
        "workspace_id" => &mut config.workspace_id,
        "project_id" => &mut config.project_id,
        _ => anyhow::bail!("unknown config key: {key} (known: {})", CONFIG_KEYS.join(", ")),
    };
    *slot = if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    };
    Ok(())
}
