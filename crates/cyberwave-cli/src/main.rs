use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod cli_command;
mod modules;

use cyberwave_core::{
    AuthError, Environment, EnvironmentName, EnvironmentOverrides, BACKEND_URL_ENV,
    ENVIRONMENT_ENV,
};

use crate::cli_args::{Cli, Command};
use crate::cli_command::handle_command;
use crate::modules::session::Session;
use crate::modules::system::{
    handle_config_command, handle_whoami, load_config, save_config, Paths,
};

/// Distinct exit code so scripts can branch on "not authenticated".
pub(crate) const EXIT_NOT_AUTHENTICATED: i32 = 3;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match init_logging(cli.verbose) {
        Ok(()) => match run(cli).await {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("Error: {err:#}");
                exit_code_for(&err)
            }
        },
        Err(err) => {
            eprintln!("Error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::resolve()?;
    let mut config = load_config(&paths)?;

    match cli.command {
        Command::Config(args) => {
            handle_config_command(args, &mut config)?;
            save_config(&paths, &config)?;
            Ok(())
        }
        Command::Whoami => handle_whoami(&paths),
        command => {
            let client = reqwest::Client::builder().build()?;
            let overrides = EnvironmentOverrides {
                explicit_backend_url: cli.backend_url.clone(),
                env_backend_url: std::env::var(BACKEND_URL_ENV).ok(),
                env_environment: std::env::var(ENVIRONMENT_ENV).ok(),
                config_environment: config.environment.clone(),
                config_backend_url: config.backend_url.clone(),
                config_frontend_url: config.frontend_url.clone(),
            };
            let environment = Environment::resolve(&overrides);

            let cancel = CancellationToken::new();
            let ctrl_c_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c_cancel.cancel();
                }
            });

            let is_login = matches!(command, Command::Login(_));
            let mut session = Session::establish(&client, environment, &paths).await;
            handle_command(command, &mut session, &cancel).await?;

            if is_login {
                capture_login_defaults(&paths, &mut config, &overrides, &session)?;
            }
            Ok(())
        }
    }
}

/// After a successful login, persist account defaults and an explicitly
/// selected environment so later invocations resolve the same way.
fn capture_login_defaults(
    paths: &Paths,
    config: &mut crate::modules::system::CliConfig,
    overrides: &EnvironmentOverrides,
    session: &Session<'_>,
) -> anyhow::Result<()> {
    let mut changed = false;

    if let Some(credentials) = session.vault.load() {
        if config.workspace_id.is_none() && credentials.workspace_id.is_some() {
            config.workspace_id = credentials.workspace_id.clone();
            changed = true;
        }
        if config.project_id.is_none() && credentials.project_id.is_some() {
            config.project_id = credentials.project_id.clone();
            changed = true;
        }
    }

    if let Some(name) = overrides
        .env_environment
        .as_deref()
        .and_then(EnvironmentName::parse)
    {
        if config.environment.as_deref() != Some(name.as_str()) {
            config.environment = Some(name.as_str().to_string());
            changed = true;
        }
    }

    if changed {
        save_config(paths, config)?;
    }
    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(core_err) = err.downcast_ref::<cyberwave_core::Error>() {
        if matches!(
            core_err,
            cyberwave_core::Error::Auth(AuthError::NotAuthenticated)
        ) {
            return EXIT_NOT_AUTHENTICATED;
        }
    }
    if let Some(AuthError::NotAuthenticated) = err.downcast_ref::<AuthError>() {
        return EXIT_NOT_AUTHENTICATED;
    }
    1
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
