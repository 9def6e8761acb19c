use tokio_util::sync::CancellationToken;

use crate::cli_args::Command;
use crate::modules::auth::{handle_login, handle_logout};
use crate::modules::session::Session;
use crate::modules::system::{handle_status, handle_sync};

pub(crate) async fn handle_command(
    command: Command,
    session: &mut Session<'_>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Command::Login(args) => handle_login(args, session, cancel).await?,
        Command::Logout => handle_logout(session)?,
        Command::Status => handle_status(session)?,
        Command::Sync => handle_sync(session, cancel).await?,
        Command::Config(_) | Command::Whoami => {
            unreachable!()
        }
    }
    Ok(())
}
