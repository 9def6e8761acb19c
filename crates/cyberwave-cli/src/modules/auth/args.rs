use clap::Args;

#[derive(Args)]
pub struct LoginArgs {
    /// Skip opening the verification URL in a browser.
    #[arg(long)]
    pub no_browser: bool,
    /// Start a fresh device authorization even when already logged in.
    #[arg(long)]
    pub force: bool,
}
