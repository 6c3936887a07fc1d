use crate::{
    cmd,
    modules::{
        auth::{self, LoginOptions},
        browser::BrowserSession,
    },
};
use anyhow::Result;
use clap::Args;
use tokio::time::Duration;

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Seconds to wait for the sign-in to complete
    #[arg(long, default_value_t = 300)]
    login_timeout: u64,
}

pub async fn run(args: LoginArgs) -> Result<()> {
    let cache = cmd::cookie_cache();
    let options = LoginOptions::new(&cmd::login_url()?, Duration::from_secs(args.login_timeout));

    let browser = BrowserSession::launch(false, Duration::from_secs(10)).await?;
    let result = auth::login(&cache, &browser, &options).await;
    browser.close().await?;

    let cookies = result?;
    tracing::info!(
        "Logged in; {} cookies stored in {}",
        cookies.len(),
        cache.path().display()
    );
    Ok(())
}
