use crate::{
    cmd::{self, ExtractorKind},
    modules::{
        auth::{self, CookieCache, LoginOptions},
        browser::BrowserSession,
        crawler::{CrawlOptions, CrawlReport, Crawler},
        store::Store,
        throttle::Throttle,
    },
};
use anyhow::{Context, Result};
use clap::Args;
use leetcode_archive_libs::{LeetCodeClient, SessionCredentials, StoredCookie, SubmissionPage};
use sqlx::{sqlite::Sqlite, Pool};
use tokio::time::Duration;

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// Discard cached cookies and sign in again before crawling
    #[arg(long)]
    relogin: bool,
    /// Abort on the first problem or submission that cannot be fetched
    #[arg(long)]
    strict: bool,
    /// Run the browser without a window when cached cookies are available
    #[arg(long)]
    headless: bool,
    /// Lower bound of the pause before each query, in seconds
    #[arg(long, default_value_t = 5)]
    min_delay: u64,
    /// Upper bound of the pause before each query, in seconds
    #[arg(long, default_value_t = 15)]
    max_delay: u64,
    /// Submissions requested per page
    #[arg(long, default_value_t = SubmissionPage::DEFAULT_LIMIT)]
    submission_limit: u32,
    /// Follow the submission list past its first page
    #[arg(long)]
    all_submission_pages: bool,
    #[arg(long, value_enum, default_value_t = ExtractorKind::Pattern)]
    extractor: ExtractorKind,
    /// Seconds to wait for the sign-in to complete
    #[arg(long, default_value_t = 300)]
    login_timeout: u64,
    /// Seconds to wait for a submission page to render
    #[arg(long, default_value_t = 10)]
    page_timeout: u64,
}

pub async fn run(args: CrawlArgs) -> Result<()> {
    let pool = cmd::connect_database().await?;
    let cache = cmd::cookie_cache();

    let cached = cached_cookies(&cache, args.relogin).await?;

    // Signing in needs a visible window.
    let headless = args.headless && cached.is_some();
    let browser = BrowserSession::launch(headless, Duration::from_secs(args.page_timeout)).await?;

    let result = crawl(&args, &pool, &browser, cached).await;
    if let Err(e) = browser.close().await {
        tracing::warn!("failed to close the browser: {:?}", e);
    }

    let report = result?;
    if report.catalog_failed {
        tracing::warn!("The problem catalog could not be fetched; nothing was updated.");
    }
    tracing::info!(
        "{} accepted problems, {} new problems, {} solutions, {} submissions saved, {} skipped.",
        report.accepted,
        report.new_problems,
        report.solutions,
        report.submissions,
        report.skipped
    );

    let summary = Store::new(&pool).summary().await?;
    tracing::info!(
        "Archive now holds {} problems, {} tags, {} solutions and {} submissions.",
        summary.problems,
        summary.tags,
        summary.solutions,
        summary.submissions
    );

    Ok(())
}

/// Cookies to start from. A forced login leaves the cache in place until it succeeds.
async fn cached_cookies(cache: &CookieCache, relogin: bool) -> Result<Option<Vec<StoredCookie>>> {
    if relogin {
        tracing::info!("Ignoring cached cookies, a new login was requested.");
        return Ok(None);
    }
    cache.load().await
}

async fn crawl(
    args: &CrawlArgs,
    pool: &Pool<Sqlite>,
    browser: &BrowserSession,
    cached: Option<Vec<StoredCookie>>,
) -> Result<CrawlReport> {
    let cache = cmd::cookie_cache();
    let login = LoginOptions::new(&cmd::login_url()?, Duration::from_secs(args.login_timeout));
    let cookies = auth::acquire(cached, &cache, browser, &login).await?;

    let credentials = SessionCredentials::from_cookies(&cookies);
    let client = LeetCodeClient::new(&cmd::base_url(), &credentials).with_context(|| {
        let message = "Failed to create the LeetCode client.";
        tracing::error!(message);
        message
    })?;

    let mut options = CrawlOptions::new(client.site_url().clone());
    options.strict = args.strict;
    options.submission_page = SubmissionPage::first(args.submission_limit);
    options.all_submission_pages = args.all_submission_pages;

    let extractor = args.extractor.extractor();
    let throttle = Throttle::new(
        Duration::from_secs(args.min_delay),
        Duration::from_secs(args.max_delay),
    );
    tracing::info!(
        "Start crawling with the {} extractor, {}-{} seconds between queries.",
        args.extractor,
        args.min_delay,
        args.max_delay
    );

    let crawler = Crawler::new(
        &client,
        browser,
        extractor.as_ref(),
        Store::new(pool),
        throttle,
        options,
    );
    crawler.run().await.with_context(|| {
        let message = "Crawling was aborted.";
        tracing::error!(message);
        message
    })
}
