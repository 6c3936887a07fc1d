use crate::modules::crawler::{PageError, SubmissionPageSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    handler::Handler,
    Page,
};
use futures::StreamExt;
use leetcode_archive_libs::StoredCookie;
use tokio::{
    task::JoinHandle,
    time::{self, Duration, Instant},
};

/// Element rendered once the submission detail page has loaded its data.
const RESULT_DATE_SELECTOR: &str = "#result_date";

/// A Chrome process driven over the DevTools protocol with a single tab.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    page_timeout: Duration,
}

impl BrowserSession {
    pub async fn launch(headless: bool, page_timeout: Duration) -> Result<Self> {
        let (browser, mut handler) = launch_browser(headless).await?;
        let handler = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open a browser tab")?;

        match browser.version().await {
            Ok(version) => tracing::info!("Launched {}", version.product),
            Err(e) => tracing::warn!("failed to get the browser version: {}", e),
        }

        Ok(BrowserSession {
            browser,
            handler,
            page,
            page_timeout,
        })
    }

    /// Opens `login_url` and waits until the tab has navigated away from the login flow.
    pub async fn wait_for_login(&self, login_url: &str, timeout: Duration) -> Result<()> {
        self.page
            .goto(login_url)
            .await
            .with_context(|| format!("Failed to open {}", login_url))?;
        tracing::info!("Please sign in within {} seconds.", timeout.as_secs());

        let deadline = Instant::now() + timeout;
        loop {
            let current = self.page.url().await?.unwrap_or_default();
            if !current.is_empty() && !is_login_url(&current) {
                tracing::info!("Signed in; now at {}", current);
                return Ok(());
            }
            if Instant::now() >= deadline {
                anyhow::bail!(
                    "login was not completed within {} seconds (url={})",
                    timeout.as_secs(),
                    current
                );
            }
            time::sleep(Duration::from_secs(1)).await;
        }
    }

    pub async fn cookies(&self) -> Result<Vec<StoredCookie>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .context("Failed to read cookies from the browser")?;

        Ok(cookies
            .into_iter()
            .map(|cookie| StoredCookie {
                name: cookie.name,
                value: cookie.value,
                domain: cookie.domain,
                path: cookie.path,
                expires: Some(cookie.expires),
                secure: cookie.secure,
                http_only: cookie.http_only,
            })
            .collect())
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        self.browser.wait().await?;
        tracing::info!("Browser closed.");
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl SubmissionPageSource for BrowserSession {
    async fn submission_page(&self, url: &str) -> Result<String, PageError> {
        let navigation = |e: chromiumoxide::error::CdpError| PageError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };

        tracing::debug!("Opening {}", url);
        self.page.goto(url).await.map_err(navigation)?;

        let deadline = Instant::now() + self.page_timeout;
        while self.page.find_element(RESULT_DATE_SELECTOR).await.is_err() {
            if Instant::now() >= deadline {
                return Err(PageError::Timeout {
                    url: url.to_string(),
                    seconds: self.page_timeout.as_secs(),
                });
            }
            time::sleep(Duration::from_millis(250)).await;
        }

        self.page.content().await.map_err(navigation)
    }
}

async fn launch_browser(headless: bool) -> Result<(Browser, Handler)> {
    let mut builder = BrowserConfig::builder()
        .viewport(None)
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--no-first-run")
        .arg("--no-default-browser-check");
    if !headless {
        builder = builder.with_head();
    }
    let config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to configure browser: {}", e))?;

    Browser::launch(config)
        .await
        .context("Failed to launch browser. Is Chrome or Chromium installed?")
}

/// Whether the tab is still somewhere inside the sign-in flow.
pub fn is_login_url(url: &str) -> bool {
    url.contains("login")
}
