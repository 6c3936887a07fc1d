use crate::modules::browser::BrowserSession;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use leetcode_archive_libs::StoredCookie;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{
    fs,
    time::{self, Duration},
};

/// Cookies harvested from the last interactive login, kept as a JSON array on disk.
pub struct CookieCache {
    path: PathBuf,
}

impl CookieCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CookieCache {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when nothing usable is cached.
    pub async fn load(&self) -> Result<Option<Vec<StoredCookie>>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        let cookies: Vec<StoredCookie> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a cookie list", self.path.display()))?;
        if cookies.is_empty() {
            return Ok(None);
        }

        tracing::info!(
            "Loaded {} cookies from {}",
            cookies.len(),
            self.path.display()
        );
        Ok(Some(cookies))
    }

    pub async fn save(&self, cookies: &[StoredCookie]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let content = serde_json::to_string_pretty(cookies)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        tracing::info!("Saved {} cookies to {}", cookies.len(), self.path.display());
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(_) => {
                tracing::info!("Removed {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub login_url: String,
    /// How long the user has to finish signing in.
    pub timeout: Duration,
    /// Pause after the sign-in redirect so the site can set its remaining cookies.
    pub settle: Duration,
}

impl LoginOptions {
    pub fn new(login_url: &str, timeout: Duration) -> Self {
        LoginOptions {
            login_url: login_url.to_string(),
            timeout,
            settle: Duration::from_secs(10),
        }
    }
}

/// The part of a browser the interactive login needs.
#[async_trait]
pub trait LoginBrowser: Send + Sync {
    async fn wait_for_login(&self, login_url: &str, timeout: Duration) -> Result<()>;
    async fn cookies(&self) -> Result<Vec<StoredCookie>>;
}

#[async_trait]
impl LoginBrowser for BrowserSession {
    async fn wait_for_login(&self, login_url: &str, timeout: Duration) -> Result<()> {
        BrowserSession::wait_for_login(self, login_url, timeout).await
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>> {
        BrowserSession::cookies(self).await
    }
}

/// Lets the user sign in through `browser` and stores the resulting cookies in `cache`.
pub async fn login(
    cache: &CookieCache,
    browser: &dyn LoginBrowser,
    options: &LoginOptions,
) -> Result<Vec<StoredCookie>> {
    browser
        .wait_for_login(&options.login_url, options.timeout)
        .await
        .with_context(|| {
            let message = "Interactive login failed.";
            tracing::error!(message);
            message
        })?;

    if !options.settle.is_zero() {
        tracing::info!(
            "Waiting {} seconds for the session cookies...",
            options.settle.as_secs()
        );
        time::sleep(options.settle).await;
    }

    let cookies = browser.cookies().await?;
    if cookies.is_empty() {
        anyhow::bail!("the browser returned no cookies after login");
    }
    cache.save(&cookies).await?;

    Ok(cookies)
}

/// Returns the cached cookies as they are, or logs in when there are none.
///
/// Cached cookies are not validated against the site. An expired session shows
/// up later as rejected queries, and `login` replaces it.
pub async fn acquire(
    cached: Option<Vec<StoredCookie>>,
    cache: &CookieCache,
    browser: &dyn LoginBrowser,
    options: &LoginOptions,
) -> Result<Vec<StoredCookie>> {
    match cached {
        Some(cookies) => {
            let now = Utc::now().timestamp() as f64;
            let expired: Vec<&str> = cookies
                .iter()
                .filter(|cookie| cookie.is_expired_at(now))
                .map(|cookie| cookie.name.as_str())
                .collect();
            if !expired.is_empty() {
                tracing::warn!(
                    "cached cookies have expired: {}. Run `login` if queries are rejected.",
                    expired.join(", ")
                );
            }
            Ok(cookies)
        }
        None => {
            tracing::info!("No cached cookies, starting interactive login.");
            login(cache, browser, options).await
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeBrowser {
        signed_in: bool,
        cookies: Vec<StoredCookie>,
        visited: Mutex<Vec<String>>,
    }

    impl FakeBrowser {
        fn new(signed_in: bool) -> Self {
            FakeBrowser {
                signed_in,
                cookies: vec![
                    StoredCookie::new("csrftoken", "token"),
                    StoredCookie::new("LEETCODE_SESSION", "session"),
                ],
                visited: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl LoginBrowser for FakeBrowser {
        async fn wait_for_login(&self, login_url: &str, timeout: Duration) -> Result<()> {
            self.visited.lock().unwrap().push(login_url.to_string());
            if self.signed_in {
                Ok(())
            } else {
                anyhow::bail!("login was not completed within {} seconds", timeout.as_secs())
            }
        }

        async fn cookies(&self) -> Result<Vec<StoredCookie>> {
            Ok(self.cookies.clone())
        }
    }

    fn options() -> LoginOptions {
        let mut options = LoginOptions::new(
            "https://leetcode.com/accounts/login/",
            Duration::from_secs(300),
        );
        options.settle = Duration::ZERO;
        options
    }

    #[tokio::test]
    async fn test_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = CookieCache::new(dir.path().join("nested").join("cookies.json"));

        assert!(cache.load().await.unwrap().is_none());

        let mut cookie = StoredCookie::new("csrftoken", "token");
        cookie.domain = String::from(".leetcode.com");
        cookie.expires = Some(1893456000.0);
        cache.save(&[cookie.clone()]).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(vec![cookie]));

        cache.clear().await.unwrap();
        assert!(cache.load().await.unwrap().is_none());
        cache.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_cache_file_is_not_usable() {
        let dir = TempDir::new().unwrap();
        let cache = CookieCache::new(dir.path().join("cookies.json"));
        std::fs::write(cache.path(), "[]").unwrap();

        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_cache_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = CookieCache::new(dir.path().join("cookies.json"));
        std::fs::write(cache.path(), "{not json").unwrap();

        assert!(cache.load().await.is_err());
    }

    #[tokio::test]
    async fn test_acquire_reuses_cached_cookies() {
        let dir = TempDir::new().unwrap();
        let cache = CookieCache::new(dir.path().join("cookies.json"));
        let browser = FakeBrowser::new(true);
        let mut expired = StoredCookie::new("csrftoken", "stale");
        expired.expires = Some(1.0);

        let cookies = acquire(Some(vec![expired.clone()]), &cache, &browser, &options())
            .await
            .unwrap();

        assert_eq!(cookies, vec![expired]);
        assert!(browser.visited.lock().unwrap().is_empty());
        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_acquire_logs_in_without_cache() {
        let dir = TempDir::new().unwrap();
        let cache = CookieCache::new(dir.path().join("cookies.json"));
        let browser = FakeBrowser::new(true);

        let cookies = acquire(None, &cache, &browser, &options()).await.unwrap();

        assert_eq!(cookies, browser.cookies);
        assert_eq!(
            *browser.visited.lock().unwrap(),
            vec![String::from("https://leetcode.com/accounts/login/")]
        );
        assert_eq!(cache.load().await.unwrap(), Some(browser.cookies.clone()));
    }

    #[tokio::test]
    async fn test_login_timeout_leaves_cache_untouched() {
        let dir = TempDir::new().unwrap();
        let cache = CookieCache::new(dir.path().join("cookies.json"));
        let browser = FakeBrowser::new(false);

        assert!(login(&cache, &browser, &options()).await.is_err());
        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_waits_for_cookies_to_settle() {
        let dir = TempDir::new().unwrap();
        let cache = CookieCache::new(dir.path().join("cookies.json"));
        let browser = FakeBrowser::new(true);
        let options = LoginOptions::new(
            "https://leetcode.com/accounts/login/",
            Duration::from_secs(300),
        );

        let before = time::Instant::now();
        login(&cache, &browser, &options).await.unwrap();

        assert!(before.elapsed() >= Duration::from_secs(10));
    }
}
