use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, COOKIE, REFERER};
use serde::{Deserialize, Serialize};

/// Cookie set by Cloudflare once the anti-bot challenge has been passed.
pub const CLEARANCE_COOKIE: &str = "cf_clearance";
/// Cookie holding the per-session CSRF secret.
pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "x-csrftoken";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

/// Headers sent with every API request so that the traffic looks like the browser the cookies came from.
const BROWSER_PROFILE: [(&str, &str); 11] = [
    ("cache-control", "max-age=0"),
    ("upgrade-insecure-requests", "1"),
    ("user-agent", USER_AGENT),
    ("accept", "*/*"),
    ("accept-language", "en,zh-CN;q=0.9,zh;q=0.8,fr;q=0.7"),
    (
        "sec-ch-ua",
        r#""Not A(Brand";v="8", "Chromium";v="132", "Google Chrome";v="132""#,
    ),
    ("sec-ch-ua-platform", r#""macOS""#),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-origin"),
];

/// A cookie captured from the browser after login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    /// Expiry as unix seconds. Chrome reports session cookies with a negative value.
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

impl StoredCookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: String::from(name),
            value: String::from(value),
            domain: String::default(),
            path: String::from("/"),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    pub fn is_expired_at(&self, now: f64) -> bool {
        matches!(self.expires, Some(expires) if expires > 0.0 && expires < now)
    }
}

/// Credentials derived from a harvested cookie set.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    cookie_header: String,
    clearance: Option<String>,
    csrf_token: Option<String>,
}

impl SessionCredentials {
    pub fn from_cookies(cookies: &[StoredCookie]) -> Self {
        // The browser may report the same name for several domains; the last one wins like in a cookie jar.
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(cookies.len());
        for cookie in cookies.iter() {
            match pairs.iter_mut().find(|(name, _)| *name == cookie.name) {
                Some(pair) => pair.1 = cookie.value.as_str(),
                None => pairs.push((cookie.name.as_str(), cookie.value.as_str())),
            }
        }

        let lookup = |key: &str| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        };
        let clearance = lookup(CLEARANCE_COOKIE);
        let csrf_token = lookup(CSRF_COOKIE);

        if csrf_token.is_none() {
            tracing::warn!("{} cookie not found, authenticated queries may be rejected", CSRF_COOKIE);
        }
        if clearance.is_none() {
            tracing::debug!("{} cookie not found", CLEARANCE_COOKIE);
        }

        let cookie_header = pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<String>>()
            .join("; ");

        Self {
            cookie_header,
            clearance,
            csrf_token,
        }
    }

    pub fn cookie_header(&self) -> &str {
        &self.cookie_header
    }

    pub fn clearance(&self) -> Option<&str> {
        self.clearance.as_deref()
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Default headers for the API client: browser profile, referer, session cookies and CSRF token.
    pub fn headers(&self, referer: &str) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        for (name, value) in BROWSER_PROFILE {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        headers.insert(REFERER, HeaderValue::from_str(referer)?);

        if !self.cookie_header.is_empty() {
            let mut cookie = HeaderValue::from_str(&self.cookie_header)?;
            cookie.set_sensitive(true);
            headers.insert(COOKIE, cookie);
        }
        if let Some(token) = &self.csrf_token {
            let mut token = HeaderValue::from_str(token)?;
            token.set_sensitive(true);
            headers.insert(HeaderName::from_static(CSRF_HEADER), token);
        }

        Ok(headers)
    }
}
