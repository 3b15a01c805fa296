//! Authenticated HTTP session against the contest site.
//!
//! The session lives entirely in the cookie jar shared with the underlying
//! `reqwest` client: [`SessionClient::login`] fills it, every later request
//! reads (and may refresh) it.

use std::sync::Arc;
use std::time::Duration;

use monitor_core::error::{MonitorError, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{StatusCode, Url};
use tracing::{debug, info};

/// Session cookie carrying the authorization level.
pub const PRIVILEGE_COOKIE: &str = "__privilege";

/// Value of [`PRIVILEGE_COOKIE`] for contest owners.
pub const OWNER_PRIVILEGE: &str = "owner";

/// Cookie-backed client for the contest site.
pub struct SessionClient {
    client: reqwest::Client,
    jar: Arc<Jar>,
    /// Contest root without a trailing slash.
    base_url: String,
    /// Parsed form of `base_url`, used for cookie look-ups.
    base: Url,
    user_id: String,
    password: String,
}

impl SessionClient {
    /// Build a client for `base_url` whose requests time out after `timeout`.
    pub fn new(base_url: &str, user_id: &str, password: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| MonitorError::Config(format!("invalid base_url '{base_url}': {e}")))?;

        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            jar,
            base_url,
            base,
            user_id: user_id.to_string(),
            password: password.to_string(),
        })
    }

    /// Contest root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit the credentials and confirm the session has owner privilege.
    ///
    /// A 200 response alone is not enough: without the owner marker the
    /// board hides private and unanswered questions, so that case is an
    /// [`MonitorError::Authorization`].
    pub async fn login(&self) -> Result<()> {
        let url = format!("{}/login", self.base_url);
        debug!(url = %url, user = %self.user_id, "submitting login form");

        let form = [
            ("name", self.user_id.as_str()),
            ("password", self.password.as_str()),
        ];
        let resp = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| MonitorError::transport("login", e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(MonitorError::HttpStatus {
                stage: "login",
                status: status.as_u16(),
            });
        }

        if !self.has_privilege() {
            return Err(MonitorError::Authorization(format!(
                "user '{}' does not hold owner privilege",
                self.user_id
            )));
        }

        info!(user = %self.user_id, "logged in with owner privilege");
        Ok(())
    }

    /// `true` when the jar holds `__privilege=owner` for the contest URL.
    pub fn has_privilege(&self) -> bool {
        self.jar
            .cookies(&self.base)
            .and_then(|header| header.to_str().ok().map(str::to_string))
            .map(|header| cookie_header_has(&header, PRIVILEGE_COOKIE, OWNER_PRIVILEGE))
            .unwrap_or(false)
    }

    /// Fetch the raw clarification board.
    pub async fn fetch_clarifications_page(&self) -> Result<String> {
        let url = format!("{}/clarifications", self.base_url);
        debug!(url = %url, "fetching clarification board");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::transport("fetch", e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(MonitorError::HttpStatus {
                stage: "fetch",
                status: status.as_u16(),
            });
        }

        resp.text()
            .await
            .map_err(|e| MonitorError::transport("fetch", e))
    }
}

/// Look for `name=value` in a `Cookie:` header string.
fn cookie_header_has(header: &str, name: &str, value: &str) -> bool {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(n, v)| n == name && v == value)
}
