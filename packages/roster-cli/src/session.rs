//! Saved-session persistence.
//!
//! A session is the browser's cookie jar, captured after a successful login
//! and replayed on the next run. The store only answers "is there something
//! on disk" — whether the session still works is decided by the login probe.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thirtyfour::Cookie;

/// An authenticated session captured as its cookie bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub saved_at: DateTime<Utc>,
    pub cookies: Vec<StoredCookie>,
}

impl Session {
    pub fn new(cookies: Vec<StoredCookie>) -> Self {
        Self {
            saved_at: Utc::now(),
            cookies,
        }
    }

    /// Render the bundle as a `Cookie:` request-header value for API calls
    /// that ride the same session outside the browser.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One stored cookie. Our own shape, so the on-disk format is independent
/// of the driver crate's cookie type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

impl From<&Cookie<'_>> for StoredCookie {
    fn from(cookie: &Cookie<'_>) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain: cookie.domain().map(str::to_string),
            path: cookie.path().map(str::to_string),
            secure: cookie.secure().unwrap_or(false),
            http_only: cookie.http_only().unwrap_or(false),
        }
    }
}

impl StoredCookie {
    pub fn to_webdriver(&self) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.name.clone(), self.value.clone());
        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        if let Some(path) = &self.path {
            cookie.set_path(path.clone());
        }
        cookie.set_secure(self.secure);
        cookie.set_http_only(self.http_only);
        cookie
    }
}

/// JSON persistence for [`Session`] at a fixed path.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session, if one is present and readable.
    ///
    /// A corrupt file counts as absent: a stale artifact on disk should
    /// never strand the operator at startup.
    pub fn try_load(&self) -> Option<Session> {
        let bytes = fs::read(&self.path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring unreadable session file"
                );
                None
            }
        }
    }

    /// Overwrite the stored session.
    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write session to {}", self.path.display()))?;
        Ok(())
    }
}
