//! WebDriver-backed adapter for the Notion UI.
//!
//! All selectors and gesture order live here; the login and invite flows
//! only see the [`LoginSurface`] and [`InviteSurface`] traits.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use tokio::time::sleep;

use crate::auth::{AuthError, LoginSurface};
use crate::config::Config;
use crate::invite::{InviteError, InviteSurface};
use crate::session::{Session, StoredCookie};

// Login surface.
const EMAIL_INPUT: &str = "input#notion-email-input-1";
const CODE_INPUT: &str = "input#notion-password-input-2";
/// Only renders once the workspace home screen is up.
const LOGGED_IN_LANDMARK: &str = "div.notion-ai-button";

// People settings surface.
const SETTINGS_ITEM: &str = "//div[normalize-space(text())='Settings']";
const PEOPLE_TAB: &str = "//div[@role='tab'][normalize-space()='People']";
const ADD_MEMBERS: &str = "//*[normalize-space(text())='Add members']";
const RECIPIENT_INPUT: &str = "input[placeholder='Search names or emails']";
const SEND_INVITE: &str = "//*[@role='button' or self::button][normalize-space()='Send invite']";

/// How long a saved session gets to prove itself before fresh login.
const RESTORE_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Bounded wait for login-flow elements (code field, landmark).
const LOGIN_WAIT_TIMEOUT: Duration = Duration::from_secs(30);
/// Bounded wait for invite-surface elements.
const UI_WAIT_TIMEOUT: Duration = Duration::from_secs(15);
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// The member list re-renders asynchronously after a submission and there
/// is no completion signal to wait on.
const INVITE_SETTLE: Duration = Duration::from_secs(2);

pub struct Browser {
    driver: WebDriver,
    base_url: String,
}

impl Browser {
    /// Connect to the WebDriver endpoint and open a fresh browser session.
    pub async fn connect(config: &Config) -> WebDriverResult<Self> {
        let mut caps = DesiredCapabilities::firefox();
        if config.headless {
            caps.set_headless()?;
        }
        let driver = WebDriver::new(config.webdriver_url.as_str(), caps).await?;
        tracing::info!(url = %config.webdriver_url, "browser session opened");
        Ok(Self {
            driver,
            base_url: config.base_url.clone(),
        })
    }

    async fn wait_for(&self, by: By, timeout: Duration) -> WebDriverResult<WebElement> {
        self.driver
            .query(by)
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await
    }

    async fn is_present(&self, by: By, timeout: Duration) -> WebDriverResult<bool> {
        self.driver
            .query(by)
            .wait(timeout, POLL_INTERVAL)
            .exists()
            .await
    }

    /// Capture the driver's cookie jar as a storable session.
    pub async fn current_session(&self) -> WebDriverResult<Session> {
        let cookies = self.driver.get_all_cookies().await?;
        Ok(Session::new(cookies.iter().map(StoredCookie::from).collect()))
    }

    pub async fn screenshot(&self, path: &Path) -> WebDriverResult<()> {
        self.driver.screenshot(path).await
    }

    pub async fn quit(self) -> WebDriverResult<()> {
        self.driver.quit().await
    }
}

#[async_trait]
impl LoginSurface for Browser {
    async fn resume(&self, session: &Session) -> Result<(), AuthError> {
        // Cookies can only be set once the browser is on the right origin.
        self.driver
            .goto(self.base_url.as_str())
            .await
            .map_err(AuthError::Driver)?;
        for cookie in &session.cookies {
            self.driver
                .add_cookie(cookie.to_webdriver())
                .await
                .map_err(AuthError::Driver)?;
        }
        self.driver
            .goto(self.base_url.as_str())
            .await
            .map_err(AuthError::Driver)?;

        if self
            .is_present(By::Css(LOGGED_IN_LANDMARK), RESTORE_PROBE_TIMEOUT)
            .await
            .map_err(AuthError::Driver)?
        {
            Ok(())
        } else {
            Err(AuthError::SessionExpired)
        }
    }

    async fn begin_login(&self) -> Result<(), AuthError> {
        let url = format!("{}/login", self.base_url);
        self.driver.goto(url.as_str()).await.map_err(AuthError::Driver)
    }

    async fn submit_identifier(&self, email: &str) -> Result<(), AuthError> {
        let field = self
            .wait_for(By::Css(EMAIL_INPUT), LOGIN_WAIT_TIMEOUT)
            .await
            .map_err(|_| AuthError::AuthenticationFailed { stage: "login form" })?;
        field.send_keys(email).await.map_err(AuthError::Driver)?;
        field
            .send_keys(Key::Enter + "")
            .await
            .map_err(AuthError::Driver)?;
        Ok(())
    }

    async fn await_code_prompt(&self) -> Result<String, AuthError> {
        let field = self
            .wait_for(By::Css(CODE_INPUT), LOGIN_WAIT_TIMEOUT)
            .await
            .map_err(|_| AuthError::AuthenticationFailed {
                stage: "one-time code field",
            })?;
        let placeholder = field.attr("placeholder").await.map_err(AuthError::Driver)?;
        Ok(placeholder.unwrap_or_else(|| "Enter code".to_string()))
    }

    async fn submit_code(&self, code: &str) -> Result<(), AuthError> {
        let field = self
            .wait_for(By::Css(CODE_INPUT), LOGIN_WAIT_TIMEOUT)
            .await
            .map_err(|_| AuthError::AuthenticationFailed {
                stage: "one-time code field",
            })?;
        field.send_keys(code).await.map_err(AuthError::Driver)?;
        field
            .send_keys(Key::Enter + "")
            .await
            .map_err(AuthError::Driver)?;
        Ok(())
    }

    async fn await_landmark(&self) -> Result<(), AuthError> {
        if self
            .is_present(By::Css(LOGGED_IN_LANDMARK), LOGIN_WAIT_TIMEOUT)
            .await
            .map_err(AuthError::Driver)?
        {
            Ok(())
        } else {
            Err(AuthError::AuthenticationFailed {
                stage: "workspace home screen",
            })
        }
    }
}

fn ui_err(gesture: &'static str) -> impl FnOnce(WebDriverError) -> InviteError {
    move |source| InviteError::Ui {
        gesture,
        source: Box::new(source),
    }
}

#[async_trait]
impl InviteSurface for Browser {
    async fn open_member_settings(&self) -> Result<(), InviteError> {
        self.wait_for(By::XPath(SETTINGS_ITEM), UI_WAIT_TIMEOUT)
            .await
            .map_err(ui_err("open settings"))?
            .click()
            .await
            .map_err(ui_err("open settings"))?;
        self.wait_for(By::XPath(PEOPLE_TAB), UI_WAIT_TIMEOUT)
            .await
            .map_err(ui_err("open people tab"))?
            .click()
            .await
            .map_err(ui_err("open people tab"))?;
        Ok(())
    }

    async fn open_invite_dialog(&self) -> Result<(), InviteError> {
        self.wait_for(By::XPath(ADD_MEMBERS), UI_WAIT_TIMEOUT)
            .await
            .map_err(ui_err("open invite dialog"))?
            .click()
            .await
            .map_err(ui_err("open invite dialog"))?;
        Ok(())
    }

    async fn enter_recipient(&self, address: &str) -> Result<(), InviteError> {
        let field = self
            .wait_for(By::Css(RECIPIENT_INPUT), UI_WAIT_TIMEOUT)
            .await
            .map_err(ui_err("find recipient field"))?;
        field
            .send_keys(address)
            .await
            .map_err(ui_err("fill recipient"))?;
        // Comma commits the address as a recipient token.
        field.send_keys(",").await.map_err(ui_err("commit recipient"))?;
        Ok(())
    }

    async fn submit_invite(&self) -> Result<(), InviteError> {
        self.wait_for(By::XPath(SEND_INVITE), UI_WAIT_TIMEOUT)
            .await
            .map_err(ui_err("send invite"))?
            .click()
            .await
            .map_err(ui_err("send invite"))?;
        Ok(())
    }

    async fn settle(&self) {
        sleep(INVITE_SETTLE).await;
    }
}
