//! Login flow: replay a saved session, or walk the operator through a
//! fresh email + one-time-code login.

use async_trait::async_trait;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use thiserror::Error;

use crate::session::Session;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A fresh login never produced the expected UI signal. Terminal for
    /// the run; the operator has to start over.
    #[error("authentication failed waiting for the {stage}")]
    AuthenticationFailed { stage: &'static str },

    /// A replayed session no longer passes the logged-in probe.
    #[error("saved session is no longer valid")]
    SessionExpired,

    /// The browser itself failed underneath the flow.
    #[error("browser command failed: {0}")]
    Driver(#[from] thirtyfour::error::WebDriverError),

    /// Operator input could not be read.
    #[error("could not read operator input: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// The login-page gestures, separated from the browser so the flow is
/// testable. Implementations bound every wait.
#[async_trait]
pub trait LoginSurface {
    /// Apply a saved session and probe for the logged-in landmark.
    /// [`AuthError::SessionExpired`] means the probe timed out.
    async fn resume(&self, session: &Session) -> Result<(), AuthError>;

    /// Open the login form.
    async fn begin_login(&self) -> Result<(), AuthError>;

    async fn submit_identifier(&self, email: &str) -> Result<(), AuthError>;

    /// Wait for the one-time-code field and return its placeholder text,
    /// which describes what the service expects the operator to type.
    async fn await_code_prompt(&self) -> Result<String, AuthError>;

    async fn submit_code(&self, code: &str) -> Result<(), AuthError>;

    /// Wait for the landmark that signals a logged-in workspace.
    async fn await_landmark(&self) -> Result<(), AuthError>;
}

/// Source of the two operator secrets.
pub trait OperatorPrompt {
    fn read_identifier(&mut self) -> Result<String, AuthError>;
    fn read_code(&mut self, hint: &str) -> Result<String, AuthError>;
}

/// Interactive prompt on the controlling terminal.
#[derive(Default)]
pub struct ConsolePrompt;

impl OperatorPrompt for ConsolePrompt {
    fn read_identifier(&mut self) -> Result<String, AuthError> {
        Ok(Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Workspace email")
            .interact_text()?)
    }

    fn read_code(&mut self, hint: &str) -> Result<String, AuthError> {
        Ok(Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(hint)
            .interact_text()?)
    }
}

/// Establish an authenticated session, preferring the saved one.
///
/// A saved session that fails its probe falls through to fresh login
/// exactly once; a bounded-wait timeout during fresh login is terminal.
pub async fn authenticate<S>(
    saved: Option<Session>,
    surface: &S,
    prompt: &mut dyn OperatorPrompt,
) -> Result<(), AuthError>
where
    S: LoginSurface + Sync,
{
    if let Some(session) = saved {
        tracing::info!(saved_at = %session.saved_at, "replaying saved session");
        match surface.resume(&session).await {
            Ok(()) => {
                tracing::info!("saved session accepted");
                return Ok(());
            }
            Err(AuthError::SessionExpired) => {
                tracing::warn!("saved session rejected, falling back to fresh login");
                println!("{}", style("Saved session expired. Please log in again.").cyan());
            }
            Err(other) => return Err(other),
        }
    } else {
        println!("{}", style("No saved session found. Please log in.").cyan());
    }

    fresh_login(surface, prompt).await
}

async fn fresh_login<S>(surface: &S, prompt: &mut dyn OperatorPrompt) -> Result<(), AuthError>
where
    S: LoginSurface + Sync,
{
    surface.begin_login().await?;

    let email = prompt.read_identifier()?;
    surface.submit_identifier(&email).await?;

    let hint = surface.await_code_prompt().await?;
    let code = prompt.read_code(&hint)?;
    surface.submit_code(&code).await?;

    surface.await_landmark().await?;
    tracing::info!("fresh login complete");
    Ok(())
}
