//! Workspace roster automation: log in to Notion (or replay a saved
//! session), then optionally invite synthetic members and export the
//! member list.

mod auth;
mod browser;
mod config;
mod export;
mod invite;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notion_client::{collect_members, NotionClient};

use crate::auth::ConsolePrompt;
use crate::browser::Browser;
use crate::config::Config;
use crate::session::SessionStore;

#[derive(Debug, Parser)]
#[command(name = "roster", about = "Automates Notion workspace membership chores")]
struct Cli {
    /// Send this many synthetic-member invitations
    #[arg(long, value_name = "COUNT")]
    invite: Option<usize>,

    /// Export the member list to PATH
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = "members.json"
    )]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,roster_cli=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let store = SessionStore::new(config.session_path.clone());

    let browser = Browser::connect(&config)
        .await
        .context("Failed to reach the WebDriver endpoint")?;

    let outcome = run(&cli, &config, &store, &browser).await;

    // Runs whether or not the work above succeeded; a freshly established
    // login must survive a failed export or invite.
    shutdown(&browser, &store, &config).await;
    if let Err(e) = browser.quit().await {
        tracing::warn!(error = %e, "browser session did not close cleanly");
    }

    outcome
}

async fn run(cli: &Cli, config: &Config, store: &SessionStore, browser: &Browser) -> Result<()> {
    let mut prompt = ConsolePrompt::default();
    auth::authenticate(store.try_load(), browser, &mut prompt)
        .await
        .context("could not establish an authenticated session")?;
    println!("{}", "Logged in.".bright_green());

    let session = browser
        .current_session()
        .await
        .context("could not capture session cookies")?;
    let client = NotionClient::with_base_url(config.base_url.clone(), session.cookie_header());

    match (cli.invite, cli.export.as_deref()) {
        (Some(count), Some(path)) => {
            // The API reads ride their own HTTP client, so they do not
            // contend with the UI gestures for page state.
            let (invited, records) =
                tokio::join!(invite::run(browser, count), collect_members(&client));
            export::write_members(path, &records)?;
            invited.context("invitations aborted")?;
            report_invites(count);
            report_export(records.len(), path);
        }
        (Some(count), None) => {
            invite::run(browser, count)
                .await
                .context("invitations aborted")?;
            report_invites(count);
        }
        (None, Some(path)) => {
            let records = collect_members(&client).await;
            export::write_members(path, &records)?;
            report_export(records.len(), path);
        }
        (None, None) => {
            tracing::info!("no operation requested; session refreshed only");
        }
    }

    Ok(())
}

/// Persist the session and grab a last screenshot. Both are best-effort.
async fn shutdown(browser: &Browser, store: &SessionStore, config: &Config) {
    match browser.current_session().await {
        Ok(session) => {
            if let Err(e) = store.save(&session) {
                tracing::warn!(error = %e, "failed to persist session");
            } else {
                tracing::info!(path = %store.path().display(), "session saved");
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not read cookies from the browser"),
    }

    if let Err(e) = browser.screenshot(&config.screenshot_path).await {
        tracing::debug!(error = %e, "final screenshot failed");
    }
}

fn report_invites(count: usize) {
    let message = format!("Sent {count} synthetic invitations.");
    println!("{}", message.as_str().bright_green());
}

fn report_export(count: usize, path: &std::path::Path) {
    let message = format!("Exported {count} members to {}.", path.display());
    println!("{}", message.as_str().bright_green());
}
