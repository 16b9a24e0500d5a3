//! Pure Notion internal-API client.
//!
//! A minimal client for the handful of undocumented `api/v3` endpoints the
//! roster tooling needs: workspace resolution, member enumeration, and a
//! batched member-metadata fetch.
//!
//! # Example
//!
//! ```rust,ignore
//! use notion_client::{collect_members, NotionClient};
//!
//! let client = NotionClient::new(cookie_header);
//!
//! let members = collect_members(&client).await;
//! for member in &members {
//!     println!("{}", member.name.as_deref().unwrap_or("(no name)"));
//! }
//! ```

pub mod error;
pub mod roster;
pub mod types;

pub use error::{NotionError, Result};
pub use roster::{collect_members, join_members, WorkspaceApi};
pub use types::{MemberRecord, RecordEnvelope, UserRecord, WorkspaceMember};

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use types::{RecordRequest, SyncRecordValuesRequest, SyncRecordValuesResponse, VisibleUsersResponse};

const BASE_URL: &str = "https://www.notion.so";

pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    cookie_header: String,
}

impl NotionClient {
    /// Client for the production service. `cookie_header` is the saved
    /// session rendered as a `Cookie:` header value.
    pub fn new(cookie_header: String) -> Self {
        Self::with_base_url(BASE_URL.to_string(), cookie_header)
    }

    /// Client against an explicit base URL.
    pub fn with_base_url(base_url: String, cookie_header: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            cookie_header,
        }
    }

    async fn call<T: DeserializeOwned>(&self, endpoint: &str, body: &impl Serialize) -> Result<T> {
        let url = format!("{}/api/v3/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, "calling internal API");

        let resp = self
            .client
            .post(&url)
            .header(header::COOKIE, self.cookie_header.as_str())
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl WorkspaceApi for NotionClient {
    async fn resolve_workspace_id(&self) -> Result<String> {
        let value: Value = self.call("getSpaces", &json!({})).await?;
        first_space_id(&value)
    }

    async fn list_members(&self, space_id: &str) -> Result<Vec<WorkspaceMember>> {
        let resp: VisibleUsersResponse = self
            .call("getVisibleUsers", &json!({ "spaceId": space_id }))
            .await?;
        tracing::debug!(space_id, users = resp.users.len(), "listed visible users");
        Ok(resp.users)
    }

    async fn fetch_member_metadata(
        &self,
        members: &[WorkspaceMember],
    ) -> Result<HashMap<String, RecordEnvelope>> {
        let requests: Vec<RecordRequest> = members
            .iter()
            .map(|member| RecordRequest::user(&member.user_id))
            .collect();
        let resp: SyncRecordValuesResponse = self
            .call("syncRecordValues", &SyncRecordValuesRequest { requests })
            .await?;
        Ok(resp.record_map.notion_user)
    }
}

/// The workspace id is the first key of the first entry's `space` mapping.
fn first_space_id(value: &Value) -> Result<String> {
    value
        .as_object()
        .and_then(|workspaces| workspaces.values().next())
        .and_then(|entry| entry.get("space"))
        .and_then(Value::as_object)
        .and_then(|spaces| spaces.keys().next())
        .cloned()
        .ok_or(NotionError::UnexpectedShape(
            "getSpaces response held no space mapping",
        ))
}
