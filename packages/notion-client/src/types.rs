use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One entry of the getVisibleUsers `users` array.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceMember {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: Option<String>,
    #[serde(rename = "firstJoinedSpaceTime")]
    pub first_joined_space_time: Option<i64>,
}

/// A record pointer for the syncRecordValues batch endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RecordRequest {
    pub pointer: RecordPointer,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordPointer {
    pub table: String,
    pub id: String,
}

impl RecordRequest {
    /// Pointer at a `notion_user` record, latest version.
    pub fn user(id: &str) -> Self {
        Self {
            pointer: RecordPointer {
                table: "notion_user".to_string(),
                id: id.to_string(),
            },
            version: -1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncRecordValuesRequest {
    pub requests: Vec<RecordRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncRecordValuesResponse {
    #[serde(rename = "recordMap")]
    pub record_map: RecordMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordMap {
    #[serde(rename = "notion_user", default)]
    pub notion_user: HashMap<String, RecordEnvelope>,
}

/// Envelope around a fetched record; `value` is absent for records the
/// caller is not allowed to read.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEnvelope {
    pub value: Option<UserRecord>,
}

/// The slice of a `notion_user` record the roster cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Wrapper for the getVisibleUsers response.
#[derive(Debug, Clone, Deserialize)]
pub struct VisibleUsersResponse {
    pub users: Vec<WorkspaceMember>,
}

/// One flattened, joined member row as it appears in the exported artifact.
///
/// Field order here is the serialized field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRecord {
    #[serde(skip)]
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<i64>,
}
