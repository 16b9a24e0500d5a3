//! Member roster assembly.
//!
//! The three API reads are each independently fallible; a failed step is
//! logged and degraded to an empty result so one broken endpoint yields a
//! partial roster instead of aborting the run.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{MemberRecord, RecordEnvelope, WorkspaceMember};

/// The three workspace reads, as a seam for mocking.
#[async_trait]
pub trait WorkspaceApi {
    /// Resolve the id of the caller's workspace.
    async fn resolve_workspace_id(&self) -> Result<String>;

    /// Members visible in the given workspace.
    async fn list_members(&self, space_id: &str) -> Result<Vec<WorkspaceMember>>;

    /// Batched metadata fetch, keyed by member id.
    async fn fetch_member_metadata(
        &self,
        members: &[WorkspaceMember],
    ) -> Result<HashMap<String, RecordEnvelope>>;
}

/// Run the full read pipeline and return the joined roster.
///
/// Never fails: each step substitutes an empty result on error, and the
/// join tolerates missing metadata entries.
pub async fn collect_members<A>(api: &A) -> Vec<MemberRecord>
where
    A: WorkspaceApi + Sync,
{
    let space_id = match api.resolve_workspace_id().await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "workspace resolution failed, continuing with empty id");
            String::new()
        }
    };

    let members = match api.list_members(&space_id).await {
        Ok(members) => members,
        Err(e) => {
            tracing::warn!(error = %e, space_id = %space_id, "member listing failed");
            Vec::new()
        }
    };

    let metadata = match api.fetch_member_metadata(&members).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!(error = %e, "metadata fetch failed, roster will hold null fields");
            HashMap::new()
        }
    };

    let records = join_members(members, &metadata);
    tracing::info!(members = records.len(), "assembled member roster");
    records
}

/// Join the member list with its metadata on member id.
///
/// A member with no metadata entry keeps its row; name and email are null.
pub fn join_members(
    members: Vec<WorkspaceMember>,
    metadata: &HashMap<String, RecordEnvelope>,
) -> Vec<MemberRecord> {
    members
        .into_iter()
        .map(|member| {
            let record = metadata
                .get(&member.user_id)
                .and_then(|envelope| envelope.value.as_ref());
            MemberRecord {
                name: record.and_then(|r| r.name.clone()),
                email: record.and_then(|r| r.email.clone()),
                role: member.role,
                created_at: member.first_joined_space_time,
                user_id: member.user_id,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::NotionError;

    #[derive(Debug, Clone, PartialEq)]
    enum ApiCall {
        Resolve,
        ListMembers(String),
        FetchMetadata(usize),
    }

    /// Scripted API double that records every call.
    #[derive(Default)]
    struct MockApi {
        calls: Mutex<Vec<ApiCall>>,
        fail_resolve: bool,
        fail_metadata: bool,
        space_id: String,
        members: Vec<WorkspaceMember>,
        metadata: HashMap<String, RecordEnvelope>,
    }

    #[async_trait]
    impl WorkspaceApi for MockApi {
        async fn resolve_workspace_id(&self) -> Result<String> {
            self.calls.lock().unwrap().push(ApiCall::Resolve);
            if self.fail_resolve {
                return Err(NotionError::UnexpectedShape(
                    "getSpaces response held no space mapping",
                ));
            }
            Ok(self.space_id.clone())
        }

        async fn list_members(&self, space_id: &str) -> Result<Vec<WorkspaceMember>> {
            self.calls
                .lock()
                .unwrap()
                .push(ApiCall::ListMembers(space_id.to_string()));
            Ok(self.members.clone())
        }

        async fn fetch_member_metadata(
            &self,
            members: &[WorkspaceMember],
        ) -> Result<HashMap<String, RecordEnvelope>> {
            self.calls
                .lock()
                .unwrap()
                .push(ApiCall::FetchMetadata(members.len()));
            if self.fail_metadata {
                return Err(NotionError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(self.metadata.clone())
        }
    }

    fn members_fixture(value: serde_json::Value) -> Vec<WorkspaceMember> {
        serde_json::from_value(value).unwrap()
    }

    fn metadata_fixture(value: serde_json::Value) -> HashMap<String, RecordEnvelope> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn join_keeps_rows_without_metadata() {
        let members = members_fixture(json!([
            {"userId": "u1", "role": "owner", "firstJoinedSpaceTime": 100},
            {"userId": "u2", "role": "member", "firstJoinedSpaceTime": 200},
            {"userId": "u3", "role": "member"},
        ]));
        let metadata = metadata_fixture(json!({
            "u2": {"value": {"name": "Bea", "email": "b@x.com"}},
        }));

        let records = join_members(members, &metadata);

        assert_eq!(records.len(), 3);
        let missing: Vec<_> = records
            .iter()
            .filter(|r| r.name.is_none() && r.email.is_none())
            .collect();
        assert_eq!(missing.len(), 2);
        assert_eq!(records[1].name.as_deref(), Some("Bea"));
        assert_eq!(records[2].role.as_deref(), Some("member"));
        assert_eq!(records[2].created_at, None);
    }

    #[test]
    fn join_merges_metadata_and_member_fields() {
        let members = members_fixture(json!([
            {"userId": "u1", "role": "owner", "firstJoinedSpaceTime": 100},
        ]));
        let metadata = metadata_fixture(json!({
            "u1": {"value": {"name": "Ana", "email": "a@x.com"}},
        }));

        let records = join_members(members, &metadata);

        assert_eq!(
            serde_json::to_value(&records).unwrap(),
            json!([
                {"name": "Ana", "email": "a@x.com", "role": "owner", "created_at": 100}
            ])
        );
    }

    #[test]
    fn join_tolerates_permission_filtered_values() {
        let members = members_fixture(json!([{"userId": "u1", "role": "guest"}]));
        let metadata = metadata_fixture(json!({"u1": {}}));

        let records = join_members(members, &metadata);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, None);
        assert_eq!(records[0].role.as_deref(), Some("guest"));
    }

    #[tokio::test]
    async fn failed_resolution_degrades_to_empty_id_and_continues() {
        let api = MockApi {
            fail_resolve: true,
            ..Default::default()
        };

        let records = collect_members(&api).await;

        assert!(records.is_empty());
        let calls = api.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                ApiCall::Resolve,
                ApiCall::ListMembers(String::new()),
                ApiCall::FetchMetadata(0),
            ]
        );
    }

    #[tokio::test]
    async fn failed_metadata_fetch_yields_partial_records() {
        let api = MockApi {
            fail_metadata: true,
            space_id: "space-1".to_string(),
            members: members_fixture(json!([
                {"userId": "u1", "role": "owner", "firstJoinedSpaceTime": 100},
                {"userId": "u2", "role": "member", "firstJoinedSpaceTime": 200},
            ])),
            ..Default::default()
        };

        let records = collect_members(&api).await;

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.name.is_none() && r.email.is_none()));
        assert_eq!(records[0].role.as_deref(), Some("owner"));
        let calls = api.calls.lock().unwrap();
        assert_eq!(calls[1], ApiCall::ListMembers("space-1".to_string()));
    }

    #[tokio::test]
    async fn happy_path_joins_all_three_reads() {
        let api = MockApi {
            space_id: "space-1".to_string(),
            members: members_fixture(json!([
                {"userId": "u1", "role": "owner", "firstJoinedSpaceTime": 100},
            ])),
            metadata: metadata_fixture(json!({
                "u1": {"value": {"name": "Ana", "email": "a@x.com"}},
            })),
            ..Default::default()
        };

        let records = collect_members(&api).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email.as_deref(), Some("a@x.com"));
        assert_eq!(records[0].created_at, Some(100));
    }
}
