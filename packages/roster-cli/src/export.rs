//! Member-list artifact writer.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use notion_client::MemberRecord;

/// Write the member list as one pretty-printed JSON array.
///
/// Always a single whole-file write — the artifact is never appended to,
/// so re-running with the same members produces a byte-identical file.
pub fn write_members(path: &Path, records: &[MemberRecord]) -> Result<()> {
    let mut json =
        serde_json::to_string_pretty(records).context("failed to serialize member records")?;
    json.push('\n');
    fs::write(path, json)
        .with_context(|| format!("failed to write member list to {}", path.display()))?;
    tracing::info!(path = %path.display(), count = records.len(), "member list written");
    Ok(())
}
