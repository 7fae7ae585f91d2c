//! Extraction of artifact registrations from a job result.
//!
//! A result may carry an `artifacts` array whose entries use the
//! registration shape. Every entry is attributed to the producing job,
//! whatever `job_id` it claims.

use mcp_core::artifact::ArtifactRegistration;
use mcp_core::types::JsonMap;

/// Result key holding artifact descriptors.
pub(crate) const ARTIFACTS_KEY: &str = "artifacts";

/// One parsed entry, or why it could not be parsed.
pub(crate) type ParsedEntry = Result<ArtifactRegistration, String>;

/// Parse the `artifacts` entries of `result`, stamping `job_id` on each.
///
/// A missing key yields nothing. A key that is not an array yields a
/// single error entry.
pub(crate) fn artifact_entries(result: &JsonMap, job_id: &str) -> Vec<ParsedEntry> {
    let Some(value) = result.get(ARTIFACTS_KEY) else {
        return Vec::new();
    };
    let Some(entries) = value.as_array() else {
        return vec![Err(format!("\"{ARTIFACTS_KEY}\" is not an array"))];
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<ArtifactRegistration>(entry.clone())
                .map(|registration| registration.with_job(job_id))
                .map_err(|e| format!("entry {index}: {e}"))
        })
        .collect()
}
