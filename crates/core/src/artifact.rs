//! Artifact schema: records, dependency references, registration and
//! listing DTOs.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, JsonMap, Timestamp};

/// Reference type assigned to forward edges when the caller gives none.
pub const REFERENCE_TYPE_DEPENDENCY: &str = "dependency";

/// Reference type carried by every system-maintained reverse edge.
pub const REFERENCE_TYPE_REFERENCED_BY: &str = "referenced_by";

/// Kind of output an artifact represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Model,
    Plot,
    Report,
    Log,
    Metrics,
    Data,
    Config,
    Other,
}

impl ArtifactType {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactType::Model => "model",
            ArtifactType::Plot => "plot",
            ArtifactType::Report => "report",
            ArtifactType::Log => "log",
            ArtifactType::Metrics => "metrics",
            ArtifactType::Data => "data",
            ArtifactType::Config => "config",
            ArtifactType::Other => "other",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model" => Ok(ArtifactType::Model),
            "plot" => Ok(ArtifactType::Plot),
            "report" => Ok(ArtifactType::Report),
            "log" => Ok(ArtifactType::Log),
            "metrics" => Ok(ArtifactType::Metrics),
            "data" => Ok(ArtifactType::Data),
            "config" => Ok(ArtifactType::Config),
            "other" => Ok(ArtifactType::Other),
            other => Err(CoreError::Validation(format!(
                "Unknown artifact type: \"{other}\""
            ))),
        }
    }
}

fn default_reference_type() -> String {
    REFERENCE_TYPE_DEPENDENCY.to_string()
}

/// A directed edge between two artifacts.
///
/// On an artifact's `dependencies` list it names an artifact this one
/// derives from; on `referenced_by` it names an artifact that depends on
/// this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub artifact_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<ArtifactType>,
    #[serde(default = "default_reference_type")]
    pub reference_type: String,
    #[serde(default)]
    pub metadata: JsonMap,
}

impl ArtifactReference {
    /// A plain `"dependency"` edge to `artifact_id`.
    pub fn dependency(artifact_id: impl Into<EntityId>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            artifact_type: None,
            reference_type: default_reference_type(),
            metadata: JsonMap::new(),
        }
    }

    /// The reverse edge recorded on a dependency target when `referrer`
    /// declares `forward`.
    pub fn reverse_of(referrer: &Artifact, forward: &ArtifactReference) -> Self {
        let mut metadata = JsonMap::new();
        metadata.insert(
            "reference_type".to_string(),
            serde_json::Value::String(forward.reference_type.clone()),
        );
        Self {
            artifact_id: referrer.id.clone(),
            artifact_type: Some(referrer.artifact_type),
            reference_type: REFERENCE_TYPE_REFERENCED_BY.to_string(),
            metadata,
        }
    }
}

/// A named output, its storage location, and its place in the dependency
/// graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub job_id: Option<EntityId>,
    pub service_id: Option<String>,
    pub size_bytes: Option<u64>,
    pub checksum: Option<String>,
    pub tags: Vec<String>,
    pub metadata: JsonMap,
    pub storage_location: String,
    pub dependencies: Vec<ArtifactReference>,
    pub referenced_by: Vec<ArtifactReference>,
}

/// Registration request, both from API callers and from the `artifacts`
/// list a finished job returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRegistration {
    /// Caller-chosen id. A fresh UUID is allocated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub storage_location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub job_id: Option<EntityId>,
    #[serde(default)]
    pub dependencies: Vec<ArtifactReference>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: JsonMap,
}

impl ArtifactRegistration {
    pub fn new(
        name: impl Into<String>,
        artifact_type: ArtifactType,
        storage_location: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            artifact_type,
            storage_location: storage_location.into(),
            description: None,
            service_id: None,
            job_id: None,
            dependencies: Vec::new(),
            size_bytes: None,
            checksum: None,
            tags: Vec::new(),
            metadata: JsonMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_job(mut self, job_id: impl Into<EntityId>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_service(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = Some(service_id.into());
        self
    }

    pub fn with_dependency(mut self, artifact_id: impl Into<EntityId>) -> Self {
        self.dependencies.push(ArtifactReference::dependency(artifact_id));
        self
    }

    /// Reject registrations that could never be resolved to a stored file.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Artifact name must not be empty".to_string(),
            ));
        }
        if self.storage_location.trim().is_empty() {
            return Err(CoreError::Validation(
                "Artifact storage_location must not be empty".to_string(),
            ));
        }
        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                return Err(CoreError::Validation(
                    "Artifact id must not be blank".to_string(),
                ));
            }
        }
        if self.dependencies.iter().any(|d| d.artifact_id.is_empty()) {
            return Err(CoreError::Validation(
                "Dependency artifact_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Materialize the stored record. Tags are deduplicated keeping the
    /// first occurrence; `referenced_by` starts empty and is filled in by
    /// the registry.
    pub fn into_artifact(self, id: EntityId, created_at: Timestamp) -> Artifact {
        let mut seen = HashSet::with_capacity(self.tags.len());
        let tags = self
            .tags
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();

        Artifact {
            id,
            name: self.name,
            artifact_type: self.artifact_type,
            description: self.description,
            created_at,
            job_id: self.job_id,
            service_id: self.service_id,
            size_bytes: self.size_bytes,
            checksum: self.checksum,
            tags,
            metadata: self.metadata,
            storage_location: self.storage_location,
            dependencies: self.dependencies,
            referenced_by: Vec::new(),
        }
    }
}

/// Listing filter. At most one of `artifact_type`, `job_id`, `service_id`
/// is honored, in that order of precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFilter {
    #[serde(default)]
    pub artifact_type: Option<ArtifactType>,
    #[serde(default)]
    pub job_id: Option<EntityId>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn registration_from_wire_entry() {
        let entry = json!({
            "name": "weights",
            "type": "model",
            "storage_location": "s3://bucket/weights.bin",
            "job_id": "ignored-upstream",
            "dependencies": [{"artifact_id": "a-1"}],
            "tags": ["best", "best", "v1"],
        });
        let reg: ArtifactRegistration = serde_json::from_value(entry).unwrap();
        assert_eq!(reg.artifact_type, ArtifactType::Model);
        assert_eq!(reg.dependencies[0].reference_type, REFERENCE_TYPE_DEPENDENCY);
        assert!(reg.id.is_none());

        let artifact = reg.into_artifact("x".into(), chrono::Utc::now());
        assert_eq!(artifact.tags, vec!["best".to_string(), "v1".to_string()]);
        assert!(artifact.referenced_by.is_empty());
    }

    #[test]
    fn unknown_artifact_type_is_rejected() {
        let entry = json!({"name": "n", "type": "video", "storage_location": "/x"});
        assert!(serde_json::from_value::<ArtifactRegistration>(entry).is_err());
        assert_matches!("video".parse::<ArtifactType>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let reg = ArtifactRegistration::new(" ", ArtifactType::Data, "/tmp/x");
        assert_matches!(reg.validate(), Err(CoreError::Validation(_)));

        let reg = ArtifactRegistration::new("data", ArtifactType::Data, "");
        assert_matches!(reg.validate(), Err(CoreError::Validation(_)));

        let reg = ArtifactRegistration::new("data", ArtifactType::Data, "/tmp/x").with_dependency("");
        assert_matches!(reg.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn reverse_edge_records_forward_reference_type() {
        let referrer = ArtifactRegistration::new("b", ArtifactType::Report, "/b")
            .into_artifact("b".into(), chrono::Utc::now());
        let mut forward = ArtifactReference::dependency("a");
        forward.reference_type = "input".into();

        let reverse = ArtifactReference::reverse_of(&referrer, &forward);
        assert_eq!(reverse.artifact_id, "b");
        assert_eq!(reverse.artifact_type, Some(ArtifactType::Report));
        assert_eq!(reverse.reference_type, REFERENCE_TYPE_REFERENCED_BY);
        assert_eq!(reverse.metadata["reference_type"], "input");
    }
}
