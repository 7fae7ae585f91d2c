//! Artifact registry with secondary indices and a dependency graph.
//!
//! All state lives in one [`ArtifactIndex`] behind a single `RwLock`, so an
//! insert or delete (primary map, three secondary indices, edge index, and
//! reverse-edge lists) is one atomic step for any concurrent reader.
//!
//! Dependency edges may name ids that do not exist (yet, or any more).
//! Such dangling edges resolve to nothing on traversal. Cycles are not
//! detected.

use std::collections::{HashMap, HashSet};

use mcp_core::artifact::{
    Artifact, ArtifactFilter, ArtifactReference, ArtifactRegistration, ArtifactType,
};
use mcp_core::error::CoreError;
use mcp_core::types::{new_id, EntityId};
use tokio::sync::RwLock;

/// Central registry for artifacts and their relationships.
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    inner: RwLock<ArtifactIndex>,
}

#[derive(Debug, Default)]
struct ArtifactIndex {
    artifacts: HashMap<EntityId, StoredArtifact>,
    by_job: HashMap<EntityId, Vec<EntityId>>,
    by_service: HashMap<String, Vec<EntityId>>,
    by_type: HashMap<ArtifactType, Vec<EntityId>>,
    /// Every declared forward edge keyed by its target id, live or
    /// dangling. Values are the declaring artifacts, one entry per edge.
    edges_to: HashMap<EntityId, Vec<EntityId>>,
    next_seq: u64,
}

#[derive(Debug)]
struct StoredArtifact {
    seq: u64,
    artifact: Artifact,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new artifact and return its id.
    ///
    /// For every dependency naming a live artifact, a reverse edge pointing
    /// back at the new artifact is appended to that target. Reverse edges
    /// for artifacts registered earlier that already point at the new id
    /// are picked up as well.
    pub async fn register(&self, registration: ArtifactRegistration) -> Result<EntityId, CoreError> {
        registration.validate()?;

        let mut index = self.inner.write().await;

        let id = registration.id.clone().unwrap_or_else(new_id);
        if index.artifacts.contains_key(&id) {
            return Err(CoreError::Conflict(format!(
                "Artifact with ID {id} already exists"
            )));
        }

        let mut artifact = registration.into_artifact(id.clone(), chrono::Utc::now());

        for dep in &artifact.dependencies {
            index
                .edges_to
                .entry(dep.artifact_id.clone())
                .or_default()
                .push(id.clone());

            if let Some(target) = index.artifacts.get_mut(&dep.artifact_id) {
                target
                    .artifact
                    .referenced_by
                    .push(ArtifactReference::reverse_of(&artifact, dep));
            }
        }

        artifact.referenced_by = index.incoming_edges(&artifact);
        index.add_to_secondary(&artifact);

        let seq = index.next_seq;
        index.next_seq += 1;

        tracing::info!(
            artifact_id = %id,
            name = %artifact.name,
            artifact_type = %artifact.artifact_type,
            dependencies = artifact.dependencies.len(),
            "Registered artifact",
        );

        index
            .artifacts
            .insert(id.clone(), StoredArtifact { seq, artifact });
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> Option<Artifact> {
        self.inner
            .read()
            .await
            .artifacts
            .get(id)
            .map(|stored| stored.artifact.clone())
    }

    /// List artifacts newest first.
    ///
    /// Only one filter is honored, with precedence type, then job, then
    /// service. `limit` is applied last.
    pub async fn list(&self, filter: &ArtifactFilter) -> Vec<Artifact> {
        let index = self.inner.read().await;

        let mut stored: Vec<&StoredArtifact> = match index.candidate_ids(filter) {
            Some(ids) => ids
                .iter()
                .filter_map(|id| index.artifacts.get(id))
                .collect(),
            None => index.artifacts.values().collect(),
        };

        stored.sort_by(|a, b| {
            b.artifact
                .created_at
                .cmp(&a.artifact.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        stored
            .into_iter()
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|s| s.artifact.clone())
            .collect()
    }

    /// All artifacts produced by `job_id`, in registration order.
    pub async fn get_by_job(&self, job_id: &str) -> Vec<Artifact> {
        let index = self.inner.read().await;
        index
            .by_job
            .get(job_id)
            .map(|ids| index.resolve(ids.iter()))
            .unwrap_or_default()
    }

    /// Artifacts that `id` depends on. Dangling edges are skipped.
    pub async fn get_dependencies(&self, id: &str) -> Result<Vec<Artifact>, CoreError> {
        let index = self.inner.read().await;
        let stored = index
            .artifacts
            .get(id)
            .ok_or_else(|| CoreError::artifact_not_found(id))?;
        Ok(index.resolve(stored.artifact.dependencies.iter().map(|d| &d.artifact_id)))
    }

    /// Artifacts that depend on `id`.
    pub async fn get_references(&self, id: &str) -> Result<Vec<Artifact>, CoreError> {
        let index = self.inner.read().await;
        let stored = index
            .artifacts
            .get(id)
            .ok_or_else(|| CoreError::artifact_not_found(id))?;
        Ok(index.resolve(stored.artifact.referenced_by.iter().map(|r| &r.artifact_id)))
    }

    /// Remove an artifact. Returns `false` if it did not exist.
    ///
    /// The artifact disappears from every index and from the reverse-edge
    /// list of each artifact it depended on. Artifacts that depend on it
    /// are left untouched and keep a dangling forward edge.
    pub async fn delete(&self, id: &str) -> bool {
        let mut index = self.inner.write().await;
        let Some(StoredArtifact { artifact, .. }) = index.artifacts.remove(id) else {
            return false;
        };

        index.remove_from_secondary(&artifact);

        for dep in &artifact.dependencies {
            if let Some(referrers) = index.edges_to.get_mut(&dep.artifact_id) {
                referrers.retain(|r| r != id);
                if referrers.is_empty() {
                    index.edges_to.remove(&dep.artifact_id);
                }
            }
            if let Some(target) = index.artifacts.get_mut(&dep.artifact_id) {
                target.artifact.referenced_by.retain(|r| r.artifact_id != id);
            }
        }

        tracing::info!(artifact_id = %id, "Deleted artifact");
        true
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.artifacts.len()
    }
}

impl ArtifactIndex {
    /// Ids from the secondary index selected by `filter`, or `None` when
    /// no filter is set.
    fn candidate_ids(&self, filter: &ArtifactFilter) -> Option<&[EntityId]> {
        const EMPTY: &[EntityId] = &[];
        if let Some(t) = filter.artifact_type {
            Some(self.by_type.get(&t).map_or(EMPTY, Vec::as_slice))
        } else if let Some(job_id) = &filter.job_id {
            Some(self.by_job.get(job_id).map_or(EMPTY, Vec::as_slice))
        } else if let Some(service_id) = &filter.service_id {
            Some(self.by_service.get(service_id).map_or(EMPTY, Vec::as_slice))
        } else {
            None
        }
    }

    /// Live artifacts for `ids`, in the given order, skipping unknown ids.
    fn resolve<'a>(&self, ids: impl Iterator<Item = &'a EntityId>) -> Vec<Artifact> {
        ids.filter_map(|id| self.artifacts.get(id))
            .map(|stored| stored.artifact.clone())
            .collect()
    }

    /// Reverse edges for `artifact` built from every live forward edge that
    /// names it, including its own when it depends on itself.
    fn incoming_edges(&self, artifact: &Artifact) -> Vec<ArtifactReference> {
        let Some(referrer_ids) = self.edges_to.get(&artifact.id) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for referrer_id in referrer_ids {
            if !seen.insert(referrer_id) {
                continue;
            }
            let referrer = if *referrer_id == artifact.id {
                artifact
            } else {
                match self.artifacts.get(referrer_id) {
                    Some(stored) => &stored.artifact,
                    None => continue,
                }
            };
            edges.extend(
                referrer
                    .dependencies
                    .iter()
                    .filter(|d| d.artifact_id == artifact.id)
                    .map(|d| ArtifactReference::reverse_of(referrer, d)),
            );
        }
        edges
    }

    fn add_to_secondary(&mut self, artifact: &Artifact) {
        let id = &artifact.id;
        if let Some(job_id) = &artifact.job_id {
            self.by_job.entry(job_id.clone()).or_default().push(id.clone());
        }
        if let Some(service_id) = &artifact.service_id {
            self.by_service
                .entry(service_id.clone())
                .or_default()
                .push(id.clone());
        }
        self.by_type
            .entry(artifact.artifact_type)
            .or_default()
            .push(id.clone());
    }

    fn remove_from_secondary(&mut self, artifact: &Artifact) {
        let id = &artifact.id;
        if let Some(job_id) = &artifact.job_id {
            remove_id(&mut self.by_job, job_id, id);
        }
        if let Some(service_id) = &artifact.service_id {
            remove_id(&mut self.by_service, service_id, id);
        }
        remove_id(&mut self.by_type, &artifact.artifact_type, id);
    }
}

/// Drop `id` from the bucket under `key`, removing the bucket once empty.
fn remove_id<K>(map: &mut HashMap<K, Vec<EntityId>>, key: &K, id: &str)
where
    K: std::hash::Hash + Eq,
{
    if let Some(ids) = map.get_mut(key) {
        ids.retain(|existing| existing != id);
        if ids.is_empty() {
            map.remove(key);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
