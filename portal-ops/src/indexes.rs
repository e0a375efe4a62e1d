/// Composite index application
///
/// Brings every catalogued container's composite indexes in line with
/// [`catalog::containers`]. Only `compositeIndexes` is replaced; included
/// and excluded paths, spatial indexes and any other policy fields stay as
/// they are on the service.
///
/// Re-running is safe: a container whose composite indexes already match
/// is reported `Unchanged` and not written to.
///
/// # Example
///
/// ```no_run
/// use portal_ops::indexes::apply_composite_indexes;
/// use portal_shared::db::{MemoryStore, SharedStore};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: SharedStore = Arc::new(MemoryStore::new("portal"));
/// for change in apply_composite_indexes(&store, false).await? {
///     println!("{}: {}", change.container, change.outcome);
/// }
/// # Ok(())
/// # }
/// ```

use portal_shared::db::{catalog, SharedStore, StoreResult};
use serde::Serialize;
use std::fmt;

/// What happened to one container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOutcome {
    /// Container did not exist and was created with the full policy
    Created,

    /// Composite indexes differed and were replaced
    Updated,

    /// Composite indexes already matched
    Unchanged,
}

impl fmt::Display for IndexOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndexOutcome::Created => "created",
            IndexOutcome::Updated => "updated",
            IndexOutcome::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// Result for one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexChange {
    pub container: String,
    pub outcome: IndexOutcome,

    /// Number of composite indexes after the run
    pub composite_indexes: usize,
}

/// Applies the catalogued composite indexes
///
/// With `dry_run` the store is only read; outcomes describe what a real
/// run would do.
pub async fn apply_composite_indexes(store: &SharedStore, dry_run: bool) -> StoreResult<Vec<IndexChange>> {
    if !dry_run {
        store.ensure_database().await?;
    }

    let mut changes = Vec::new();

    for definition in catalog::containers() {
        let desired = &definition.indexing_policy.composite_indexes;

        let outcome = match store.read_container(&definition.id).await? {
            None => {
                if !dry_run {
                    store.create_container(&definition).await?;
                }
                IndexOutcome::Created
            }
            Some(current) if current.indexing_policy.has_composite_indexes(desired) => IndexOutcome::Unchanged,
            Some(mut current) => {
                tracing::debug!(
                    container = %definition.id,
                    current = current.indexing_policy.composite_indexes.len(),
                    desired = desired.len(),
                    "Composite indexes differ"
                );
                current.indexing_policy.composite_indexes = desired.clone();
                if !dry_run {
                    store.replace_container(&current).await?;
                }
                IndexOutcome::Updated
            }
        };

        tracing::info!(container = %definition.id, outcome = %outcome, dry_run, "Composite indexes checked");

        changes.push(IndexChange {
            container: definition.id.clone(),
            outcome,
            composite_indexes: desired.len(),
        });
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_shared::db::catalog::{container, IndexPath};
    use portal_shared::db::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn memory() -> SharedStore {
        Arc::new(MemoryStore::new("indexes-test"))
    }

    fn outcomes(changes: &[IndexChange]) -> Vec<IndexOutcome> {
        changes.iter().map(|c| c.outcome).collect()
    }

    #[tokio::test]
    async fn test_creates_missing_containers() {
        let store = memory();

        let changes = apply_composite_indexes(&store, false).await.unwrap();
        assert_eq!(changes.len(), catalog::containers().len());
        assert!(outcomes(&changes).iter().all(|o| *o == IndexOutcome::Created));

        let projects = store.read_container("projects").await.unwrap().unwrap();
        assert_eq!(projects.indexing_policy.composite_indexes.len(), 2);
    }

    #[tokio::test]
    async fn test_rerun_leaves_policy_unchanged() {
        let store = memory();
        apply_composite_indexes(&store, false).await.unwrap();

        let before: Vec<_> = policy_snapshot(&store).await;
        let changes = apply_composite_indexes(&store, false).await.unwrap();
        let after: Vec<_> = policy_snapshot(&store).await;

        assert!(outcomes(&changes).iter().all(|o| *o == IndexOutcome::Unchanged));
        assert_eq!(before, after);
    }

    async fn policy_snapshot(store: &SharedStore) -> Vec<serde_json::Value> {
        let mut policies = Vec::new();
        for definition in catalog::containers() {
            let current = store.read_container(&definition.id).await.unwrap().unwrap();
            policies.push(serde_json::to_value(&current.indexing_policy).unwrap());
        }
        policies
    }

    #[tokio::test]
    async fn test_updates_only_composite_indexes() {
        let store = memory();
        store.ensure_database().await.unwrap();

        let mut stale = container("workItems").unwrap();
        stale.indexing_policy.composite_indexes.clear();
        stale.indexing_policy.excluded_paths.push(IndexPath {
            path: "/notes/*".to_string(),
        });
        stale
            .indexing_policy
            .extra
            .insert("spatialIndexes".to_string(), json!([]));
        store.create_container(&stale).await.unwrap();

        let changes = apply_composite_indexes(&store, false).await.unwrap();
        let work_items = changes.iter().find(|c| c.container == "workItems").unwrap();
        assert_eq!(work_items.outcome, IndexOutcome::Updated);
        assert_eq!(work_items.composite_indexes, 2);

        let current = store.read_container("workItems").await.unwrap().unwrap();
        let desired = container("workItems").unwrap().indexing_policy.composite_indexes;
        assert!(current.indexing_policy.has_composite_indexes(&desired));
        assert!(current
            .indexing_policy
            .excluded_paths
            .contains(&IndexPath {
                path: "/notes/*".to_string()
            }));
        assert!(current.indexing_policy.extra.contains_key("spatialIndexes"));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let store = memory();
        store.ensure_database().await.unwrap();

        let mut stale = container("approvals").unwrap();
        stale.indexing_policy.composite_indexes.clear();
        store.create_container(&stale).await.unwrap();

        let changes = apply_composite_indexes(&store, true).await.unwrap();
        let approvals = changes.iter().find(|c| c.container == "approvals").unwrap();
        assert_eq!(approvals.outcome, IndexOutcome::Updated);
        assert_eq!(
            changes.iter().filter(|c| c.outcome == IndexOutcome::Created).count(),
            catalog::containers().len() - 1
        );

        assert!(store.read_container("projects").await.unwrap().is_none());
        let current = store.read_container("approvals").await.unwrap().unwrap();
        assert!(current.indexing_policy.composite_indexes.is_empty());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(IndexOutcome::Unchanged.to_string(), "unchanged");
        assert_eq!(serde_json::to_value(IndexOutcome::Created).unwrap(), json!("created"));
    }
}
