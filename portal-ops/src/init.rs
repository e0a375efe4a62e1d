/// Database bootstrap
///
/// Creates the database and every catalogued container that is missing.
/// Existing containers are reported and left alone; use
/// [`crate::indexes::apply_composite_indexes`] to update their policies.

use portal_shared::db::{catalog, ContainerStatus, SharedStore, StoreResult};

/// Creates the database and missing containers
///
/// With `dry_run` nothing is written and `Created` means "would be created".
pub async fn init_db(store: &SharedStore, dry_run: bool) -> StoreResult<Vec<(String, ContainerStatus)>> {
    if !dry_run {
        return store.initialize_database().await;
    }

    let mut report = Vec::new();
    for definition in catalog::containers() {
        let status = match store.read_container(&definition.id).await? {
            Some(_) => ContainerStatus::Existing,
            None => ContainerStatus::Created,
        };
        report.push((definition.id, status));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_shared::db::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_init_db_creates_then_reports_existing() {
        let store: SharedStore = Arc::new(MemoryStore::new("init-test"));

        let first = init_db(&store, false).await.unwrap();
        assert!(first.iter().all(|(_, s)| *s == ContainerStatus::Created));

        let second = init_db(&store, false).await.unwrap();
        assert_eq!(second.len(), first.len());
        assert!(second.iter().all(|(_, s)| *s == ContainerStatus::Existing));
    }

    #[tokio::test]
    async fn test_init_db_dry_run() {
        let store: SharedStore = Arc::new(MemoryStore::new("init-test"));

        let report = init_db(&store, true).await.unwrap();
        assert!(report.iter().all(|(_, s)| *s == ContainerStatus::Created));
        assert!(store.read_container("organizations").await.unwrap().is_none());
    }
}
