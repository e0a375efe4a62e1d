/// Creative asset model
///
/// Images, videos, documents and copy moving through client review.
/// Partitioned on `/projectId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Video,
    Document,
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Draft,
    InReview,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,

    /// Partition key
    pub project_id: String,

    pub name: String,

    pub kind: AssetKind,

    /// Where the file is stored
    pub url: String,

    pub status: AssetStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Asset {
    const CONTAINER: &'static str = "assets";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.project_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAsset {
    #[validate(length(min = 1, max = 300, message = "Name must be 1-300 characters"))]
    pub name: String,

    pub kind: AssetKind,

    #[validate(url(message = "Asset URL must be a valid URL"))]
    pub url: String,

    #[serde(default = "default_status")]
    pub status: AssetStatus,
}

fn default_status() -> AssetStatus {
    AssetStatus::Draft
}

impl Asset {
    pub fn build(project_id: &str, id: &str, data: CreateAsset) -> Self {
        let now = Utc::now();

        Asset {
            id: id.to_string(),
            project_id: project_id.to_string(),
            name: data.name,
            kind: data.kind,
            url: data.url,
            status: data.status,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn upsert(store: &SharedStore, asset: &Asset) -> StoreResult<Self> {
        get_container::<Asset>(store).upsert(asset).await
    }

    /// Lists a project's assets, most recently updated first
    pub async fn list_by_project(store: &SharedStore, project_id: &str) -> StoreResult<Vec<Self>> {
        let query = Query::new("SELECT * FROM c WHERE c.projectId = @projectId ORDER BY c.updatedAt DESC")
            .param("@projectId", project_id);
        get_container::<Asset>(store).query(&query, Some(project_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_asset_validation() {
        let data: CreateAsset = serde_json::from_str(
            r#"{"name": "Hero banner", "kind": "image", "url": "https://cdn.acme.test/hero.png"}"#,
        )
        .unwrap();
        assert_eq!(data.status, AssetStatus::Draft);
        assert!(data.validate().is_ok());

        let bad = CreateAsset {
            url: "not a url".to_string(),
            ..data
        };
        assert!(bad.validate().is_err());
    }
}
