/// Container catalogue
///
/// Static definition of every Cosmos DB container the portal uses: its
/// partition key path and the composite indexes backing multi-field
/// queries (`WHERE` on the partition key plus `ORDER BY` on another path).
///
/// | Container       | Partition key | Composite indexes |
/// |-----------------|---------------|-------------------|
/// | `organizations` | `/orgId`      | -                 |
/// | `users`         | `/orgId`      | email, name       |
/// | `projects`      | `/orgId`      | status + updatedAt, updatedAt |
/// | `workItems`     | `/projectId`  | status + dueDate, priority + createdAt |
/// | `events`        | `/projectId`  | startsAt, kind + startsAt |
/// | `assets`        | `/projectId`  | status + updatedAt |
/// | `insights`      | `/projectId`  | period + metric |
/// | `messages`      | `/projectId`  | threadId + createdAt, createdAt |
/// | `approvals`     | `/projectId`  | status + createdAt |
/// | `toolInventory` | `/orgId`      | category + name, status + monthlyCost |
/// | `webhooks`      | `/orgId`      | active + createdAt |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Container queried by the health check
pub const HEALTH_CHECK_CONTAINER: &str = "organizations";

/// Cosmos DB partition key definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionKeyDefinition {
    pub paths: Vec<String>,

    #[serde(default = "default_partition_kind")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
}

fn default_partition_kind() -> String {
    "Hash".to_string()
}

/// Sort order of one composite index path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One path inside a composite index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositePath {
    pub path: String,
    pub order: SortOrder,
}

impl CompositePath {
    pub fn asc(path: &str) -> Self {
        Self {
            path: path.to_string(),
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(path: &str) -> Self {
        Self {
            path: path.to_string(),
            order: SortOrder::Descending,
        }
    }
}

/// Indexing path entry (`includedPaths` / `excludedPaths`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPath {
    pub path: String,
}

/// Container indexing policy
///
/// Fields the portal does not manage (spatial indexes, vector indexes...)
/// are kept in `extra` so a replace round-trips them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingPolicy {
    #[serde(default = "default_indexing_mode")]
    pub indexing_mode: String,

    #[serde(default = "default_true")]
    pub automatic: bool,

    #[serde(default)]
    pub included_paths: Vec<IndexPath>,

    #[serde(default)]
    pub excluded_paths: Vec<IndexPath>,

    #[serde(default)]
    pub composite_indexes: Vec<Vec<CompositePath>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_indexing_mode() -> String {
    "consistent".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        Self {
            indexing_mode: default_indexing_mode(),
            automatic: true,
            included_paths: vec![IndexPath {
                path: "/*".to_string(),
            }],
            excluded_paths: vec![IndexPath {
                path: "/\"_etag\"/?".to_string(),
            }],
            composite_indexes: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl IndexingPolicy {
    /// Whether the composite indexes match, ignoring their order in the list
    pub fn has_composite_indexes(&self, desired: &[Vec<CompositePath>]) -> bool {
        self.composite_indexes.len() == desired.len()
            && desired.iter().all(|index| self.composite_indexes.contains(index))
    }
}

/// Container definition as sent to and returned by Cosmos DB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub id: String,

    pub partition_key: PartitionKeyDefinition,

    #[serde(default)]
    pub indexing_policy: IndexingPolicy,

    /// System properties (`_rid`, `_etag`, ...) and unmanaged settings
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContainerDefinition {
    fn new(id: &str, partition_key: &str, composite_indexes: Vec<Vec<CompositePath>>) -> Self {
        Self {
            id: id.to_string(),
            partition_key: PartitionKeyDefinition {
                paths: vec![partition_key.to_string()],
                kind: default_partition_kind(),
                version: None,
            },
            indexing_policy: IndexingPolicy {
                composite_indexes,
                ..IndexingPolicy::default()
            },
            extra: Map::new(),
        }
    }

    /// Partition key path, e.g. `/orgId`
    pub fn partition_key_path(&self) -> &str {
        self.partition_key
            .paths
            .first()
            .map(String::as_str)
            .unwrap_or("/id")
    }

    /// Partition key field name, e.g. `orgId`
    pub fn partition_key_field(&self) -> &str {
        self.partition_key_path().trim_start_matches('/')
    }
}

/// Every container the portal uses
pub fn containers() -> Vec<ContainerDefinition> {
    use CompositePath as P;

    vec![
        ContainerDefinition::new("organizations", "/orgId", vec![]),
        ContainerDefinition::new(
            "users",
            "/orgId",
            vec![
                vec![P::asc("/orgId"), P::asc("/email")],
                vec![P::asc("/orgId"), P::asc("/name")],
            ],
        ),
        ContainerDefinition::new(
            "projects",
            "/orgId",
            vec![
                vec![P::asc("/orgId"), P::asc("/status"), P::desc("/updatedAt")],
                vec![P::asc("/orgId"), P::desc("/updatedAt")],
            ],
        ),
        ContainerDefinition::new(
            "workItems",
            "/projectId",
            vec![
                vec![P::asc("/projectId"), P::asc("/status"), P::asc("/dueDate")],
                vec![P::asc("/projectId"), P::desc("/priority"), P::desc("/createdAt")],
            ],
        ),
        ContainerDefinition::new(
            "events",
            "/projectId",
            vec![
                vec![P::asc("/projectId"), P::asc("/startsAt")],
                vec![P::asc("/projectId"), P::asc("/kind"), P::asc("/startsAt")],
            ],
        ),
        ContainerDefinition::new(
            "assets",
            "/projectId",
            vec![vec![P::asc("/projectId"), P::asc("/status"), P::desc("/updatedAt")]],
        ),
        ContainerDefinition::new(
            "insights",
            "/projectId",
            vec![vec![P::asc("/projectId"), P::asc("/period"), P::asc("/metric")]],
        ),
        ContainerDefinition::new(
            "messages",
            "/projectId",
            vec![
                vec![P::asc("/projectId"), P::asc("/threadId"), P::asc("/createdAt")],
                vec![P::asc("/projectId"), P::desc("/createdAt")],
            ],
        ),
        ContainerDefinition::new(
            "approvals",
            "/projectId",
            vec![vec![P::asc("/projectId"), P::asc("/status"), P::desc("/createdAt")]],
        ),
        ContainerDefinition::new(
            "toolInventory",
            "/orgId",
            vec![
                vec![P::asc("/orgId"), P::asc("/category"), P::asc("/name")],
                vec![P::asc("/orgId"), P::asc("/status"), P::desc("/monthlyCost")],
            ],
        ),
        ContainerDefinition::new(
            "webhooks",
            "/orgId",
            vec![vec![P::asc("/orgId"), P::asc("/active"), P::desc("/createdAt")]],
        ),
    ]
}

/// Looks up one container definition by name
pub fn container(name: &str) -> Option<ContainerDefinition> {
    containers().into_iter().find(|c| c.id == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalogue_names_are_unique() {
        let defs = containers();
        let mut names: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), defs.len());
    }

    #[test]
    fn test_composite_indexes_lead_with_partition_key() {
        for def in containers() {
            for index in &def.indexing_policy.composite_indexes {
                assert!(index.len() >= 2, "{} has a single-path composite index", def.id);
                assert_eq!(index[0].path, def.partition_key_path(), "{}", def.id);
            }
        }
    }

    #[test]
    fn test_serializes_cosmos_shape() {
        let def = container("workItems").unwrap();
        let body = serde_json::to_value(&def).unwrap();

        assert_eq!(body["partitionKey"]["paths"], json!(["/projectId"]));
        assert_eq!(body["partitionKey"]["kind"], "Hash");
        assert_eq!(body["indexingPolicy"]["indexingMode"], "consistent");
        assert_eq!(
            body["indexingPolicy"]["compositeIndexes"][0][2],
            json!({"path": "/dueDate", "order": "ascending"})
        );
    }

    #[test]
    fn test_round_trips_unmanaged_fields() {
        let raw = json!({
            "id": "projects",
            "partitionKey": {"paths": ["/orgId"], "kind": "Hash", "version": 2},
            "indexingPolicy": {"indexingMode": "consistent", "automatic": true, "spatialIndexes": []},
            "_rid": "abc==",
            "defaultTtl": -1
        });

        let def: ContainerDefinition = serde_json::from_value(raw).unwrap();
        assert_eq!(def.partition_key_field(), "orgId");
        assert_eq!(def.partition_key.version, Some(2));
        assert!(def.indexing_policy.composite_indexes.is_empty());
        assert!(def.indexing_policy.extra.contains_key("spatialIndexes"));
        assert_eq!(def.extra["defaultTtl"], json!(-1));
    }

    #[test]
    fn test_has_composite_indexes_ignores_list_order() {
        let mut def = container("projects").unwrap();
        let desired = def.indexing_policy.composite_indexes.clone();
        def.indexing_policy.composite_indexes.reverse();

        assert!(def.indexing_policy.has_composite_indexes(&desired));

        def.indexing_policy.composite_indexes.pop();
        assert!(!def.indexing_policy.has_composite_indexes(&desired));
    }
}
