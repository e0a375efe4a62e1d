/// Tool inventory model
///
/// The marketing tools an organization pays for (analytics, email, ads,
/// social scheduling...), with their monthly cost. Partitioned on `/orgId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Active,
    Trial,
    Retired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInventoryItem {
    pub id: String,

    /// Partition key
    pub org_id: String,

    pub name: String,

    pub category: String,

    /// Never negative
    pub monthly_cost: f64,

    /// Who administers the tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    pub status: ToolStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for ToolInventoryItem {
    const CONTAINER: &'static str = "toolInventory";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.org_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateToolInventoryItem {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: String,

    #[validate(range(min = 0.0, message = "Monthly cost cannot be negative"))]
    pub monthly_cost: f64,

    pub owner: Option<String>,

    #[serde(default = "default_status")]
    pub status: ToolStatus,
}

fn default_status() -> ToolStatus {
    ToolStatus::Active
}

impl ToolInventoryItem {
    pub fn build(org_id: &str, id: &str, data: CreateToolInventoryItem) -> Self {
        let now = Utc::now();

        ToolInventoryItem {
            id: id.to_string(),
            org_id: org_id.to_string(),
            name: data.name,
            category: data.category,
            monthly_cost: data.monthly_cost,
            owner: data.owner,
            status: data.status,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn upsert(store: &SharedStore, item: &ToolInventoryItem) -> StoreResult<Self> {
        get_container::<ToolInventoryItem>(store).upsert(item).await
    }

    /// Lists an organization's tools by name
    pub async fn list_by_org(store: &SharedStore, org_id: &str) -> StoreResult<Vec<Self>> {
        let query = Query::new("SELECT * FROM c WHERE c.orgId = @orgId ORDER BY c.name ASC").param("@orgId", org_id);
        get_container::<ToolInventoryItem>(store).query(&query, Some(org_id)).await
    }

    /// Monthly spend across tools that are not retired
    pub fn monthly_spend(items: &[ToolInventoryItem]) -> f64 {
        items
            .iter()
            .filter(|t| t.status != ToolStatus::Retired)
            .map(|t| t.monthly_cost)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, cost: f64, status: ToolStatus) -> CreateToolInventoryItem {
        CreateToolInventoryItem {
            name: name.to_string(),
            category: "analytics".to_string(),
            monthly_cost: cost,
            owner: None,
            status,
        }
    }

    #[test]
    fn test_negative_cost_rejected() {
        assert!(input("GA", 0.0, ToolStatus::Active).validate().is_ok());
        assert!(input("GA", -5.0, ToolStatus::Active).validate().is_err());
    }

    #[test]
    fn test_monthly_spend_skips_retired() {
        let items = vec![
            ToolInventoryItem::build("o", "t1", input("A", 100.0, ToolStatus::Active)),
            ToolInventoryItem::build("o", "t2", input("B", 50.0, ToolStatus::Trial)),
            ToolInventoryItem::build("o", "t3", input("C", 999.0, ToolStatus::Retired)),
        ];
        assert_eq!(ToolInventoryItem::monthly_spend(&items), 150.0);
    }
}
