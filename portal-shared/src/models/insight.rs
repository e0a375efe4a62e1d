/// Insight model
///
/// A reported metric for a period (e.g. `ctr` for `2024-03`), with the
/// change against the previous period. Partitioned on `/projectId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{get_container, Document, Query, SharedStore, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,

    /// Partition key
    pub project_id: String,

    pub title: String,

    /// Metric key, e.g. `impressions`
    pub metric: String,

    pub value: f64,

    /// Change against the previous period
    #[serde(default)]
    pub delta: f64,

    /// Reporting period, e.g. `2024-03`
    pub period: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Insight {
    const CONTAINER: &'static str = "insights";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.project_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInsight {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 100))]
    pub metric: String,

    pub value: f64,

    #[serde(default)]
    pub delta: f64,

    #[validate(length(min = 1, max = 32))]
    pub period: String,
}

impl Insight {
    pub fn build(project_id: &str, id: &str, data: CreateInsight) -> Self {
        let now = Utc::now();

        Insight {
            id: id.to_string(),
            project_id: project_id.to_string(),
            title: data.title,
            metric: data.metric,
            value: data.value,
            delta: data.delta,
            period: data.period,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn upsert(store: &SharedStore, insight: &Insight) -> StoreResult<Self> {
        get_container::<Insight>(store).upsert(insight).await
    }

    /// Lists a project's insights for one period
    pub async fn list_by_period(store: &SharedStore, project_id: &str, period: &str) -> StoreResult<Vec<Self>> {
        let query = Query::new(
            "SELECT * FROM c WHERE c.projectId = @projectId AND c.period = @period ORDER BY c.metric ASC",
        )
        .param("@projectId", project_id)
        .param("@period", period);
        get_container::<Insight>(store).query(&query, Some(project_id)).await
    }
}
