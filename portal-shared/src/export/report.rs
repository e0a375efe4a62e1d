/// Report contents shared by the PDF and XLSX renderers
///
/// Summary figures (status counts, completion, pending approvals) are
/// computed here so both formats print the same numbers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::StoreResult;
use crate::db::SharedStore;
use crate::models::approval::{Approval, ApprovalStatus};
use crate::models::project::Project;
use crate::models::work_item::{WorkItem, WorkItemStatus};

/// Everything an export needs about one project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    pub project: Project,
    pub work_items: Vec<WorkItem>,
    pub approvals: Vec<Approval>,
    pub generated_at: DateTime<Utc>,
}

impl ProjectReport {
    pub fn new(project: Project, work_items: Vec<WorkItem>, approvals: Vec<Approval>) -> Self {
        Self {
            project,
            work_items,
            approvals,
            generated_at: Utc::now(),
        }
    }

    /// Gathers the work items and approvals of an already loaded project
    ///
    /// Callers read the project from its own organization partition and
    /// check access first; nothing here looks across organizations.
    pub async fn load(store: &SharedStore, project: Project) -> StoreResult<Self> {
        let work_items = WorkItem::list_by_project(store, &project.id).await?;
        let approvals = Approval::list_by_project(store, &project.id).await?;

        Ok(Self::new(project, work_items, approvals))
    }

    /// Work items per status, in workflow order
    pub fn work_item_counts(&self) -> Vec<(WorkItemStatus, usize)> {
        [
            WorkItemStatus::Todo,
            WorkItemStatus::InProgress,
            WorkItemStatus::Review,
            WorkItemStatus::Done,
        ]
        .into_iter()
        .map(|status| (status, self.work_items.iter().filter(|w| w.status == status).count()))
        .collect()
    }

    /// Share of work items done, 0..=100
    pub fn completion_percent(&self) -> u32 {
        if self.work_items.is_empty() {
            return 0;
        }
        let done = self
            .work_items
            .iter()
            .filter(|w| w.status == WorkItemStatus::Done)
            .count();
        ((done * 100) / self.work_items.len()) as u32
    }

    pub fn pending_approvals(&self) -> usize {
        self.approvals
            .iter()
            .filter(|a| a.status == ApprovalStatus::Pending)
            .count()
    }

    /// `start - end` schedule text, `-` for open ends
    pub fn schedule(&self) -> String {
        let fmt = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        format!("{} to {}", fmt(self.project.start_date), fmt(self.project.end_date))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::approval::CreateApproval;
    use crate::models::project::{CreateProject, ProjectStatus};
    use crate::models::work_item::CreateWorkItem;

    pub fn report() -> ProjectReport {
        let project = Project::build("org-1", "proj-1", CreateProject {
            name: "Spring Launch".to_string(),
            client_name: "Acme Outdoor".to_string(),
            description: Some("Seasonal campaign".to_string()),
            status: ProjectStatus::Active,
            budget: 48000.0,
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 31),
        });

        let item = |id: &str, title: &str, status: WorkItemStatus| {
            WorkItem::build("proj-1", id, CreateWorkItem {
                title: title.to_string(),
                description: None,
                status,
                priority: 3,
                assignee_id: None,
                due_date: None,
            })
        };

        let approval = Approval::build("proj-1", "appr-1", "user-1", CreateApproval {
            subject_type: "asset".to_string(),
            subject_id: "asset-1".to_string(),
            comment: None,
        });

        ProjectReport::new(
            project,
            vec![
                item("wi-1", "Brief", WorkItemStatus::Done),
                item("wi-2", "Creative", WorkItemStatus::InProgress),
                item("wi-3", "Media plan", WorkItemStatus::Todo),
                item("wi-4", "Landing page", WorkItemStatus::Done),
            ],
            vec![approval],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_summary_figures() {
        let report = fixtures::report();
        assert_eq!(report.completion_percent(), 50);
        assert_eq!(report.pending_approvals(), 1);
        assert_eq!(report.schedule(), "2024-03-01 to 2024-05-31");

        let counts = report.work_item_counts();
        assert_eq!(counts[0], (WorkItemStatus::Todo, 1));
        assert_eq!(counts[3], (WorkItemStatus::Done, 2));
    }

    #[tokio::test]
    async fn test_load() {
        let store: SharedStore = Arc::new(MemoryStore::new("test"));
        store.initialize_database().await.unwrap();

        let fixture = fixtures::report();
        for item in &fixture.work_items {
            WorkItem::upsert(&store, item).await.unwrap();
        }

        let report = ProjectReport::load(&store, fixture.project.clone()).await.unwrap();
        assert_eq!(report.project.name, "Spring Launch");
        assert_eq!(report.work_items.len(), 4);
        assert!(report.approvals.is_empty());
    }
}
