/// Project report export
///
/// A [`ProjectReport`] gathers a project with its work items and approvals;
/// the renderers turn it into a downloadable PDF or XLSX file.
///
/// ```no_run
/// use portal_shared::export::{ExportFormat, ProjectReport};
/// use portal_shared::models::project::Project;
/// # use portal_shared::db::SharedStore;
///
/// # async fn example(store: SharedStore) -> Result<(), Box<dyn std::error::Error>> {
/// if let Some(project) = Project::find(&store, "org-acme", "proj-spring-launch").await? {
///     let report = ProjectReport::load(&store, project).await?;
///     let bytes = ExportFormat::Pdf.render(&report)?;
///     assert!(bytes.starts_with(b"%PDF-1.4"));
/// }
/// # Ok(())
/// # }
/// ```

pub mod pdf;
pub mod report;
pub mod xlsx;

pub use report::ProjectReport;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::StoreError;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Supported download formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Xlsx,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// Download file name, e.g. `project-abc-report.pdf`
    pub fn filename(&self, project_id: &str) -> String {
        format!("project-{}-report.{}", project_id, self.extension())
    }

    /// `Content-Disposition` header value
    pub fn content_disposition(&self, project_id: &str) -> String {
        format!("attachment; filename=\"{}\"", self.filename(project_id))
    }

    pub fn render(&self, report: &ProjectReport) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Pdf => pdf::render(report),
            ExportFormat::Xlsx => xlsx::render(report),
        }
    }
}
