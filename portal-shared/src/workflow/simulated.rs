/// Simulated workflow runner
///
/// Answers every action with a canned, plausible result. Nothing is sent
/// anywhere and nothing is written to the store.
///
/// # Payload
///
/// ```json
/// {
///   "simulateFailure": false,  // return a failed outcome (default: false)
///   "delayMs": 0               // pretend the work takes this long (default: 0, max: 5000)
/// }
/// ```
///
/// Actions read a few extra keys: `generate-report` takes `format`
/// (`pdf` or `xlsx`), `publish-campaign` takes `channels`, `send-digest`
/// takes `period`.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use super::{WorkflowAction, WorkflowError, WorkflowOutcome, WorkflowRequest, WorkflowResult, WorkflowRunner, WorkflowStatus};

const MAX_DELAY_MS: u64 = 5000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulationOptions {
    #[serde(default)]
    simulate_failure: bool,

    #[serde(default)]
    delay_ms: u64,

    #[serde(default)]
    format: Option<String>,

    #[serde(default)]
    channels: Option<Vec<String>>,

    #[serde(default)]
    period: Option<String>,
}

impl SimulationOptions {
    fn parse(payload: &Value) -> WorkflowResult<Self> {
        match payload {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => {
                let options: Self = serde_json::from_value(payload.clone())
                    .map_err(|e| WorkflowError::InvalidPayload(e.to_string()))?;

                if options.delay_ms > MAX_DELAY_MS {
                    return Err(WorkflowError::InvalidPayload(format!(
                        "delayMs must be <= {}",
                        MAX_DELAY_MS
                    )));
                }
                if let Some(format) = &options.format {
                    if format != "pdf" && format != "xlsx" {
                        return Err(WorkflowError::InvalidPayload(
                            "format must be \"pdf\" or \"xlsx\"".to_string(),
                        ));
                    }
                }
                Ok(options)
            }
            _ => Err(WorkflowError::InvalidPayload("payload must be a JSON object".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedRunner;

impl SimulatedRunner {
    pub fn new() -> Self {
        SimulatedRunner
    }

    fn canned(request: &WorkflowRequest, options: &SimulationOptions) -> (String, Value) {
        let project_id = &request.project_id;

        match request.action {
            WorkflowAction::GenerateReport => {
                let format = options.format.as_deref().unwrap_or("pdf");
                (
                    format!("Report generated ({})", format),
                    json!({
                        "format": format,
                        "downloadUrl": format!("/v1/projects/{}/export/{}", project_id, format),
                    }),
                )
            }
            WorkflowAction::SyncTools => (
                "Tool inventory synchronized".to_string(),
                json!({
                    "toolsChecked": 6,
                    "toolsUpdated": 2,
                    "source": "simulated",
                }),
            ),
            WorkflowAction::RequestApproval => (
                "Approval request sent to client".to_string(),
                json!({
                    "approvalStatus": "pending",
                    "notified": ["client"],
                }),
            ),
            WorkflowAction::PublishCampaign => {
                let channels = options
                    .channels
                    .clone()
                    .unwrap_or_else(|| vec!["email".to_string(), "social".to_string()]);
                (
                    format!("Campaign published to {} channel(s)", channels.len()),
                    json!({
                        "channels": channels,
                        "publishedAt": Utc::now(),
                    }),
                )
            }
            WorkflowAction::SendDigest => {
                let period = options.period.as_deref().unwrap_or("weekly");
                (
                    format!("{} digest sent", period),
                    json!({
                        "period": period,
                        "recipients": 3,
                    }),
                )
            }
        }
    }
}

#[async_trait]
impl WorkflowRunner for SimulatedRunner {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn run(&self, request: WorkflowRequest) -> WorkflowResult<WorkflowOutcome> {
        let options = SimulationOptions::parse(&request.payload)?;
        let started_at = Utc::now();

        info!(
            action = %request.action,
            project_id = %request.project_id,
            requested_by = %request.requested_by,
            "Simulated workflow starting"
        );

        if options.delay_ms > 0 {
            sleep(Duration::from_millis(options.delay_ms)).await;
        }

        let (status, message, output) = if options.simulate_failure {
            warn!(action = %request.action, project_id = %request.project_id, "Simulating workflow failure");
            (
                WorkflowStatus::Failed,
                format!("Simulated failure of {}", request.action),
                json!({ "error": "simulated_failure" }),
            )
        } else {
            let (message, output) = Self::canned(&request, &options);
            (WorkflowStatus::Completed, message, output)
        };

        Ok(WorkflowOutcome {
            action: request.action,
            project_id: request.project_id,
            status,
            message,
            simulated: true,
            started_at,
            completed_at: Utc::now(),
            output,
        })
    }
}
