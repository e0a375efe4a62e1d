/// Workflow runner contract
///
/// A runner executes one workflow request to completion and reports the
/// outcome. Runners must be shareable across request handlers.
///
/// ```no_run
/// use async_trait::async_trait;
/// use portal_shared::workflow::{WorkflowOutcome, WorkflowRequest, WorkflowResult, WorkflowRunner};
///
/// struct NoopRunner;
///
/// #[async_trait]
/// impl WorkflowRunner for NoopRunner {
///     fn name(&self) -> &str {
///         "noop"
///     }
///
///     async fn run(&self, request: WorkflowRequest) -> WorkflowResult<WorkflowOutcome> {
///         unimplemented!("{}", request.action)
///     }
/// }
/// ```

use async_trait::async_trait;
use std::sync::Arc;

use super::{WorkflowOutcome, WorkflowRequest, WorkflowResult};

#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Runner name, used in logs
    fn name(&self) -> &str;

    /// Executes a workflow
    ///
    /// A workflow that ran but did not succeed is an `Ok` outcome with
    /// status `failed`. `Err` means the request itself was unusable.
    async fn run(&self, request: WorkflowRequest) -> WorkflowResult<WorkflowOutcome>;
}

pub type SharedRunner = Arc<dyn WorkflowRunner>;
