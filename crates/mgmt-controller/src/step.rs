//! Step handlers and per-stage step queues
//!
//! Steps queued for a later stage run in the order they were added. Steps
//! added to the running stage run next, in the order they were added, ahead
//! of anything queued before them.

use crate::context::OperationContext;
use crate::error::ControllerError;
use crate::state::Stage;
use mgmt_model::OperationRequest;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Unit of work executed against an [`OperationContext`]
///
/// Closures with the matching signature are handlers too.
pub trait OperationStepHandler: Send + Sync {
    /// Run the step for `operation`
    ///
    /// # Errors
    /// Any failure aborts the request and triggers rollback.
    fn execute(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
    ) -> Result<(), ControllerError>;
}

impl<F> OperationStepHandler for F
where
    F: Fn(&mut OperationContext, &OperationRequest) -> Result<(), ControllerError> + Send + Sync,
{
    fn execute(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
    ) -> Result<(), ControllerError> {
        self(context, operation)
    }
}

/// Queued step: a handler plus the operation it runs for
#[derive(Clone)]
pub struct Step {
    pub(crate) operation: OperationRequest,
    pub(crate) handler: Arc<dyn OperationStepHandler>,
}

impl Step {
    /// Step running `handler` for `operation`
    #[must_use]
    pub fn new(operation: OperationRequest, handler: Arc<dyn OperationStepHandler>) -> Self {
        Self { operation, handler }
    }

    /// Operation the step runs for
    #[inline]
    #[must_use]
    pub fn operation(&self) -> &OperationRequest {
        &self.operation
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("operation", &self.operation.to_string())
            .finish_non_exhaustive()
    }
}

/// Step queues of one request
#[derive(Debug, Default)]
pub(crate) struct StepQueues {
    running: Option<Stage>,
    /// Steps of the running stage; the top runs next
    stack: Vec<Step>,
    /// Steps added to the running stage by the step in progress
    added: Vec<Step>,
    /// Steps of stages not started yet, in insertion order
    pending: BTreeMap<Stage, Vec<Step>>,
}

impl StepQueues {
    pub(crate) fn push(&mut self, stage: Stage, step: Step) -> Result<(), ControllerError> {
        match self.running {
            Some(running) if running == stage => self.added.push(step),
            Some(running) if running > stage => {
                return Err(ControllerError::Failed(format!(
                    "cannot add a {stage:?} step once the {running:?} stage is running"
                )))
            }
            _ => self.pending.entry(stage).or_default().push(step),
        }
        Ok(())
    }

    pub(crate) fn has_steps(&self, stage: Stage) -> bool {
        self.pending.get(&stage).is_some_and(|steps| !steps.is_empty())
    }

    pub(crate) fn start(&mut self, stage: Stage) {
        self.running = Some(stage);
        self.stack = self.pending.remove(&stage).unwrap_or_default();
        self.stack.reverse();
        self.added.clear();
    }

    pub(crate) fn next(&mut self) -> Option<Step> {
        while let Some(step) = self.added.pop() {
            self.stack.push(step);
        }
        self.stack.pop()
    }
}
