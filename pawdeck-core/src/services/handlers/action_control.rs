use async_trait::async_trait;
use uuid::Uuid;

use pawdeck_common::models::SubAction;

use crate::services::interpreter::{template, ExecutionContext, Interpreter, StepHandler, StepOutput};
use crate::Error;

/// Runs another configured action, reusing the current context. Delegates
/// to the interpreter's recursion-guarded entry; a target already on the
/// call stack is refused and reported as failure.
pub struct RunActionHandler;

#[async_trait]
impl StepHandler for RunActionHandler {
    fn kind(&self) -> &'static str {
        "run_action"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let raw = template::render_field(step, "action_id", ctx);
        let Ok(action_id) = Uuid::parse_str(raw.trim()) else {
            return Ok(StepOutput::fail(format!("'{}' is not a valid action id", raw)));
        };
        if interpreter.run_action_by_id(action_id, ctx).await {
            Ok(StepOutput::ok())
        } else {
            Ok(StepOutput::fail(format!("running action {} failed", action_id)))
        }
    }
}

/// Enables or disables another action in the catalog.
pub struct SetActionStateHandler;

#[async_trait]
impl StepHandler for SetActionStateHandler {
    fn kind(&self) -> &'static str {
        "set_action_state"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let raw = template::render_field(step, "action_id", ctx);
        let Ok(action_id) = Uuid::parse_str(raw.trim()) else {
            return Ok(StepOutput::fail(format!("'{}' is not a valid action id", raw)));
        };
        let enabled = step.field_bool("enabled").unwrap_or(true);
        match interpreter.actions().set_action_enabled(action_id, enabled) {
            Ok(()) => Ok(StepOutput::ok()),
            Err(e) => Ok(StepOutput::fail(e.to_string())),
        }
    }
}
