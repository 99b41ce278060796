use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use pawdeck_common::models::SubAction;

use crate::services::interpreter::{ExecutionContext, Interpreter, StepHandler, StepOutput};
use crate::Error;

/// Pauses the current chain for a fixed or randomized duration. Only this
/// chain suspends; concurrently processed events keep flowing.
pub struct DelayHandler;

#[async_trait]
impl StepHandler for DelayHandler {
    fn kind(&self) -> &'static str {
        "delay"
    }

    async fn execute(
        &self,
        step: &SubAction,
        _ctx: &mut ExecutionContext,
        _interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let duration = {
            let min = step.field_f64("min_seconds");
            let max = step.field_f64("max_seconds");
            let seconds = match (min, max) {
                (Some(lo), Some(hi)) if hi > lo => rand::rng().random_range(lo..hi),
                _ => step.field_f64("seconds").unwrap_or(0.0),
            };
            Duration::from_secs_f64(seconds.max(0.0))
        };
        debug!("Delay step sleeping {:?}", duration);
        tokio::time::sleep(duration).await;
        Ok(StepOutput::ok())
    }
}

/// Draws an integer uniformly from an inclusive range into a variable.
pub struct RandomNumberHandler;

#[async_trait]
impl StepHandler for RandomNumberHandler {
    fn kind(&self) -> &'static str {
        "random_number"
    }

    async fn execute(
        &self,
        step: &SubAction,
        _ctx: &mut ExecutionContext,
        _interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let mut min = step.field_i64("min").unwrap_or(0);
        let mut max = step.field_i64("max").unwrap_or(100);
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        let value = rand::rng().random_range(min..=max);
        let variable = step.field_str("variable").unwrap_or("randomNumber");
        let mut vars = HashMap::new();
        vars.insert(variable.to_string(), value.to_string());
        Ok(StepOutput::ok_with(vars))
    }
}

/// Authoring aid; does nothing at runtime.
pub struct CommentHandler;

#[async_trait]
impl StepHandler for CommentHandler {
    fn kind(&self) -> &'static str {
        "comment"
    }

    async fn execute(
        &self,
        _step: &SubAction,
        _ctx: &mut ExecutionContext,
        _interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        Ok(StepOutput::ok())
    }
}
