use async_trait::async_trait;
use tracing::info;

use pawdeck_common::models::SubAction;

use crate::services::interpreter::{template, ExecutionContext, Interpreter, StepHandler, StepOutput};
use crate::Error;

/// Plays a sound file, optionally blocking the chain until playback ends.
pub struct PlaySoundHandler;

#[async_trait]
impl StepHandler for PlaySoundHandler {
    fn kind(&self) -> &'static str {
        "play_sound"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let path = template::render_field(step, "path", ctx);
        if path.is_empty() {
            return Ok(StepOutput::fail("play_sound requires a 'path' field"));
        }
        let Some(media) = &interpreter.runtime().media else {
            info!("No media capability configured; skipping play_sound");
            return Ok(StepOutput::ok());
        };
        let volume = step.field_f64("volume").unwrap_or(1.0).clamp(0.0, 1.0) as f32;
        let wait = step.field_bool("wait").unwrap_or(false);
        media.play_sound(&path, volume, wait).await?;
        Ok(StepOutput::ok())
    }
}
