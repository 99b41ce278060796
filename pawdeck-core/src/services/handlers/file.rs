use std::collections::HashMap;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::info;

use pawdeck_common::models::SubAction;
use pawdeck_common::traits::capabilities::FileAccess;

use crate::services::interpreter::{template, ExecutionContext, Interpreter, StepHandler, StepOutput};
use crate::Error;

/// Default [`FileAccess`] backed by the local filesystem.
pub struct LocalFileAccess;

#[async_trait]
impl FileAccess for LocalFileAccess {
    async fn write_text(&self, path: &str, contents: &str, append: bool) -> Result<(), Error> {
        if append {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(contents.as_bytes()).await?;
            file.flush().await?;
            Ok(())
        } else {
            tokio::fs::write(path, contents).await?;
            Ok(())
        }
    }

    async fn read_text(&self, path: &str) -> Result<String, Error> {
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

/// Writes or appends templated text to a file.
pub struct FileWriteHandler;

#[async_trait]
impl StepHandler for FileWriteHandler {
    fn kind(&self) -> &'static str {
        "file_write"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let path = template::render_field(step, "path", ctx);
        if path.is_empty() {
            return Ok(StepOutput::fail("file_write requires a 'path' field"));
        }
        let Some(files) = &interpreter.runtime().files else {
            info!("No file capability configured; skipping file_write");
            return Ok(StepOutput::ok());
        };
        let content = template::render_field(step, "content", ctx);
        let append = step.field_bool("append").unwrap_or(false);
        files.write_text(&path, &content, append).await?;
        Ok(StepOutput::ok())
    }
}

/// Reads a file into a variable.
pub struct FileReadHandler;

#[async_trait]
impl StepHandler for FileReadHandler {
    fn kind(&self) -> &'static str {
        "file_read"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let path = template::render_field(step, "path", ctx);
        if path.is_empty() {
            return Ok(StepOutput::fail("file_read requires a 'path' field"));
        }
        let variable = step.field_str("variable").unwrap_or("fileContents").to_string();
        let Some(files) = &interpreter.runtime().files else {
            info!("No file capability configured; file_read yields an empty value");
            let mut vars = HashMap::new();
            vars.insert(variable, String::new());
            return Ok(StepOutput::ok_with(vars));
        };
        let contents = files.read_text(&path).await?;
        let mut vars = HashMap::new();
        vars.insert(variable, contents);
        Ok(StepOutput::ok_with(vars))
    }
}
