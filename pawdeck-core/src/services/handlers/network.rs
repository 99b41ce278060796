use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use pawdeck_common::models::SubAction;

use crate::services::interpreter::{template, ExecutionContext, Interpreter, StepHandler, StepOutput};
use crate::Error;

/// Issues an HTTP request with configurable method, headers and body, and
/// stores the response into a named variable. The per-request timeout is
/// the only cancellation point in the interpreter.
pub struct HttpRequestHandler {
    client: reqwest::Client,
}

impl HttpRequestHandler {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpRequestHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepHandler for HttpRequestHandler {
    fn kind(&self) -> &'static str {
        "http_request"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        _interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let url = template::render_field(step, "url", ctx);
        if url.is_empty() {
            return Ok(StepOutput::fail("http_request requires a 'url' field"));
        }
        let method_raw = step.field_str("method").unwrap_or("GET");
        let Ok(method) = reqwest::Method::from_str(&method_raw.to_uppercase()) else {
            return Ok(StepOutput::fail(format!("invalid HTTP method '{}'", method_raw)));
        };
        let timeout_secs = step.field_f64("timeout_seconds").unwrap_or(10.0).max(0.1);

        let mut request = self
            .client
            .request(method, &url)
            .timeout(Duration::from_secs_f64(timeout_secs));

        if let Some(headers) = step.fields.get("headers").and_then(|v| v.as_object()) {
            for (name, value) in headers {
                if let Some(raw) = value.as_str() {
                    request = request.header(name, template::render(raw, ctx));
                }
            }
        }
        if let Some(body) = step.field_str("body") {
            request = request.body(template::render(body, ctx));
        }

        debug!("http_request step calling {}", url);
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return Ok(StepOutput::fail(format!("request failed: {}", e))),
        };
        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return Ok(StepOutput::fail(format!("reading response failed: {}", e))),
        };

        let variable = step.field_str("variable").unwrap_or("httpResponse").to_string();
        let stored = if step.field_bool("parse_json").unwrap_or(false) {
            match serde_json::from_str::<serde_json::Value>(&body) {
                Ok(value) => value.to_string(),
                Err(e) => {
                    return Ok(StepOutput::fail(format!("response is not valid JSON: {}", e)));
                }
            }
        } else {
            body
        };

        let mut vars = HashMap::new();
        vars.insert("httpStatus".to_string(), status.as_u16().to_string());
        vars.insert(variable, stored);
        Ok(StepOutput::ok_with(vars))
    }
}
