use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Datelike, Timelike, Utc};

use pawdeck_common::models::SubAction;

use crate::services::interpreter::{ExecutionContext, Interpreter, StepHandler, StepOutput};
use crate::Error;

/// Exposes the current timestamp, formatted plus decomposed into fields.
pub struct CurrentDatetimeHandler;

#[async_trait]
impl StepHandler for CurrentDatetimeHandler {
    fn kind(&self) -> &'static str {
        "current_datetime"
    }

    async fn execute(
        &self,
        step: &SubAction,
        _ctx: &mut ExecutionContext,
        _interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let format = step.field_str("format").unwrap_or("%Y-%m-%d %H:%M:%S");
        let now_utc = Utc::now();
        let (formatted, fields) = match step.field_str("timezone") {
            Some(tz_name) => {
                let Ok(tz) = chrono_tz::Tz::from_str(tz_name) else {
                    return Ok(StepOutput::fail(format!("unknown timezone '{}'", tz_name)));
                };
                let local = now_utc.with_timezone(&tz);
                (local.format(format).to_string(), decompose(&local))
            }
            None => (now_utc.format(format).to_string(), decompose(&now_utc)),
        };
        let mut vars = fields;
        vars.insert("datetime".to_string(), formatted);
        Ok(StepOutput::ok_with(vars))
    }
}

fn decompose<T: Datelike + Timelike>(moment: &T) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("year".into(), moment.year().to_string());
    vars.insert("month".into(), moment.month().to_string());
    vars.insert("day".into(), moment.day().to_string());
    vars.insert("hour".into(), moment.hour().to_string());
    vars.insert("minute".into(), moment.minute().to_string());
    vars.insert("second".into(), moment.second().to_string());
    vars.insert("weekday".into(), format!("{:?}", moment.weekday()));
    vars
}
