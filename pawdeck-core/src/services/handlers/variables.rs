use std::collections::HashMap;

use async_trait::async_trait;

use pawdeck_common::models::SubAction;

use crate::services::interpreter::{template, ExecutionContext, Interpreter, StepHandler, StepOutput};
use crate::Error;

fn resolve_user(step: &SubAction, ctx: &ExecutionContext) -> Option<String> {
    let templated = template::render_field(step, "user", ctx);
    if !templated.is_empty() {
        return Some(templated);
    }
    ctx.user.clone()
}

/// Writes a value into the engine's global variable store and exposes it
/// to the rest of the chain.
pub struct SetVariableHandler;

#[async_trait]
impl StepHandler for SetVariableHandler {
    fn kind(&self) -> &'static str {
        "set_variable"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(name) = step.field_str("name") else {
            return Ok(StepOutput::fail("set_variable requires a 'name' field"));
        };
        let value = template::render_field(step, "value", ctx);
        let globals = &interpreter.runtime().globals;
        globals.set(name, &value);
        if step.field_bool("persist").unwrap_or(false) {
            globals.persist()?;
        }
        let mut vars = HashMap::new();
        vars.insert(name.to_string(), value);
        Ok(StepOutput::ok_with(vars))
    }
}

/// Reads a global variable into the chain; an unset variable reads empty.
pub struct GetVariableHandler;

#[async_trait]
impl StepHandler for GetVariableHandler {
    fn kind(&self) -> &'static str {
        "get_variable"
    }

    async fn execute(
        &self,
        step: &SubAction,
        _ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(name) = step.field_str("name") else {
            return Ok(StepOutput::fail("get_variable requires a 'name' field"));
        };
        let target = step.field_str("variable").unwrap_or(name);
        let value = interpreter.runtime().globals.get(name).unwrap_or_default();
        let mut vars = HashMap::new();
        vars.insert(target.to_string(), value);
        Ok(StepOutput::ok_with(vars))
    }
}

/// Writes a per-user variable; defaults to the acting user.
pub struct SetUserVariableHandler;

#[async_trait]
impl StepHandler for SetUserVariableHandler {
    fn kind(&self) -> &'static str {
        "set_user_variable"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(name) = step.field_str("name") else {
            return Ok(StepOutput::fail("set_user_variable requires a 'name' field"));
        };
        let Some(user) = resolve_user(step, ctx) else {
            return Ok(StepOutput::fail("set_user_variable has no user to apply to"));
        };
        let value = template::render_field(step, "value", ctx);
        let store = &interpreter.runtime().user_vars;
        store.set(&user, name, &value);
        if step.field_bool("persist").unwrap_or(false) {
            store.persist()?;
        }
        let mut vars = HashMap::new();
        vars.insert(name.to_string(), value);
        Ok(StepOutput::ok_with(vars))
    }
}

/// Reads a per-user variable into the chain.
pub struct GetUserVariableHandler;

#[async_trait]
impl StepHandler for GetUserVariableHandler {
    fn kind(&self) -> &'static str {
        "get_user_variable"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(name) = step.field_str("name") else {
            return Ok(StepOutput::fail("get_user_variable requires a 'name' field"));
        };
        let Some(user) = resolve_user(step, ctx) else {
            return Ok(StepOutput::fail("get_user_variable has no user to read from"));
        };
        let target = step.field_str("variable").unwrap_or(name);
        let value = interpreter
            .runtime()
            .user_vars
            .get(&user, name)
            .unwrap_or_default();
        let mut vars = HashMap::new();
        vars.insert(target.to_string(), value);
        Ok(StepOutput::ok_with(vars))
    }
}

/// Arithmetic over two templated operands. Division by zero yields 0, it
/// never produces NaN or infinity.
pub struct MathHandler;

#[async_trait]
impl StepHandler for MathHandler {
    fn kind(&self) -> &'static str {
        "math"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        _interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let left_raw = template::render_field(step, "operand1", ctx);
        let right_raw = template::render_field(step, "operand2", ctx);
        let Ok(left) = left_raw.trim().parse::<f64>() else {
            return Ok(StepOutput::fail(format!("operand1 '{}' is not numeric", left_raw)));
        };
        let Ok(right) = right_raw.trim().parse::<f64>() else {
            return Ok(StepOutput::fail(format!("operand2 '{}' is not numeric", right_raw)));
        };
        let operation = step.field_str("operation").unwrap_or("add");
        let result = match operation {
            "add" => left + right,
            "subtract" => left - right,
            "multiply" => left * right,
            "divide" => {
                if right == 0.0 {
                    0.0
                } else {
                    left / right
                }
            }
            "modulo" => {
                if right == 0.0 {
                    0.0
                } else {
                    left % right
                }
            }
            "power" => left.powf(right),
            other => {
                return Ok(StepOutput::fail(format!("unknown math operation '{}'", other)));
            }
        };
        let variable = step.field_str("variable").unwrap_or("mathResult");
        let mut vars = HashMap::new();
        vars.insert(variable.to_string(), format_number(result));
        Ok(StepOutput::ok_with(vars))
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// String transforms over a templated input.
pub struct StringOpHandler;

#[async_trait]
impl StepHandler for StringOpHandler {
    fn kind(&self) -> &'static str {
        "string_op"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        _interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let input = template::render_field(step, "input", ctx);
        let operation = step.field_str("operation").unwrap_or("trim");
        let result = match operation {
            "uppercase" => input.to_uppercase(),
            "lowercase" => input.to_lowercase(),
            "trim" => input.trim().to_string(),
            "length" => input.chars().count().to_string(),
            "replace" => {
                let search = template::render_field(step, "search", ctx);
                let replacement = template::render_field(step, "replacement", ctx);
                if search.is_empty() {
                    input
                } else {
                    input.replace(&search, &replacement)
                }
            }
            "substring" => {
                let chars: Vec<char> = input.chars().collect();
                let start = step.field_i64("start").unwrap_or(0).max(0) as usize;
                let end = step
                    .field_i64("end")
                    .map(|e| e.max(0) as usize)
                    .unwrap_or(chars.len())
                    .min(chars.len());
                if start >= end {
                    String::new()
                } else {
                    chars[start..end].iter().collect()
                }
            }
            "split" => {
                let separator = step.field_str("separator").unwrap_or(" ");
                let index = step.field_i64("index").unwrap_or(0).max(0) as usize;
                input
                    .split(separator)
                    .nth(index)
                    .unwrap_or("")
                    .to_string()
            }
            other => {
                return Ok(StepOutput::fail(format!("unknown string operation '{}'", other)));
            }
        };
        let variable = step.field_str("variable").unwrap_or("stringResult");
        let mut vars = HashMap::new();
        vars.insert(variable.to_string(), result);
        Ok(StepOutput::ok_with(vars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting_drops_integral_fraction() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(2.5), "2.5");
    }
}
