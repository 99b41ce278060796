use once_cell::sync::Lazy;
use regex::Regex;

use pawdeck_common::models::SubAction;

use super::context::ExecutionContext;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*)%").unwrap());

/// Replace every `%identifier%` token with its value from the context's
/// variable bag, falling back to the argument bag. Unresolved tokens stay
/// verbatim in the output.
pub fn render(text: &str, ctx: &ExecutionContext) -> String {
    TOKEN_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            match ctx.lookup(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Render a step's text field, treating a missing field as empty.
pub fn render_field(step: &SubAction, name: &str, ctx: &ExecutionContext) -> String {
    render(step.field_str(name).unwrap_or(""), ctx)
}
