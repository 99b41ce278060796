pub mod context;
pub mod template;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use tracing::{debug, warn};
use uuid::Uuid;

use pawdeck_common::models::action::{STEP_KIND_BREAK, STEP_KIND_CONDITION};
use pawdeck_common::models::{Action, BranchRole, SubAction};
use pawdeck_common::traits::capabilities::{
    BrokerCapability, ChannelCapability, ChatCapability, FileAccess, MediaPlayback,
    ModerationCapability, SceneCapability, UserLookupCapability,
};

use crate::services::action_service::ActionService;
use crate::services::handlers;
use crate::services::handlers::file::LocalFileAccess;
use crate::services::variable_store::{UserVariableStore, VariableStore};
use crate::Error;

pub use context::ExecutionContext;

/// Result of executing one step: success/failure, variables produced for
/// the rest of the chain, and an optional human-readable error.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub success: bool,
    pub variables: HashMap<String, String>,
    pub error: Option<String>,
}

impl StepOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            variables: HashMap::new(),
            error: None,
        }
    }

    pub fn ok_with(variables: HashMap<String, String>) -> Self {
        Self {
            success: true,
            variables,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            variables: HashMap::new(),
            error: Some(error.into()),
        }
    }
}

/// A category step handler. Handlers report failure through the returned
/// [`StepOutput`]; an `Err` is caught at the dispatch boundary and turned
/// into a failed output, so nothing escapes the interpreter.
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// Type tag this handler is registered under.
    fn kind(&self) -> &'static str;

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error>;
}

/// Capability adapters and shared stores the handlers reach through. All
/// state here is owned by the engine instance that carries it; nothing is
/// ambient or module-level.
pub struct RuntimeContext {
    pub chat: Option<Arc<dyn ChatCapability>>,
    pub moderation: Option<Arc<dyn ModerationCapability>>,
    pub channel: Option<Arc<dyn ChannelCapability>>,
    pub scenes: Option<Arc<dyn SceneCapability>>,
    pub broker: Option<Arc<dyn BrokerCapability>>,
    pub user_lookup: Option<Arc<dyn UserLookupCapability>>,
    pub files: Option<Arc<dyn FileAccess>>,
    pub media: Option<Arc<dyn MediaPlayback>>,
    pub globals: Arc<VariableStore>,
    pub user_vars: Arc<UserVariableStore>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self {
            chat: None,
            moderation: None,
            channel: None,
            scenes: None,
            broker: None,
            user_lookup: None,
            files: Some(Arc::new(LocalFileAccess)),
            media: None,
            globals: Arc::new(VariableStore::new()),
            user_vars: Arc::new(UserVariableStore::new()),
        }
    }

    /// Runtime whose variable stores persist next to the configuration
    /// documents, so persisted variables survive restarts.
    pub fn with_persistence_dir(dir: &std::path::Path) -> Self {
        let mut runtime = Self::new();
        runtime.globals = Arc::new(VariableStore::with_persistence(dir.join("variables.json")));
        runtime.user_vars = Arc::new(UserVariableStore::with_persistence(
            dir.join("user_variables.json"),
        ));
        runtime
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks an action's ordered step tree, dispatching each step by its type
/// tag to a registered handler and interpreting control flow (conditional
/// branch, break, recursive sub-invocation) directly.
pub struct Interpreter {
    registry: HashMap<&'static str, Arc<dyn StepHandler>>,
    runtime: Arc<RuntimeContext>,
    actions: Arc<ActionService>,
    in_flight: DashMap<Uuid, u32>,
}

impl Interpreter {
    pub fn new(runtime: Arc<RuntimeContext>, actions: Arc<ActionService>) -> Self {
        Self {
            registry: handlers::builtin_handlers(),
            runtime,
            actions,
            in_flight: DashMap::new(),
        }
    }

    pub fn runtime(&self) -> &RuntimeContext {
        &self.runtime
    }

    pub fn actions(&self) -> &ActionService {
        &self.actions
    }

    /// Run one action with the given context. Returns overall success of
    /// the executed step list.
    pub async fn run_action(&self, action: &Action, ctx: &mut ExecutionContext) -> bool {
        if !action.enabled {
            debug!("Action '{}' is disabled, skipping", action.name);
            return false;
        }
        if action.concurrent {
            self.enter_in_flight(action.action_id);
        } else if self.enter_in_flight_exclusive(action.action_id).is_none() {
            warn!(
                "Action '{}' is already running and does not allow concurrent execution",
                action.name
            );
            return false;
        }

        ctx.call_stack.push(action.action_id);
        let result = if action.random_one {
            self.run_random_step(action, ctx).await
        } else {
            self.run_step_list(&action.steps, action.always_run, ctx).await
        };
        ctx.call_stack.pop();
        self.leave_in_flight(action.action_id);
        result
    }

    /// Recursion-guarded entry used by the "run action" step: refuses when
    /// the target id is already on this chain's call stack.
    pub async fn run_action_by_id(&self, action_id: Uuid, ctx: &mut ExecutionContext) -> bool {
        if ctx.call_stack.contains(&action_id) {
            warn!(
                "Refusing to run action {}: already on the call stack (recursion)",
                action_id
            );
            return false;
        }
        let Some(action) = self.actions.get_action(action_id) else {
            warn!("Run-action target {} does not exist", action_id);
            return false;
        };
        self.run_action(&action, ctx).await
    }

    /// Execute steps in ascending order. A disabled step is skipped with
    /// implicit success. A failure abandons the remaining siblings unless
    /// `always_run` is set; a requested break always does, at every level.
    pub async fn run_step_list(
        &self,
        steps: &[SubAction],
        always_run: bool,
        ctx: &mut ExecutionContext,
    ) -> bool {
        let mut all_ok = true;
        for step in steps {
            if ctx.break_requested {
                break;
            }
            if !step.enabled {
                debug!("Step {} ({}) is disabled, skipping", step.step_id, step.kind);
                continue;
            }
            let output = self.execute_step(step, always_run, ctx).await;
            ctx.variables.extend(output.variables);
            if !output.success {
                all_ok = false;
                if let Some(err) = &output.error {
                    warn!("Step {} ({}) failed: {}", step.step_id, step.kind, err);
                }
                if !always_run {
                    break;
                }
            }
            if ctx.break_requested {
                break;
            }
        }
        all_ok
    }

    /// Dispatch a single step. Control-flow steps are interpreted here;
    /// everything else goes through the handler registry.
    pub async fn execute_step(
        &self,
        step: &SubAction,
        always_run: bool,
        ctx: &mut ExecutionContext,
    ) -> StepOutput {
        match step.kind.as_str() {
            STEP_KIND_CONDITION => self.execute_condition(step, always_run, ctx).await,
            STEP_KIND_BREAK => {
                ctx.break_requested = true;
                StepOutput::ok()
            }
            kind => match self.registry.get(kind) {
                Some(handler) => match handler.execute(step, ctx, self).await {
                    Ok(output) => output,
                    Err(e) => StepOutput::fail(e.to_string()),
                },
                None => {
                    warn!("Unknown step type '{}', treating as no-op", kind);
                    StepOutput::ok()
                }
            },
        }
    }

    async fn execute_condition(
        &self,
        step: &SubAction,
        always_run: bool,
        ctx: &mut ExecutionContext,
    ) -> StepOutput {
        let selected = match evaluate_condition(step, ctx) {
            Ok(value) => value,
            Err(msg) => return StepOutput::fail(msg),
        };
        let role = if selected {
            BranchRole::True
        } else {
            BranchRole::False
        };
        let Some(block) = step.branch_block(role) else {
            // normalize() guarantees both blocks; a hand-built tree may not.
            return StepOutput::ok();
        };
        let ok = Box::pin(self.run_step_list(&block.children, always_run, ctx)).await;
        if ok {
            StepOutput::ok()
        } else {
            StepOutput::fail("branch execution failed")
        }
    }

    async fn run_random_step(&self, action: &Action, ctx: &mut ExecutionContext) -> bool {
        let enabled: Vec<&SubAction> = action.steps.iter().filter(|s| s.enabled).collect();
        if enabled.is_empty() {
            return true;
        }
        let chosen = {
            let total: u64 = enabled.iter().map(|s| u64::from(s.weight.max(1))).sum();
            let mut roll = rand::rng().random_range(0..total);
            let mut pick = enabled[0];
            for step in &enabled {
                let w = u64::from(step.weight.max(1));
                if roll < w {
                    pick = *step;
                    break;
                }
                roll -= w;
            }
            pick
        };
        debug!(
            "Action '{}' picked random step {} ({})",
            action.name, chosen.step_id, chosen.kind
        );
        self.run_step_list(std::slice::from_ref(chosen), action.always_run, ctx)
            .await
    }

    fn enter_in_flight(&self, id: Uuid) {
        *self.in_flight.entry(id).or_insert(0) += 1;
    }

    /// Marks the action in flight only when it is not already; `None` means
    /// an execution is in progress.
    fn enter_in_flight_exclusive(&self, id: Uuid) -> Option<()> {
        let mut entry = self.in_flight.entry(id).or_insert(0);
        if *entry > 0 {
            return None;
        }
        *entry += 1;
        Some(())
    }

    fn leave_in_flight(&self, id: Uuid) {
        let remove = match self.in_flight.get_mut(&id) {
            Some(mut count) => {
                if *count > 1 {
                    *count -= 1;
                    false
                } else {
                    true
                }
            }
            None => false,
        };
        if remove {
            self.in_flight.remove(&id);
        }
    }
}

/// Evaluate a conditional-branch step's comparison over two templated
/// strings. An invalid pattern is a step failure, never a panic or an
/// `Err` escaping the interpreter.
fn evaluate_condition(step: &SubAction, ctx: &ExecutionContext) -> Result<bool, String> {
    let left = template::render_field(step, "left", ctx);
    let right = template::render_field(step, "right", ctx);
    let operator = step.field_str("operator").unwrap_or("equals");
    match operator {
        "equals" => Ok(left == right),
        "not_equals" => Ok(left != right),
        "contains" => Ok(left.contains(&right)),
        "not_contains" => Ok(!left.contains(&right)),
        "starts_with" => Ok(left.starts_with(&right)),
        "ends_with" => Ok(left.ends_with(&right)),
        "greater" => Ok(numeric(&left, &right).map(|(l, r)| l > r).unwrap_or(false)),
        "greater_or_equal" => Ok(numeric(&left, &right).map(|(l, r)| l >= r).unwrap_or(false)),
        "less" => Ok(numeric(&left, &right).map(|(l, r)| l < r).unwrap_or(false)),
        "less_or_equal" => Ok(numeric(&left, &right).map(|(l, r)| l <= r).unwrap_or(false)),
        "is_empty" => Ok(left.is_empty()),
        "is_not_empty" => Ok(!left.is_empty()),
        "matches" => match regex::Regex::new(&right) {
            Ok(re) => Ok(re.is_match(&left)),
            Err(e) => Err(format!("invalid pattern '{}': {}", right, e)),
        },
        other => Err(format!("unknown comparison operator '{}'", other)),
    }
}

fn numeric(left: &str, right: &str) -> Option<(f64, f64)> {
    let l = left.trim().parse::<f64>().ok()?;
    let r = right.trim().parse::<f64>().ok()?;
    Some((l, r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawdeck_common::models::Platform;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Platform::Twitch)
    }

    fn condition(left: &str, operator: &str, right: &str) -> SubAction {
        SubAction::new(STEP_KIND_CONDITION)
            .with_field("left", left)
            .with_field("operator", operator)
            .with_field("right", right)
    }

    #[test]
    fn numeric_operators_compare_as_numbers() {
        let c = ctx();
        assert_eq!(evaluate_condition(&condition("10", "greater", "9"), &c), Ok(true));
        assert_eq!(evaluate_condition(&condition("9", "greater", "10"), &c), Ok(false));
        assert_eq!(
            evaluate_condition(&condition("2", "less_or_equal", "2"), &c),
            Ok(true)
        );
    }

    #[test]
    fn non_numeric_operands_compare_false() {
        let c = ctx();
        assert_eq!(
            evaluate_condition(&condition("abc", "greater", "1"), &c),
            Ok(false)
        );
    }

    #[test]
    fn invalid_pattern_is_a_failure_not_a_panic() {
        let c = ctx();
        assert!(evaluate_condition(&condition("text", "matches", "([broken"), &c).is_err());
    }

    #[test]
    fn is_empty_over_templated_unknown_token_is_false() {
        // %missing% stays verbatim, so the string is not empty.
        let c = ctx();
        assert_eq!(
            evaluate_condition(&condition("%missing%", "is_empty", ""), &c),
            Ok(false)
        );
    }
}
