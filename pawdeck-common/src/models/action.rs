use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Step type tag of a conditional-branch node.
pub const STEP_KIND_CONDITION: &str = "condition";
/// Step type tag of a break node.
pub const STEP_KIND_BREAK: &str = "break";
/// Step type tag used for the synthesized true/false blocks of a condition.
pub const STEP_KIND_BLOCK: &str = "block";

/// The class of event a trigger binds an action to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Command,
    Follow,
    Cheer,
    Subscribe,
    Resub,
    GiftSub,
    GiftBomb,
    Raid,
    ChannelPointRedemption,
}

impl TriggerKind {
    pub fn all() -> [TriggerKind; 9] {
        [
            TriggerKind::Command,
            TriggerKind::Follow,
            TriggerKind::Cheer,
            TriggerKind::Subscribe,
            TriggerKind::Resub,
            TriggerKind::GiftSub,
            TriggerKind::GiftBomb,
            TriggerKind::Raid,
            TriggerKind::ChannelPointRedemption,
        ]
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerKind::Command => "command",
            TriggerKind::Follow => "follow",
            TriggerKind::Cheer => "cheer",
            TriggerKind::Subscribe => "subscribe",
            TriggerKind::Resub => "resub",
            TriggerKind::GiftSub => "gift_sub",
            TriggerKind::GiftBomb => "gift_bomb",
            TriggerKind::Raid => "raid",
            TriggerKind::ChannelPointRedemption => "channel_point_redemption",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TriggerKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "command" => Ok(TriggerKind::Command),
            "follow" => Ok(TriggerKind::Follow),
            "cheer" => Ok(TriggerKind::Cheer),
            "subscribe" => Ok(TriggerKind::Subscribe),
            "resub" => Ok(TriggerKind::Resub),
            "gift_sub" => Ok(TriggerKind::GiftSub),
            "gift_bomb" => Ok(TriggerKind::GiftBomb),
            "raid" => Ok(TriggerKind::Raid),
            "channel_point_redemption" => Ok(TriggerKind::ChannelPointRedemption),
            _ => Err(format!("Unknown trigger kind: {}", s)),
        }
    }
}

/// Binds an action to a class of event, with type-specific filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub trigger_id: Uuid,
    pub kind: TriggerKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Usernames whose events never fire this trigger.
    #[serde(default)]
    pub excluded_users: Vec<String>,
    /// For `Command` triggers: the referenced command.
    #[serde(default)]
    pub command_id: Option<Uuid>,
    /// For `ChannelPointRedemption` triggers: the referenced reward.
    #[serde(default)]
    pub reward_id: Option<String>,
    /// Lower bound on the event amount (bits, gift count, raid viewers).
    #[serde(default)]
    pub min_amount: Option<i64>,
    /// Upper bound on the event amount.
    #[serde(default)]
    pub max_amount: Option<i64>,
    /// Subscription tier filter ("1000", "2000", "3000", "prime").
    #[serde(default)]
    pub tier: Option<String>,
}

impl Trigger {
    pub fn new(kind: TriggerKind) -> Self {
        Self {
            trigger_id: Uuid::new_v4(),
            kind,
            enabled: true,
            excluded_users: Vec::new(),
            command_id: None,
            reward_id: None,
            min_amount: None,
            max_amount: None,
            tier: None,
        }
    }

    pub fn for_command(command_id: Uuid) -> Self {
        let mut t = Trigger::new(TriggerKind::Command);
        t.command_id = Some(command_id);
        t
    }

    pub fn excludes(&self, user: Option<&str>) -> bool {
        match user {
            Some(u) => self
                .excluded_users
                .iter()
                .any(|ex| ex.eq_ignore_ascii_case(u)),
            None => false,
        }
    }
}

/// Role of a child node under a conditional-branch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchRole {
    True,
    False,
}

/// One node of an action's execution tree: either a leaf effect or a
/// branching control node. Sibling order is the vec order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAction {
    pub step_id: Uuid,
    /// Type tag selecting the handler.
    pub kind: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Relative weight used when the owning action picks one step randomly.
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Set on the two block children of a conditional-branch step.
    #[serde(default)]
    pub branch: Option<BranchRole>,
    #[serde(default)]
    pub children: Vec<SubAction>,
    /// Free-form, handler-specific configuration.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl SubAction {
    pub fn new(kind: &str) -> Self {
        Self {
            step_id: Uuid::new_v4(),
            kind: kind.to_string(),
            enabled: true,
            weight: 1,
            branch: None,
            children: Vec::new(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    pub fn field_i64(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(|v| v.as_i64())
    }

    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(|v| v.as_f64())
    }

    pub fn field_bool(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(|v| v.as_bool())
    }

    /// The true- or false-block child of a conditional-branch step.
    pub fn branch_block(&self, role: BranchRole) -> Option<&SubAction> {
        self.children.iter().find(|c| c.branch == Some(role))
    }

    /// Restores the structural invariant that a conditional-branch step has
    /// exactly two role-flagged children. Missing blocks are synthesized
    /// empty; surplus children keep only the first node per role.
    pub fn normalize(&mut self) {
        if self.kind == STEP_KIND_CONDITION {
            let mut blocks: Vec<SubAction> = Vec::with_capacity(2);
            for role in [BranchRole::True, BranchRole::False] {
                let found = self
                    .children
                    .iter()
                    .find(|c| c.branch == Some(role))
                    .cloned();
                blocks.push(found.unwrap_or_else(|| {
                    let mut block = SubAction::new(STEP_KIND_BLOCK);
                    block.branch = Some(role);
                    block
                }));
            }
            self.children = blocks;
        }
        for child in &mut self.children {
            child.normalize();
        }
    }
}

/// A named unit of automation: triggers plus an ordered tree of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub action_id: Uuid,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Keep executing remaining steps after one fails.
    #[serde(default)]
    pub always_run: bool,
    /// Execute a single, weight-picked top-level step instead of the list.
    #[serde(default)]
    pub random_one: bool,
    /// Allow overlapping executions of this action.
    #[serde(default = "default_true")]
    pub concurrent: bool,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub steps: Vec<SubAction>,
}

impl Action {
    pub fn new(name: &str) -> Self {
        Self {
            action_id: Uuid::new_v4(),
            name: name.to_string(),
            enabled: true,
            always_run: false,
            random_one: false,
            concurrent: true,
            triggers: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn normalize(&mut self) {
        for step in &mut self.steps {
            step.normalize();
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_weight() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_synthesizes_missing_branch_blocks() {
        let mut cond = SubAction::new(STEP_KIND_CONDITION);
        let mut true_block = SubAction::new(STEP_KIND_BLOCK);
        true_block.branch = Some(BranchRole::True);
        true_block.children.push(SubAction::new("comment"));
        cond.children.push(true_block);

        cond.normalize();

        assert_eq!(cond.children.len(), 2);
        assert!(cond.branch_block(BranchRole::True).is_some());
        let false_block = cond.branch_block(BranchRole::False).unwrap();
        assert!(false_block.children.is_empty());
    }

    #[test]
    fn normalize_recurses_into_nested_conditions() {
        let inner = SubAction::new(STEP_KIND_CONDITION);
        let mut true_block = SubAction::new(STEP_KIND_BLOCK);
        true_block.branch = Some(BranchRole::True);
        true_block.children.push(inner);
        let mut outer = SubAction::new(STEP_KIND_CONDITION);
        outer.children.push(true_block);

        outer.normalize();

        let nested = &outer.branch_block(BranchRole::True).unwrap().children[0];
        assert_eq!(nested.children.len(), 2);
    }

    #[test]
    fn trigger_exclusion_list_ignores_case() {
        let mut t = Trigger::new(TriggerKind::Follow);
        t.excluded_users.push("StreamElements".into());
        assert!(t.excludes(Some("streamelements")));
        assert!(!t.excludes(Some("viewer")));
        assert!(!t.excludes(None));
    }
}
