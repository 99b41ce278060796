// File: src/services/trigger_catalog.rs
//
// Static, read-only metadata describing every trigger kind: its
// configurable fields and the variables it exposes to action authors.
// Consulted by editing/authoring tooling and assisted action builders;
// the automation engine itself never reads it.

use once_cell::sync::Lazy;

use pawdeck_common::models::{Platform, PlatformSet, TriggerKind};

/// Value type of a configurable trigger field, for form rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Number,
    Toggle,
    CommandReference,
    RewardReference,
    UserList,
}

/// One configurable field of a trigger kind.
#[derive(Debug, Clone)]
pub struct TriggerField {
    pub name: &'static str,
    pub field_type: FieldType,
    pub description: &'static str,
}

/// One templating variable a trigger kind provides to its action's steps.
#[derive(Debug, Clone)]
pub struct TriggerVariable {
    pub name: &'static str,
    pub description: &'static str,
}

/// Descriptive metadata for a single trigger kind.
#[derive(Debug, Clone)]
pub struct TriggerDefinition {
    pub kind: TriggerKind,
    pub display_name: &'static str,
    pub category: &'static str,
    pub platforms: PlatformSet,
    pub fields: Vec<TriggerField>,
    pub variables: Vec<TriggerVariable>,
}

const COMMON_FIELDS: [TriggerField; 2] = [
    TriggerField {
        name: "enabled",
        field_type: FieldType::Toggle,
        description: "Whether this trigger currently fires.",
    },
    TriggerField {
        name: "excluded_users",
        field_type: FieldType::UserList,
        description: "Usernames whose events are ignored (e.g. other bots).",
    },
];

const COMMON_VARIABLES: [TriggerVariable; 2] = [
    TriggerVariable {
        name: "user",
        description: "The acting user's name.",
    },
    TriggerVariable {
        name: "platform",
        description: "The platform the event arrived from.",
    },
];

static DEFINITIONS: Lazy<Vec<TriggerDefinition>> = Lazy::new(|| {
    vec![
        command_definition(),
        follow_definition(),
        cheer_definition(),
        subscribe_definition(),
        resub_definition(),
        gift_sub_definition(),
        gift_bomb_definition(),
        raid_definition(),
        redemption_definition(),
    ]
});

fn base(
    kind: TriggerKind,
    display_name: &'static str,
    category: &'static str,
    platforms: PlatformSet,
) -> TriggerDefinition {
    TriggerDefinition {
        kind,
        display_name,
        category,
        platforms,
        fields: COMMON_FIELDS.to_vec(),
        variables: COMMON_VARIABLES.to_vec(),
    }
}

fn command_definition() -> TriggerDefinition {
    let mut def = base(
        TriggerKind::Command,
        "Chat Command",
        "chat",
        PlatformSet::all(),
    );
    def.fields.push(TriggerField {
        name: "command_id",
        field_type: FieldType::CommandReference,
        description: "The command whose match fires this trigger.",
    });
    def.variables.extend([
        TriggerVariable {
            name: "message",
            description: "The full chat message that matched.",
        },
        TriggerVariable {
            name: "rawInput",
            description: "Everything after the command trigger text.",
        },
        TriggerVariable {
            name: "input0",
            description: "First whitespace-separated argument (input1, input2, ... follow).",
        },
        TriggerVariable {
            name: "targetUser",
            description: "First argument with a leading @ stripped.",
        },
    ]);
    def
}

fn follow_definition() -> TriggerDefinition {
    base(
        TriggerKind::Follow,
        "New Follower",
        "community",
        PlatformSet::from_bits(Platform::Twitch.bit() | Platform::YouTube.bit() | Platform::Kick.bit()),
    )
}

fn cheer_definition() -> TriggerDefinition {
    let mut def = base(
        TriggerKind::Cheer,
        "Cheer",
        "support",
        PlatformSet::single(Platform::Twitch),
    );
    def.fields.extend([
        TriggerField {
            name: "min_amount",
            field_type: FieldType::Number,
            description: "Fire only for at least this many bits.",
        },
        TriggerField {
            name: "max_amount",
            field_type: FieldType::Number,
            description: "Fire only for at most this many bits.",
        },
    ]);
    def.variables.push(TriggerVariable {
        name: "bits",
        description: "Number of bits cheered.",
    });
    def
}

fn subscribe_definition() -> TriggerDefinition {
    let mut def = base(
        TriggerKind::Subscribe,
        "New Subscription",
        "support",
        PlatformSet::single(Platform::Twitch),
    );
    def.fields.push(TriggerField {
        name: "tier",
        field_type: FieldType::Text,
        description: "Fire only for this subscription tier.",
    });
    def.variables.push(TriggerVariable {
        name: "tier",
        description: "Subscription tier of the event.",
    });
    def
}

fn resub_definition() -> TriggerDefinition {
    let mut def = base(
        TriggerKind::Resub,
        "Resubscription",
        "support",
        PlatformSet::single(Platform::Twitch),
    );
    def.fields.push(TriggerField {
        name: "tier",
        field_type: FieldType::Text,
        description: "Fire only for this subscription tier.",
    });
    def.variables.extend([
        TriggerVariable {
            name: "tier",
            description: "Subscription tier of the event.",
        },
        TriggerVariable {
            name: "months",
            description: "Cumulative months the user has been subscribed.",
        },
    ]);
    def
}

fn gift_sub_definition() -> TriggerDefinition {
    let mut def = base(
        TriggerKind::GiftSub,
        "Gifted Subscription",
        "support",
        PlatformSet::single(Platform::Twitch),
    );
    def.variables.push(TriggerVariable {
        name: "recipient",
        description: "User who received the gifted subscription.",
    });
    def
}

fn gift_bomb_definition() -> TriggerDefinition {
    let mut def = base(
        TriggerKind::GiftBomb,
        "Gift Bomb",
        "support",
        PlatformSet::single(Platform::Twitch),
    );
    def.fields.extend([
        TriggerField {
            name: "min_amount",
            field_type: FieldType::Number,
            description: "Fire only for at least this many gifted subs.",
        },
        TriggerField {
            name: "max_amount",
            field_type: FieldType::Number,
            description: "Fire only for at most this many gifted subs.",
        },
    ]);
    def.variables.push(TriggerVariable {
        name: "count",
        description: "Number of subscriptions gifted at once.",
    });
    def
}

fn raid_definition() -> TriggerDefinition {
    let mut def = base(
        TriggerKind::Raid,
        "Incoming Raid",
        "community",
        PlatformSet::single(Platform::Twitch),
    );
    def.fields.extend([
        TriggerField {
            name: "min_amount",
            field_type: FieldType::Number,
            description: "Fire only for raids of at least this size.",
        },
        TriggerField {
            name: "max_amount",
            field_type: FieldType::Number,
            description: "Fire only for raids of at most this size.",
        },
    ]);
    def.variables.push(TriggerVariable {
        name: "viewers",
        description: "Viewer count the raid arrived with.",
    });
    def
}

fn redemption_definition() -> TriggerDefinition {
    let mut def = base(
        TriggerKind::ChannelPointRedemption,
        "Channel Point Redemption",
        "support",
        PlatformSet::single(Platform::Twitch),
    );
    def.fields.push(TriggerField {
        name: "reward_id",
        field_type: FieldType::RewardReference,
        description: "The channel-point reward this trigger listens for.",
    });
    def.variables.extend([
        TriggerVariable {
            name: "reward_id",
            description: "Id of the redeemed reward.",
        },
        TriggerVariable {
            name: "reward_title",
            description: "Title of the redeemed reward.",
        },
        TriggerVariable {
            name: "redemption_input",
            description: "Viewer-entered text, when the reward collects input.",
        },
    ]);
    def
}

/// Every known trigger definition, in display order.
pub fn all_definitions() -> &'static [TriggerDefinition] {
    &DEFINITIONS
}

/// Metadata for one trigger kind.
pub fn definition_for(kind: TriggerKind) -> &'static TriggerDefinition {
    DEFINITIONS
        .iter()
        .find(|d| d.kind == kind)
        .expect("every trigger kind has a definition")
}

/// All definitions in a category (e.g. "support").
pub fn definitions_in_category(category: &str) -> Vec<&'static TriggerDefinition> {
    DEFINITIONS
        .iter()
        .filter(|d| d.category == category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_trigger_kind_is_described() {
        for kind in TriggerKind::all() {
            let def = definition_for(kind);
            assert_eq!(def.kind, kind);
            assert!(!def.display_name.is_empty());
            assert!(!def.fields.is_empty());
            assert!(!def.variables.is_empty());
        }
    }

    #[test]
    fn command_trigger_exposes_positional_inputs() {
        let def = definition_for(TriggerKind::Command);
        assert!(def.variables.iter().any(|v| v.name == "input0"));
        assert!(def.fields.iter().any(|f| f.field_type == FieldType::CommandReference));
    }

    #[test]
    fn categories_partition_the_catalog() {
        let chat = definitions_in_category("chat").len();
        let community = definitions_in_category("community").len();
        let support = definitions_in_category("support").len();
        assert_eq!(chat + community + support, all_definitions().len());
    }
}
