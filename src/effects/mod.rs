//! Declarative effect language attached to entities: triggers, conditions and
//! action descriptors.

pub mod action;
pub mod condition;
pub mod trigger;

use serde::Deserialize;

pub use action::{
    Action, ActionDescriptor, ActionKind, CountdownSpec, TieredAction, DEFAULT_COUNTDOWN_TURNS,
};
pub use condition::Condition;
pub use trigger::{TriggerKind, SYMPHONY_TAG};

/// A (trigger, condition, action list) tuple attached to an entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Effect {
    pub trigger: TriggerKind,
    #[serde(default, alias = "if")]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,
}

impl Effect {
    pub fn new(trigger: TriggerKind, actions: Vec<ActionDescriptor>) -> Self {
        Self {
            trigger,
            condition: None,
            actions,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_accepts_if_alias_and_mixed_actions() {
        let json = r#"{
            "trigger": "onHit",
            "if": {"type": "enemy_has_no_armor"},
            "actions": [
                {"type": "give_enemy_status", "status": "poison", "value": 2},
                {"type": "summon_dragon"}
            ]
        }"#;
        let effect: Effect = serde_json::from_str(json).unwrap();
        assert_eq!(effect.trigger, TriggerKind::OnHit);
        assert_eq!(effect.condition, Some(Condition::EnemyHasNoArmor));
        assert!(matches!(effect.actions[0], ActionDescriptor::Known(_)));
        assert!(matches!(effect.actions[1], ActionDescriptor::Unknown { .. }));
    }
}
