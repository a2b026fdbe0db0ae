//! Declarative action descriptors.
//!
//! Each [ActionKind] has exactly one [Action] variant carrying the fields it
//! needs. Data is parsed into [ActionDescriptor]: entries whose `type` is not a
//! registered kind, or whose parameters don't fit the variant, are kept as
//! diagnostics instead of failing the whole database load.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::combat::{Stat, StatusKind, Tier};
use crate::error::ActionError;

/// Countdown length used when `add_countdown` omits `value.turns`.
pub const DEFAULT_COUNTDOWN_TURNS: u32 = 3;

fn one() -> i64 {
    1
}

fn one_u32() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct CountdownSpec {
    #[serde(default)]
    pub turns: Option<u32>,
    #[serde(default)]
    pub repeat: bool,
}

impl CountdownSpec {
    pub fn turns_or_default(&self) -> u32 {
        self.turns.unwrap_or(DEFAULT_COUNTDOWN_TURNS)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    GainStat {
        stat: Stat,
        value: i64,
    },
    LoseStat {
        stat: Stat,
        value: i64,
    },
    GainTempAttack {
        value: i64,
    },
    GainMaxHealth {
        value: i64,
    },
    GainStatus {
        status: StatusKind,
        value: i64,
    },
    GiveEnemyStatus {
        status: StatusKind,
        value: i64,
    },
    RemoveStatus {
        status: StatusKind,
        #[serde(default)]
        value: Option<i64>,
    },
    RemoveRandomStatus {
        #[serde(default = "one")]
        value: i64,
    },
    ConvertStatToStatus {
        stat: Stat,
        status: StatusKind,
        #[serde(default = "one")]
        multiplier: i64,
        /// Converts at most this much of the source; the whole source when absent.
        #[serde(default)]
        amount: Option<i64>,
    },
    ConvertStatusToStat {
        status: StatusKind,
        stat: Stat,
        #[serde(default = "one")]
        multiplier: i64,
        #[serde(default)]
        amount: Option<i64>,
    },
    DealDamage {
        value: i64,
    },
    DealArmoredDamage {
        value: i64,
    },
    TakeDamage {
        value: i64,
    },
    LifeDrain {
        value: i64,
    },
    Heal {
        value: i64,
    },
    HealPercentage {
        percent: i64,
    },
    HealFromSpeed {
        #[serde(default = "one")]
        multiplier: i64,
    },
    HealToFull,
    GiveEnemyStatusEqualToStat {
        stat: Stat,
        status: StatusKind,
        #[serde(default = "one")]
        multiplier: i64,
    },
    StealStat {
        stat: Stat,
        value: i64,
    },
    AddExtraStrikes {
        value: i64,
    },
    AddCountdown {
        name: String,
        #[serde(default)]
        value: CountdownSpec,
        #[serde(default)]
        actions: Vec<ActionDescriptor>,
    },
    AdvanceCountdowns {
        value: u32,
    },
    TriggerSymphony {
        #[serde(default = "one_u32")]
        times: u32,
    },
    AddCounter {
        counter: String,
        #[serde(default = "one")]
        value: i64,
    },
    ResetCounter {
        counter: String,
    },
}

/// Registered action types. This is the whole action library surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    GainStat,
    LoseStat,
    GainTempAttack,
    GainMaxHealth,
    GainStatus,
    GiveEnemyStatus,
    RemoveStatus,
    RemoveRandomStatus,
    ConvertStatToStatus,
    ConvertStatusToStat,
    DealDamage,
    DealArmoredDamage,
    TakeDamage,
    LifeDrain,
    Heal,
    HealPercentage,
    HealFromSpeed,
    HealToFull,
    GiveEnemyStatusEqualToStat,
    StealStat,
    AddExtraStrikes,
    AddCountdown,
    AdvanceCountdowns,
    TriggerSymphony,
    AddCounter,
    ResetCounter,
}

impl ActionKind {
    pub const ALL: [ActionKind; 26] = [
        Self::GainStat,
        Self::LoseStat,
        Self::GainTempAttack,
        Self::GainMaxHealth,
        Self::GainStatus,
        Self::GiveEnemyStatus,
        Self::RemoveStatus,
        Self::RemoveRandomStatus,
        Self::ConvertStatToStatus,
        Self::ConvertStatusToStat,
        Self::DealDamage,
        Self::DealArmoredDamage,
        Self::TakeDamage,
        Self::LifeDrain,
        Self::Heal,
        Self::HealPercentage,
        Self::HealFromSpeed,
        Self::HealToFull,
        Self::GiveEnemyStatusEqualToStat,
        Self::StealStat,
        Self::AddExtraStrikes,
        Self::AddCountdown,
        Self::AdvanceCountdowns,
        Self::TriggerSymphony,
        Self::AddCounter,
        Self::ResetCounter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GainStat => "gain_stat",
            Self::LoseStat => "lose_stat",
            Self::GainTempAttack => "gain_temp_attack",
            Self::GainMaxHealth => "gain_max_health",
            Self::GainStatus => "gain_status",
            Self::GiveEnemyStatus => "give_enemy_status",
            Self::RemoveStatus => "remove_status",
            Self::RemoveRandomStatus => "remove_random_status",
            Self::ConvertStatToStatus => "convert_stat_to_status",
            Self::ConvertStatusToStat => "convert_status_to_stat",
            Self::DealDamage => "deal_damage",
            Self::DealArmoredDamage => "deal_armored_damage",
            Self::TakeDamage => "take_damage",
            Self::LifeDrain => "life_drain",
            Self::Heal => "heal",
            Self::HealPercentage => "heal_percentage",
            Self::HealFromSpeed => "heal_from_speed",
            Self::HealToFull => "heal_to_full",
            Self::GiveEnemyStatusEqualToStat => "give_enemy_status_equal_to_stat",
            Self::StealStat => "steal_stat",
            Self::AddExtraStrikes => "add_extra_strikes",
            Self::AddCountdown => "add_countdown",
            Self::AdvanceCountdowns => "advance_countdowns",
            Self::TriggerSymphony => "trigger_symphony",
            Self::AddCounter => "add_counter",
            Self::ResetCounter => "reset_counter",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn scale_field(value: i64, factor: i64, field: &'static str) -> Result<i64, ActionError> {
    value
        .checked_mul(factor)
        .ok_or(ActionError::Overflow { field })
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::GainStat { .. } => ActionKind::GainStat,
            Self::LoseStat { .. } => ActionKind::LoseStat,
            Self::GainTempAttack { .. } => ActionKind::GainTempAttack,
            Self::GainMaxHealth { .. } => ActionKind::GainMaxHealth,
            Self::GainStatus { .. } => ActionKind::GainStatus,
            Self::GiveEnemyStatus { .. } => ActionKind::GiveEnemyStatus,
            Self::RemoveStatus { .. } => ActionKind::RemoveStatus,
            Self::RemoveRandomStatus { .. } => ActionKind::RemoveRandomStatus,
            Self::ConvertStatToStatus { .. } => ActionKind::ConvertStatToStatus,
            Self::ConvertStatusToStat { .. } => ActionKind::ConvertStatusToStat,
            Self::DealDamage { .. } => ActionKind::DealDamage,
            Self::DealArmoredDamage { .. } => ActionKind::DealArmoredDamage,
            Self::TakeDamage { .. } => ActionKind::TakeDamage,
            Self::LifeDrain { .. } => ActionKind::LifeDrain,
            Self::Heal { .. } => ActionKind::Heal,
            Self::HealPercentage { .. } => ActionKind::HealPercentage,
            Self::HealFromSpeed { .. } => ActionKind::HealFromSpeed,
            Self::HealToFull => ActionKind::HealToFull,
            Self::GiveEnemyStatusEqualToStat { .. } => ActionKind::GiveEnemyStatusEqualToStat,
            Self::StealStat { .. } => ActionKind::StealStat,
            Self::AddExtraStrikes { .. } => ActionKind::AddExtraStrikes,
            Self::AddCountdown { .. } => ActionKind::AddCountdown,
            Self::AdvanceCountdowns { .. } => ActionKind::AdvanceCountdowns,
            Self::TriggerSymphony { .. } => ActionKind::TriggerSymphony,
            Self::AddCounter { .. } => ActionKind::AddCounter,
            Self::ResetCounter { .. } => ActionKind::ResetCounter,
        }
    }

    /// Copy with every magnitude multiplied by `factor`. Countdown lengths,
    /// counters and trigger counts are structural and left untouched.
    pub fn scaled(&self, factor: i64) -> Result<Action, ActionError> {
        if factor == 1 {
            return Ok(self.clone());
        }
        let mut scaled = self.clone();
        match &mut scaled {
            Self::GainStat { value, .. }
            | Self::LoseStat { value, .. }
            | Self::GainTempAttack { value }
            | Self::GainMaxHealth { value }
            | Self::GainStatus { value, .. }
            | Self::GiveEnemyStatus { value, .. }
            | Self::RemoveRandomStatus { value }
            | Self::DealDamage { value }
            | Self::DealArmoredDamage { value }
            | Self::TakeDamage { value }
            | Self::LifeDrain { value }
            | Self::Heal { value }
            | Self::StealStat { value, .. }
            | Self::AddExtraStrikes { value } => *value = scale_field(*value, factor, "value")?,
            Self::RemoveStatus { value, .. } => {
                if let Some(v) = value {
                    *v = scale_field(*v, factor, "value")?;
                }
            }
            Self::ConvertStatToStatus { multiplier, .. }
            | Self::ConvertStatusToStat { multiplier, .. }
            | Self::HealFromSpeed { multiplier }
            | Self::GiveEnemyStatusEqualToStat { multiplier, .. } => {
                *multiplier = scale_field(*multiplier, factor, "multiplier")?
            }
            Self::HealPercentage { percent } => *percent = scale_field(*percent, factor, "percent")?,
            Self::AddCountdown { actions, .. } => {
                for descriptor in actions.iter_mut() {
                    match descriptor {
                        ActionDescriptor::Known(inner) => *inner = inner.scaled(factor)?,
                        ActionDescriptor::Tiered(tiered) => *tiered = tiered.scaled(factor)?,
                        ActionDescriptor::Unknown { .. } | ActionDescriptor::Malformed { .. } => {}
                    }
                }
            }
            Self::HealToFull
            | Self::AdvanceCountdowns { .. }
            | Self::TriggerSymphony { .. }
            | Self::AddCounter { .. }
            | Self::ResetCounter { .. } => {}
        }
        Ok(scaled)
    }
}

/// Action with per-tier variants, from `value_gold` / `value_diamond` fields.
/// A tier without its own field falls back to the base action.
#[derive(Debug, Clone, PartialEq)]
pub struct TieredAction {
    pub base: Action,
    pub gold: Option<Action>,
    pub diamond: Option<Action>,
}

impl TieredAction {
    pub fn for_tier(&self, tier: Tier) -> &Action {
        let picked = match tier {
            Tier::Base => None,
            Tier::Gold => self.gold.as_ref(),
            Tier::Diamond => self.diamond.as_ref(),
        };
        picked.unwrap_or(&self.base)
    }

    fn scaled(&self, factor: i64) -> Result<TieredAction, ActionError> {
        Ok(TieredAction {
            base: self.base.scaled(factor)?,
            gold: self.gold.as_ref().map(|a| a.scaled(factor)).transpose()?,
            diamond: self.diamond.as_ref().map(|a| a.scaled(factor)).transpose()?,
        })
    }

    /// Tier fields whose action came out identical to the base, e.g. on a
    /// kind without a `value` parameter.
    pub fn ignored_tiers(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.gold.as_ref() == Some(&self.base) {
            ignored.push(GOLD_FIELD);
        }
        if self.diamond.as_ref() == Some(&self.base) {
            ignored.push(DIAMOND_FIELD);
        }
        ignored
    }
}

const GOLD_FIELD: &str = "value_gold";
const DIAMOND_FIELD: &str = "value_diamond";

/// Re-parses `raw` with `value` replaced by the tier field's value.
fn tier_variant(raw: &Value, field: &str) -> Option<Result<Action, String>> {
    let value = raw.get(field)?.clone();
    let mut variant = raw.clone();
    if let Value::Object(map) = &mut variant {
        map.insert("value".to_string(), value);
    }
    Some(serde_json::from_value::<Action>(variant).map_err(|err| format!("{field}: {err}")))
}

/// One entry of an effect's action list as found in data.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDescriptor {
    Known(Action),
    Tiered(TieredAction),
    /// `type` names no registered action kind.
    Unknown { type_name: String },
    /// Registered kind whose parameters did not parse.
    Malformed { type_name: String, reason: String },
}

impl ActionDescriptor {
    pub fn from_value(raw: Value) -> Self {
        let Some(type_name) = raw.get("type").and_then(Value::as_str).map(str::to_string) else {
            return Self::Malformed {
                type_name: "<missing>".to_string(),
                reason: "action has no string `type` field".to_string(),
            };
        };
        if ActionKind::from_name(&type_name).is_none() {
            return Self::Unknown { type_name };
        }
        let gold = tier_variant(&raw, GOLD_FIELD).transpose();
        let diamond = tier_variant(&raw, DIAMOND_FIELD).transpose();
        let base = serde_json::from_value::<Action>(raw).map_err(|err| err.to_string());
        match (base, gold, diamond) {
            (Ok(base), Ok(None), Ok(None)) => Self::Known(base),
            (Ok(base), Ok(gold), Ok(diamond)) => Self::Tiered(TieredAction {
                base,
                gold,
                diamond,
            }),
            (Err(reason), _, _) | (_, Err(reason), _) | (_, _, Err(reason)) => {
                Self::Malformed { type_name, reason }
            }
        }
    }

    /// Action to run for an entity of the given tier. `None` for data faults.
    pub fn action_for(&self, tier: Tier) -> Option<&Action> {
        match self {
            Self::Known(action) => Some(action),
            Self::Tiered(tiered) => Some(tiered.for_tier(tier)),
            Self::Unknown { .. } | Self::Malformed { .. } => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Known(action) => action.kind().as_str(),
            Self::Tiered(tiered) => tiered.base.kind().as_str(),
            Self::Unknown { type_name } | Self::Malformed { type_name, .. } => type_name,
        }
    }
}

impl From<Action> for ActionDescriptor {
    fn from(action: Action) -> Self {
        Self::Known(action)
    }
}

impl<'de> Deserialize<'de> for ActionDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_value(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ActionDescriptor {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn every_kind_name_resolves_back_to_itself() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::from_name("summon_dragon"), None);
    }

    #[test]
    fn known_action_parses_with_defaults() {
        let descriptor = parse(r#"{"type":"convert_stat_to_status","stat":"armor","status":"thorns"}"#);
        assert_eq!(
            descriptor,
            ActionDescriptor::Known(Action::ConvertStatToStatus {
                stat: Stat::Armor,
                status: StatusKind::Thorns,
                multiplier: 1,
                amount: None,
            })
        );
    }

    #[test]
    fn unregistered_type_is_kept_as_unknown() {
        let descriptor = parse(r#"{"type":"summon_dragon","value":3}"#);
        assert_eq!(
            descriptor,
            ActionDescriptor::Unknown {
                type_name: "summon_dragon".to_string()
            }
        );
        assert_eq!(descriptor.type_name(), "summon_dragon");
    }

    #[test]
    fn missing_required_field_is_kept_as_malformed() {
        let descriptor = parse(r#"{"type":"gain_status","value":3}"#);
        match descriptor {
            ActionDescriptor::Malformed { type_name, reason } => {
                assert_eq!(type_name, "gain_status");
                assert!(reason.contains("status"), "{reason}");
            }
            other => panic!("expected malformed, got {other:?}"),
        }
        assert!(matches!(
            parse(r#"{"value":3}"#),
            ActionDescriptor::Malformed { .. }
        ));
    }

    #[test]
    fn countdown_turns_fall_back_only_when_absent() {
        let descriptor = parse(
            r#"{"type":"add_countdown","name":"Holy Tome","value":{"turns":6},"actions":[{"type":"gain_stat","stat":"attack","value":3}]}"#,
        );
        let ActionDescriptor::Known(Action::AddCountdown { value, actions, .. }) = descriptor else {
            panic!("expected add_countdown");
        };
        assert_eq!(value.turns_or_default(), 6);
        assert_eq!(actions.len(), 1);

        let defaulted = parse(r#"{"type":"add_countdown","name":"Bare"}"#);
        let ActionDescriptor::Known(Action::AddCountdown { value, .. }) = defaulted else {
            panic!("expected add_countdown");
        };
        assert_eq!(value.turns_or_default(), DEFAULT_COUNTDOWN_TURNS);
    }

    #[test]
    fn scaling_touches_magnitudes_but_not_countdown_length() {
        let action = Action::AddCountdown {
            name: "Granite Tome".to_string(),
            value: CountdownSpec {
                turns: Some(4),
                repeat: true,
            },
            actions: vec![Action::GainStat {
                stat: Stat::Armor,
                value: 6,
            }
            .into()],
        };
        let Action::AddCountdown { value, actions, .. } = action.scaled(2).unwrap() else {
            panic!("expected add_countdown");
        };
        assert_eq!(value.turns, Some(4));
        assert_eq!(
            actions[0],
            ActionDescriptor::Known(Action::GainStat {
                stat: Stat::Armor,
                value: 12
            })
        );
    }

    #[test]
    fn tier_fields_replace_value_for_that_tier_only() {
        let descriptor =
            parse(r#"{"type":"heal","value":2,"value_gold":4,"value_diamond":8}"#);
        let ActionDescriptor::Tiered(tiered) = &descriptor else {
            panic!("expected tiered, got {descriptor:?}");
        };
        assert_eq!(tiered.for_tier(Tier::Base), &Action::Heal { value: 2 });
        assert_eq!(tiered.for_tier(Tier::Gold), &Action::Heal { value: 4 });
        assert_eq!(descriptor.action_for(Tier::Diamond), Some(&Action::Heal { value: 8 }));
        assert_eq!(descriptor.type_name(), "heal");

        let gold_only = parse(r#"{"type":"heal","value":2,"value_gold":3}"#);
        assert_eq!(gold_only.action_for(Tier::Diamond), Some(&Action::Heal { value: 2 }));
    }

    #[test]
    fn bad_tier_value_is_malformed() {
        match parse(r#"{"type":"heal","value":2,"value_gold":"lots"}"#) {
            ActionDescriptor::Malformed { type_name, reason } => {
                assert_eq!(type_name, "heal");
                assert!(reason.starts_with("value_gold"), "{reason}");
            }
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn tier_field_on_valueless_kind_is_reported_as_ignored() {
        let ActionDescriptor::Tiered(tiered) =
            parse(r#"{"type":"heal_percentage","percent":10,"value_gold":20}"#)
        else {
            panic!("expected tiered");
        };
        assert_eq!(tiered.ignored_tiers(), vec!["value_gold"]);
    }

    #[test]
    fn scaling_reports_overflow() {
        let action = Action::DealDamage { value: i64::MAX };
        assert_eq!(
            action.scaled(2),
            Err(ActionError::Overflow { field: "value" })
        );
    }
}
