use serde::{Deserialize, Serialize};

use crate::combat::{Fighter, Stat, StatusKind};

/// Predicate gating an effect. Evaluated against the acting fighter, its
/// opponent and the current round (0 before the first turn).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    HasArmor,
    NoArmor,
    IsFullHealth,
    IsFirstTurn,
    IsWounded,
    HasStatus { status: StatusKind },
    EnemyHasStatus { status: StatusKind },
    EnemyHasNoArmor,
    SpeedGreaterThanEnemy,
    StatAtLeast { stat: Stat, value: i64 },
    EveryNthTurn { n: u32 },
    CounterAtLeast { counter: String, value: i64 },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
    #[serde(other)]
    Unknown,
}

impl Condition {
    /// `None` when the predicate (or any nested one) is of an unknown type.
    pub fn evaluate(&self, actor: &Fighter, opponent: &Fighter, round: u32) -> Option<bool> {
        let holds = match self {
            Self::HasArmor => actor.armor > 0,
            Self::NoArmor => actor.armor == 0,
            Self::IsFullHealth => actor.hp == actor.hp_max,
            Self::IsFirstTurn => round <= 1,
            Self::IsWounded => actor.is_at_wounded_threshold(),
            Self::HasStatus { status } => actor.statuses.has(*status),
            Self::EnemyHasStatus { status } => opponent.statuses.has(*status),
            Self::EnemyHasNoArmor => opponent.armor == 0,
            Self::SpeedGreaterThanEnemy => actor.speed > opponent.speed,
            Self::StatAtLeast { stat, value } => actor.stat(*stat) >= *value,
            Self::EveryNthTurn { n } => *n > 0 && round > 0 && round % n == 0,
            Self::CounterAtLeast { counter, value } => actor.counter(counter) >= *value,
            Self::All { conditions } => {
                for condition in conditions {
                    if !condition.evaluate(actor, opponent, round)? {
                        return Some(false);
                    }
                }
                true
            }
            Self::Any { conditions } => {
                for condition in conditions {
                    if condition.evaluate(actor, opponent, round)? {
                        return Some(true);
                    }
                }
                false
            }
            Self::Not { condition } => !condition.evaluate(actor, opponent, round)?,
            Self::Unknown => return None,
        };
        Some(holds)
    }

    /// True if this predicate or any nested one is [Condition::Unknown].
    pub fn contains_unknown(&self) -> bool {
        match self {
            Self::Unknown => true,
            Self::All { conditions } | Self::Any { conditions } => {
                conditions.iter().any(Condition::contains_unknown)
            }
            Self::Not { condition } => condition.contains_unknown(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Side;

    fn fighter(hp: i64, armor: i64, speed: i64) -> Fighter {
        let mut f = Fighter::bare(Side::Left, "Test", hp, 0, armor, speed);
        f.hp = hp;
        f
    }

    #[test]
    fn parses_nested_conditions_from_json() {
        let json = r#"{"type":"all","conditions":[{"type":"has_armor"},{"type":"not","condition":{"type":"enemy_has_status","status":"poison"}}]}"#;
        let condition: Condition = serde_json::from_str(json).unwrap();
        let me = fighter(10, 2, 1);
        let enemy = fighter(10, 0, 1);
        assert_eq!(condition.evaluate(&me, &enemy, 1), Some(true));
    }

    #[test]
    fn unknown_condition_type_deserializes_and_evaluates_to_none() {
        let condition: Condition =
            serde_json::from_str(r#"{"type":"moon_is_full","phase":3}"#).unwrap();
        assert_eq!(condition, Condition::Unknown);
        let me = fighter(10, 0, 0);
        assert_eq!(condition.evaluate(&me, &me, 1), None);

        let nested = Condition::Any {
            conditions: vec![Condition::Unknown],
        };
        assert!(nested.contains_unknown());
    }

    #[test]
    fn every_nth_turn_ignores_battle_start_and_zero() {
        let me = fighter(10, 0, 0);
        let even = Condition::EveryNthTurn { n: 2 };
        assert_eq!(even.evaluate(&me, &me, 0), Some(false));
        assert_eq!(even.evaluate(&me, &me, 3), Some(false));
        assert_eq!(even.evaluate(&me, &me, 4), Some(true));
        assert_eq!(
            Condition::EveryNthTurn { n: 0 }.evaluate(&me, &me, 4),
            Some(false)
        );
    }

    #[test]
    fn wounded_uses_half_max_rounded_down() {
        let mut me = fighter(11, 0, 0);
        me.hp = 6;
        assert_eq!(Condition::IsWounded.evaluate(&me, &me, 1), Some(false));
        me.hp = 5;
        assert_eq!(Condition::IsWounded.evaluate(&me, &me, 1), Some(true));
    }
}
