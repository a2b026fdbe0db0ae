//! Action library: interprets one [Action] against an actor/opponent pair.
//!
//! Every successful action yields exactly one log line. Work that re-enters
//! the dispatcher (symphony, countdowns expiring early) is handed back as a
//! [FollowUp] instead of being run here.

use crate::combat::countdown::{self, Countdown};
use crate::combat::fighter::{Fighter, Stat};
use crate::combat::rng::Rng;
use crate::effects::Action;
use crate::error::ActionError;

pub struct ActionContext<'a> {
    pub actor: &'a mut Fighter,
    pub opponent: &'a mut Fighter,
    pub rng: &'a mut Rng,
    /// Display name of the entity the action came from.
    pub source: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FollowUp {
    None,
    Symphony { times: u32 },
    Countdowns(Vec<Countdown>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub line: String,
    pub follow_up: FollowUp,
}

impl ActionOutcome {
    fn line(line: String) -> Self {
        Self {
            line,
            follow_up: FollowUp::None,
        }
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<i64, ActionError> {
    if value < 0 {
        return Err(ActionError::InvalidParameter {
            field,
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(value)
}

fn product(field: &'static str, a: i64, b: i64) -> Result<i64, ActionError> {
    a.checked_mul(b).ok_or(ActionError::Overflow { field })
}

pub fn execute(action: &Action, ctx: &mut ActionContext<'_>) -> Result<ActionOutcome, ActionError> {
    let src = ctx.source;
    let me = ctx.actor.name.clone();
    let them = ctx.opponent.name.clone();

    let line = match action {
        Action::GainStat { stat, value } => {
            let value = non_negative("value", *value)?;
            let applied = ctx.actor.apply_stat_delta(*stat, value);
            format!("{me} gains {applied} {stat} ({src})")
        }
        Action::LoseStat { stat, value } => {
            let value = non_negative("value", *value)?;
            let applied = ctx.actor.apply_stat_delta(*stat, -value);
            format!("{me} loses {} {stat} ({src})", -applied)
        }
        Action::GainTempAttack { value } => {
            ctx.actor.temp_attack = ctx.actor.temp_attack.saturating_add(*value);
            format!("{me} gains {value} temporary attack ({src})")
        }
        Action::GainMaxHealth { value } => {
            let value = non_negative("value", *value)?;
            let applied = ctx.actor.gain_max_health(value);
            format!("{me} gains {applied} max health ({src})")
        }
        Action::GainStatus { status, value } => {
            let value = non_negative("value", *value)?;
            let applied = ctx.actor.gain_status(*status, value);
            format!("{me} gains {applied} {status} ({src})")
        }
        Action::GiveEnemyStatus { status, value } => {
            let value = non_negative("value", *value)?;
            let applied = ctx.opponent.gain_status(*status, value);
            format!("{me} gives {them} {applied} {status} ({src})")
        }
        Action::RemoveStatus { status, value } => {
            let amount = value.map(|v| non_negative("value", v)).transpose()?;
            let removed = ctx.actor.statuses.remove(*status, amount);
            format!("{me} removes {removed} {status} ({src})")
        }
        Action::RemoveRandomStatus { value } => {
            let value = non_negative("value", *value)?;
            match ctx.actor.statuses.remove_random(ctx.rng, value) {
                Some((status, removed)) => format!("{me} removes {removed} {status} ({src})"),
                None => format!("{me} has no status to remove ({src})"),
            }
        }
        Action::ConvertStatToStatus {
            stat,
            status,
            multiplier,
            amount,
        } => {
            let multiplier = non_negative("multiplier", *multiplier)?;
            let available = ctx.actor.stat(*stat).max(0);
            let taken = match amount {
                Some(limit) => non_negative("amount", *limit)?.min(available),
                None => available,
            };
            let gained = product("multiplier", taken, multiplier)?;
            ctx.actor.apply_stat_delta(*stat, -taken);
            let applied = ctx.actor.gain_status(*status, gained);
            format!("{me} converts {taken} {stat} into {applied} {status} ({src})")
        }
        Action::ConvertStatusToStat {
            status,
            stat,
            multiplier,
            amount,
        } => {
            let multiplier = non_negative("multiplier", *multiplier)?;
            let available = ctx.actor.statuses.get(*status);
            let taken = match amount {
                Some(limit) => non_negative("amount", *limit)?.min(available),
                None => available,
            };
            let gained = product("multiplier", taken, multiplier)?;
            ctx.actor.statuses.remove(*status, Some(taken));
            let applied = ctx.actor.apply_stat_delta(*stat, gained);
            format!("{me} converts {taken} {status} into {applied} {stat} ({src})")
        }
        Action::DealDamage { value } => {
            let value = non_negative("value", *value)?;
            let dealt = ctx.opponent.pierce(value);
            ctx.actor.stats.hp_damage_dealt += dealt;
            format!("{me} deals {dealt} damage to {them} ({src})")
        }
        Action::DealArmoredDamage { value } => {
            let value = non_negative("value", *value)?;
            let (armor_lost, hp_lost) = ctx.opponent.absorb(value);
            ctx.actor.stats.armor_destroyed_dealt += armor_lost;
            ctx.actor.stats.hp_damage_dealt += hp_lost;
            format!("{me} deals {hp_lost} damage and destroys {armor_lost} armor of {them} ({src})")
        }
        Action::TakeDamage { value } => {
            let value = non_negative("value", *value)?;
            let lost = ctx.actor.pierce(value);
            format!("{me} takes {lost} damage ({src})")
        }
        Action::LifeDrain { value } => {
            let value = non_negative("value", *value)?;
            let drained = ctx.opponent.pierce(value);
            ctx.actor.stats.hp_damage_dealt += drained;
            let healed = ctx.actor.heal(drained);
            format!("{me} drains {drained} health from {them} and heals {healed} ({src})")
        }
        Action::Heal { value } => {
            let value = non_negative("value", *value)?;
            let healed = ctx.actor.heal(value);
            format!("{me} heals {healed} ({src})")
        }
        Action::HealPercentage { percent } => {
            let percent = non_negative("percent", *percent)?;
            let amount = product("percent", ctx.actor.hp_max, percent)? / 100;
            let healed = ctx.actor.heal(amount);
            format!("{me} heals {healed} ({src})")
        }
        Action::HealFromSpeed { multiplier } => {
            let multiplier = non_negative("multiplier", *multiplier)?;
            let amount = product("multiplier", ctx.actor.speed, multiplier)?;
            let healed = ctx.actor.heal(amount);
            format!("{me} heals {healed} ({src})")
        }
        Action::HealToFull => {
            let healed = ctx.actor.heal(ctx.actor.hp_max);
            format!("{me} heals {healed} ({src})")
        }
        Action::GiveEnemyStatusEqualToStat {
            stat,
            status,
            multiplier,
        } => {
            let multiplier = non_negative("multiplier", *multiplier)?;
            let amount = product("multiplier", ctx.actor.stat(*stat).max(0), multiplier)?;
            let applied = ctx.opponent.gain_status(*status, amount);
            format!("{me} gives {them} {applied} {status} ({src})")
        }
        Action::StealStat { stat, value } => {
            let value = non_negative("value", *value)?;
            let stolen = -ctx.opponent.apply_stat_delta(*stat, -value);
            let gained = match stat {
                Stat::Health => ctx.actor.heal(stolen),
                _ => ctx.actor.apply_stat_delta(*stat, stolen),
            };
            format!("{me} steals {gained} {stat} from {them} ({src})")
        }
        Action::AddExtraStrikes { value } => {
            let value = non_negative("value", *value)?;
            ctx.actor.extra_strikes = ctx.actor.extra_strikes.saturating_add(value);
            format!("{me} gains {value} extra strikes ({src})")
        }
        Action::AddCountdown {
            name,
            value,
            actions,
        } => {
            let turns = value.turns_or_default();
            ctx.actor.countdowns.push(
                Countdown::new(name, turns, src, actions.clone()).repeating(value.repeat),
            );
            format!("{me} starts countdown {name} for {turns} turns ({src})")
        }
        Action::AdvanceCountdowns { value } => {
            let expired = countdown::tick(&mut ctx.actor.countdowns, *value);
            return Ok(ActionOutcome {
                line: format!("{me} advances countdowns by {value} ({src})"),
                follow_up: FollowUp::Countdowns(expired),
            });
        }
        Action::TriggerSymphony { times } => {
            return Ok(ActionOutcome {
                line: format!("{me} plays the symphony {times} times ({src})"),
                follow_up: FollowUp::Symphony { times: *times },
            });
        }
        Action::AddCounter { counter, value } => {
            let slot = ctx.actor.counters.entry(counter.clone()).or_insert(0);
            *slot = slot.saturating_add(*value);
            format!("{me} counter {counter} is now {slot} ({src})")
        }
        Action::ResetCounter { counter } => {
            ctx.actor.counters.remove(counter);
            format!("{me} resets counter {counter} ({src})")
        }
    };
    Ok(ActionOutcome::line(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::fighter::Side;
    use crate::combat::status::StatusKind;
    use crate::effects::{CountdownSpec, TriggerKind};

    struct Pair {
        me: Fighter,
        them: Fighter,
        rng: Rng,
    }

    impl Pair {
        fn new() -> Self {
            Self {
                me: Fighter::bare(Side::Left, "Left", 20, 2, 4, 3),
                them: Fighter::bare(Side::Right, "Right", 20, 2, 2, 1),
                rng: Rng::new(5),
            }
        }

        fn run(&mut self, action: Action) -> Result<ActionOutcome, ActionError> {
            let mut ctx = ActionContext {
                actor: &mut self.me,
                opponent: &mut self.them,
                rng: &mut self.rng,
                source: "Test Item",
            };
            execute(&action, &mut ctx)
        }
    }

    #[test]
    fn gain_stat_logs_actor_amount_and_source() {
        let mut pair = Pair::new();
        let out = pair
            .run(Action::GainStat {
                stat: Stat::Health,
                value: 5,
            })
            .unwrap();
        assert_eq!(out.line, "Left gains 5 health (Test Item)");
        assert_eq!((pair.me.hp, pair.me.hp_max), (25, 25));
        assert_eq!(out.follow_up, FollowUp::None);
    }

    #[test]
    fn convert_reads_before_zeroing() {
        let mut pair = Pair::new();
        let out = pair
            .run(Action::ConvertStatToStatus {
                stat: Stat::Armor,
                status: StatusKind::Thorns,
                multiplier: 2,
                amount: None,
            })
            .unwrap();
        assert_eq!(pair.me.armor, 0);
        assert_eq!(pair.me.statuses.get(StatusKind::Thorns), 8);
        assert_eq!(out.line, "Left converts 4 armor into 8 thorns (Test Item)");
    }

    #[test]
    fn convert_status_to_stat_respects_amount_cap() {
        let mut pair = Pair::new();
        pair.me.statuses.add(StatusKind::Regen, 5);
        pair.run(Action::ConvertStatusToStat {
            status: StatusKind::Regen,
            stat: Stat::Attack,
            multiplier: 1,
            amount: Some(2),
        })
        .unwrap();
        assert_eq!(pair.me.statuses.get(StatusKind::Regen), 3);
        assert_eq!(pair.me.attack, 4);
    }

    #[test]
    fn deal_damage_bypasses_armor_but_armored_variant_does_not() {
        let mut pair = Pair::new();
        pair.run(Action::DealDamage { value: 3 }).unwrap();
        assert_eq!((pair.them.armor, pair.them.hp), (2, 17));
        pair.run(Action::DealArmoredDamage { value: 3 }).unwrap();
        assert_eq!((pair.them.armor, pair.them.hp), (0, 16));
        assert_eq!(pair.me.stats.hp_damage_dealt, 4);
        assert_eq!(pair.me.stats.armor_destroyed_dealt, 2);
    }

    #[test]
    fn heal_percentage_floors_and_clamps() {
        let mut pair = Pair::new();
        pair.me.hp = 10;
        let out = pair.run(Action::HealPercentage { percent: 33 }).unwrap();
        assert_eq!(pair.me.hp, 16);
        assert_eq!(out.line, "Left heals 6 (Test Item)");
        pair.run(Action::HealToFull).unwrap();
        assert_eq!(pair.me.hp, pair.me.hp_max);
    }

    #[test]
    fn give_enemy_status_equal_to_stat_reads_actor() {
        let mut pair = Pair::new();
        pair.run(Action::GiveEnemyStatusEqualToStat {
            stat: Stat::Speed,
            status: StatusKind::Poison,
            multiplier: 1,
        })
        .unwrap();
        assert_eq!(pair.them.statuses.get(StatusKind::Poison), 3);
        assert_eq!(pair.them.stats.statuses_gained.get("poison"), Some(&3));
    }

    #[test]
    fn steal_stat_is_capped_by_what_the_enemy_has() {
        let mut pair = Pair::new();
        let out = pair
            .run(Action::StealStat {
                stat: Stat::Armor,
                value: 5,
            })
            .unwrap();
        assert_eq!((pair.me.armor, pair.them.armor), (6, 0));
        assert_eq!(out.line, "Left steals 2 armor from Right (Test Item)");
    }

    #[test]
    fn negative_magnitude_is_an_action_error() {
        let mut pair = Pair::new();
        let err = pair.run(Action::Heal { value: -2 }).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { field: "value", .. }));
        assert_eq!(pair.me.hp, 20);
    }

    #[test]
    fn countdown_uses_explicit_turns() {
        let mut pair = Pair::new();
        pair.run(Action::AddCountdown {
            name: "Holy Tome".to_string(),
            value: CountdownSpec {
                turns: Some(6),
                repeat: false,
            },
            actions: Vec::new(),
        })
        .unwrap();
        assert_eq!(pair.me.countdowns[0].turns_remaining, 6);
        assert_eq!(pair.me.countdowns[0].source, "Test Item");

        let out = pair.run(Action::AdvanceCountdowns { value: 6 }).unwrap();
        match out.follow_up {
            FollowUp::Countdowns(expired) => assert_eq!(expired.len(), 1),
            other => panic!("expected expired countdowns, got {other:?}"),
        }
        assert!(pair.me.countdowns.is_empty());
    }

    #[test]
    fn damage_and_status_actions_raise_triggers_on_the_target() {
        let mut pair = Pair::new();
        pair.run(Action::DealDamage { value: 2 }).unwrap();
        pair.run(Action::GiveEnemyStatus {
            status: StatusKind::Poison,
            value: 1,
        })
        .unwrap();
        assert_eq!(
            pair.them.take_pending(),
            vec![TriggerKind::OnDamaged, TriggerKind::OnGainStatus]
        );

        pair.me.hp = 15;
        pair.run(Action::LifeDrain { value: 3 }).unwrap();
        assert_eq!(pair.me.take_pending(), vec![TriggerKind::OnHeal]);
        assert_eq!(pair.them.take_pending(), vec![TriggerKind::OnDamaged]);
    }

    #[test]
    fn counters_accumulate_and_reset() {
        let mut pair = Pair::new();
        for _ in 0..3 {
            pair.run(Action::AddCounter {
                counter: "hits".to_string(),
                value: 1,
            })
            .unwrap();
        }
        assert_eq!(pair.me.counter("hits"), 3);
        pair.run(Action::ResetCounter {
            counter: "hits".to_string(),
        })
        .unwrap();
        assert_eq!(pair.me.counter("hits"), 0);
    }
}
