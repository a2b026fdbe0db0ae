//! Effect trigger dispatcher: the battle's event bus.
//!
//! For an event on one side, walks that fighter's effect sources (equipped
//! records in equip order, then active sets) and each source's effects in
//! declaration order, evaluates conditions and runs the actions through the
//! library with the set multiplier applied. Data faults degrade to diagnostic
//! log lines; nothing here can abort a battle.

use std::collections::BTreeSet;

use crate::combat::countdown::Countdown;
use crate::combat::engine::{
    pair_mut, Battle, DISPATCH_BUDGET_PER_ROUND, MAX_DISPATCH_DEPTH, MAX_SYMPHONY_TIMES,
};
use crate::combat::fighter::{resolve_equipment, Build, Side, Tier};
use crate::combat::library::{self, ActionContext, FollowUp};
use crate::combat::sets::{active_sets, multiplier_for, SetDef};
use crate::combat::trace::ActionTrace;
use crate::data::{Database, EntityRecord};
use crate::effects::{ActionDescriptor, Effect, TriggerKind};
use crate::error::Result;

static NO_TAGS: BTreeSet<String> = BTreeSet::new();

/// Something whose effects fire for a fighter.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EffectSource<'a> {
    pub(crate) name: &'a str,
    pub(crate) tags: &'a BTreeSet<String>,
    pub(crate) effects: &'a [Effect],
    pub(crate) tier: Tier,
}

impl<'a> EffectSource<'a> {
    fn record(record: &'a EntityRecord, tier: Tier) -> Self {
        Self {
            name: &record.name,
            tags: &record.tags,
            effects: &record.effects,
            tier,
        }
    }

    /// Sets carry no tags, so they never pick up a set multiplier.
    fn set(set: &'a SetDef) -> Self {
        Self {
            name: &set.name,
            tags: &NO_TAGS,
            effects: &set.effects,
            tier: Tier::Base,
        }
    }

    fn listens_to(&self, trigger: TriggerKind) -> bool {
        self.effects.iter().any(|effect| effect.trigger == trigger)
    }
}

/// Equipped records followed by active sets that have effects of their own.
pub(crate) fn effect_sources<'a>(build: &Build, db: &'a Database) -> Result<Vec<EffectSource<'a>>> {
    let equipment = resolve_equipment(build, db)?;
    let records: Vec<&EntityRecord> = equipment.iter().map(|(record, _)| *record).collect();

    let mut sources: Vec<EffectSource<'a>> = equipment
        .into_iter()
        .map(|(record, tier)| EffectSource::record(record, tier))
        .collect();
    sources.extend(
        active_sets(&records, db)
            .into_iter()
            .filter(|set| !set.effects.is_empty())
            .map(EffectSource::set),
    );
    Ok(sources)
}

impl<'a> Battle<'a> {
    fn enter(&mut self, what: &str) -> bool {
        if self.dispatches >= DISPATCH_BUDGET_PER_ROUND {
            if !self.budget_exhausted {
                self.budget_exhausted = true;
                self.log
                    .diagnostic(format!("dispatch budget exhausted: {what} dropped"));
            }
            return false;
        }
        self.dispatches += 1;
        if self.depth >= MAX_DISPATCH_DEPTH {
            self.log
                .diagnostic(format!("dispatch depth exceeded: {what} dropped"));
            return false;
        }
        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn has_listener(&self, trigger: TriggerKind, side: Side) -> bool {
        self.loadouts[side.index()]
            .iter()
            .any(|source| source.listens_to(trigger))
    }

    /// Fires `trigger` on `side`'s effect sources.
    pub(crate) fn run_effects(&mut self, trigger: TriggerKind, side: Side) {
        if !self.enter(trigger.as_str()) {
            return;
        }
        let required_tag = trigger.required_tag();

        for slot in 0..self.loadouts[side.index()].len() {
            let source = self.loadouts[side.index()][slot];
            if let Some(tag) = required_tag {
                if !source.tags.contains(tag) {
                    continue;
                }
            }
            let multiplier = multiplier_for(&self.fighter(side).active_sets, source.tags);

            for effect in source.effects.iter().filter(|e| e.trigger == trigger) {
                if self.outcome().is_some() {
                    break;
                }
                if let Some(condition) = &effect.condition {
                    let actor = self.fighter(side);
                    let opponent = self.fighter(side.opponent());
                    match condition.evaluate(actor, opponent, self.round) {
                        Some(true) => {}
                        Some(false) => continue,
                        None => {
                            self.log.diagnostic(format!(
                                "unknown condition on {trigger} ({})",
                                source.name
                            ));
                            continue;
                        }
                    }
                }
                self.run_actions(
                    side,
                    &effect.actions,
                    Some(trigger),
                    source.name,
                    multiplier,
                    source.tier,
                );
            }
        }
        self.leave();
    }

    /// Fires the state-change triggers both fighters raised since the last
    /// flush, left side first. Triggers nobody listens to are discarded.
    pub(crate) fn flush_pending(&mut self) {
        for side in Side::BOTH {
            for trigger in self.fighter_mut(side).take_pending() {
                if self.outcome().is_some() {
                    return;
                }
                if self.has_listener(trigger, side) {
                    self.run_effects(trigger, side);
                }
            }
        }
    }

    /// Runs an action list for `side`. Stops early once a fighter is down.
    pub(crate) fn run_actions(
        &mut self,
        side: Side,
        actions: &[ActionDescriptor],
        trigger: Option<TriggerKind>,
        source: &str,
        multiplier: i64,
        tier: Tier,
    ) {
        for descriptor in actions {
            if self.outcome().is_some() {
                return;
            }
            let action = match descriptor {
                ActionDescriptor::Unknown { type_name } => {
                    self.log.diagnostic(format!("unknown action: {type_name}"));
                    continue;
                }
                ActionDescriptor::Malformed { type_name, reason } => {
                    self.log
                        .diagnostic(format!("malformed action {type_name}: {reason}"));
                    continue;
                }
                ActionDescriptor::Known(action) => action,
                ActionDescriptor::Tiered(tiered) => tiered.for_tier(tier),
            };
            let kind = action.kind();
            let scaled = match action.scaled(multiplier) {
                Ok(scaled) => scaled,
                Err(err) => {
                    self.log.diagnostic(format!("action {kind} failed: {err}"));
                    continue;
                }
            };

            let (actor, opponent) = pair_mut(&mut self.fighters, side);
            let mut ctx = ActionContext {
                actor,
                opponent,
                rng: &mut self.rng,
                source,
            };
            let outcome = match library::execute(&scaled, &mut ctx) {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.log.diagnostic(format!("action {kind} failed: {err}"));
                    continue;
                }
            };

            let trace = ActionTrace {
                round: self.round,
                side,
                actor: self.fighter(side).name.clone(),
                source: source.to_string(),
                trigger,
                action: kind.as_str().to_string(),
                multiplier,
                line: outcome.line.clone(),
            };
            self.log.push(outcome.line);
            self.observer.on_action(&trace);
            self.collector.record(trace);
            self.notify_step();
            self.flush_pending();

            match outcome.follow_up {
                FollowUp::None => {}
                FollowUp::Symphony { times } => {
                    if times > MAX_SYMPHONY_TIMES {
                        self.log.diagnostic(format!(
                            "symphony capped at {MAX_SYMPHONY_TIMES} plays ({times} requested)"
                        ));
                    }
                    for _ in 0..times.min(MAX_SYMPHONY_TIMES) {
                        if self.outcome().is_some() || self.budget_exhausted {
                            break;
                        }
                        self.run_effects(TriggerKind::Symphony, side);
                    }
                }
                FollowUp::Countdowns(expired) => self.fire_countdowns(side, expired),
            }
        }
    }

    /// Fires expired countdowns in order, then the owner's `countdown` trigger
    /// once per expiry. Countdown actions run at base tier.
    pub(crate) fn fire_countdowns(&mut self, side: Side, expired: Vec<Countdown>) {
        for countdown in expired {
            if self.outcome().is_some() {
                return;
            }
            if !self.enter("countdown") {
                return;
            }
            self.log.push(format!(
                "{} countdown {} fires ({})",
                self.fighter(side).name,
                countdown.name,
                countdown.source
            ));
            self.run_actions(side, &countdown.on_expire, None, &countdown.name, 1, Tier::Base);
            self.run_effects(TriggerKind::Countdown, side);
            self.leave();
        }
    }
}
