//! Turn/round scheduler and the `simulate` entry points.
//!
//! A battle runs `preBattle` and `battleStart` for both sides, then loops
//! rounds until a fighter reaches 0 HP or the turn cap is hit:
//!
//! 1. reset temporary attack, log `-- Turn N --`
//! 2. `turnStart` triggers, turn-start status upkeep, countdown upkeep
//! 3. strike phase in speed order (ties per [TieBreak]); thorns reflect
//!    within the strike that triggered them; at most [MAX_STRIKES_PER_PHASE]
//!    strikes per fighter
//! 4. exposed check, wounded check
//! 5. `turnEnd` triggers, turn-end status upkeep, wounded check
//!
//! Termination is checked after every phase and every strike. Each round (and
//! the pre-battle phase) may open at most [DISPATCH_BUDGET_PER_ROUND] trigger
//! dispatches. The whole run is a pure function of the builds, the database
//! and [SimulationOptions].

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::combat::countdown;
use crate::combat::dispatcher::{effect_sources, EffectSource};
use crate::combat::fighter::{create_fighter_on, Build, Fighter, Side};
use crate::combat::log::BattleLog;
use crate::combat::rng::Rng;
use crate::combat::status::{StatusKind, Upkeep, TURN_END_UPKEEP, TURN_START_UPKEEP};
use crate::combat::trace::{BattleObserver, NoopObserver, TraceCollector, TraceMode};
use crate::data::Database;
use crate::effects::TriggerKind;
use crate::error::Result;

pub const DEFAULT_SEED: u64 = 7;
pub const DEFAULT_MAX_TURNS: u32 = 100;
/// Nested dispatches allowed before further events are dropped.
pub const MAX_DISPATCH_DEPTH: u32 = 8;
/// Dispatches a single round may open, counting ones dropped for depth.
pub const DISPATCH_BUDGET_PER_ROUND: u32 = 10_000;
/// Strikes one fighter may make in a strike phase, extra strikes included.
pub const MAX_STRIKES_PER_PHASE: i64 = 32;
/// Upper bound on `trigger_symphony` repetitions.
pub const MAX_SYMPHONY_TIMES: u32 = 16;

/// Strike order when both fighters have equal speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    LeftFirst,
    RightFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationOptions {
    pub seed: u64,
    #[serde(alias = "max_turns")]
    pub max_turns: u32,
    #[serde(alias = "include_summary")]
    pub include_summary: bool,
    #[serde(alias = "tie_break")]
    pub tie_break: TieBreak,
    #[serde(alias = "trace_mode")]
    pub trace_mode: TraceMode,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_turns: DEFAULT_MAX_TURNS,
            include_summary: false,
            tie_break: TieBreak::LeftFirst,
            trace_mode: TraceMode::Off,
        }
    }
}

impl SimulationOptions {
    /// The turn cap actually enforced; never below 1.
    pub fn effective_max_turns(&self) -> u32 {
        self.max_turns.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Left,
    Right,
    /// Both fighters reached 0 HP in the same resolution step.
    Draw,
    /// Turn cap reached with both fighters alive.
    Timeout,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Draw => "draw",
            Self::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterSummary {
    pub name: String,
    pub hp: i64,
    pub hp_max: i64,
    pub armor: i64,
    pub strikes_attempted: u32,
    pub strikes_landed: u32,
    pub hp_damage_dealt: i64,
    pub armor_destroyed_dealt: i64,
    pub statuses_gained: std::collections::BTreeMap<String, i64>,
    /// Statuses still held when the battle ended.
    pub statuses: std::collections::BTreeMap<String, i64>,
    pub active_sets: Vec<String>,
}

impl FighterSummary {
    fn of(fighter: &Fighter) -> Self {
        Self {
            name: fighter.name.clone(),
            hp: fighter.hp,
            hp_max: fighter.hp_max,
            armor: fighter.armor,
            strikes_attempted: fighter.stats.strikes_attempted,
            strikes_landed: fighter.stats.strikes_landed,
            hp_damage_dealt: fighter.stats.hp_damage_dealt,
            armor_destroyed_dealt: fighter.stats.armor_destroyed_dealt,
            statuses_gained: fighter.stats.statuses_gained.clone(),
            statuses: fighter
                .statuses
                .active()
                .map(|(kind, value)| (kind.as_str().to_string(), value))
                .collect(),
            active_sets: fighter.active_set_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleSummary {
    pub left: FighterSummary,
    pub right: FighterSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub result: Outcome,
    pub rounds: u32,
    pub log: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BattleSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<crate::combat::trace::ActionTrace>,
}

/// Mutable state of one battle. Lives for a single `simulate` call.
pub(crate) struct Battle<'a> {
    pub(crate) fighters: [Fighter; 2],
    /// Effect sources per side: equipped records in equip order, then active sets.
    pub(crate) loadouts: [Vec<EffectSource<'a>>; 2],
    pub(crate) rng: Rng,
    pub(crate) log: BattleLog,
    pub(crate) round: u32,
    pub(crate) depth: u32,
    /// Dispatches opened this round.
    pub(crate) dispatches: u32,
    pub(crate) budget_exhausted: bool,
    pub(crate) collector: TraceCollector,
    pub(crate) observer: &'a mut dyn BattleObserver,
    tie_break: TieBreak,
}

/// Borrows both fighters mutably as `(actor, opponent)`.
pub(crate) fn pair_mut(fighters: &mut [Fighter; 2], actor: Side) -> (&mut Fighter, &mut Fighter) {
    let [left, right] = fighters;
    match actor {
        Side::Left => (left, right),
        Side::Right => (right, left),
    }
}

impl<'a> Battle<'a> {
    pub(crate) fn fighter(&self, side: Side) -> &Fighter {
        &self.fighters[side.index()]
    }

    pub(crate) fn fighter_mut(&mut self, side: Side) -> &mut Fighter {
        &mut self.fighters[side.index()]
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        match (self.fighters[0].is_alive(), self.fighters[1].is_alive()) {
            (true, true) => None,
            (false, false) => Some(Outcome::Draw),
            (false, true) => Some(Outcome::Right),
            (true, false) => Some(Outcome::Left),
        }
    }

    fn checkpoint(&self) -> ControlFlow<Outcome> {
        match self.outcome() {
            Some(outcome) => ControlFlow::Break(outcome),
            None => ControlFlow::Continue(()),
        }
    }

    /// Shows both fighters to the observer after a resolved step.
    pub(crate) fn notify_step(&mut self) {
        self.observer
            .on_step(&self.fighters[0], &self.fighters[1]);
    }

    fn run(&mut self, max_turns: u32) -> Outcome {
        match self.run_to_end(max_turns) {
            ControlFlow::Break(outcome) => outcome,
            ControlFlow::Continue(()) => Outcome::Timeout,
        }
    }

    fn run_to_end(&mut self, max_turns: u32) -> ControlFlow<Outcome> {
        for trigger in [TriggerKind::PreBattle, TriggerKind::BattleStart] {
            for side in Side::BOTH {
                self.run_effects(trigger, side);
                self.checkpoint()?;
            }
        }

        while self.round < max_turns {
            self.round += 1;
            self.log.set_round(self.round);
            self.dispatches = 0;
            self.budget_exhausted = false;
            self.run_round()?;
        }
        ControlFlow::Continue(())
    }

    fn run_round(&mut self) -> ControlFlow<Outcome> {
        for fighter in &mut self.fighters {
            fighter.temp_attack = 0;
        }
        self.log.push(format!("-- Turn {} --", self.round));

        for side in Side::BOTH {
            self.run_effects(TriggerKind::TurnStart, side);
            self.checkpoint()?;
        }
        for side in Side::BOTH {
            self.status_upkeep(side, &TURN_START_UPKEEP);
        }
        self.checkpoint()?;
        self.flush_pending();
        self.checkpoint()?;
        for side in Side::BOTH {
            let expired = countdown::tick(&mut self.fighter_mut(side).countdowns, 1);
            self.fire_countdowns(side, expired);
            self.checkpoint()?;
        }

        let armor_at_start = [self.fighters[0].armor, self.fighters[1].armor];
        self.strike_phase()?;

        for side in Side::BOTH {
            let fighter = self.fighter_mut(side);
            if !fighter.exposed_fired && armor_at_start[side.index()] > 0 && fighter.armor == 0 {
                fighter.exposed_fired = true;
                self.run_effects(TriggerKind::OnExposed, side);
                self.checkpoint()?;
            }
        }
        self.wounded_check()?;

        for side in Side::BOTH {
            self.run_effects(TriggerKind::TurnEnd, side);
            self.checkpoint()?;
        }
        for side in Side::BOTH {
            self.status_upkeep(side, &TURN_END_UPKEEP);
        }
        self.checkpoint()?;
        self.flush_pending();
        self.checkpoint()?;
        self.wounded_check()
    }

    fn strike_order(&self) -> [Side; 2] {
        let (left, right) = (self.fighters[0].speed, self.fighters[1].speed);
        let left_first = match left.cmp(&right) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.tie_break == TieBreak::LeftFirst,
        };
        if left_first {
            [Side::Left, Side::Right]
        } else {
            [Side::Right, Side::Left]
        }
    }

    fn strike_phase(&mut self) -> ControlFlow<Outcome> {
        for side in self.strike_order() {
            let extra = std::mem::take(&mut self.fighter_mut(side).extra_strikes).max(0);
            let requested = extra.saturating_add(1);
            if requested > MAX_STRIKES_PER_PHASE {
                let name = &self.fighter(side).name;
                let line = format!(
                    "{name} strikes capped at {MAX_STRIKES_PER_PHASE} ({requested} requested)"
                );
                self.log.diagnostic(line);
            }
            for _ in 0..requested.min(MAX_STRIKES_PER_PHASE) {
                self.strike(side)?;
            }
        }
        ControlFlow::Continue(())
    }

    fn strike(&mut self, attacker: Side) -> ControlFlow<Outcome> {
        let defender = attacker.opponent();
        let (att, def) = pair_mut(&mut self.fighters, attacker);
        att.stats.strikes_attempted += 1;

        if att.statuses.has(StatusKind::Stun) {
            att.statuses.add(StatusKind::Stun, -1);
            self.log
                .push(format!("{} is stunned and misses the strike", att.name));
            return ControlFlow::Continue(());
        }

        let mut damage = att.strike_damage();
        if att.statuses.has(StatusKind::Freeze) {
            damage /= 2;
        }
        let armor_before = def.armor;
        let (armor_lost, hp_lost) = def.absorb(damage);
        att.stats.armor_destroyed_dealt += armor_lost;
        att.stats.hp_damage_dealt += hp_lost;
        if armor_lost + hp_lost > 0 {
            att.stats.strikes_landed += 1;
        }
        if armor_lost > 0 {
            self.log
                .push(format!("{} destroys {armor_lost} armor", att.name));
        }
        if hp_lost > 0 {
            self.log
                .push(format!("{} hits {} for {hp_lost}", att.name, def.name));
        }
        if armor_lost + hp_lost == 0 {
            self.log
                .push(format!("{} strikes {} for no damage", att.name, def.name));
        }
        let exposed_now = armor_before > 0 && def.armor == 0 && !def.exposed_fired;
        if exposed_now {
            def.exposed_fired = true;
        }

        // Thorns resolve inside the strike; both sides may drop to 0 here.
        let thorns = def.statuses.get(StatusKind::Thorns);
        if thorns > 0 {
            let (armor_lost, hp_lost) = att.absorb(thorns);
            def.stats.armor_destroyed_dealt += armor_lost;
            def.stats.hp_damage_dealt += hp_lost;
            self.log.push(format!(
                "{} reflects {thorns} thorns onto {} ({armor_lost} armor, {hp_lost} health)",
                def.name, att.name
            ));
        }
        self.notify_step();
        self.checkpoint()?;
        self.flush_pending();
        self.checkpoint()?;

        self.run_effects(TriggerKind::OnHit, attacker);
        self.checkpoint()?;
        self.run_effects(TriggerKind::OnStruck, defender);
        self.checkpoint()?;
        if exposed_now {
            self.run_effects(TriggerKind::OnExposed, defender);
            self.checkpoint()?;
        }
        self.run_effects(TriggerKind::AfterStrike, attacker);
        self.checkpoint()
    }

    fn status_upkeep(&mut self, side: Side, order: &[StatusKind]) {
        let fighter = &mut self.fighters[side.index()];
        for &kind in order {
            let magnitude = fighter.statuses.get(kind);
            if magnitude == 0 {
                continue;
            }
            match kind.upkeep() {
                Some(Upkeep::ArmorLoss) => {
                    let lost = fighter.lose_armor(magnitude);
                    if lost > 0 {
                        self.log
                            .push(format!("{} loses {lost} armor to {kind}", fighter.name));
                    }
                }
                Some(Upkeep::Damage) => {
                    let lost = fighter.take_damage(magnitude);
                    self.log
                        .push(format!("{} suffers {lost} {kind} damage", fighter.name));
                    if kind == StatusKind::Poison {
                        fighter.pending.push(TriggerKind::OnPoisonTick);
                    }
                }
                Some(Upkeep::Heal) => {
                    let healed = fighter.heal(magnitude);
                    if healed > 0 {
                        self.log
                            .push(format!("{} heals {healed} from {kind}", fighter.name));
                    }
                }
                Some(Upkeep::DecayOnly) | None => {}
            }
            fighter.statuses.add(kind, -1);
        }
        self.notify_step();
    }

    fn wounded_check(&mut self) -> ControlFlow<Outcome> {
        for side in Side::BOTH {
            let fighter = self.fighter_mut(side);
            if !fighter.wounded_fired && fighter.is_alive() && fighter.is_at_wounded_threshold() {
                fighter.wounded_fired = true;
                self.run_effects(TriggerKind::OnWounded, side);
                self.checkpoint()?;
            }
        }
        ControlFlow::Continue(())
    }
}

/// Runs one battle. Fails only when a build references an unknown slug.
pub fn simulate(
    left: &Build,
    right: &Build,
    db: &Database,
    options: &SimulationOptions,
) -> Result<SimulationResult> {
    simulate_with_observer(left, right, db, options, &mut NoopObserver)
}

/// [simulate] with an observer that sees every executed action.
pub fn simulate_with_observer(
    left: &Build,
    right: &Build,
    db: &Database,
    options: &SimulationOptions,
    observer: &mut dyn BattleObserver,
) -> Result<SimulationResult> {
    let fighters = [
        create_fighter_on(Side::Left, left, db)?,
        create_fighter_on(Side::Right, right, db)?,
    ];
    let loadouts = [effect_sources(left, db)?, effect_sources(right, db)?];
    let max_turns = options.effective_max_turns();

    tracing::debug!(
        left = %fighters[0].name,
        right = %fighters[1].name,
        seed = options.seed,
        max_turns,
        "starting battle"
    );

    let mut battle = Battle {
        fighters,
        loadouts,
        rng: Rng::new(options.seed),
        log: BattleLog::new(),
        round: 0,
        depth: 0,
        dispatches: 0,
        budget_exhausted: false,
        collector: TraceCollector::new(options.trace_mode == TraceMode::Events),
        observer,
        tie_break: options.tie_break,
    };
    let result = battle.run(max_turns);

    tracing::debug!(result = result.as_str(), rounds = battle.round, "battle finished");

    let summary = options.include_summary.then(|| BattleSummary {
        left: FighterSummary::of(battle.fighter(Side::Left)),
        right: FighterSummary::of(battle.fighter(Side::Right)),
    });
    Ok(SimulationResult {
        result,
        rounds: battle.round,
        log: battle.log.into_lines(),
        summary,
        events: battle.collector.into_events(),
    })
}
