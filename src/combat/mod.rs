pub mod countdown;
pub mod dispatcher;
pub mod engine;
pub mod export_csv;
pub mod fighter;
pub mod library;
pub mod log;
pub mod rng;
pub mod sets;
pub mod status;
pub mod trace;

pub use countdown::Countdown;
pub use engine::{
    simulate, simulate_with_observer, BattleSummary, FighterSummary, Outcome, SimulationOptions,
    SimulationResult, TieBreak, DEFAULT_MAX_TURNS, DEFAULT_SEED, DISPATCH_BUDGET_PER_ROUND,
    MAX_DISPATCH_DEPTH, MAX_STRIKES_PER_PHASE, MAX_SYMPHONY_TIMES,
};
pub use export_csv::{write_sweep_csv, write_sweep_csv_to};
pub use fighter::{
    create_fighter, create_fighter_on, resolve_equipment, resolve_loadout, Build, Equip, Fighter,
    FighterStats, Side, Stat, StatOverrides, Tier, DEFAULT_BASE_HP,
};
pub use library::{ActionContext, ActionOutcome, FollowUp};
pub use log::BattleLog;
pub use rng::Rng;
pub use sets::{builtin_sets, compute_active_sets, multiplier_for, SetDef, SetRequirement};
pub use status::{StatusKind, StatusLedger, Upkeep, TURN_END_UPKEEP, TURN_START_UPKEEP};
pub use trace::{ActionTrace, BattleObserver, NoopObserver, TraceCollector, TraceMode};
