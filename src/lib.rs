//! Deterministic, data-driven battle simulator.
//!
//! Two fighters are built from loadouts of items, weapons and upgrades whose
//! declarative effects fire on battle events. [simulate] runs one battle to a
//! terminal state and returns its outcome together with the full battle log.

pub mod cli;
pub mod combat;
pub mod config;
pub mod data;
pub mod effects;
pub mod error;
pub mod logging;
pub mod parallel;

pub use combat::{
    create_fighter, simulate, simulate_with_observer, Build, Outcome, SimulationOptions,
    SimulationResult,
};
pub use data::{load_database, Database};
pub use error::{ActionError, Result, SimError};
