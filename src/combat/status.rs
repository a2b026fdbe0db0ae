//! Status ledger: per-fighter status magnitudes and their per-turn upkeep.
//!
//! Magnitudes never drop below zero. Upkeep runs in two fixed passes per turn
//! ([TURN_START_UPKEEP] then [TURN_END_UPKEEP]); the scheduler applies each
//! kind's [Upkeep] to the fighter and then decays the stack by one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::rng::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Poison,
    Acid,
    Riptide,
    Freeze,
    Stun,
    Thorns,
    Regen,
    Purity,
}

/// What a status does to its holder during upkeep, before decaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upkeep {
    /// Removes armor equal to the magnitude (floor 0).
    ArmorLoss,
    /// Deals damage equal to the magnitude, bypassing armor.
    Damage,
    /// Restores health equal to the magnitude (clamped to max).
    Heal,
    /// No effect beyond decaying.
    DecayOnly,
}

/// Turn-start pass, applied in this order.
pub const TURN_START_UPKEEP: [StatusKind; 2] = [StatusKind::Acid, StatusKind::Poison];

/// Turn-end pass, applied in this order.
pub const TURN_END_UPKEEP: [StatusKind; 5] = [
    StatusKind::Regen,
    StatusKind::Riptide,
    StatusKind::Thorns,
    StatusKind::Freeze,
    StatusKind::Purity,
];

impl StatusKind {
    pub const ALL: [StatusKind; 8] = [
        Self::Poison,
        Self::Acid,
        Self::Riptide,
        Self::Freeze,
        Self::Stun,
        Self::Thorns,
        Self::Regen,
        Self::Purity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poison => "poison",
            Self::Acid => "acid",
            Self::Riptide => "riptide",
            Self::Freeze => "freeze",
            Self::Stun => "stun",
            Self::Thorns => "thorns",
            Self::Regen => "regen",
            Self::Purity => "purity",
        }
    }

    /// Stun has no upkeep entry: it is consumed one stack per prevented strike.
    pub fn upkeep(&self) -> Option<Upkeep> {
        match self {
            Self::Acid => Some(Upkeep::ArmorLoss),
            Self::Poison | Self::Riptide => Some(Upkeep::Damage),
            Self::Regen => Some(Upkeep::Heal),
            Self::Thorns | Self::Freeze | Self::Purity => Some(Upkeep::DecayOnly),
            Self::Stun => None,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping of status kind to magnitude. Zero-magnitude kinds are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusLedger {
    stacks: BTreeMap<StatusKind, i64>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: StatusKind) -> i64 {
        self.stacks.get(&kind).copied().unwrap_or(0)
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.get(kind) > 0
    }

    /// Adds `amount` (negative removes) and clamps at zero. Returns the applied change.
    pub fn add(&mut self, kind: StatusKind, amount: i64) -> i64 {
        let before = self.get(kind);
        let after = before.saturating_add(amount).max(0);
        if after == 0 {
            self.stacks.remove(&kind);
        } else {
            self.stacks.insert(kind, after);
        }
        after - before
    }

    /// Removes `amount` stacks, or the whole stack when `amount` is `None`. Returns stacks removed.
    pub fn remove(&mut self, kind: StatusKind, amount: Option<i64>) -> i64 {
        match amount {
            Some(n) => -self.add(kind, -n.max(0)),
            None => self.stacks.remove(&kind).unwrap_or(0),
        }
    }

    /// Removes up to `amount` stacks from one uniformly chosen active status.
    ///
    /// Candidates are taken in [StatusKind] order so the pick depends only on the
    /// ledger contents and the battle RNG.
    pub fn remove_random(&mut self, rng: &mut Rng, amount: i64) -> Option<(StatusKind, i64)> {
        let active: Vec<StatusKind> = self.active().map(|(kind, _)| kind).collect();
        if active.is_empty() {
            return None;
        }
        let kind = active[rng.next_below(active.len())];
        let removed = self.remove(kind, Some(amount));
        Some((kind, removed))
    }

    /// Active statuses in kind order.
    pub fn active(&self) -> impl Iterator<Item = (StatusKind, i64)> + '_ {
        self.stacks.iter().map(|(kind, value)| (*kind, *value))
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_clamps_at_zero_and_reports_applied_delta() {
        let mut ledger = StatusLedger::new();
        assert_eq!(ledger.add(StatusKind::Poison, 3), 3);
        assert_eq!(ledger.add(StatusKind::Poison, -5), -3);
        assert_eq!(ledger.get(StatusKind::Poison), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn remove_without_amount_clears_the_stack() {
        let mut ledger = StatusLedger::new();
        ledger.add(StatusKind::Thorns, 4);
        assert_eq!(ledger.remove(StatusKind::Thorns, None), 4);
        assert!(!ledger.has(StatusKind::Thorns));
        assert_eq!(ledger.remove(StatusKind::Thorns, Some(2)), 0);
    }

    #[test]
    fn remove_random_is_reproducible_for_a_seed() {
        let build = || {
            let mut ledger = StatusLedger::new();
            ledger.add(StatusKind::Poison, 2);
            ledger.add(StatusKind::Acid, 2);
            ledger.add(StatusKind::Regen, 2);
            ledger
        };
        let mut a = build();
        let mut b = build();
        let mut rng_a = Rng::new(99);
        let mut rng_b = Rng::new(99);
        for _ in 0..6 {
            assert_eq!(a.remove_random(&mut rng_a, 1), b.remove_random(&mut rng_b, 1));
        }
        assert!(a.is_empty());
        assert_eq!(a.remove_random(&mut rng_a, 1), None);
    }

    #[test]
    fn every_kind_except_stun_has_an_upkeep_slot() {
        for kind in StatusKind::ALL {
            let scheduled =
                TURN_START_UPKEEP.contains(&kind) || TURN_END_UPKEEP.contains(&kind);
            assert_eq!(scheduled, kind.upkeep().is_some(), "{kind}");
        }
    }
}
