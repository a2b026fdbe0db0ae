use std::fmt;

use serde::{Deserialize, Serialize};

/// Named event points at which equipped entities' effects may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    PreBattle,
    BattleStart,
    TurnStart,
    TurnEnd,
    OnHit,
    OnStruck,
    OnExposed,
    OnWounded,
    Symphony,
    Countdown,
    /// Lost armor or health to a strike, thorns or a damage action.
    OnDamaged,
    /// Raised on the attacker once a strike and its reactions are resolved.
    AfterStrike,
    /// Restored at least 1 health.
    OnHeal,
    OnGainArmor,
    OnGainStatus,
    /// Took poison damage during upkeep.
    OnPoisonTick,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 16] = [
        Self::PreBattle,
        Self::BattleStart,
        Self::TurnStart,
        Self::TurnEnd,
        Self::OnHit,
        Self::OnStruck,
        Self::OnExposed,
        Self::OnWounded,
        Self::Symphony,
        Self::Countdown,
        Self::OnDamaged,
        Self::AfterStrike,
        Self::OnHeal,
        Self::OnGainArmor,
        Self::OnGainStatus,
        Self::OnPoisonTick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreBattle => "preBattle",
            Self::BattleStart => "battleStart",
            Self::TurnStart => "turnStart",
            Self::TurnEnd => "turnEnd",
            Self::OnHit => "onHit",
            Self::OnStruck => "onStruck",
            Self::OnExposed => "onExposed",
            Self::OnWounded => "onWounded",
            Self::Symphony => "symphony",
            Self::Countdown => "countdown",
            Self::OnDamaged => "onDamaged",
            Self::AfterStrike => "afterStrike",
            Self::OnHeal => "onHeal",
            Self::OnGainArmor => "onGainArmor",
            Self::OnGainStatus => "onGainStatus",
            Self::OnPoisonTick => "onPoisonTick",
        }
    }

    /// Tag an entity must carry to respond to this event. `None` means every
    /// equipped entity is eligible.
    pub fn required_tag(&self) -> Option<&'static str> {
        match self {
            Self::Symphony => Some(SYMPHONY_TAG),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const SYMPHONY_TAG: &str = "Symphony";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_names_round_trip_through_serde() {
        for trigger in TriggerKind::ALL {
            let json = serde_json::to_string(&trigger).unwrap();
            assert_eq!(json, format!("\"{}\"", trigger.as_str()));
            let back: TriggerKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, trigger);
        }
    }

    #[test]
    fn state_change_triggers_use_their_data_names() {
        let parsed: Vec<TriggerKind> = serde_json::from_str(
            r#"["onDamaged", "afterStrike", "onHeal", "onGainArmor", "onGainStatus", "onPoisonTick"]"#,
        )
        .unwrap();
        assert_eq!(parsed, TriggerKind::ALL[10..].to_vec());
    }

    #[test]
    fn unknown_trigger_is_rejected() {
        assert!(serde_json::from_str::<TriggerKind>("\"onSneeze\"").is_err());
    }

    #[test]
    fn only_symphony_is_tag_scoped() {
        assert_eq!(TriggerKind::Symphony.required_tag(), Some("Symphony"));
        assert_eq!(TriggerKind::OnHit.required_tag(), None);
    }
}
