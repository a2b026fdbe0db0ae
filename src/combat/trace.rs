//! Structured per-action trace hook.

use serde::{Deserialize, Serialize};

use crate::combat::fighter::{Fighter, Side};
use crate::effects::{ActionKind, TriggerKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    #[default]
    Off,
    Events,
}

/// One executed action, as seen by observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTrace {
    pub round: u32,
    pub side: Side,
    pub actor: String,
    /// Entity (or countdown) the action came from.
    pub source: String,
    /// `None` when fired by a countdown expiring.
    pub trigger: Option<TriggerKind>,
    pub action: String,
    pub multiplier: i64,
    pub line: String,
}

impl ActionTrace {
    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::from_name(&self.action)
    }
}

pub trait BattleObserver {
    fn on_action(&mut self, trace: &ActionTrace);

    /// Called after every resolved step (an action, a strike, one side's
    /// status upkeep) with both fighters as they stand.
    fn on_step(&mut self, _left: &Fighter, _right: &Fighter) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BattleObserver for NoopObserver {
    fn on_action(&mut self, _trace: &ActionTrace) {}
}

#[derive(Debug, Clone, Default)]
pub struct TraceCollector {
    enabled: bool,
    events: Vec<ActionTrace>,
}

impl TraceCollector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    pub fn record(&mut self, trace: ActionTrace) {
        if self.enabled {
            self.events.push(trace);
        }
    }

    pub fn events(&self) -> &[ActionTrace] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ActionTrace> {
        self.events
    }
}

impl BattleObserver for TraceCollector {
    fn on_action(&mut self, trace: &ActionTrace) {
        self.record(trace.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ActionTrace {
        ActionTrace {
            round: 1,
            side: Side::Left,
            actor: "Left".to_string(),
            source: "Ruby Ring".to_string(),
            trigger: Some(TriggerKind::BattleStart),
            action: ActionKind::GainStat.as_str().to_string(),
            multiplier: 2,
            line: "Left gains 10 health (Ruby Ring)".to_string(),
        }
    }

    #[test]
    fn trace_collector_records_only_when_enabled() {
        let mut on = TraceCollector::new(true);
        on.on_action(&sample());
        assert_eq!(on.events().len(), 1);
        assert_eq!(on.events()[0].kind(), Some(ActionKind::GainStat));

        let mut off = TraceCollector::new(false);
        off.on_action(&sample());
        assert!(off.events().is_empty());
    }

    #[test]
    fn trace_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["trigger"], "battleStart");
        assert_eq!(json["side"], "left");
        assert_eq!(json["multiplier"], 2);
    }
}
