//! Named countdown timers that fire an action list on expiry.

use crate::effects::ActionDescriptor;

#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    pub name: String,
    pub turns_remaining: u32,
    /// Length used when a repeating countdown re-arms.
    pub turns: u32,
    /// Name of the entity that registered the countdown.
    pub source: String,
    pub repeat: bool,
    pub on_expire: Vec<ActionDescriptor>,
}

impl Countdown {
    pub fn new(name: &str, turns: u32, source: &str, on_expire: Vec<ActionDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            turns_remaining: turns,
            turns,
            source: source.to_string(),
            repeat: false,
            on_expire,
        }
    }

    pub fn repeating(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }
}

/// Decrements every countdown by `by` turns and returns those that expired,
/// in registration order. One-shot countdowns are removed; repeating ones are
/// re-armed in place and a copy is returned for firing.
pub fn tick(countdowns: &mut Vec<Countdown>, by: u32) -> Vec<Countdown> {
    let mut expired = Vec::new();
    countdowns.retain_mut(|countdown| {
        countdown.turns_remaining = countdown.turns_remaining.saturating_sub(by);
        if countdown.turns_remaining > 0 {
            return true;
        }
        expired.push(countdown.clone());
        if countdown.repeat {
            countdown.turns_remaining = countdown.turns.max(1);
            true
        } else {
            false
        }
    });
    expired
}
