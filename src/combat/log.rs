//! Ordered battle log. Every line is mirrored to `tracing` at trace level;
//! diagnostics (recoverable data faults) are additionally raised as warnings.

#[derive(Debug, Clone, Default)]
pub struct BattleLog {
    lines: Vec<String>,
    round: u32,
    diagnostics: usize,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::trace!(round = self.round, "{line}");
        self.lines.push(line);
    }

    pub fn diagnostic(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::warn!(round = self.round, "{line}");
        self.diagnostics += 1;
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_land_in_the_same_sequence() {
        let mut log = BattleLog::new();
        log.push("-- Turn 1 --");
        log.diagnostic("unknown action: summon_dragon");
        log.push("Left hits Right for 2");
        assert_eq!(log.len(), 3);
        assert_eq!(log.diagnostic_count(), 1);
        assert_eq!(log.lines()[1], "unknown action: summon_dragon");
    }
}
