//! Seed sweeps: the same matchup run under many seeds, distributed with rayon.
//!
//! Every battle is independent and deterministic, so the rows come back in
//! seed order regardless of scheduling.

use rayon::prelude::*;
use serde::Serialize;

use crate::combat::{simulate, Build, Outcome, SimulationOptions};
use crate::data::Database;
use crate::error::Result;
use crate::parallel::pool::WorkerPool;

pub const PROGRESS_BATCHES: usize = 10;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use heic_sim::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// `count` consecutive seeds starting at `base` (wrapping).
pub fn seed_range(base: u64, count: usize) -> Vec<u64> {
    (0..count as u64).map(|i| base.wrapping_add(i)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepRow {
    pub seed: u64,
    pub result: Outcome,
    pub rounds: u32,
    pub hp_left: i64,
    pub hp_right: i64,
    pub log_lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub battles: usize,
    pub left_wins: usize,
    pub right_wins: usize,
    pub draws: usize,
    pub timeouts: usize,
    pub average_rounds: f64,
}

impl SweepSummary {
    pub fn from_rows(rows: &[SweepRow]) -> Self {
        let mut summary = Self {
            battles: rows.len(),
            ..Self::default()
        };
        for row in rows {
            match row.result {
                Outcome::Left => summary.left_wins += 1,
                Outcome::Right => summary.right_wins += 1,
                Outcome::Draw => summary.draws += 1,
                Outcome::Timeout => summary.timeouts += 1,
            }
        }
        if !rows.is_empty() {
            let total: u64 = rows.iter().map(|row| u64::from(row.rounds)).sum();
            summary.average_rounds = total as f64 / rows.len() as f64;
        }
        summary
    }

    pub fn left_win_rate(&self) -> f64 {
        if self.battles == 0 {
            0.0
        } else {
            self.left_wins as f64 / self.battles as f64
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub summary: SweepSummary,
    pub rows: Vec<SweepRow>,
}

fn run_one(
    left: &Build,
    right: &Build,
    db: &Database,
    options: &SimulationOptions,
    seed: u64,
) -> Result<SweepRow> {
    let per_seed = SimulationOptions {
        seed,
        include_summary: true,
        trace_mode: crate::combat::TraceMode::Off,
        ..*options
    };
    let result = simulate(left, right, db, &per_seed)?;
    let (hp_left, hp_right) = result
        .summary
        .as_ref()
        .map(|s| (s.left.hp, s.right.hp))
        .unwrap_or_default();
    Ok(SweepRow {
        seed,
        result: result.result,
        rounds: result.rounds,
        hp_left,
        hp_right,
        log_lines: result.log.len(),
    })
}

/// Runs one battle per seed on the current rayon pool, reporting progress
/// after each of up to [PROGRESS_BATCHES] batches.
pub fn run_seed_sweep(
    left: &Build,
    right: &Build,
    db: &Database,
    options: &SimulationOptions,
    seeds: &[u64],
) -> Result<SweepReport> {
    let mut rows = Vec::with_capacity(seeds.len());
    for (start, end) in batch_ranges(seeds.len(), PROGRESS_BATCHES) {
        let batch = seeds[start..end]
            .par_iter()
            .map(|&seed| run_one(left, right, db, options, seed))
            .collect::<Result<Vec<_>>>()?;
        rows.extend(batch);
        tracing::debug!(done = end, total = seeds.len(), "seed sweep progress");
    }
    Ok(SweepReport {
        summary: SweepSummary::from_rows(&rows),
        rows,
    })
}

/// [run_seed_sweep] inside [WorkerPool::install].
pub fn run_seed_sweep_in(
    pool: &WorkerPool,
    left: &Build,
    right: &Build,
    db: &Database,
    options: &SimulationOptions,
    seeds: &[u64],
) -> Result<SweepReport> {
    pool.install(|| run_seed_sweep(left, right, db, options, seeds))?
}

/// Sequential reference used to check the parallel path.
pub fn run_seed_sweep_serial(
    left: &Build,
    right: &Build,
    db: &Database,
    options: &SimulationOptions,
    seeds: &[u64],
) -> Result<SweepReport> {
    let rows = seeds
        .iter()
        .map(|&seed| run_one(left, right, db, options, seed))
        .collect::<Result<Vec<_>>>()?;
    Ok(SweepReport {
        summary: SweepSummary::from_rows(&rows),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::StatOverrides;

    #[test]
    fn batch_ranges_even_split() {
        let r = batch_ranges(100, 4);
        assert_eq!(r, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
    }

    #[test]
    fn batch_ranges_with_remainder() {
        let r = batch_ranges(10, 3);
        assert_eq!(r, vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn batch_ranges_empty() {
        assert!(batch_ranges(0, 5).is_empty());
        assert!(batch_ranges(10, 0).is_empty());
    }

    #[test]
    fn seed_range_wraps() {
        assert_eq!(seed_range(u64::MAX, 2), vec![u64::MAX, 0]);
    }

    #[test]
    fn parallel_sweep_matches_serial_in_seed_order() {
        let db = Database::default();
        let stats = StatOverrides {
            hp: Some(12),
            attack: Some(3),
            armor: Some(1),
            speed: Some(1),
        };
        let left = Build::named("A").with_stats(stats);
        let right = Build::named("B").with_stats(stats);
        let seeds = seed_range(10, 16);
        let options = SimulationOptions::default();

        let parallel = run_seed_sweep(&left, &right, &db, &options, &seeds).unwrap();
        let serial = run_seed_sweep_serial(&left, &right, &db, &options, &seeds).unwrap();
        assert_eq!(parallel.rows, serial.rows);
        assert_eq!(parallel.summary.battles, 16);
        assert_eq!(parallel.rows[0].seed, 10);
    }

    #[test]
    fn summary_counts_outcomes() {
        let row = |result, rounds| SweepRow {
            seed: 0,
            result,
            rounds,
            hp_left: 0,
            hp_right: 0,
            log_lines: 0,
        };
        let summary = SweepSummary::from_rows(&[
            row(Outcome::Left, 2),
            row(Outcome::Left, 4),
            row(Outcome::Timeout, 6),
            row(Outcome::Draw, 4),
        ]);
        assert_eq!(summary.left_wins, 2);
        assert_eq!(summary.timeouts, 1);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.average_rounds, 4.0);
        assert_eq!(summary.left_win_rate(), 0.5);
    }
}
