//! CSV export of seed-sweep results, one row per battle.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::parallel::SweepRow;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    seed: u64,
    result: &'a str,
    rounds: u32,
    hp_left: i64,
    hp_right: i64,
    log_lines: usize,
}

/// Writes `rows` with a header line to any writer.
pub fn write_sweep_csv_to<W: Write>(writer: W, rows: &[SweepRow]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(CsvRow {
            seed: row.seed,
            result: row.result.as_str(),
            rounds: row.rounds,
            hp_left: row.hp_left,
            hp_right: row.hp_right,
            log_lines: row.log_lines,
        })?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_sweep_csv(path: impl AsRef<Path>, rows: &[SweepRow]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_sweep_csv_to(file, rows)
}
