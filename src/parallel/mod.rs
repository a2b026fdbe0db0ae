pub mod batch;
pub mod pool;

pub use batch::{
    batch_ranges, run_seed_sweep, run_seed_sweep_in, run_seed_sweep_serial, seed_range,
    SweepReport, SweepRow, SweepSummary,
};
pub use pool::WorkerPool;
