//! Simulator throughput benchmarks: battles per second and seed sweeps.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use heic_sim::combat::{simulate, Build, SimulationOptions, StatOverrides};
use heic_sim::parallel::{run_seed_sweep, run_seed_sweep_serial, seed_range};
use heic_sim::Database;

fn bench_db() -> Database {
    Database::from_json_str(include_str!("../tests/fixtures/database.json"))
        .unwrap_or_default()
}

fn knight() -> Build {
    Build::named("Knight")
        .with_stats(StatOverrides {
            hp: Some(60),
            attack: Some(2),
            armor: None,
            speed: Some(2),
        })
        .with_weapon("weapons/venom_dagger")
        .with_item("items/thorn_mail")
        .with_item("items/holy_tome")
        .with_item("items/conductor_baton")
        .with_item("items/violin")
}

fn rogue() -> Build {
    Build::named("Rogue")
        .with_stats(StatOverrides {
            hp: Some(60),
            attack: Some(3),
            armor: Some(2),
            speed: Some(1),
        })
        .with_weapon("weapons/cutlass")
        .with_edge("upgrades/keen_edge")
        .with_item("items/bandage")
        .with_item("items/frost_charm")
        .with_item("items/buckler")
}

fn bench_simulator(c: &mut Criterion) {
    let db = bench_db();
    let (left, right) = (knight(), rogue());

    let mut group = c.benchmark_group("simulator");
    group.sample_size(100);
    group.throughput(Throughput::Elements(1));

    for max_turns in [3u32, 20, 100] {
        let options = SimulationOptions {
            max_turns,
            ..SimulationOptions::default()
        };
        group.bench_function(format!("battle_{max_turns}_turns"), |b| {
            b.iter_batched(
                || (left.clone(), right.clone()),
                |(l, r)| black_box(simulate(&l, &r, &db, &options)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let db = bench_db();
    let (left, right) = (knight(), rogue());
    let options = SimulationOptions::default();
    let seeds = seed_range(options.seed, 256);

    let mut group = c.benchmark_group("seed_sweep");
    group.sample_size(20);
    group.throughput(Throughput::Elements(seeds.len() as u64));

    group.bench_function("serial", |b| {
        b.iter(|| black_box(run_seed_sweep_serial(&left, &right, &db, &options, &seeds)))
    });
    group.bench_function("parallel", |b| {
        b.iter(|| black_box(run_seed_sweep(&left, &right, &db, &options, &seeds)))
    });
    group.finish();
}

criterion_group!(benches, bench_simulator, bench_sweep);
criterion_main!(benches);
