use std::path::PathBuf;

use crate::combat::{compute_active_sets, simulate, write_sweep_csv};
use crate::config::{load_battle_file, BattleFile, RuntimeConfig};
use crate::data::{load_database, validate_database, Database};
use crate::parallel::{run_seed_sweep, seed_range};

const USAGE: &str = "usage: heic_sim <simulate|sweep|validate|sets>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Sweep,
    Validate,
    Sets,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("simulate") => Some(Command::Simulate),
        Some("sweep") => Some(Command::Sweep),
        Some("validate") => Some(Command::Validate),
        Some("sets") => Some(Command::Sets),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let config = RuntimeConfig::from_env();
    match parse_command(args) {
        Some(Command::Simulate) => handle_simulate(args, &config),
        Some(Command::Sweep) => handle_sweep(args, &config),
        Some(Command::Validate) => handle_validate(args, &config),
        Some(Command::Sets) => handle_sets(args, &config),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

/// Value following `--name`, if any.
fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == name)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}

/// Positional arguments after the subcommand, skipping flags and their values.
fn positionals(args: &[String]) -> Vec<&str> {
    const VALUE_FLAGS: [&str; 2] = ["--database", "--csv"];
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args.iter().skip(2) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn open_database(args: &[String], config: &RuntimeConfig) -> Option<Database> {
    let path = flag_value(args, "--database")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.database_path.clone());
    match load_database(&path) {
        Ok(db) => Some(db),
        Err(err) => {
            eprintln!("failed to load database '{}': {err}", path.display());
            None
        }
    }
}

fn open_battle(path: &str) -> Option<BattleFile> {
    match load_battle_file(path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("failed to load battle file '{path}': {err}");
            None
        }
    }
}

fn handle_simulate(args: &[String], config: &RuntimeConfig) -> i32 {
    let Some(&battle_path) = positionals(args).first() else {
        eprintln!("usage: heic_sim simulate <battle-file> [--database <path>] [--summary] [--text]");
        return 2;
    };
    let Some(battle) = open_battle(battle_path) else {
        return 1;
    };
    let Some(db) = open_database(args, config) else {
        return 1;
    };

    let mut options = battle.resolved_options(config);
    if has_flag(args, "--summary") {
        options.include_summary = true;
    }
    let result = match simulate(&battle.left, &battle.right, &db, &options) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };

    if has_flag(args, "--text") {
        for line in &result.log {
            println!("{line}");
        }
        println!("result: {} after {} rounds", result.result.as_str(), result.rounds);
        return 0;
    }
    match serde_json::to_string_pretty(&result) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize simulation result: {err}");
            1
        }
    }
}

fn handle_sweep(args: &[String], config: &RuntimeConfig) -> i32 {
    let positional = positionals(args);
    let (Some(&battle_path), Some(&raw_count)) = (positional.first(), positional.get(1)) else {
        eprintln!("usage: heic_sim sweep <battle-file> <count> [--database <path>] [--csv <out>]");
        return 2;
    };
    let Ok(count) = raw_count.parse::<usize>() else {
        eprintln!("invalid count '{raw_count}'");
        return 2;
    };
    let Some(battle) = open_battle(battle_path) else {
        return 1;
    };
    let Some(db) = open_database(args, config) else {
        return 1;
    };

    let options = battle.resolved_options(config);
    let seeds = seed_range(options.seed, count);
    let report = match run_seed_sweep(&battle.left, &battle.right, &db, &options, &seeds) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("sweep failed: {err}");
            return 1;
        }
    };

    if let Some(out) = flag_value(args, "--csv") {
        if let Err(err) = write_sweep_csv(out, &report.rows) {
            eprintln!("failed to write csv '{out}': {err}");
            return 1;
        }
        tracing::info!(path = out, rows = report.rows.len(), "wrote sweep csv");
    }
    match serde_json::to_string_pretty(&report.summary) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize sweep summary: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String], config: &RuntimeConfig) -> i32 {
    let path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.database_path.clone());
    let db = match load_database(&path) {
        Ok(db) => db,
        Err(err) => {
            eprintln!("validation failed: {err}");
            return 1;
        }
    };

    let report = validate_database(&db);
    for diagnostic in &report.diagnostics {
        eprintln!("- {diagnostic}");
    }
    if report.has_errors() {
        eprintln!("validation failed: {} issue(s)", report.diagnostics.len());
        1
    } else {
        println!(
            "validation passed: {} ({} entities)",
            path.display(),
            db.len()
        );
        0
    }
}

fn handle_sets(args: &[String], config: &RuntimeConfig) -> i32 {
    let slugs = positionals(args);
    if slugs.is_empty() {
        eprintln!("usage: heic_sim sets <slug>... [--database <path>]");
        return 2;
    }
    let Some(db) = open_database(args, config) else {
        return 1;
    };
    match compute_active_sets(&slugs, &db) {
        Ok(active) => match serde_json::to_string_pretty(&active) {
            Ok(payload) => {
                println!("{payload}");
                0
            }
            Err(err) => {
                eprintln!("failed to serialize sets: {err}");
                1
            }
        },
        Err(err) => {
            eprintln!("set lookup failed: {err}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command(&args(&["bin", "sweep"])), Some(Command::Sweep));
        assert_eq!(parse_command(&args(&["bin", "serve"])), None);
        assert_eq!(parse_command(&args(&["bin"])), None);
    }

    #[test]
    fn positionals_skip_flags_and_their_values() {
        let a = args(&["bin", "sweep", "--database", "db.json", "battle.yaml", "--csv", "out.csv", "20"]);
        assert_eq!(positionals(&a), vec!["battle.yaml", "20"]);
        assert_eq!(flag_value(&a, "--csv"), Some("out.csv"));
        assert!(!has_flag(&a, "--summary"));
    }
}
