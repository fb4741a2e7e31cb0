use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::data::database::{resolve_data_dir, Database};
use crate::data::validate::{validate_catalogue_dir, ValidationSeverity};
use crate::data::{build, request};
use crate::model::damage::{calculate_edv_from_gear_lookup, gear_skill_map};
use crate::optimizer::report::{build_report, search_report, ReportInputs};
use crate::optimizer::{run_search, SearchOptions, DEFAULT_BATCHES};

#[derive(Debug, Parser)]
#[command(name = "smithy", about = "Equipment build search and damage evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Find the highest-EFR build satisfying a search request.
    Search(SearchArgs),
    /// Evaluate one concrete build.
    Evaluate(EvaluateArgs),
    /// Load and cross-check a catalogue directory.
    Validate(ValidateArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SearchArgs {
    /// Search request (JSON, or YAML with a .yaml/.yml extension).
    pub request: PathBuf,
    /// Catalogue directory; defaults to $SMITHY_DATA_DIR, then ./data.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Evaluate armour sets on all workers.
    #[arg(long)]
    pub parallel: bool,
    /// Worker threads (0 = one per core).
    #[arg(long, default_value_t = 0)]
    pub workers: usize,
    /// Armour-set batches between weapon re-filters in parallel mode.
    #[arg(long, default_value_t = DEFAULT_BATCHES)]
    pub batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct EvaluateArgs {
    /// Build document (JSON).
    pub build: PathBuf,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ValidateArgs {
    /// Catalogue directory; defaults to $SMITHY_DATA_DIR, then ./data.
    pub dir: Option<PathBuf>,
}

/// Parse arguments (including the program name). `Err` carries the exit code.
pub fn parse_command(args: &[String]) -> Result<Command, i32> {
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli.command),
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
            let _ = err.print();
            if code == 2 {
                eprintln!("usage: smithy <search|evaluate|validate>");
            }
            Err(code)
        }
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Ok(Command::Search(args)) => handle_search(&args),
        Ok(Command::Evaluate(args)) => handle_evaluate(&args),
        Ok(Command::Validate(args)) => handle_validate(&args),
        Err(code) => code,
    }
}

fn load_database(data_dir: Option<&Path>) -> Option<Arc<Database>> {
    let dir = resolve_data_dir(data_dir);
    match Database::load_from_dir(&dir) {
        Ok(db) => Some(db),
        Err(err) => {
            eprintln!("failed to load catalogue from {}: {err}", dir.display());
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T, what: &str) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize {what}: {err}");
            1
        }
    }
}

fn handle_search(args: &SearchArgs) -> i32 {
    let Some(db) = load_database(args.data_dir.as_deref()) else {
        return 1;
    };
    let params = match request::read_file(&db, &args.request) {
        Ok(params) => params,
        Err(err) => {
            eprintln!("invalid search request {}: {err}", args.request.display());
            return 1;
        }
    };
    let options = SearchOptions {
        parallel: args.parallel,
        workers: args.workers,
        batches: args.batches,
    };

    let outcome = match run_search(&db, &params, &options) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("search failed: {err}");
            return 1;
        }
    };
    let Some(best) = outcome.best.as_ref() else {
        eprintln!("no build satisfies the request");
        return 1;
    };
    let report = search_report(&db, best, &params.misc_buffs, &params.damage_model, outcome.stats.clone());
    print_json(&report, "search result")
}

fn handle_evaluate(args: &EvaluateArgs) -> i32 {
    let Some(db) = load_database(args.data_dir.as_deref()) else {
        return 1;
    };
    let build = match build::read_file(&db, &args.build) {
        Ok(build) => build,
        Err(err) => {
            eprintln!("invalid build {}: {err}", args.build.display());
            return 1;
        }
    };
    let edv = calculate_edv_from_gear_lookup(
        &db,
        &build.weapon,
        &build.armour,
        &build.decorations,
        &build.misc_buffs,
        &build.skill_spec,
    );
    let skills = gear_skill_map(&db, &build.weapon.calculate_contribution(), &build.armour, &build.decorations);
    info!(efr = edv.efr, efes = edv.efes, "build evaluated");
    let report = build_report(
        &db,
        ReportInputs {
            weapon: &build.weapon,
            armour: &build.armour,
            decorations: &build.decorations,
            misc_buffs: &build.misc_buffs,
            skills: &skills,
            edv: &edv,
            damage_model: build.damage_model.as_ref(),
        },
    );
    print_json(&report, "evaluation")
}

fn handle_validate(args: &ValidateArgs) -> i32 {
    let dir = resolve_data_dir(args.dir.as_deref());
    let report = validate_catalogue_dir(&dir);
    for diagnostic in &report.diagnostics {
        eprintln!("- {diagnostic}");
    }
    if report.has_errors() {
        eprintln!(
            "validation failed: {} error(s)",
            report.count(ValidationSeverity::Error)
        );
        1
    } else {
        println!(
            "validation passed: {} ({} warning(s))",
            dir.display(),
            report.count(ValidationSeverity::Warning)
        );
        0
    }
}
