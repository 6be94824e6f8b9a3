//! # Niaga Command-Line Tool
//!
//! Evaluates documents and tax modes from the shell.
//!
//! ## Usage
//! ```bash
//! # Totals breakdown of a document payload
//! cargo run -p niaga-engine --bin niaga -- totals ./order.json
//!
//! # Tax on a base amount
//! cargo run -p niaga-engine --bin niaga -- tax ppn_11_inclusive 111000
//!
//! # Effective configuration
//! cargo run -p niaga-engine --bin niaga -- --config ./niaga.toml config
//! ```
//!
//! Output is JSON (TOML for `config`) on stdout. Failures print an
//! `ApiError` as JSON on stderr and exit with status 1.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use niaga_core::{resolve_tax, Money, TaxMode};
use niaga_engine::{init_tracing, ApiError, DocumentInput, EngineConfig, EngineError, EngineResult};

const USAGE: &str = "\
Niaga Document Pricing Tool

Usage: niaga [OPTIONS] <COMMAND>

Commands:
  totals <FILE>          Print the totals breakdown of a document JSON file
  tax <MODE> <AMOUNT>    Print the tax resolution of an amount
  config                 Print the effective configuration as TOML

Options:
  -c, --config <PATH>    Config file path (default: platform config dir)
  -h, --help             Show this help message

Tax modes: none, non_pkp, ppn_11_inclusive, ppn_11_exclusive,
           ppn_12_inclusive, ppn_12_exclusive";

enum Command {
    Totals(PathBuf),
    Tax(String, String),
    Config,
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                return ExitCode::SUCCESS;
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        [cmd, file] if cmd == "totals" => Command::Totals(PathBuf::from(file)),
        [cmd, mode, amount] if cmd == "tax" => Command::Tax(mode.clone(), amount.clone()),
        [cmd] if cmd == "config" => Command::Config,
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let config = EngineConfig::load_or_default(config_path);

    match run(command, &config) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let api = ApiError::from(err);
            match serde_json::to_string_pretty(&api) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", api),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &EngineConfig) -> EngineResult<String> {
    match command {
        Command::Totals(path) => {
            let contents = std::fs::read_to_string(&path)?;
            let input = DocumentInput::from_json(&contents)?;
            input.validate()?;
            let totals = input.totals(config.pricing.default_tax_mode)?;
            Ok(serde_json::to_string_pretty(&totals)?)
        }
        Command::Tax(mode, amount) => {
            let mode: TaxMode = mode.parse()?;
            let amount: i64 = amount.trim().parse().map_err(|_| {
                EngineError::from(niaga_core::ValidationError::InvalidFormat {
                    field: "amount".to_string(),
                    reason: "must be a whole number".to_string(),
                })
            })?;
            let resolution = resolve_tax(mode, Money::from_units(amount).non_negative());
            Ok(serde_json::to_string_pretty(&resolution)?)
        }
        Command::Config => Ok(toml::to_string_pretty(config)?),
    }
}
