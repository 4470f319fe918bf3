use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use daybook_core::{Normalizer, TracingSink};
use daybook_ingest::{DateRange, TransactionSource};
use daybook_sheets::{GoogleSheetsStore, MemorySheet, format_batch};
use std::path::PathBuf;
use tracing::info;

mod auth;
mod config;
mod logging;
mod pipeline;
mod state;

use config::Config;
use pipeline::{Pipeline, Response};

#[derive(Parser, Debug)]
#[command(
    name = "daybook",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DAYBOOK_BUILD_SHA"), ")"),
    about = "Append the day's bank operations to a shared spreadsheet"
)]
struct Cli {
    /// Config file (default: ~/.daybook/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logs on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one day's operations and append them to the sheet
    Run {
        /// Day to fetch, YYYY-MM-DD (default: today in the configured timezone)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Read operations from this export file instead of the configured source
        #[arg(long)]
        input: Option<PathBuf>,

        /// Append to an in-memory sheet and print the rows instead of writing
        #[arg(long)]
        dry_run: bool,

        /// Rows already present in the in-memory sheet (with --dry-run)
        #[arg(long, default_value_t = 0, requires = "dry_run")]
        existing_rows: usize,
    },

    /// Print the rows an export file would produce, without touching any sheet
    Preview {
        #[arg(long)]
        input: PathBuf,

        /// Sheet row the first operation would land on
        #[arg(long, default_value_t = 2)]
        start_row: u32,

        /// Only keep operations of this day (default: keep everything)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,

    /// Print the effective config (file + environment)
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: {e:#}");
    }

    let result = match cli.command {
        Command::Run {
            date,
            input,
            dry_run,
            existing_rows,
        } => {
            let result = run(cli.config, date, input, dry_run, existing_rows).await;
            respond(&result);
            result.map(|_| ())
        }
        Command::Preview {
            input,
            start_row,
            date,
        } => preview(cli.config, input, start_row, date).await,
        Command::Config { command } => config_command(cli.config, command),
    };

    if let Err(e) = result {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

/// Print the trigger's JSON envelope on stdout.
fn respond(result: &Result<usize>) {
    let response = match result {
        Ok(rows) => Response::success(*rows),
        Err(e) => Response::error(e),
    };
    match serde_json::to_string(&response) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error: {e}"),
    }
}

fn load(config: Option<PathBuf>) -> Result<Config> {
    let mut cfg = config::load_config(config.as_deref())?;
    cfg.apply_env(|k| std::env::var(k).ok());
    Ok(cfg)
}

async fn run(
    config: Option<PathBuf>,
    date: Option<NaiveDate>,
    input: Option<PathBuf>,
    dry_run: bool,
    existing_rows: usize,
) -> Result<usize> {
    let cfg = load(config).context("loading config")?;
    let day = match date {
        Some(d) => d,
        None => Utc::now().with_timezone(&cfg.timezone()?).date_naive(),
    };
    let range = DateRange::day(day);

    let source = cfg.source(input.as_deref())?;
    info!(source = %source.describe(), %day, formulas_version = cfg.formulas.version, "starting run");

    let normalizer = Normalizer::new(cfg.date_formats()?);
    let pipeline = Pipeline {
        normalizer: &normalizer,
        formulas: &cfg.formulas,
        events: &TracingSink,
    };

    if dry_run {
        let sheet = MemorySheet::with_rows(existing_rows);
        let rows = pipeline.run(&source, &sheet, range).await?;
        for row in sheet.rows().iter().skip(existing_rows) {
            eprintln!("{}", serde_json::to_string(row)?);
        }
        return Ok(rows);
    }

    let spreadsheet_id = cfg.spreadsheet_id()?;
    let sheet_name = cfg.sheet_name()?;
    let token = auth::google_access_token().await?;
    let store = GoogleSheetsStore::new(spreadsheet_id, sheet_name, token)?;

    Ok(pipeline.run(&source, &store, range).await?)
}

async fn preview(
    config: Option<PathBuf>,
    input: PathBuf,
    start_row: u32,
    date: Option<NaiveDate>,
) -> Result<()> {
    let cfg = load(config)?;
    let source = cfg.source(Some(&input))?;
    let range = match date {
        Some(d) => DateRange::day(d),
        None => DateRange::new(NaiveDate::MIN, NaiveDate::MAX)?,
    };
    let raws = source
        .fetch(range)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let txns = Normalizer::new(cfg.date_formats()?).normalize(&raws, &TracingSink)?;
    let batch = format_batch(&txns, start_row, &cfg.formulas)?;
    println!("{}", serde_json::to_string_pretty(&batch.values())?);
    if !batch.is_empty() {
        info!(start_row = batch.start_row(), end_row = batch.end_row(), "preview rows");
    }
    Ok(())
}

fn config_command(config: Option<PathBuf>, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init => config::init_config(config.as_deref()),
        ConfigCommand::Show => {
            let cfg = load(config)?.redacted();
            print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_carries_build_sha() {
        let sha = env!("DAYBOOK_BUILD_SHA");
        assert!(!sha.is_empty());
        let cmd = Cli::command();
        let version = cmd.get_version().unwrap();
        assert!(version.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(version.ends_with(&format!("({sha})")));
    }

    #[test]
    fn test_existing_rows_requires_dry_run() {
        assert!(Cli::try_parse_from(["daybook", "run", "--existing-rows", "5"]).is_err());
        let cli = Cli::try_parse_from(["daybook", "run", "--dry-run", "--existing-rows", "5"]).unwrap();
        assert!(matches!(cli.command, Command::Run { dry_run: true, existing_rows: 5, .. }));
    }
}
