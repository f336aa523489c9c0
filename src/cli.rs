use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum, error::ErrorKind};
use tracing::info;

use crate::config::StockConfig;
use crate::consumption::{Period, consumption_for_config};
use crate::data::Report;
use crate::dates::parse_iso_date;
use crate::errors::StockError;
use crate::ledger::current_quantities;
use crate::transport::fs::{read_config, read_reports};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PeriodArg {
    Week,
    Month,
}

impl From<PeriodArg> for Period {
    fn from(value: PeriodArg) -> Self {
        match value {
            PeriodArg::Week => Period::Week,
            PeriodArg::Month => Period::Month,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "stock-monitoring",
    disable_help_subcommand = true,
    about = "Stock ledger and consumption for stock monitoring deployments",
    long_about = "Replay submitted reports against a deployment configuration to compute current stock per item, or the quantity moved over the last three weeks or months.",
    after_help = "Set RUST_LOG=debug to trace checkpoint selection and replayed events."
)]
struct StockMonitoringCli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print current quantities, replayed from the last stock count.
    Ledger(InputArgs),
    /// Print per-item movement over the trailing window.
    Consumption(ConsumptionArgs),
    /// Report form identifiers shared by several workflows.
    CheckConfig(ConfigArg),
}

#[derive(Debug, Args)]
struct ConfigArg {
    #[arg(
        long,
        value_name = "PATH",
        help = "Deployment configuration file (JSON)"
    )]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct InputArgs {
    #[command(flatten)]
    config: ConfigArg,
    #[arg(
        long,
        value_name = "PATH",
        help = "Report dump: JSON array, {\"docs\": [...]}, or an _all_docs response with include_docs"
    )]
    reports: PathBuf,
    #[arg(
        long,
        help = "Refuse to run when the configuration reuses a form identifier across workflows"
    )]
    strict: bool,
}

#[derive(Debug, Args)]
struct ConsumptionArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(
        long,
        value_enum,
        default_value_t = PeriodArg::Week,
        help = "Period unit of the three-period window"
    )]
    period: PeriodArg,
    #[arg(
        long,
        value_name = "DATE",
        value_parser = parse_now_arg,
        help = "Reference instant (RFC 3339 or YYYY-MM-DD); defaults to the current time"
    )]
    now: Option<DateTime<Utc>>,
}

/// Run the command line with `args_iter` (program name excluded), writing results to stdout.
pub fn run<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_to(args_iter, &mut out)
}

/// Run the command line, writing results to `out`.
pub fn run_to<I, W>(args_iter: I, out: &mut W) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    W: Write,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let Some(cli) = parse_cli::<StockMonitoringCli, _>(
        std::iter::once("stock-monitoring".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    match cli.command {
        Command::Ledger(input) => {
            let (config, reports) = load_inputs(&input)?;
            let ledger = current_quantities(&config, &reports);
            if ledger.is_empty() {
                info!(
                    form = %config.features.stock_count_form(),
                    "no stock count among the reports; quantities are unknown"
                );
            }
            writeln!(out, "{}", serde_json::to_string_pretty(&ledger)?)?;
        }
        Command::Consumption(args) => {
            let (config, reports) = load_inputs(&args.input)?;
            let now = args.now.unwrap_or_else(Utc::now);
            let moved = consumption_for_config(&config, &reports, args.period.into(), now);
            writeln!(out, "{}", serde_json::to_string_pretty(&moved)?)?;
        }
        Command::CheckConfig(arg) => {
            let config = read_config(&arg.config)?;
            let collisions = config.collisions();
            if collisions.is_empty() {
                writeln!(out, "no form identifier collisions")?;
            }
            for collision in &collisions {
                writeln!(
                    out,
                    "form '{}' is used by: {}",
                    collision.form,
                    collision.workflow_list()
                )?;
            }
            if let Some(collision) = collisions.into_iter().next() {
                return Err(StockError::from(collision).into());
            }
        }
    }
    Ok(())
}

fn load_inputs(input: &InputArgs) -> Result<(StockConfig, Vec<Report>), StockError> {
    let config = read_config(&input.config.config)?;
    if input.strict {
        config.validate()?;
    }
    let reports = read_reports(&input.reports)?;
    Ok((config, reports))
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_now_arg(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_iso_date(raw).ok_or_else(|| {
        format!("invalid date '{}': expected RFC 3339 or YYYY-MM-DD", raw.trim())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_now_arg_accepts_dates_and_timestamps() {
        assert_eq!(
            parse_now_arg("2025-05-10").unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap()
        );
        assert!(parse_now_arg("2025-05-10T08:00:00Z").is_ok());
        assert!(parse_now_arg("tomorrow").is_err());
    }

    #[test]
    fn help_is_not_an_error() {
        let mut out = Vec::new();
        let result = run_to(["--help".to_string()].into_iter(), &mut out);
        assert!(result.is_ok());
        assert!(out.is_empty());
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        let mut out = Vec::new();
        assert!(run_to(std::iter::empty(), &mut out).is_err());
    }

    #[test]
    fn consumption_period_defaults_to_week() {
        let cli = StockMonitoringCli::try_parse_from([
            "stock-monitoring",
            "consumption",
            "--config",
            "c.json",
            "--reports",
            "r.json",
        ])
        .unwrap();
        let Command::Consumption(args) = cli.command else {
            panic!("expected consumption command");
        };
        assert_eq!(Period::from(args.period), Period::Week);
        assert!(args.now.is_none());
        assert!(!args.input.strict);
    }
}
