//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Name of the environment variable holding the GitHub token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// AgentCommits - track public GitHub commits made by AI coding agents
///
/// Collects daily commit counts from the GitHub search API and renders
/// a chart plus a monthly trend table.
///
/// Examples:
///   agentcommits collect 2026-02-14
///   agentcommits collect 2026-02-01 2026-02-14
///   agentcommits collect 2026-02-01 2026-02-14 --dry-run
///   agentcommits report
///   agentcommits --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .agentcommits.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .agentcommits.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect daily counts for one date or an inclusive date range
    Collect(CollectArgs),
    /// Render the chart and trend table from all collected records
    Report(ReportArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct CollectArgs {
    /// First date to collect (YYYY-MM-DD, UTC)
    #[arg(value_name = "START", value_parser = parse_date)]
    pub start: NaiveDate,

    /// Last date to collect, inclusive (defaults to START)
    #[arg(value_name = "END", value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// GitHub token used for the search API
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Record store directory
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Requests per minute to pace to (0 disables pacing)
    #[arg(long, value_name = "RPM")]
    pub requests_per_minute: Option<u32>,

    /// Skip dates that already have a record file
    #[arg(long)]
    pub skip_existing: bool,

    /// Print the queries that would be issued without calling the API
    #[arg(long)]
    pub dry_run: bool,
}

impl CollectArgs {
    /// The last date of the range.
    pub fn end_date(&self) -> NaiveDate {
        self.end.unwrap_or(self.start)
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// Record store directory
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Output path of the chart image
    #[arg(long, value_name = "FILE")]
    pub chart: Option<PathBuf>,

    /// Markdown document to update
    #[arg(long, value_name = "FILE")]
    pub document: Option<PathBuf>,
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            None => Err("Missing command: use `collect <START> [END]` or `report`".to_string()),
            Some(Command::Collect(collect)) => {
                if collect.end_date() < collect.start {
                    return Err(format!(
                        "End date {} is before start date {}",
                        collect.end_date(),
                        collect.start
                    ));
                }

                // Dry runs never touch the API
                if !collect.dry_run && collect.token.as_deref().map_or(true, |t| t.trim().is_empty())
                {
                    return Err(format!(
                        "{} environment variable is not set (required by collect)",
                        TOKEN_ENV
                    ));
                }

                Ok(())
            }
            Some(Command::Report(_)) => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn collect_args(start: &str, end: Option<&str>) -> Args {
        Args {
            command: Some(Command::Collect(CollectArgs {
                start: date(start),
                end: end.map(date),
                token: Some("ghp_test".to_string()),
                store: None,
                requests_per_minute: None,
                skip_existing: false,
                dry_run: false,
            })),
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    fn collect_mut(args: &mut Args) -> &mut CollectArgs {
        match args.command.as_mut() {
            Some(Command::Collect(collect)) => collect,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_single_date_is_one_day_range() {
        let args = collect_args("2026-02-14", None);
        assert!(args.validate().is_ok());
        match args.command {
            Some(Command::Collect(c)) => assert_eq!(c.end_date(), c.start),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let args = collect_args("2026-02-14", Some("2026-02-01"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let mut args = collect_args("2026-02-14", None);
        collect_mut(&mut args).token = None;
        let err = args.validate().unwrap_err();
        assert!(err.contains(TOKEN_ENV));

        collect_mut(&mut args).token = Some("  ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_dry_run_needs_no_token() {
        let mut args = collect_args("2026-02-14", None);
        let collect = collect_mut(&mut args);
        collect.token = None;
        collect.dry_run = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_missing_command_is_rejected() {
        let mut args = collect_args("2026-02-14", None);
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(date("2026-02-14").to_string(), "2026-02-14");
        assert!(parse_date("2026-2-30").is_err());
        assert!(parse_date("14/02/2026").is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let args = Args::try_parse_from([
            "agentcommits",
            "collect",
            "2026-02-01",
            "2026-02-03",
            "--token",
            "abc",
        ])
        .unwrap();
        match args.command {
            Some(Command::Collect(c)) => {
                assert_eq!(c.start, date("2026-02-01"));
                assert_eq!(c.end, Some(date("2026-02-03")));
            }
            _ => panic!("expected collect"),
        }

        assert!(Args::try_parse_from(["agentcommits", "collect"]).is_err());
        assert!(Args::try_parse_from(["agentcommits", "report", "extra"]).is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = collect_args("2026-02-14", None);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
