// src/cli.rs
use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT, RunConfig, parse_duration};
use crate::error::ConfigError;

/// certinfo: TLS certificate inspector
///
/// Reads host[:port] targets (one per line) from stdin or a file, fetches each
/// peer's leaf certificate, and optionally follows Subject Alternative Names
/// to discover more hosts.
#[derive(Parser, Debug, Clone)]
#[command(name = "certinfo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Input & Configuration =====
    /// File with targets, one per line (default: stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// File with root domains that recursive expansion may follow (one per line)
    #[arg(long = "scope")]
    pub scope: Option<PathBuf>,

    // ===== Scan =====
    /// Number of concurrent workers [default: 50]
    #[arg(short = 'c', long = "concurrency")]
    pub concurrency: Option<usize>,

    /// Connection timeout (e.g. 5s, 10m, 1h) [default: 15s]
    #[arg(short = 't', long = "timeout")]
    pub timeout: Option<String>,

    /// Recursively probe hosts discovered in certificate SANs
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    // ===== Output Format =====
    /// Output records as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Output records as CSV
    #[arg(long = "csv")]
    pub csv: bool,

    /// Print host with its SANs on one line
    #[arg(long = "san")]
    pub san: bool,

    /// Print host with its issue date on one line
    #[arg(long = "issued")]
    pub issued: bool,

    /// Print host with its expiration date on one line
    #[arg(long = "expires")]
    pub expires: bool,

    /// Only print certificates issued today (requires --issued)
    #[arg(long = "today")]
    pub today: bool,

    /// Write output to file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    // ===== Display & Statistics =====
    /// Print run statistics to stderr when finished
    #[arg(long = "stats")]
    pub stats: bool,

    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Report connection failures and debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// No banner, warnings and errors only
    #[arg(short = 's', long = "silent")]
    pub silent: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.json && self.csv {
            return Err(ConfigError::IncompatibleFlags(
                "Cannot specify both --json and --csv".to_string(),
            ));
        }

        if self.today && (!self.issued || self.san || self.expires || self.json || self.csv) {
            return Err(ConfigError::IncompatibleFlags(
                "--today can only be used with --issued and no other output flags".to_string(),
            ));
        }

        if self.verbose && self.silent {
            return Err(ConfigError::IncompatibleFlags(
                "Cannot specify both --verbose and --silent".to_string(),
            ));
        }

        Ok(())
    }

    /// Determine the output format based on flags
    ///
    /// Summary selections take precedence over --json/--csv.
    pub fn output_format(&self) -> OutputFormat {
        if self.san || self.issued || self.expires {
            OutputFormat::Summary
        } else if self.json {
            OutputFormat::Json
        } else if self.csv {
            OutputFormat::Csv
        } else {
            OutputFormat::SanList
        }
    }

    /// Build the engine configuration: CLI flag > config file > default
    pub fn run_config(&self, file: &Config) -> Result<RunConfig, ConfigError> {
        let concurrency = self
            .concurrency
            .or(file.scan.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY);

        let timeout = self
            .timeout
            .as_deref()
            .or(file.scan.timeout.as_deref())
            .unwrap_or(DEFAULT_TIMEOUT);

        let recursive = self.recursive || file.scan.recursive.unwrap_or(false);

        RunConfig::new(concurrency, parse_duration(timeout)?, self.verbose, recursive)
    }

    /// Spinner only makes sense on an interactive stderr
    pub fn should_show_progress(&self) -> bool {
        !self.no_progress
            && !self.silent
            && is_terminal::is_terminal(std::io::stderr())
    }

    /// Determine log level; `None` defers to the config file
    pub fn log_level(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else if self.silent {
            Some("warn")
        } else {
            None
        }
    }
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Every SAN on its own line (default)
    SanList,
    /// Pretty-printed JSON object per record
    Json,
    /// CSV with header row
    Csv,
    /// One line per record with the selected fields
    Summary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["certinfo"]);
        assert!(cli.input.is_none());
        assert!(!cli.recursive);
        assert_eq!(cli.output_format(), OutputFormat::SanList);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_json_output_format() {
        let cli = Cli::parse_from(["certinfo", "--json"]);
        assert_eq!(cli.output_format(), OutputFormat::Json);
    }

    #[test]
    fn test_csv_output_format() {
        let cli = Cli::parse_from(["certinfo", "--csv"]);
        assert_eq!(cli.output_format(), OutputFormat::Csv);
    }

    #[test]
    fn test_summary_takes_precedence() {
        let cli = Cli::parse_from(["certinfo", "--json", "--san"]);
        assert_eq!(cli.output_format(), OutputFormat::Summary);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_multiple_formats_invalid() {
        let cli = Cli::parse_from(["certinfo", "--json", "--csv"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_today_requires_issued() {
        let cli = Cli::parse_from(["certinfo", "--today"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["certinfo", "--today", "--issued"]);
        assert!(cli.validate().is_ok());

        let cli = Cli::parse_from(["certinfo", "--today", "--issued", "--san"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["certinfo", "--today", "--issued", "--json"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_verbose_and_silent_invalid() {
        let cli = Cli::parse_from(["certinfo", "--verbose", "--silent"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_run_config_defaults() {
        let cli = Cli::parse_from(["certinfo"]);
        let config = cli.run_config(&Config::default()).unwrap();
        assert_eq!(config.concurrency, 50);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(!config.recursive);
        assert!(!config.verbose);
    }

    #[test]
    fn test_run_config_cli_overrides_file() {
        let mut file = Config::default();
        file.scan.concurrency = Some(10);
        file.scan.timeout = Some("3s".to_string());
        file.scan.recursive = Some(true);

        let cli = Cli::parse_from(["certinfo", "-c", "20"]);
        let config = cli.run_config(&file).unwrap();
        assert_eq!(config.concurrency, 20);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(config.recursive);

        let cli = Cli::parse_from(["certinfo", "--timeout", "500ms", "-v"]);
        let config = cli.run_config(&file).unwrap();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert!(config.verbose);
    }

    #[test]
    fn test_bad_timeout_is_config_error() {
        let cli = Cli::parse_from(["certinfo", "--timeout", "soon"]);
        assert!(matches!(
            cli.run_config(&Config::default()),
            Err(ConfigError::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn test_zero_concurrency_is_config_error() {
        let cli = Cli::parse_from(["certinfo", "-c", "0"]);
        assert!(matches!(
            cli.run_config(&Config::default()),
            Err(ConfigError::InvalidConcurrency(0))
        ));
    }

    #[test]
    fn test_log_level() {
        assert_eq!(Cli::parse_from(["certinfo", "-v"]).log_level(), Some("debug"));
        assert_eq!(Cli::parse_from(["certinfo", "-s"]).log_level(), Some("warn"));
        assert_eq!(Cli::parse_from(["certinfo"]).log_level(), None);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from([
            "certinfo", "-i", "hosts.txt", "-c", "8", "-t", "3s", "-r", "-o", "out.json",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("hosts.txt")));
        assert_eq!(cli.concurrency, Some(8));
        assert_eq!(cli.timeout.as_deref(), Some("3s"));
        assert!(cli.recursive);
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
    }
}
