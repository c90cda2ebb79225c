// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_CONCURRENCY: usize = 50;
pub const DEFAULT_TIMEOUT: &str = "15s";

/// Immutable settings the engine runs with
///
/// Built once before the pipeline starts and passed by value to the
/// coordinator; nothing re-reads flags after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Workers per round
    pub concurrency: usize,
    /// Bound on TCP connect + TLS handshake for one target
    pub timeout: Duration,
    /// Report per-host failures at warn level
    pub verbose: bool,
    /// Expand through SAN entries round by round
    pub recursive: bool,
}

impl RunConfig {
    pub fn new(
        concurrency: usize,
        timeout: Duration,
        verbose: bool,
        recursive: bool,
    ) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(concurrency));
        }
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                value: format!("{:?}", timeout),
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            concurrency,
            timeout,
            verbose,
            recursive,
        })
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(15),
            verbose: false,
            recursive: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScanConfig {
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Duration string such as "5s" or "1m30s"
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub recursive: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Optional TOML config file; CLI flags override it
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Parse a duration string like `500ms`, `15s`, `1m30s` or `1.5h`
///
/// Accepted units: `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`. A bare `0` is
/// accepted; any other number needs a unit.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidTimeout {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let s = value.trim();
    if s.is_empty() {
        return Err(invalid("empty duration"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = s;

    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_end == 0 {
            return Err(invalid("expected a number"));
        }
        let number: f64 = rest[..num_end]
            .parse()
            .map_err(|_| invalid("malformed number"))?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let nanos_per_unit = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid("unknown unit")),
        };

        total_nanos += number * nanos_per_unit;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(invalid("duration out of range"));
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_compound_and_fractional() {
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("2.5s").unwrap(), Duration::from_millis(2500));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for bad in ["", "abc", "15", "5 s", "5x", "-5s", "s"] {
            assert!(
                matches!(parse_duration(bad), Err(ConfigError::InvalidTimeout { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_run_config_validation() {
        assert!(RunConfig::new(50, Duration::from_secs(3), false, true).is_ok());
        assert!(matches!(
            RunConfig::new(0, Duration::from_secs(3), false, false),
            Err(ConfigError::InvalidConcurrency(0))
        ));
        assert!(matches!(
            RunConfig::new(1, Duration::ZERO, false, false),
            Err(ConfigError::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn test_run_config_default() {
        let config = RunConfig::default();
        assert_eq!(config.concurrency, 50);
        assert_eq!(config.timeout, parse_duration(DEFAULT_TIMEOUT).unwrap());
        assert!(!config.recursive);
    }

    #[test]
    fn test_config_from_valid_toml() {
        let toml_content = r#"
[scan]
concurrency = 100
timeout = "5s"
recursive = true

[logging]
level = "debug"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.scan.concurrency, Some(100));
        assert_eq!(config.scan.timeout.as_deref(), Some("5s"));
        assert_eq!(config.scan.recursive, Some(true));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_empty_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.scan.concurrency, None);
        assert_eq!(config.scan.timeout, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"invalid toml content {{{").unwrap();
        temp_file.flush().unwrap();

        assert!(matches!(
            Config::from_file(temp_file.path()),
            Err(ConfigError::File { .. })
        ));
    }

    #[test]
    fn test_config_nonexistent_file() {
        let result = Config::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }
}
