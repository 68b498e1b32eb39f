//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/server-status/config.toml`
//! - macOS: `~/Library/Application Support/server-status/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `SERVER_STATUS_CONFIG`: Override config file path
//! - `SERVER_STATUS_FORMAT`: Output format (text, json)
//! - `SERVER_STATUS_NO_COLOR` or `NO_COLOR`: Disable colors
//! - `SERVER_STATUS_VERBOSE`: Detailed report and debug logging (1, true, yes)
//! - `SERVER_STATUS_PRETTY`: Pretty-print JSON output (1, true, yes)
//! - `SERVER_STATUS_LEDGER`: Token ledger path
//! - `SERVER_STATUS_OUTBOX`: Drop directory for outbound messages

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::cli::args::{Cli, OutputFormat};
use crate::core::budget::BudgetConfig;
use crate::core::pricing::{Conversion, Currency, DEFAULT_USD_TO_EUR, ModelPricing, PricingTable};
use crate::core::report::Thresholds;
use crate::error::{Result, StatusError};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "SERVER_STATUS_CONFIG";
/// Environment variable for output format.
pub const ENV_FORMAT: &str = "SERVER_STATUS_FORMAT";
/// Environment variable to disable colors.
pub const ENV_NO_COLOR: &str = "SERVER_STATUS_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
/// Environment variable for verbose output.
pub const ENV_VERBOSE: &str = "SERVER_STATUS_VERBOSE";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "SERVER_STATUS_PRETTY";
/// Environment variable for the ledger path.
pub const ENV_LEDGER: &str = "SERVER_STATUS_LEDGER";
/// Environment variable for the outbox directory.
pub const ENV_OUTBOX: &str = "SERVER_STATUS_OUTBOX";

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The loaded (and validated) config file contents.
    pub file: Config,
    /// Config file that was consulted (it may not exist).
    pub config_path: PathBuf,
    /// Output format.
    pub format: OutputFormat,
    /// Whether to disable colored output.
    pub no_color: bool,
    /// Detailed narrative and debug logging.
    pub verbose: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
    /// Token ledger.
    pub ledger_path: PathBuf,
    /// Vector document store (file or directory).
    pub document_store_path: PathBuf,
    /// Drop directory for outbound messages.
    pub outbox_dir: PathBuf,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub config_path: ConfigSource,
    pub format: ConfigSource,
    pub no_color: ConfigSource,
    pub verbose: ConfigSource,
    pub pretty: ConfigSource,
    pub ledger_path: ConfigSource,
    pub outbox_dir: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, environment variables, and config file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config file exists but cannot be
    /// parsed, or if any resolved value is invalid.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut sources = ConfigSources::default();

        let config_path = Self::resolve_config_path(cli, &mut sources.config_path);
        let file = Config::load_from(&config_path)?;
        file.validate()?;

        let paths = AppPaths::new();
        let format = Self::resolve_format(cli, &file, &mut sources.format)?;
        let no_color = Self::resolve_no_color(cli, &file, &mut sources.no_color);
        let verbose = Self::resolve_verbose(cli, &mut sources.verbose);
        let pretty = Self::resolve_pretty(cli, &file, &mut sources.pretty);
        let ledger_path = Self::resolve_path(
            ENV_LEDGER,
            file.paths.ledger.as_ref(),
            paths.ledger_file(),
            &mut sources.ledger_path,
        );
        let outbox_dir = Self::resolve_path(
            ENV_OUTBOX,
            file.paths.outbox.as_ref(),
            paths.outbox_dir(),
            &mut sources.outbox_dir,
        );
        let document_store_path = file
            .paths
            .document_store
            .clone()
            .unwrap_or_else(|| paths.document_store());

        tracing::debug!(
            config = %config_path.display(),
            ledger = %ledger_path.display(),
            outbox = %outbox_dir.display(),
            "configuration resolved"
        );

        Ok(Self {
            file,
            config_path,
            format,
            no_color,
            verbose,
            pretty,
            ledger_path,
            document_store_path,
            outbox_dir,
            sources,
        })
    }

    /// Config path from `--config`, then `SERVER_STATUS_CONFIG`, then the platform default.
    fn resolve_config_path(cli: &Cli, source: &mut ConfigSource) -> PathBuf {
        if let Some(path) = &cli.config {
            *source = ConfigSource::Cli;
            return path.clone();
        }
        if let Some(path) = non_empty_env(ENV_CONFIG) {
            *source = ConfigSource::Env;
            return PathBuf::from(path);
        }
        *source = ConfigSource::Default;
        Config::config_path()
    }

    /// Resolve output format setting.
    fn resolve_format(
        cli: &Cli,
        config: &Config,
        source: &mut ConfigSource,
    ) -> Result<OutputFormat> {
        // 1. CLI --json shorthand or --format
        if cli.json {
            *source = ConfigSource::Cli;
            return Ok(OutputFormat::Json);
        }
        if let Some(format) = cli.format {
            *source = ConfigSource::Cli;
            return Ok(format);
        }

        // 2. Environment variable
        if let Some(format_env) = non_empty_env(ENV_FORMAT) {
            *source = ConfigSource::Env;
            return Self::parse_format(&format_env);
        }

        // 3. Config file
        if let Some(ref format_str) = config.output.format {
            *source = ConfigSource::ConfigFile;
            return Self::parse_format(format_str);
        }

        // 4. Default
        *source = ConfigSource::Default;
        Ok(OutputFormat::Text)
    }

    /// Parse a format string into `OutputFormat`.
    fn parse_format(s: &str) -> Result<OutputFormat> {
        OutputFormat::from_arg(s).ok_or_else(|| StatusError::ConfigInvalid {
            key: "format".to_string(),
            message: format!("'{s}' is not a format. Valid formats: text, json"),
        })
    }

    fn resolve_no_color(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.no_color {
            *source = ConfigSource::Cli;
            return true;
        }
        if Self::is_env_truthy(ENV_NO_COLOR) || std::env::var_os(ENV_NO_COLOR_STD).is_some() {
            *source = ConfigSource::Env;
            return true;
        }
        if !config.output.color {
            *source = ConfigSource::ConfigFile;
            return true;
        }
        *source = ConfigSource::Default;
        false
    }

    fn resolve_verbose(cli: &Cli, source: &mut ConfigSource) -> bool {
        if cli.verbose {
            *source = ConfigSource::Cli;
            return true;
        }
        if Self::is_env_truthy(ENV_VERBOSE) {
            *source = ConfigSource::Env;
            return true;
        }
        *source = ConfigSource::Default;
        false
    }

    fn resolve_pretty(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }
        if Self::is_env_truthy(ENV_PRETTY) {
            *source = ConfigSource::Env;
            return true;
        }
        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }
        *source = ConfigSource::Default;
        false
    }

    fn resolve_path(
        env: &str,
        configured: Option<&PathBuf>,
        default: PathBuf,
        source: &mut ConfigSource,
    ) -> PathBuf {
        if let Some(path) = non_empty_env(env) {
            *source = ConfigSource::Env;
            return PathBuf::from(path);
        }
        if let Some(path) = configured {
            *source = ConfigSource::ConfigFile;
            return path.clone();
        }
        *source = ConfigSource::Default;
        default
    }

    /// Check if an environment variable is set to a truthy value.
    fn is_env_truthy(var: &str) -> bool {
        std::env::var(var)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }

    /// Price table with configured overrides applied.
    #[must_use]
    pub fn pricing_table(&self) -> PricingTable {
        PricingTable::with_overrides(&self.file.pricing.models)
    }

    /// Reporting currency and exchange rate.
    #[must_use]
    pub const fn conversion(&self) -> Conversion {
        Conversion::new(self.file.pricing.currency, self.file.pricing.usd_to_eur)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub thresholds: Thresholds,
    pub budget: BudgetConfig,
    pub pricing: PricingConfig,
    pub paths: PathsConfig,
    pub system: SystemConfig,
    pub model_daemon: ModelDaemonConfig,
    pub notification: NotificationConfig,
    pub output: OutputConfig,
}

/// General settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Hours between scheduled reports. Informational: the scheduler lives
    /// outside this program.
    pub report_interval_hours: u32,
    /// Days of daily trend attached to each report (0 disables).
    pub trend_days: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            report_interval_hours: 6,
            trend_days: 7,
        }
    }
}

/// Reporting currency, exchange rate, and price overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub currency: Currency,
    pub usd_to_eur: f64,
    /// Entries added to or replacing the built-in price list.
    pub models: Vec<ModelPricing>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: Currency::Eur,
            usd_to_eur: DEFAULT_USD_TO_EUR,
            models: Vec::new(),
        }
    }
}

/// File locations. Unset values fall back to the data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub ledger: Option<PathBuf>,
    pub document_store: Option<PathBuf>,
    pub outbox: Option<PathBuf>,
}

/// Where host metrics are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    pub disk_mount: String,
    /// Timeout for external commands (`df`, `sysctl`, `system_profiler`).
    pub command_timeout_seconds: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            disk_mount: "/".to_string(),
            command_timeout_seconds: 5,
        }
    }
}

impl SystemConfig {
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }
}

/// Model-serving daemon (Ollama HTTP API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDaemonConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for ModelDaemonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://127.0.0.1:11434".to_string(),
            timeout_seconds: 2,
        }
    }
}

impl ModelDaemonConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Chat notification target for queued reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Whether `report` queues the rendered output.
    pub enabled: bool,
    pub channel: String,
    pub chat_id: Option<i64>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: "telegram".to_string(),
            chat_id: None,
        }
    }
}

/// Output formatting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (text, json).
    pub format: Option<String>,
    /// Whether to color the health label.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let parse_error = |message: String| StatusError::ConfigParse {
            path: path.display().to_string(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
        toml::from_str(&content).map_err(|e| parse_error(e.to_string()))
    }

    /// Serialize as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| StatusError::Config(format!("Failed to serialize config: {e}")))
    }

    /// Get the default config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| StatusError::ConfigInvalid {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.general.report_interval_hours == 0 {
            return Err(invalid(
                "general.report_interval_hours",
                "must be at least 1 hour",
            ));
        }
        if self.general.trend_days > 366 {
            return Err(invalid("general.trend_days", "must be at most 366 days"));
        }

        self.thresholds.validate()?;
        self.budget.validate()?;

        if !(self.pricing.usd_to_eur.is_finite() && self.pricing.usd_to_eur > 0.0) {
            return Err(invalid("pricing.usd_to_eur", "must be a positive rate"));
        }
        for entry in &self.pricing.models {
            if entry.provider.trim().is_empty() || entry.model.trim().is_empty() {
                return Err(invalid(
                    "pricing.models",
                    "provider and model must not be empty",
                ));
            }
            if entry.input_per_million < 0.0 || entry.output_per_million < 0.0 {
                return Err(invalid(
                    "pricing.models",
                    &format!("negative rate for {}/{}", entry.provider, entry.model),
                ));
            }
        }

        if self.system.command_timeout_seconds == 0 || self.system.command_timeout_seconds > 300 {
            return Err(invalid(
                "system.command_timeout_seconds",
                "must be between 1 and 300 seconds",
            ));
        }
        if self.model_daemon.timeout_seconds == 0 || self.model_daemon.timeout_seconds > 300 {
            return Err(invalid(
                "model_daemon.timeout_seconds",
                "must be between 1 and 300 seconds",
            ));
        }
        if self.model_daemon.enabled
            && !(self.model_daemon.endpoint.starts_with("http://")
                || self.model_daemon.endpoint.starts_with("https://"))
        {
            return Err(invalid(
                "model_daemon.endpoint",
                "must be an http:// or https:// URL",
            ));
        }

        if let Some(format) = &self.output.format {
            if OutputFormat::from_arg(format).is_none() {
                return Err(invalid("output.format", "valid formats: text, json"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_ENV: &[&str] = &[
        ENV_CONFIG,
        ENV_FORMAT,
        ENV_NO_COLOR,
        ENV_NO_COLOR_STD,
        ENV_VERBOSE,
        ENV_PRETTY,
        ENV_LEDGER,
        ENV_OUTBOX,
    ];

    #[allow(unsafe_code)]
    fn set_env(key: &str, value: &str) {
        // SAFETY: callers hold ENV_LOCK
        unsafe { std::env::set_var(key, value) };
    }

    #[allow(unsafe_code)]
    fn remove_env(key: &str) {
        // SAFETY: callers hold ENV_LOCK
        unsafe { std::env::remove_var(key) };
    }

    fn clean_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for key in ALL_ENV {
            remove_env(key);
        }
        guard
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["server-status"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.general.report_interval_hours, 6);
        assert_eq!(config.model_daemon.endpoint, "http://127.0.0.1:11434");
        assert_eq!(config.pricing.currency, Currency::Eur);
    }

    #[test]
    fn load_missing_file_returns_default() {
        let config = Config::load_from(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_valid_toml() {
        let file = write_config(
            r#"
[thresholds]
ram_warning_percent = 70
ram_critical_percent = 85

[budget]
monthly_limit = 25.0

[pricing]
currency = "USD"

[[pricing.models]]
provider = "mistral"
model = "mistral-large"
input_per_million = 2.0
output_per_million = 6.0

[notification]
chat_id = 8106588289
"#,
        );

        let config = Config::load_from(file.path()).unwrap();
        assert!((config.thresholds.ram_warning_percent - 70.0).abs() < f64::EPSILON);
        assert!((config.budget.monthly_limit - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.pricing.currency, Currency::Usd);
        assert_eq!(config.pricing.models.len(), 1);
        assert_eq!(config.notification.chat_id, Some(8_106_588_289));
        // untouched sections keep their defaults
        assert_eq!(config.system, SystemConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_invalid_toml_is_parse_error() {
        let file = write_config("this is not valid toml {{{{");
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, StatusError::ConfigParse { .. }));
    }

    #[test]
    fn unknown_currency_is_parse_error() {
        let file = write_config("[pricing]\ncurrency = \"GBP\"\n");
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn shown_toml_parses_back() {
        let mut config = Config::default();
        config.budget.monthly_limit = 42.0;
        config.paths.ledger = Some(PathBuf::from("/var/lib/tokens.db"));

        let text = config.to_toml().unwrap();
        let loaded: Config = toml::from_str(&text).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn trend_window_longer_than_a_year_rejected() {
        let mut config = Config::default();
        config.general.trend_days = 366;
        assert!(config.validate().is_ok());

        config.general.trend_days = 367;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            StatusError::ConfigInvalid { ref key, .. } if key == "general.trend_days"
        ));
    }

    #[test]
    fn warning_at_or_above_critical_is_rejected() {
        let mut config = Config::default();
        config.thresholds.swap_warning_percent = 80.0;
        config.thresholds.swap_critical_percent = 80.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.exit_code(), crate::error::ExitCode::ConfigError);
    }

    #[test]
    fn thresholds_outside_percent_range_rejected() {
        let mut config = Config::default();
        config.thresholds.ram_critical_percent = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_price_rejected() {
        let mut config = Config::default();
        config
            .pricing
            .models
            .push(ModelPricing::new("openai", "gpt-4o", -1.0, 1.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = Config::default();
        config.general.report_interval_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_source_display() {
        assert_eq!(format!("{}", ConfigSource::Cli), "CLI flag");
        assert_eq!(format!("{}", ConfigSource::Env), "environment variable");
        assert_eq!(format!("{}", ConfigSource::ConfigFile), "config file");
        assert_eq!(format!("{}", ConfigSource::Default), "default");
    }

    #[test]
    fn is_env_truthy_values() {
        let _guard = clean_env();
        set_env("SERVER_STATUS_TEST_TRUTHY", "yes");
        set_env("SERVER_STATUS_TEST_FALSY", "0");
        assert!(ResolvedConfig::is_env_truthy("SERVER_STATUS_TEST_TRUTHY"));
        assert!(!ResolvedConfig::is_env_truthy("SERVER_STATUS_TEST_FALSY"));
        assert!(!ResolvedConfig::is_env_truthy("SERVER_STATUS_TEST_MISSING"));
        remove_env("SERVER_STATUS_TEST_TRUTHY");
        remove_env("SERVER_STATUS_TEST_FALSY");
    }

    #[test]
    fn cli_config_flag_wins_over_env() {
        let _guard = clean_env();
        let from_cli = write_config("[output]\npretty = true\n");
        let from_env = write_config("[output]\npretty = false\n");
        set_env(ENV_CONFIG, from_env.path().to_str().unwrap());

        let resolved =
            ResolvedConfig::resolve(&cli(&["--config", from_cli.path().to_str().unwrap()]))
                .unwrap();

        assert_eq!(resolved.config_path, from_cli.path());
        assert_eq!(resolved.sources.config_path, ConfigSource::Cli);
        assert!(resolved.pretty);
        assert_eq!(resolved.sources.pretty, ConfigSource::ConfigFile);
        remove_env(ENV_CONFIG);
    }

    #[test]
    fn format_precedence() {
        let _guard = clean_env();
        let file = write_config("[output]\nformat = \"json\"\n");
        let path = file.path().to_str().unwrap();

        let resolved = ResolvedConfig::resolve(&cli(&["--config", path])).unwrap();
        assert_eq!(resolved.format, OutputFormat::Json);
        assert_eq!(resolved.sources.format, ConfigSource::ConfigFile);

        set_env(ENV_FORMAT, "text");
        let resolved = ResolvedConfig::resolve(&cli(&["--config", path])).unwrap();
        assert_eq!(resolved.format, OutputFormat::Text);
        assert_eq!(resolved.sources.format, ConfigSource::Env);

        let resolved = ResolvedConfig::resolve(&cli(&["--config", path, "--json"])).unwrap();
        assert_eq!(resolved.format, OutputFormat::Json);
        assert_eq!(resolved.sources.format, ConfigSource::Cli);
        remove_env(ENV_FORMAT);
    }

    #[test]
    fn ledger_path_env_overrides_file() {
        let _guard = clean_env();
        let file = write_config("[paths]\nledger = \"/from/file.db\"\n");
        let path = file.path().to_str().unwrap();

        let resolved = ResolvedConfig::resolve(&cli(&["--config", path])).unwrap();
        assert_eq!(resolved.ledger_path, PathBuf::from("/from/file.db"));
        assert_eq!(resolved.sources.ledger_path, ConfigSource::ConfigFile);

        set_env(ENV_LEDGER, "/from/env.db");
        let resolved = ResolvedConfig::resolve(&cli(&["--config", path])).unwrap();
        assert_eq!(resolved.ledger_path, PathBuf::from("/from/env.db"));
        assert_eq!(resolved.sources.ledger_path, ConfigSource::Env);
        remove_env(ENV_LEDGER);
    }

    #[test]
    fn no_color_from_standard_env() {
        let _guard = clean_env();
        let file = write_config("");
        set_env(ENV_NO_COLOR_STD, "1");
        let resolved =
            ResolvedConfig::resolve(&cli(&["--config", file.path().to_str().unwrap()])).unwrap();
        assert!(resolved.no_color);
        assert_eq!(resolved.sources.no_color, ConfigSource::Env);
        remove_env(ENV_NO_COLOR_STD);
    }

    #[test]
    fn invalid_file_fails_resolution() {
        let _guard = clean_env();
        let file = write_config("[budget]\nalert_percent = 0\n");
        let err = ResolvedConfig::resolve(&cli(&["--config", file.path().to_str().unwrap()]))
            .unwrap_err();
        assert!(matches!(err, StatusError::ConfigInvalid { .. }));
    }
}
