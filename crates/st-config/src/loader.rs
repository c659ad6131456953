//! Configuration loader with file and environment variable support
//!
//! Loading does not log by itself: the binary reads configuration before a
//! tracing subscriber exists, so everything worth reporting is collected in a
//! [`LoadReport`] and emitted once logging is up.

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "subtrack.toml",
    "./config/config.toml",
    "/etc/subtrack/config.toml",
];

/// An environment override whose value could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    pub key: String,
    pub value: String,
}

/// What happened while loading, for logging after the subscriber is installed
#[derive(Debug, Default)]
pub struct LoadReport {
    /// File the configuration was read from, if any
    pub source: Option<PathBuf>,
    /// Explicitly requested file that did not exist
    pub missing_path: Option<PathBuf>,
    pub rejected_overrides: Vec<RejectedOverride>,
}

impl LoadReport {
    pub fn has_warnings(&self) -> bool {
        self.missing_path.is_some() || !self.rejected_overrides.is_empty()
    }

    /// Emit the collected events through `tracing`.
    pub fn log(&self) {
        if let Some(path) = &self.missing_path {
            warn!(?path, "Configured file does not exist, searched defaults");
        }
        match &self.source {
            Some(path) => info!(?path, "Loaded configuration from file"),
            None => info!("No configuration file found, using defaults"),
        }
        for rejected in &self.rejected_overrides {
            warn!(
                key = %rejected.key,
                value = %rejected.value,
                "Ignoring unparsable environment override"
            );
        }
    }
}

/// Configuration loader
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration and log the report immediately.
    ///
    /// Only useful when a subscriber is already installed; otherwise use
    /// [`ConfigLoader::load_reported`].
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (config, report) = self.load_reported()?;
        report.log();
        Ok(config)
    }

    /// Load configuration from file (if found) with environment variable
    /// overrides, returning what should be logged.
    pub fn load_reported(&self) -> Result<(AppConfig, LoadReport), ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    fn load_with<F>(&self, lookup: F) -> Result<(AppConfig, LoadReport), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut report = LoadReport::default();
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&mut report, &lookup) {
            config = AppConfig::from_file(&path)?;
            report.source = Some(path);
        }

        report.rejected_overrides = apply_overrides(&mut config, lookup);

        Ok((config, report))
    }

    /// Find the configuration file to use
    fn find_config_file<F>(&self, report: &mut LoadReport, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            report.missing_path = Some(path.clone());
        }

        if let Some(path) = lookup("SUBTRACK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

fn parse_into<T: FromStr>(
    key: &str,
    raw: String,
    target: &mut T,
    rejected: &mut Vec<RejectedOverride>,
) {
    match raw.parse() {
        Ok(value) => *target = value,
        Err(_) => rejected.push(RejectedOverride {
            key: key.to_string(),
            value: raw,
        }),
    }
}

/// Apply `SUBTRACK_*` overrides using `lookup` as the variable source.
///
/// Unparsable values leave the previous setting in place and are returned.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Vec<RejectedOverride>
where
    F: Fn(&str) -> Option<String>,
{
    let mut rejected = Vec::new();

    if let Some(val) = lookup("SUBTRACK_ENV") {
        config.env = val;
    }

    // HTTP
    if let Some(val) = lookup("SUBTRACK_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("SUBTRACK_HTTP_PORT") {
        parse_into("SUBTRACK_HTTP_PORT", val, &mut config.http.port, &mut rejected);
    }
    if let Some(val) = lookup("SUBTRACK_HTTP_REQUEST_TIMEOUT_SECS") {
        parse_into("SUBTRACK_HTTP_REQUEST_TIMEOUT_SECS", val, &mut config.http.request_timeout_secs, &mut rejected);
    }
    if let Some(val) = lookup("SUBTRACK_HTTP_SHUTDOWN_TIMEOUT_SECS") {
        parse_into("SUBTRACK_HTTP_SHUTDOWN_TIMEOUT_SECS", val, &mut config.http.shutdown_timeout_secs, &mut rejected);
    }

    // Database
    if let Some(val) = lookup("SUBTRACK_DATABASE_KIND") {
        config.database.kind = val.to_lowercase();
    }
    if let Some(val) = lookup("SUBTRACK_DATABASE_URL") {
        config.database.url = val;
    }
    if let Some(val) = lookup("SUBTRACK_DATABASE_POOL_MAX") {
        parse_into("SUBTRACK_DATABASE_POOL_MAX", val, &mut config.database.pool_max, &mut rejected);
    }
    if let Some(val) = lookup("SUBTRACK_DATABASE_CONNECT_TIMEOUT_SECS") {
        parse_into("SUBTRACK_DATABASE_CONNECT_TIMEOUT_SECS", val, &mut config.database.connect_timeout_secs, &mut rejected);
    }
    if let Some(val) = lookup("SUBTRACK_DATABASE_RETRY_ATTEMPTS") {
        parse_into("SUBTRACK_DATABASE_RETRY_ATTEMPTS", val, &mut config.database.retry_attempts, &mut rejected);
    }
    if let Some(val) = lookup("SUBTRACK_DATABASE_RETRY_DELAY_MS") {
        parse_into("SUBTRACK_DATABASE_RETRY_DELAY_MS", val, &mut config.database.retry_delay_ms, &mut rejected);
    }

    rejected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_replace_values() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("SUBTRACK_ENV", "prod"),
                ("SUBTRACK_HTTP_PORT", "9000"),
                ("SUBTRACK_DATABASE_KIND", "SQLite"),
                ("SUBTRACK_DATABASE_URL", "sqlite://subtrack.db"),
                ("SUBTRACK_DATABASE_POOL_MAX", "4"),
                ("SUBTRACK_DATABASE_RETRY_DELAY_MS", "250"),
            ]),
        );

        assert!(config.is_production());
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.database.kind, "sqlite");
        assert_eq!(config.database.url, "sqlite://subtrack.db");
        assert_eq!(config.database.pool_max, 4);
        assert_eq!(config.database.retry_delay_ms, 250);
    }

    #[test]
    fn test_unparsable_override_is_reported_and_ignored() {
        let mut config = AppConfig::default();
        let rejected = apply_overrides(
            &mut config,
            lookup_from(&[("SUBTRACK_HTTP_PORT", "80a"), ("SUBTRACK_DATABASE_POOL_MAX", "3")]),
        );

        assert_eq!(config.http.port, 8080);
        assert_eq!(config.database.pool_max, 3);
        assert_eq!(
            rejected,
            vec![RejectedOverride {
                key: "SUBTRACK_HTTP_PORT".to_string(),
                value: "80a".to_string(),
            }]
        );
    }

    #[test]
    fn test_load_report_collects_warnings() {
        let missing = std::env::temp_dir().join("subtrack-does-not-exist.toml");
        let loader = ConfigLoader::with_path(&missing);

        let (config, report) = loader
            .load_with(lookup_from(&[("SUBTRACK_DATABASE_RETRY_ATTEMPTS", "many")]))
            .unwrap();

        assert!(report.has_warnings());
        assert_eq!(report.missing_path, Some(missing));
        assert_eq!(report.rejected_overrides.len(), 1);
        assert_eq!(report.rejected_overrides[0].key, "SUBTRACK_DATABASE_RETRY_ATTEMPTS");
        assert_eq!(config.database.retry_attempts, 5);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 7070\n\n[database]\nurl = \"postgres://db/subs\"").unwrap();

        let (config, report) = ConfigLoader::with_path(file.path())
            .load_with(lookup_from(&[]))
            .unwrap();
        assert_eq!(config.database.url, "postgres://db/subs");
        assert_eq!(config.database.pool_max, 10);
        assert_eq!(report.source.as_deref(), Some(file.path()));
        assert!(!report.has_warnings());
    }
}
