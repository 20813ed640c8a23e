//! Daemon configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use eutl_tsl::RefreshConfig;
use eutl_utils::LogFormat;

use crate::error::DaemonError;

/// One configured List of Trusted Lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotlConfig {
    pub url: String,

    /// JSON-encoded certificates allowed to sign the LOTL.
    #[serde(default)]
    pub signing_certificates: Vec<PathBuf>,

    /// Only services of these types contribute trust. Empty means all.
    #[serde(default)]
    pub service_types: Vec<String>,

    /// Only providers registered in these territories contribute trust. Empty means all.
    #[serde(default)]
    pub territories: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the persisted cache.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Keep stage results across restarts.
    #[serde(default = "default_true")]
    pub persist_cache: bool,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Print the Prometheus text exposition when the daemon exits.
    #[serde(default)]
    pub print_metrics: bool,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default, rename = "lotl")]
    pub lotls: Vec<LotlConfig>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./eutl_data")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_http_timeout_secs() -> u64 {
    60
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, DaemonError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, DaemonError> {
        let config: Self = toml::from_str(s).map_err(|e| DaemonError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, DaemonError> {
        toml::to_string_pretty(self).map_err(|e| DaemonError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        self.refresh
            .validate()
            .map_err(|e| DaemonError::Config(e.to_string()))?;
        if let Some(lotl) = self.lotls.iter().find(|l| l.url.trim().is_empty()) {
            return Err(DaemonError::Config(format!(
                "LOTL entry with empty url ({} signing certificates)",
                lotl.signing_certificates.len()
            )));
        }
        Ok(())
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            persist_cache: default_true(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            http_timeout_secs: default_http_timeout_secs(),
            print_metrics: false,
            refresh: RefreshConfig::default(),
            lotls: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let parsed = DaemonConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.refresh.max_workers, config.refresh.max_workers);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").unwrap();
        assert!(config.persist_cache);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.http_timeout_secs, 60);
        assert!(config.lotls.is_empty());
    }

    #[test]
    fn lotl_tables_are_parsed() {
        let toml = r#"
            log_format = "json"

            [refresh]
            max_workers = 8

            [[lotl]]
            url = "https://ec.europa.eu/tools/lotl/eu-lotl.xml"
            signing_certificates = ["certs/lotl-1.json"]
            service_types = ["http://uri.etsi.org/TrstSvc/Svctype/CA/QC"]
        "#;
        let config = DaemonConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.refresh.max_workers, 8);
        assert_eq!(config.lotls.len(), 1);
        assert_eq!(config.lotls[0].signing_certificates, [PathBuf::from("certs/lotl-1.json")]);
        assert!(config.lotls[0].territories.is_empty());
    }

    #[test]
    fn empty_lotl_url_is_rejected() {
        let toml = r#"
            [[lotl]]
            url = "  "
        "#;
        assert!(matches!(
            DaemonConfig::from_toml_str(toml),
            Err(DaemonError::Config(_))
        ));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = DaemonConfig::from_toml_file(Path::new("/nonexistent/eutl.toml"));
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }
}
