//! Extractor configuration. Every section has defaults, so a partial JSON file is enough.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// WHOIS and DNS lookups
    pub probe: ProbeConfig,
    /// Page fetch
    pub fetch: FetchConfig,
    /// Batch extraction
    pub batch: BatchConfig,
    /// Keyword, brand, shortener and TLD lists used by the lexical heuristics
    pub keywords: KeywordLists,
    /// Classifier model
    pub model: ModelConfig,
    /// Verdict thresholds over the classifier score
    pub verdict: VerdictConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub whois_enabled: bool,
    pub dns_enabled: bool,
    /// Root WHOIS server asked for the TLD referral (host:port)
    pub iana_server: String,
    /// Follow the `Registrar WHOIS Server:` referral of thin registries
    pub follow_referral: bool,
    pub whois_timeout_ms: u64,
    pub dns_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub enabled: bool,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub user_agent: String,
    /// Bodies are truncated past this many bytes
    pub max_body_bytes: usize,
    /// Honor HTTP(S)_PROXY from the environment
    pub use_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// URLs extracted at once; output order never depends on it
    pub concurrency: usize,
}

/// Named static lists. Matching is case-insensitive substring unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordLists {
    pub phish_hints: Vec<String>,
    pub brands: Vec<String>,
    pub shorteners: Vec<String>,
    /// Exact match against the public suffix
    pub suspicious_tlds: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX classifier
    pub path: PathBuf,
    /// Width of the numeric feature vector the model expects
    pub feature_dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// Percent score above which a URL is blocked
    pub blocked_above: f32,
    pub warning_above: f32,
    pub caution_above: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            whois_enabled: true,
            dns_enabled: true,
            iana_server: "whois.iana.org:43".to_string(),
            follow_referral: true,
            whois_timeout_ms: 5_000,
            dns_timeout_ms: 2_000,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 5_000,
            connect_timeout_ms: 3_000,
            user_agent: concat!("phishscan/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 2 * 1024 * 1024,
            use_proxy: true,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordLists {
    fn default() -> Self {
        Self {
            phish_hints: strings(&["login", "verify", "secure", "account", "banking"]),
            brands: strings(&["google", "facebook", "apple", "paypal", "amazon"]),
            shorteners: strings(&["bit.ly", "goo.gl", "tinyurl.com", "ow.ly"]),
            suspicious_tlds: strings(&["tk", "ml", "ga", "cf", "gq"]),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("model.onnx"),
            feature_dim: crate::features::FeatureRecord::NUMERIC_WIDTH,
        }
    }
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            blocked_above: 80.0,
            warning_above: 50.0,
            caution_above: 20.0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ProbeConfig {
    pub fn whois_timeout(&self) -> Duration {
        Duration::from_millis(self.whois_timeout_ms)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl KeywordLists {
    /// Look a list up by its config name.
    pub fn list(&self, name: &str) -> Option<&[String]> {
        match name {
            "phish_hints" => Some(&self.phish_hints),
            "brands" => Some(&self.brands),
            "shorteners" => Some(&self.shorteners),
            "suspicious_tlds" => Some(&self.suspicious_tlds),
            _ => None,
        }
    }

    /// Lowercase every entry so matching against lowercased text is a plain `contains`.
    pub fn normalized(mut self) -> Self {
        for list in [
            &mut self.phish_hints,
            &mut self.brands,
            &mut self.shorteners,
            &mut self.suspicious_tlds,
        ] {
            for item in list.iter_mut() {
                *item = item.trim().to_lowercase();
            }
            list.retain(|s| !s.is_empty());
        }
        self
    }
}

impl ExtractorConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).unwrap_or_default()
    }

    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Network-free configuration: WHOIS, DNS and page fetch disabled.
    pub fn offline() -> Self {
        let mut c = Self::default();
        c.probe.whois_enabled = false;
        c.probe.dns_enabled = false;
        c.fetch.enabled = false;
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let c = ExtractorConfig::load(Path::new("does-not-exist.json"));
        assert_eq!(c.batch.concurrency, 8);
        assert!(c.fetch.enabled);
        assert_eq!(c.keywords.suspicious_tlds.len(), 5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"fetch": {{"timeout_ms": 750}}, "keywords": {{"brands": ["Contoso"]}}}}"#
        )
        .unwrap();
        let c = ExtractorConfig::try_load(f.path()).unwrap();
        assert_eq!(c.fetch.timeout_ms, 750);
        assert_eq!(c.fetch.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(c.keywords.brands, vec!["Contoso".to_string()]);
        assert_eq!(c.keywords.phish_hints.len(), 5);
        assert_eq!(c.probe.iana_server, "whois.iana.org:43");
    }

    #[test]
    fn invalid_json_is_reported_by_try_load() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{ not json").unwrap();
        assert!(matches!(
            ExtractorConfig::try_load(f.path()),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(ExtractorConfig::load(f.path()).batch.concurrency, 8);
    }

    #[test]
    fn lists_are_addressable_by_name_and_normalized() {
        let mut lists = KeywordLists::default();
        lists.brands.push("  MicroSoft ".into());
        lists.brands.push("   ".into());
        let lists = lists.normalized();
        assert_eq!(lists.list("brands").unwrap().last().unwrap(), "microsoft");
        assert_eq!(lists.list("brands").unwrap().len(), 6);
        assert!(lists.list("nope").is_none());
    }
}
