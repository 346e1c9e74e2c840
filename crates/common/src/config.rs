//! Load test configuration
//!
//! Settings come from an optional TOML file overlaid by named lookups
//! (environment variables by default). The two run parameters have no
//! defaults: a run cannot start until both are known.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::crypto::KeyLength;
use crate::{Error, Result};

/// Lookup name for the worker count
pub const THREADS_COUNT: &str = "threads_count";

/// Lookup name for the per-worker time budget in milliseconds
pub const THREAD_TTL: &str = "thread_ttl";

/// Lookup name for failing the harness on a timed-out wait
pub const FAIL_ON_TIMEOUT: &str = "fail_on_timeout";

/// Immutable parameters of a single load run
///
/// Only constructed through [`LoadSettings::new`], which deserialization also
/// goes through, so a value always holds at least one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLoadSettings")]
pub struct LoadSettings {
    threads_count: usize,
    thread_ttl_ms: u64,
}

#[derive(Deserialize)]
struct RawLoadSettings {
    threads_count: usize,
    thread_ttl_ms: u64,
}

impl TryFrom<RawLoadSettings> for LoadSettings {
    type Error = Error;

    fn try_from(raw: RawLoadSettings) -> Result<Self> {
        Self::new(raw.threads_count, raw.thread_ttl_ms)
    }
}

impl LoadSettings {
    /// Create validated settings
    pub fn new(threads_count: usize, thread_ttl_ms: u64) -> Result<Self> {
        if threads_count == 0 {
            return Err(Error::InvalidConfig(format!(
                "{} must be at least 1",
                THREADS_COUNT
            )));
        }
        Ok(Self {
            threads_count,
            thread_ttl_ms,
        })
    }

    /// Read settings through a name lookup; both names are required
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let threads_count = lookup(THREADS_COUNT)
            .ok_or_else(|| Error::MissingSetting(THREADS_COUNT.to_string()))?;
        let thread_ttl = lookup(THREAD_TTL)
            .ok_or_else(|| Error::MissingSetting(THREAD_TTL.to_string()))?;

        Self::new(
            parse_setting(THREADS_COUNT, &threads_count)?,
            parse_setting(THREAD_TTL, &thread_ttl)?,
        )
    }

    /// Number of concurrent workers
    pub fn threads_count(&self) -> usize {
        self.threads_count
    }

    /// Wall-clock budget of each worker, in milliseconds
    pub fn thread_ttl_ms(&self) -> u64 {
        self.thread_ttl_ms
    }

    /// Per-worker time budget
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.thread_ttl_ms)
    }
}

/// Look a setting up in the process environment by its upper-cased name
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name.to_ascii_uppercase()).ok()
}

fn parse_setting<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("{} = {:?}: {}", name, raw, e)))
}

/// Full configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Run parameters
    pub load: LoadSection,

    /// Cryptographic work unit
    pub crypto: CryptoConfig,

    /// Browser work unit
    pub web: WebConfig,
}

/// `[load]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSection {
    pub threads_count: Option<usize>,
    pub thread_ttl_ms: Option<u64>,

    /// Treat a timed-out aggregate wait as a failed run
    pub fail_on_timeout: bool,
}

/// `[crypto]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Symmetric key length in bits (128, 192 or 256)
    pub key_bits: u16,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self { key_bits: 256 }
    }
}

impl CryptoConfig {
    pub fn key_length(&self) -> Result<KeyLength> {
        KeyLength::from_bits(self.key_bits)
    }
}

/// `[web]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Site under test
    pub base_url: String,

    /// chromium, firefox or webkit
    pub browser: String,

    pub headless: bool,

    /// Directory holding the `playwright` node modules
    pub node_path: Option<PathBuf>,

    /// Default timeout for waits and assertions
    pub step_timeout_ms: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.gsmarena.com".to_string(),
            browser: "chromium".to_string(),
            headless: true,
            node_path: None,
            step_timeout_ms: 10_000,
        }
    }
}

impl LoadConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override `[load]` values with whatever the lookup provides
    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(THREADS_COUNT) {
            self.load.threads_count = Some(parse_setting(THREADS_COUNT, &raw)?);
        }
        if let Some(raw) = lookup(THREAD_TTL) {
            self.load.thread_ttl_ms = Some(parse_setting(THREAD_TTL, &raw)?);
        }
        if let Some(raw) = lookup(FAIL_ON_TIMEOUT) {
            self.load.fail_on_timeout = parse_setting(FAIL_ON_TIMEOUT, &raw)?;
        }
        Ok(())
    }

    /// Validated run settings
    pub fn settings(&self) -> Result<LoadSettings> {
        let threads_count = self
            .load
            .threads_count
            .ok_or_else(|| Error::MissingSetting(THREADS_COUNT.to_string()))?;
        let thread_ttl_ms = self
            .load
            .thread_ttl_ms
            .ok_or_else(|| Error::MissingSetting(THREAD_TTL.to_string()))?;
        LoadSettings::new(threads_count, thread_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = LoadSettings::from_lookup(lookup_from(&[
            ("threads_count", "10"),
            ("thread_ttl", "1000"),
        ]))
        .unwrap();
        assert_eq!(settings.threads_count(), 10);
        assert_eq!(settings.time_budget(), Duration::from_millis(1000));
    }

    #[test]
    fn test_missing_setting_is_fatal() {
        let err = LoadSettings::from_lookup(lookup_from(&[("threads_count", "3")])).unwrap_err();
        assert!(matches!(err, Error::MissingSetting(ref name) if name == THREAD_TTL));
        assert!(err.is_setup());
    }

    #[test]
    fn test_unparsable_setting_is_fatal() {
        let err = LoadSettings::from_lookup(lookup_from(&[
            ("threads_count", "many"),
            ("thread_ttl", "1000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(LoadSettings::new(0, 100).is_err());
        assert!(LoadSettings::new(1, 0).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected_when_deserializing() {
        let raw = r#"{"threads_count":0,"thread_ttl_ms":100}"#;
        let err = serde_json::from_str::<LoadSettings>(raw).unwrap_err();
        assert!(err.to_string().contains("threads_count must be at least 1"));

        let settings: LoadSettings =
            serde_json::from_str(r#"{"threads_count":4,"thread_ttl_ms":100}"#).unwrap();
        assert_eq!(settings, LoadSettings::new(4, 100).unwrap());
    }

    #[test]
    fn test_lookup_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multiload.toml");
        std::fs::write(
            &path,
            r#"
[load]
threads_count = 2
thread_ttl_ms = 500

[crypto]
key_bits = 128
"#,
        )
        .unwrap();

        let mut config = LoadConfig::load(&path).unwrap();
        assert_eq!(config.crypto.key_length().unwrap(), KeyLength::Aes128);

        config
            .apply_lookup(lookup_from(&[
                ("threads_count", "8"),
                ("fail_on_timeout", "true"),
            ]))
            .unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.threads_count(), 8);
        assert_eq!(settings.thread_ttl_ms(), 500);
        assert!(config.load.fail_on_timeout);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoadConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.crypto.key_bits, 256);
        assert!(config.settings().is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("multiload.toml");
        let mut config = LoadConfig::default();
        config.load.threads_count = Some(5);
        config.load.thread_ttl_ms = Some(250);
        config.save(&path).unwrap();

        let loaded = LoadConfig::load(&path).unwrap();
        assert_eq!(loaded.settings().unwrap(), LoadSettings::new(5, 250).unwrap());
    }
}
