use serde::Deserialize;
use std::fs::File;
use std::time::Duration;

pub const DEFAULT_MAX_CONNECTIONS: usize = 100;
pub const DEFAULT_IDLE_TTL_SECS: u64 = 300;

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct TenancyConfig {
    /// Hosts of the form `{slug}.{base_domain}` resolve by slug; anything
    /// else is treated as a candidate custom domain. Leaving this empty is
    /// a deployment mistake and makes every resolution fail closed.
    #[serde(default)]
    pub base_domain: String,

    /// Upper bound on live workspace database handles held by the cache.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Handles idle longer than this are reclaimed on the next eviction pass.
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    /// Cache domain-lookup misses for a short window.
    #[serde(default = "default_negative_cache")]
    pub negative_cache: bool,

    /// Base64-encoded 32-byte key for the built-in credential decryptor.
    /// Absent when an external decryption service is wired in instead.
    #[serde(default)]
    pub credentials_key: Option<String>,
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

fn default_idle_ttl_secs() -> u64 {
    DEFAULT_IDLE_TTL_SECS
}

fn default_negative_cache() -> bool {
    true
}

impl TenancyConfig {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn defaults_apply() {
        let yaml = r#"
            base_domain: quackback.io
            "#;
        let tmp = write_tmp_file(yaml);
        let config = TenancyConfig::from_file(tmp.path()).expect("load config");

        assert_eq!(config.base_domain, "quackback.io");
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.idle_ttl(), Duration::from_secs(300));
        assert!(config.negative_cache);
        assert_eq!(config.credentials_key, None);
    }

    #[test]
    fn explicit_values_win() {
        let yaml = r#"
            base_domain: quackback.io
            max_connections: 8
            idle_ttl_secs: 60
            negative_cache: false
            credentials_key: c2VjcmV0
            "#;
        let tmp = write_tmp_file(yaml);
        let config = TenancyConfig::from_file(tmp.path()).expect("load config");

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.idle_ttl(), Duration::from_secs(60));
        assert!(!config.negative_cache);
        assert_eq!(config.credentials_key.as_deref(), Some("c2VjcmV0"));
    }

    #[test]
    fn missing_base_domain_parses_as_empty() {
        let yaml = "max_connections: 4";
        let tmp = write_tmp_file(yaml);
        let config = TenancyConfig::from_file(tmp.path()).expect("load config");

        assert_eq!(config.base_domain, "");
    }
}
