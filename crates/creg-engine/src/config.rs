use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Which storage backends a [`Registry`](crate::Registry) is built on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Everything in memory. Lost on exit.
    #[default]
    Memory,
    /// Write-ahead-log ledger and filesystem blobs under `data_dir`.
    Durable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub backend: Backend,
    /// Root for durable state: `ledger.wal` and `blobs/`.
    pub data_dir: Option<PathBuf>,
    /// Base URL for locators, e.g. a public gateway. When unset the blob
    /// store's native locator is returned.
    pub locator_base: Option<String>,
    /// Attempts at the index append that follows a ledger insert.
    pub append_attempts: u32,
    /// fsync each ledger append.
    pub sync_writes: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            data_dir: None,
            locator_base: None,
            append_attempts: 3,
            sync_writes: true,
        }
    }
}

impl RegistryConfig {
    /// Durable configuration rooted at `data_dir`.
    pub fn durable(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Durable,
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.backend == Backend::Durable && self.data_dir.is_none() {
            return Err(EngineError::Config(
                "durable backend requires data_dir".into(),
            ));
        }
        if self.append_attempts == 0 {
            return Err(EngineError::Config(
                "append_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn ledger_path(data_dir: &Path) -> PathBuf {
        data_dir.join("ledger.wal")
    }

    pub(crate) fn blob_root(data_dir: &Path) -> PathBuf {
        data_dir.join("blobs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = RegistryConfig::default();
        assert_eq!(c.backend, Backend::Memory);
        assert_eq!(c.append_attempts, 3);
        assert!(c.sync_writes);
        assert!(c.locator_base.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parses_full_toml() {
        let c = RegistryConfig::from_toml_str(
            r#"
            backend = "durable"
            data_dir = "/var/lib/creg"
            locator_base = "https://ipfs.io/ipfs"
            append_attempts = 5
            sync_writes = false
            "#,
        )
        .unwrap();
        assert_eq!(c.backend, Backend::Durable);
        assert_eq!(c.data_dir, Some(PathBuf::from("/var/lib/creg")));
        assert_eq!(c.locator_base.as_deref(), Some("https://ipfs.io/ipfs"));
        assert_eq!(c.append_attempts, 5);
        assert!(!c.sync_writes);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let c = RegistryConfig::from_toml_str("").unwrap();
        assert_eq!(c, RegistryConfig::default());
    }

    #[test]
    fn durable_without_data_dir_is_rejected() {
        let err = RegistryConfig::from_toml_str(r#"backend = "durable""#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = RegistryConfig::from_toml_str("append_attempts = 0").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn unknown_backend_rejected() {
        assert!(RegistryConfig::from_toml_str(r#"backend = "s3""#).is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creg.toml");
        std::fs::write(&path, "append_attempts = 2\n").unwrap();
        assert_eq!(RegistryConfig::load(&path).unwrap().append_attempts, 2);
        assert!(RegistryConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn durable_helper_sets_dir() {
        let c = RegistryConfig::durable("/tmp/x");
        assert_eq!(c.backend, Backend::Durable);
        assert!(c.validate().is_ok());
        assert_eq!(
            RegistryConfig::ledger_path(Path::new("/tmp/x")),
            PathBuf::from("/tmp/x/ledger.wal")
        );
    }
}
