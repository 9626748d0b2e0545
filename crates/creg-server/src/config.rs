use std::net::SocketAddr;
use std::path::Path;

use creg_engine::RegistryConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 8088;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Largest accepted certificate document, in decoded bytes.
    pub max_payload_bytes: usize,
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            max_payload_bytes: 16 * 1024 * 1024,
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        if config.max_payload_bytes == 0 {
            return Err(ServerError::Config(
                "max_payload_bytes must be positive".into(),
            ));
        }
        config.registry.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Request body limit: hex doubles the payload, plus room for the
    /// surrounding JSON fields.
    pub fn body_limit(&self) -> usize {
        self.max_payload_bytes
            .saturating_mul(2)
            .saturating_add(64 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creg_engine::Backend;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8088".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_payload_bytes, 16 * 1024 * 1024);
        assert_eq!(c.registry, RegistryConfig::default());
    }

    #[test]
    fn parses_nested_registry_section() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:9000"

            [registry]
            backend = "durable"
            data_dir = "/srv/creg"
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.registry.backend, Backend::Durable);
        assert_eq!(c.max_payload_bytes, ServerConfig::default().max_payload_bytes);
    }

    #[test]
    fn invalid_registry_section_rejected() {
        let err = ServerConfig::from_toml_str("[registry]\nbackend = \"durable\"\n").unwrap_err();
        assert!(matches!(err, ServerError::Engine(_)));
    }

    #[test]
    fn zero_payload_limit_rejected() {
        assert!(ServerConfig::from_toml_str("max_payload_bytes = 0").is_err());
    }

    #[test]
    fn body_limit_covers_hex_encoding() {
        let c = ServerConfig {
            max_payload_bytes: 100,
            ..ServerConfig::default()
        };
        assert!(c.body_limit() >= 200);
    }
}
