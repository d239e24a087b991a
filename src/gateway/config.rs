//! Gateway configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::{Error, Result};

/// Tunables for a [`CreationGateway`](crate::gateway::CreationGateway).
///
/// Every field has a default, so a YAML file only needs the keys it changes:
///
/// ```
/// use longan::gateway::GatewayConfig;
///
/// let config = GatewayConfig::from_yaml_str("max_buffer_size: 4096\n").unwrap();
/// assert_eq!(config.max_buffer_size, 4096);
/// assert!(!config.require_file_identifier);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Largest properties buffer accepted by `create`, in bytes.
    pub max_buffer_size: usize,
    /// Reject buffers that lack the document kind's file identifier.
    pub require_file_identifier: bool,
    /// Serialize every engine call even if the engine declares itself safe
    /// for concurrent use of independent handles.
    pub serialize_engine_calls: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: 1024 * 1024,
            require_file_identifier: false,
            serialize_engine_calls: false,
        }
    }
}

impl GatewayConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse gateway config: {}", e)))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::Config(format!("Failed to serialize gateway config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.max_buffer_size, 1 << 20);
        assert!(!config.require_file_identifier);
        assert!(!config.serialize_engine_calls);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = GatewayConfig::from_yaml_str("require_file_identifier: true\n").unwrap();
        assert!(config.require_file_identifier);
        assert_eq!(config.max_buffer_size, GatewayConfig::default().max_buffer_size);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = GatewayConfig {
            max_buffer_size: 512,
            require_file_identifier: true,
            serialize_engine_calls: true,
        };
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(GatewayConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_bad_yaml_is_a_config_error() {
        let err = GatewayConfig::from_yaml_str("max_buffer_size: [oops]\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "serialize_engine_calls: true").unwrap();
        let config = GatewayConfig::from_yaml_file(file.path()).unwrap();
        assert!(config.serialize_engine_calls);

        let missing = GatewayConfig::from_yaml_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
