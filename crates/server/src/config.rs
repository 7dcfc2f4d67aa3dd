//! Server configuration

use anyhow::{bail, Context, Result};
use inference_lib::provider::artifact::DEFAULT_MAX_MODEL_BYTES;
use inference_lib::{
    FallbackProvider, LocalFileProvider, ModelProvider, RegistryConfig, RegistryProvider,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the model is loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// Registry first, then local files
    Auto,
    Registry,
    Local,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the registry, experiments and local model files
    #[serde(default = "default_model_root")]
    pub model_root: PathBuf,

    #[serde(default = "default_model_source")]
    pub model_source: ModelSource,

    /// Registered model name
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Registered version, or `latest`
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Experiment searched when the model is not registered
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,

    /// Serve `/metrics` from a Prometheus registry
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    /// Largest model artifact accepted, in bytes
    #[serde(default = "default_max_model_bytes")]
    pub max_model_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_model_root() -> PathBuf {
    PathBuf::from("./models")
}

fn default_model_source() -> ModelSource {
    ModelSource::Auto
}

fn default_model_name() -> String {
    "iris-classifier".to_string()
}

fn default_model_version() -> String {
    "latest".to_string()
}

fn default_experiment_name() -> String {
    "iris-classification".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_max_model_bytes() -> usize {
    DEFAULT_MAX_MODEL_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_root: default_model_root(),
            model_source: default_model_source(),
            model_name: default_model_name(),
            model_version: default_model_version(),
            experiment_name: default_experiment_name(),
            metrics_enabled: default_metrics_enabled(),
            max_model_bytes: default_max_model_bytes(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `iris-server.*` and `IRIS_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("iris-server").required(false))
            .add_source(config::Environment::with_prefix("IRIS"))
            .build()
            .context("Failed to read configuration")?;

        let config: ServerConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            bail!("model_name must not be empty");
        }
        if self.model_version.trim().is_empty() {
            bail!("model_version must not be empty");
        }
        if self.max_model_bytes == 0 {
            bail!("max_model_bytes must be positive");
        }
        Ok(())
    }

    /// Socket address string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            root: self.model_root.clone(),
            model_name: self.model_name.clone(),
            model_version: self.model_version.clone(),
            experiment_name: self.experiment_name.clone(),
            max_model_bytes: self.max_model_bytes,
        }
    }

    /// Provider chain for the configured model source
    pub fn build_provider(&self) -> Arc<dyn ModelProvider> {
        let registry: Arc<dyn ModelProvider> =
            Arc::new(RegistryProvider::new(self.registry_config()));
        let local: Arc<dyn ModelProvider> = Arc::new(
            LocalFileProvider::new(&self.model_root).with_max_model_bytes(self.max_model_bytes),
        );

        match self.model_source {
            ModelSource::Registry => registry,
            ModelSource::Local => local,
            ModelSource::Auto => Arc::new(FallbackProvider::new(vec![registry, local])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.model_source, ModelSource::Auto);
        assert_eq!(config.max_model_bytes, 10 * 1024 * 1024);
        assert!(config.metrics_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig = serde_json::from_str(
            r#"{"port": 8080, "model_source": "local", "metrics_enabled": false}"#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.model_source, ModelSource::Local);
        assert!(!config.metrics_enabled);
        assert_eq!(config.model_name, "iris-classifier");
    }

    #[test]
    fn test_unknown_source_rejected() {
        let result: Result<ServerConfig, _> = serde_json::from_str(r#"{"model_source": "s3"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let config = ServerConfig {
            max_model_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_names() {
        let mut config = ServerConfig::default();
        assert_eq!(config.build_provider().name(), "fallback");
        config.model_source = ModelSource::Registry;
        assert_eq!(config.build_provider().name(), "registry");
        config.model_source = ModelSource::Local;
        assert_eq!(config.build_provider().name(), "local");
    }
}
