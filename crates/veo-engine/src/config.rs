//! Engine configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use veo_client::{DaydreamsProvider, GoogleProvider, PlannerClient, VideoProvider};
use veo_store::StorageLayout;

use crate::error::{EngineError, EngineResult};

/// Which remote backend generates videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    Daydreams,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Daydreams => "daydreams",
        }
    }
}

/// Engine configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Selected generation backend
    pub provider: ProviderKind,
    /// Google API key (generation and planning)
    pub gemini_api_key: Option<String>,
    /// Daydreams Router API key
    pub daydreams_api_key: Option<String>,
    /// Daydreams Router base URL override
    pub daydreams_base_url: Option<String>,
    /// Output directory override
    pub output_dir: Option<PathBuf>,
    /// Sleep between provider probes in blocking generation loops
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Google,
            gemini_api_key: None,
            daydreams_api_key: None,
            daydreams_base_url: None,
            output_dir: None,
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables (`.env` honored).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let provider = match std::env::var("VEO_PROVIDER")
            .unwrap_or_default()
            .trim()
            .to_lowercase()
            .as_str()
        {
            "daydreams" => ProviderKind::Daydreams,
            _ => ProviderKind::Google,
        };

        let poll_interval = std::env::var("VEO_POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|secs| secs.max(2))
            .unwrap_or(5);

        Self {
            provider,
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            daydreams_api_key: std::env::var("DAYDREAMS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            daydreams_base_url: std::env::var("DAYDREAMS_BASE_URL").ok(),
            output_dir: std::env::var("VEO_OUTPUT_DIR").ok().map(PathBuf::from),
            poll_interval: Duration::from_secs(poll_interval),
        }
    }

    /// Whether the selected provider has an API key configured.
    pub fn api_key_present(&self) -> bool {
        match self.provider {
            ProviderKind::Google => self.gemini_api_key.is_some(),
            ProviderKind::Daydreams => self.daydreams_api_key.is_some(),
        }
    }

    /// Construct the configured generation provider.
    pub fn build_provider(&self) -> EngineResult<Arc<dyn VideoProvider>> {
        match self.provider {
            ProviderKind::Google => {
                let key = self.gemini_api_key.as_deref().ok_or_else(|| {
                    EngineError::config_error("GEMINI_API_KEY not set")
                })?;
                Ok(Arc::new(GoogleProvider::new(key)?))
            }
            ProviderKind::Daydreams => {
                let key = self.daydreams_api_key.as_deref().ok_or_else(|| {
                    EngineError::config_error("DAYDREAMS_API_KEY not set")
                })?;
                let provider = match &self.daydreams_base_url {
                    Some(base) => DaydreamsProvider::with_base_url(key, base)?,
                    None => DaydreamsProvider::new(key)?,
                };
                Ok(Arc::new(provider))
            }
        }
    }

    /// Construct the Gemini scene-planner client.
    pub fn build_planner(&self) -> EngineResult<PlannerClient> {
        let key = self
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| EngineError::config_error("GEMINI_API_KEY not set"))?;
        Ok(PlannerClient::new(key)?)
    }

    /// Construct the output layout.
    pub fn build_layout(&self) -> EngineResult<StorageLayout> {
        let layout = match &self.output_dir {
            Some(dir) => StorageLayout::new(dir)?,
            None => StorageLayout::from_env()?,
        };
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.provider, ProviderKind::Google);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(!config.api_key_present());
    }

    #[test]
    fn test_provider_requires_key() {
        let config = EngineConfig::default();
        assert!(matches!(
            config.build_provider(),
            Err(EngineError::ConfigError(_))
        ));
    }
}
