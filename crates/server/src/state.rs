use crate::config::ServerConfig;
use crate::error::ServerResult;
use dashmap::DashMap;
use homologador::{HomologConfig, Homologator};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: API key -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, Instant)>>,

    /// Loaded catalog and matcher (shared across requests)
    pub homologator: Arc<Homologator>,

    /// Prometheus render handle, present when metrics are enabled
    pub prometheus: Option<PrometheusHandle>,

    pub started_at: Instant,
}

impl ServerState {
    /// Loads the pipeline YAML named by `config.pipeline_config` and builds the homologator.
    pub async fn new(config: ServerConfig, prometheus: Option<PrometheusHandle>) -> ServerResult<Self> {
        let pipeline = HomologConfig::from_file(&config.pipeline_config)
            .map_err(homologador::HomologError::from)?;
        let homologator = Homologator::from_config(&pipeline).await?;
        Ok(Self::with_homologator(config, Arc::new(homologator), prometheus))
    }

    /// State around an already built homologator.
    pub fn with_homologator(
        config: ServerConfig,
        homologator: Arc<Homologator>,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            homologator,
            prometheus,
            started_at: Instant::now(),
        }
    }

    /// Check if API key is valid
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Check rate limit for API key
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        // Reset if window has passed
        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
