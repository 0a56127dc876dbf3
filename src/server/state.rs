//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use crate::config::Settings;
use crate::services::{OpenAiConfig, OpenAiService};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Holds the resources handlers need. Cheaply cloneable via Arc and
/// thread-safe.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// OpenAI API client
    pub openai: Arc<OpenAiService>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);
        let start_time = Instant::now();

        tracing::debug!(
            base_url = ?settings.openai_base_url,
            "Initializing OpenAI client"
        );

        let config = OpenAiConfig::from_settings(&settings)
            .context("OPENAI_API_KEY must be set")?;
        let openai = Arc::new(OpenAiService::new(config)?);

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            settings,
            openai,
            start_time,
        })
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check whether the upstream client is usable
    pub fn check_upstream_health(&self) -> bool {
        self.openai.health_check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_requires_api_key() {
        let settings = Settings::default();
        assert!(AppState::new(settings).is_err());
    }

    #[test]
    fn test_state_creation() {
        let settings = Settings {
            openai_api_key: Some("sk-test".to_string()),
            ..Settings::default()
        };

        let state = AppState::new(settings).unwrap();
        assert!(state.check_upstream_health());
    }
}
