//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// Per-endpoint model selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Model for the one-shot completion endpoint
    pub completion: String,
    /// Model for the chat-shaped streaming endpoints
    pub chat: String,
    /// Model for structured-data generation
    pub structured: String,
    /// Image generation model
    pub image: String,
    /// Speech synthesis model
    pub speech: String,
    /// Audio transcription model
    pub transcription: String,
    /// Model used with the hosted web-search tool (Responses API)
    pub web_search: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            completion: "gpt-4.1-nano".to_string(),
            chat: "gpt-5-nano".to_string(),
            structured: "gpt-5-nano".to_string(),
            image: "dall-e-3".to_string(),
            speech: "tts-1".to_string(),
            transcription: "whisper-1".to_string(),
            web_search: "gpt-5-nano".to_string(),
        }
    }
}

/// Options forwarded with image generation requests
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageOptions {
    pub size: String,
    pub quality: String,
    pub style: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            size: "1024x1024".to_string(),
            quality: "hd".to_string(),
            style: "vivid".to_string(),
        }
    }
}

/// Options forwarded with speech synthesis requests
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeechOptions {
    pub voice: String,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            voice: "alloy".to_string(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    // Upstream OpenAI API
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub request_timeout_seconds: u64,

    // Per-endpoint models and options
    pub models: ModelConfig,
    pub image: ImageOptions,
    pub speech: SpeechOptions,

    // Upload limit for the transcription endpoint (bytes)
    pub max_upload_bytes: usize,

    // Debug options
    /// Print all request prompts to stdout
    #[serde(default)]
    pub print_prompts: bool,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let settings = Self {
            // App settings
            app_name: env_or_default("APP_NAME", "ai-playground-server"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),

            // Server settings
            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "3000")
                .parse()
                .context("Invalid PORT value")?,

            // Upstream OpenAI API
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            request_timeout_seconds: env_or_default("REQUEST_TIMEOUT_SECONDS", "120")
                .parse()
                .unwrap_or(120),

            // Models
            models: ModelConfig {
                completion: env_or_default("COMPLETION_MODEL", "gpt-4.1-nano"),
                chat: env_or_default("CHAT_MODEL", "gpt-5-nano"),
                structured: env_or_default("STRUCTURED_DATA_MODEL", "gpt-5-nano"),
                image: env_or_default("IMAGE_MODEL", "dall-e-3"),
                speech: env_or_default("SPEECH_MODEL", "tts-1"),
                transcription: env_or_default("TRANSCRIPTION_MODEL", "whisper-1"),
                web_search: env_or_default("WEB_SEARCH_MODEL", "gpt-5-nano"),
            },

            // Image options
            image: ImageOptions {
                size: env_or_default("IMAGE_SIZE", "1024x1024"),
                quality: env_or_default("IMAGE_QUALITY", "hd"),
                style: env_or_default("IMAGE_STYLE", "vivid"),
            },

            // Speech options
            speech: SpeechOptions {
                voice: env_or_default("SPEECH_VOICE", "alloy"),
            },

            // Uploads (25MB, the upstream transcription limit)
            max_upload_bytes: env_or_default("MAX_UPLOAD_BYTES", "26214400")
                .parse()
                .unwrap_or(26_214_400),

            // Debug options
            print_prompts: env_or_default("PRINT_PROMPTS", "false")
                .parse()
                .unwrap_or(false),
        };

        // Validate settings
        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.request_timeout_seconds == 0 {
            anyhow::bail!("request_timeout_seconds must be > 0");
        }

        if self.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be > 0");
        }

        if self.openai_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; upstream calls will fail");
        }

        Ok(())
    }

    /// Get the server address string (host:port)
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "ai-playground-server".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            openai_api_key: None,
            openai_base_url: None,
            request_timeout_seconds: 120,
            models: ModelConfig::default(),
            image: ImageOptions::default(),
            speech: SpeechOptions::default(),
            max_upload_bytes: 26_214_400,
            print_prompts: false,
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "ai-playground-server");
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.models.image, "dall-e-3");
        assert!(settings.openai_api_key.is_none());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("nope".parse::<Environment>().is_err());
    }

    #[test]
    fn test_server_addr() {
        let settings = Settings::default();
        assert_eq!(settings.server_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let settings = Settings {
            port: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let settings = Settings {
            request_timeout_seconds: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
