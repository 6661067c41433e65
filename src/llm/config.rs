//! Provider configuration

use super::{ChatProvider, GeminiProvider, LoggingProvider};
use std::sync::Arc;

pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the chat provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            api_key: non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")),
            model: non_empty("MINDSETU_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            base_url: non_empty("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        }
    }
}

/// Build the configured provider, wrapped with logging.
///
/// Returns `None` when no API key is configured; chat is then permanently
/// unavailable for the lifetime of the process.
pub fn build_provider(config: &LlmConfig) -> Option<Arc<dyn ChatProvider>> {
    let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
        tracing::warn!("Gemini API key is not configured. Chat will be unavailable.");
        return None;
    };

    match GeminiProvider::new(api_key.to_string(), &config.base_url) {
        Ok(provider) => Some(Arc::new(LoggingProvider::new(Arc::new(provider)))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize Gemini provider");
            None
        }
    }
}
