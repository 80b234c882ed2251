use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::completion::resolve_model;
use crate::error::AppError;
use crate::prompts::{builtin_actions, DEFAULT_SYSTEM_PROMPT};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Completion endpoint settings.
    pub provider: ProviderConfig,
    /// Conversation and sampling settings.
    pub generation: GenerationConfig,
    /// Actions offered to the user.
    pub actions: Vec<Action>,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// HTTP transport settings.
    pub request: RequestConfig,
}

/// Completion endpoint configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key; may be empty, in which case generation is refused.
    pub api_key: String,
    /// Endpoint base URL, without the `/v1/responses` path.
    pub base_url: String,
    /// Model identifier after normalisation against the supported table.
    pub model: String,
    /// Model named in the environment, when normalisation replaced it.
    pub remapped_from: Option<String>,
}

/// Conversation building and sampling configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Input token cap for the ancestor conversation; 0 means unlimited.
    pub max_input_tokens: usize,
    /// Output token cap sent with the request; 0 leaves it to the endpoint.
    pub max_response_tokens: u32,
    /// Maximum ancestor depth walked; 0 means unlimited.
    pub max_depth: usize,
    /// System prompt used when no ancestor overrides it (may be empty).
    pub system_prompt: String,
}

/// A named prompt that can be appended to a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Stable identifier used to select the action.
    pub id: String,
    /// Display name, also used as the reply edge label.
    pub name: String,
    /// Prompt appended to the conversation.
    pub prompt: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive for `EnvFilter`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Client-side timeout; `None` leaves requests unbounded.
    pub timeout_ms: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let requested_model = env::var("MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let model = resolve_model(&requested_model);
        let remapped_from = (model != requested_model.trim()).then_some(requested_model);

        let provider = ProviderConfig {
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model,
            remapped_from,
        };

        let generation = GenerationConfig {
            temperature: parse_var("TEMPERATURE")?.unwrap_or(1.0),
            max_input_tokens: parse_var("MAX_INPUT_TOKENS")?.unwrap_or(0),
            max_response_tokens: parse_var("MAX_RESPONSE_TOKENS")?.unwrap_or(0),
            max_depth: parse_var("MAX_DEPTH")?.unwrap_or(0),
            system_prompt: env::var("SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string()),
        };

        let actions = match env::var("ACTIONS_FILE") {
            Ok(path) => load_actions(Path::new(&path))?,
            Err(_) => builtin_actions(),
        };

        let debug = env::var("DEBUG")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let logging = LoggingConfig {
            level: if debug {
                "debug".to_string()
            } else {
                env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
            },
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: parse_var("REQUEST_TIMEOUT_MS")?,
        };

        Ok(Config {
            provider,
            generation,
            actions,
            logging,
            request,
        })
    }

    /// Log the model remap, if any.
    ///
    /// Called once logging is initialised, since configuration is loaded
    /// before the subscriber exists.
    pub fn warn_remapped_model(&self) {
        if let Some(requested) = &self.provider.remapped_from {
            warn!(
                requested = %requested,
                model = %self.provider.model,
                "Model is not supported by the completion endpoint, using fallback"
            );
        }
    }

    /// Look up an action by id
    pub fn action(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }
}

/// Parse an optional numeric environment variable.
///
/// A present but malformed value is a configuration error rather than a
/// silent fallback to the default.
fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, AppError> {
    match env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config {
                message: format!("{} has an invalid value: {}", name, raw),
            }),
        Err(_) => Ok(None),
    }
}

/// Load the action list from a JSON file containing an array of actions.
pub fn load_actions(path: &Path) -> Result<Vec<Action>, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| AppError::Config {
        message: format!("Failed to read actions file {}: {}", path.display(), e),
    })?;
    let actions: Vec<Action> = serde_json::from_str(&raw).map_err(|e| AppError::Config {
        message: format!("Invalid actions file {}: {}", path.display(), e),
    })?;

    if let Some(action) = actions.iter().find(|a| a.id.trim().is_empty()) {
        return Err(AppError::Config {
            message: format!("Action '{}' has an empty id", action.name),
        });
    }

    Ok(actions)
}

impl Action {
    /// Create a new action
    pub fn new(id: impl Into<String>, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prompt: prompt.into(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_input_tokens: 0,
            max_response_tokens: 0,
            max_depth: 0,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_generation_config_default_is_unlimited() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_input_tokens, 0);
        assert_eq!(config.max_response_tokens, 0);
        assert_eq!(config.max_depth, 0);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_load_actions_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "tldr", "name": "TL;DR", "prompt": "One sentence please."}}]"#
        )
        .unwrap();

        let actions = load_actions(file.path()).unwrap();
        assert_eq!(actions, vec![Action::new("tldr", "TL;DR", "One sentence please.")]);
    }

    #[test]
    fn test_load_actions_rejects_empty_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": " ", "name": "Blank", "prompt": "x"}}]"#).unwrap();

        let result = load_actions(file.path());
        assert!(matches!(result, Err(AppError::Config { .. })));
    }

    #[test]
    fn test_load_actions_missing_file() {
        let result = load_actions(Path::new("/nonexistent/actions.json"));
        assert!(matches!(result, Err(AppError::Config { .. })));
    }
}
