//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides. Config::from_env() also loads a .env
//! file via dotenvy when one exists, so each test sets every variable it
//! asserts on.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use canvas_conversation::config::{Config, LogFormat};
use serial_test::serial;
use std::env;
use std::io::Write;

#[test]
#[serial]
fn test_config_from_env_custom_provider() {
    env::set_var("OPENAI_API_KEY", "sk-test");
    env::set_var("OPENAI_BASE_URL", "https://proxy.example.com");
    env::set_var("MODEL", "gpt-4o");

    let config = Config::from_env().unwrap();
    assert_eq!(config.provider.api_key, "sk-test");
    assert_eq!(config.provider.base_url, "https://proxy.example.com");
    assert_eq!(config.provider.model, "gpt-4o");

    env::remove_var("OPENAI_API_KEY");
    env::remove_var("OPENAI_BASE_URL");
    env::remove_var("MODEL");
}

#[test]
#[serial]
fn test_config_from_env_remaps_unsupported_model() {
    env::set_var("MODEL", "gpt-5-mini");
    let config = Config::from_env().unwrap();
    assert_eq!(config.provider.model, "gpt-4o-mini");
    assert_eq!(config.provider.remapped_from.as_deref(), Some("gpt-5-mini"));

    env::set_var("MODEL", "gpt-5-turbo");
    let config = Config::from_env().unwrap();
    assert_eq!(config.provider.model, "gpt-4o");
    assert_eq!(config.provider.remapped_from.as_deref(), Some("gpt-5-turbo"));

    env::set_var("MODEL", "gpt-4o");
    let config = Config::from_env().unwrap();
    assert_eq!(config.provider.remapped_from, None);

    env::remove_var("MODEL");
}

#[test]
#[serial]
fn test_config_from_env_generation_limits() {
    env::set_var("TEMPERATURE", "0.2");
    env::set_var("MAX_INPUT_TOKENS", "4000");
    env::set_var("MAX_RESPONSE_TOKENS", "512");
    env::set_var("MAX_DEPTH", "3");
    env::set_var("SYSTEM_PROMPT", "You are terse.");

    let config = Config::from_env().unwrap();
    assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.generation.max_input_tokens, 4000);
    assert_eq!(config.generation.max_response_tokens, 512);
    assert_eq!(config.generation.max_depth, 3);
    assert_eq!(config.generation.system_prompt, "You are terse.");

    env::remove_var("TEMPERATURE");
    env::remove_var("MAX_INPUT_TOKENS");
    env::remove_var("MAX_RESPONSE_TOKENS");
    env::remove_var("MAX_DEPTH");
    env::remove_var("SYSTEM_PROMPT");
}

#[test]
#[serial]
fn test_config_from_env_invalid_number_is_error() {
    env::set_var("MAX_INPUT_TOKENS", "lots");

    let result = Config::from_env();
    assert!(result.is_err(), "Malformed limits should be rejected");
    assert!(result.unwrap_err().to_string().contains("MAX_INPUT_TOKENS"));

    env::remove_var("MAX_INPUT_TOKENS");
}

#[test]
#[serial]
fn test_config_from_env_empty_number_uses_default() {
    env::set_var("MAX_DEPTH", "");

    let config = Config::from_env().unwrap();
    assert_eq!(config.generation.max_depth, 0);

    env::remove_var("MAX_DEPTH");
}

#[test]
#[serial]
fn test_config_from_env_actions_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"id": "eli5", "name": "ELI5", "prompt": "Explain like I'm five."}}]"#
    )
    .unwrap();
    env::set_var("ACTIONS_FILE", file.path());

    let config = Config::from_env().unwrap();
    assert_eq!(config.actions.len(), 1);
    assert_eq!(config.action("eli5").unwrap().name, "ELI5");
    assert!(config.action("summarize").is_none());

    env::remove_var("ACTIONS_FILE");
}

#[test]
#[serial]
fn test_config_from_env_builtin_actions_by_default() {
    env::remove_var("ACTIONS_FILE");

    let config = Config::from_env().unwrap();
    assert!(config.action("summarize").is_some());
    assert!(config.action("critique").is_some());
    assert!(config.action("expand").is_some());
}

#[test]
#[serial]
fn test_config_from_env_request_timeout() {
    env::set_var("REQUEST_TIMEOUT_MS", "15000");
    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, Some(15000));

    env::remove_var("REQUEST_TIMEOUT_MS");
    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, None);
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    env::set_var("LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::remove_var("LOG_FORMAT");
}

#[test]
#[serial]
fn test_config_from_env_debug_forces_debug_level() {
    env::set_var("LOG_LEVEL", "warn");
    env::set_var("DEBUG", "true");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.level, "debug");

    env::remove_var("DEBUG");
    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.level, "warn");

    env::remove_var("LOG_LEVEL");
}
