//! Unit tests for completion wire types.
//!
//! Tests request serialization, option flattening, message constructors
//! and reply shape decoding.

use super::*;
use crate::config::GenerationConfig;
use pretty_assertions::assert_eq;
use serde_json::json;

// Message tests
#[test]
fn test_message_system() {
    let msg = Message::system("You are a helpful assistant");
    assert_eq!(msg.role, MessageRole::System);
    assert_eq!(msg.text(), Some("You are a helpful assistant"));
}

#[test]
fn test_message_user() {
    let msg = Message::user("Hello, world!");
    assert_eq!(msg.role, MessageRole::User);
    assert_eq!(msg.text(), Some("Hello, world!"));
    assert!(!msg.is_image());
}

#[test]
fn test_message_assistant() {
    let msg = Message::assistant("Hi there!");
    assert_eq!(msg.role, MessageRole::Assistant);
    assert_eq!(msg.text(), Some("Hi there!"));
}

#[test]
fn test_message_image() {
    let msg = Message::image("data:image/png;base64,AAAA");
    assert_eq!(msg.role, MessageRole::User);
    assert!(msg.is_image());
    assert_eq!(msg.text(), None);
}

#[test]
fn test_text_message_serializes_as_string() {
    let value = serde_json::to_value(Message::user("hi")).unwrap();
    assert_eq!(value, json!({"role": "user", "content": "hi"}));
}

#[test]
fn test_image_message_serializes_as_parts() {
    let value = serde_json::to_value(Message::image("data:image/png;base64,AAAA")).unwrap();
    assert_eq!(
        value,
        json!({
            "role": "user",
            "content": [{"type": "input_image", "image_url": "data:image/png;base64,AAAA"}]
        })
    );
}

#[test]
fn test_message_deserializes_both_content_forms() {
    let text: Message = serde_json::from_value(json!({"role": "assistant", "content": "ok"})).unwrap();
    assert_eq!(text, Message::assistant("ok"));

    let image: Message = serde_json::from_value(json!({
        "role": "user",
        "content": [{"type": "input_image", "image_url": "data:image/gif;base64,R0"}]
    }))
    .unwrap();
    assert_eq!(image, Message::image("data:image/gif;base64,R0"));
}

// CompletionRequest tests
#[test]
fn test_request_without_options() {
    let req = CompletionRequest::new("gpt-4o-mini", vec![Message::user("test")]);
    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(
        value,
        json!({
            "input": [{"role": "user", "content": "test"}],
            "model": "gpt-4o-mini"
        })
    );
}

#[test]
fn test_request_options_are_flattened() {
    let options = CompletionOptions::default()
        .with_max_tokens(256)
        .with_temperature(0.5)
        .with_top_p(0.9)
        .with_frequency_penalty(0.25)
        .with_presence_penalty(0.5)
        .with_stop(vec!["END".to_string()]);
    let req = CompletionRequest::new("gpt-4o", vec![]).with_options(options);
    let value = serde_json::to_value(&req).unwrap();

    assert_eq!(value["model"], "gpt-4o");
    assert_eq!(value["input"], json!([]));
    assert_eq!(value["max_tokens"], 256);
    assert_eq!(value["temperature"], 0.5);
    assert_eq!(value["top_p"].as_f64().map(|v| (v * 100.0).round()), Some(90.0));
    assert_eq!(value["frequency_penalty"], 0.25);
    assert_eq!(value["presence_penalty"], 0.5);
    assert_eq!(value["stop"], json!(["END"]));
}

#[test]
fn test_options_from_config() {
    let mut config = GenerationConfig {
        temperature: 0.25,
        ..GenerationConfig::default()
    };
    let options = CompletionOptions::from_config(&config);
    assert_eq!(options.temperature, Some(0.25));
    assert_eq!(options.max_tokens, None);

    config.max_response_tokens = 512;
    let options = CompletionOptions::from_config(&config);
    assert_eq!(options.max_tokens, Some(512));
}

// ReplyShape tests
#[test]
fn test_reply_shape_order_prefers_inline() {
    let body = json!({
        "content": [{"type": "output_text", "text": "inline"}],
        "output_text": "flat"
    });
    let shape = ReplyShape::decode(&body).unwrap();
    assert!(matches!(shape, ReplyShape::Inline(_)));
    assert_eq!(shape.text(), "inline");
}

#[test]
fn test_reply_shape_nested_concatenates_items() {
    let body = json!({
        "output": [
            {"content": [{"type": "output_text", "text": "one "}]},
            {"type": "function_call"},
            {"content": [{"type": "output_text", "text": "two"}]}
        ]
    });
    let shape = ReplyShape::decode(&body).unwrap();
    assert!(matches!(shape, ReplyShape::Nested(_)));
    assert_eq!(shape.text(), "one two");
}

#[test]
fn test_reply_shape_flat() {
    let shape = ReplyShape::decode(&json!({"output_text": "flat"})).unwrap();
    assert!(matches!(shape, ReplyShape::Flat(_)));
    assert_eq!(shape.text(), "flat");
}

#[test]
fn test_reply_shape_ignores_non_text_parts() {
    let body = json!({"content": [
        {"type": "reasoning", "text": "hidden"},
        {"type": "output_text", "text": "visible"}
    ]});
    assert_eq!(ReplyShape::decode(&body).unwrap().text(), "visible");
}

#[test]
fn test_reply_shape_unknown() {
    assert!(ReplyShape::decode(&json!({"choices": [{"message": {}}]})).is_err());
    assert!(ReplyShape::decode(&json!("just a string")).is_err());
    assert!(ReplyShape::decode(&json!({"output_text": 42})).is_err());
}
