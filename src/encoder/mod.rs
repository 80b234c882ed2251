//! Token encoding for budget accounting.
//!
//! Wraps a `tiktoken-rs` BPE for the configured model. Unknown model names
//! fall back to the `cl100k_base` encoding with a warning instead of
//! failing the caller.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;
use tracing::warn;

use crate::error::{EncoderError, EncoderResult};

/// Encoding used when the model name is not recognised.
pub const FALLBACK_ENCODING: &str = "cl100k_base";

/// Tokenizer bound to a model.
#[derive(Clone)]
pub struct Encoder {
    bpe: Arc<CoreBPE>,
    model: String,
}

/// Text cut to fit a token allowance, with its re-encoded token count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    /// Kept prefix.
    pub text: String,
    /// Token count of the kept prefix.
    pub tokens: usize,
}

impl Encoder {
    /// Resolve the encoding for `model`, falling back to `cl100k_base`.
    pub fn for_model(model: &str) -> EncoderResult<Self> {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(e) => {
                warn!(
                    model = %model,
                    encoding = FALLBACK_ENCODING,
                    error = %e,
                    "No tokenizer for model, using fallback encoding"
                );
                tiktoken_rs::cl100k_base().map_err(|e| EncoderError::Load {
                    encoding: FALLBACK_ENCODING.to_string(),
                    message: e.to_string(),
                })?
            }
        };

        Ok(Self {
            bpe: Arc::new(bpe),
            model: model.to_string(),
        })
    }

    /// Model name this encoder was requested for.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Encode text into tokens.
    pub fn encode(&self, text: &str) -> Vec<usize> {
        self.bpe.encode_with_special_tokens(text)
    }

    /// Decode tokens back into text.
    ///
    /// Fails when the tokens end in the middle of a multi-byte character.
    pub fn decode(&self, tokens: &[usize]) -> EncoderResult<String> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| EncoderError::Decode {
                tokens: tokens.len(),
                message: e.to_string(),
            })
    }

    /// Number of tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Cut `text` so that it encodes to at most `max_tokens` tokens.
    ///
    /// The decoded token prefix is only used to find a character count; the
    /// original string is sliced at that many characters, so the result is
    /// always a prefix of `text` on a character boundary.
    pub fn truncate(&self, text: &str, max_tokens: usize) -> Truncation {
        let tokens = self.encode(text);
        if tokens.len() <= max_tokens {
            return Truncation {
                text: text.to_string(),
                tokens: tokens.len(),
            };
        }

        let mut prefix = max_tokens;
        while prefix > 0 {
            if let Ok(decoded) = self.decode(&tokens[..prefix]) {
                let kept = take_chars(text, decoded.chars().count());
                let count = self.count(kept);
                if count <= max_tokens {
                    return Truncation {
                        text: kept.to_string(),
                        tokens: count,
                    };
                }
            }
            prefix -= 1;
        }

        Truncation {
            text: String::new(),
            tokens: 0,
        }
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder").field("model", &self.model).finish()
    }
}

/// First `n` characters of `text`.
fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> Encoder {
        Encoder::for_model("gpt-4").expect("cl100k encoder")
    }

    #[test]
    fn test_round_trip_reconstructs_text() {
        let enc = encoder();
        for text in [
            "",
            "Hello, world!",
            "Ünïcödé and emoji 🦀🦀 mixed with 漢字",
            "  leading and trailing whitespace \n\n",
        ] {
            let tokens = enc.encode(text);
            assert_eq!(enc.decode(&tokens).unwrap(), text);
        }
    }

    #[test]
    fn test_unknown_model_falls_back() {
        let enc = Encoder::for_model("definitely-not-a-model").expect("fallback encoder");
        assert_eq!(enc.model(), "definitely-not-a-model");
        assert!(enc.count("hello world") > 0);

        let baseline = encoder();
        assert_eq!(
            enc.encode("fallback text"),
            baseline.encode("fallback text")
        );
    }

    #[test]
    fn test_truncate_keeps_text_that_fits() {
        let enc = encoder();
        let text = "short note";
        let cut = enc.truncate(text, 100);
        assert_eq!(cut.text, text);
        assert_eq!(cut.tokens, enc.count(text));
    }

    #[test]
    fn test_truncate_respects_allowance() {
        let enc = encoder();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
        for allowance in [1, 3, 7, 25] {
            let cut = enc.truncate(&text, allowance);
            assert!(cut.tokens <= allowance);
            assert_eq!(cut.tokens, enc.count(&cut.text));
            assert!(text.starts_with(&cut.text));
            assert!(!cut.text.is_empty());
        }
    }

    #[test]
    fn test_truncate_multibyte_text_stays_on_char_boundary() {
        let enc = encoder();
        let text = "🦀漢字🦀漢字🦀漢字🦀漢字🦀漢字";
        for allowance in 0..enc.count(text) {
            let cut = enc.truncate(text, allowance);
            assert!(cut.tokens <= allowance);
            assert!(text.starts_with(&cut.text));
        }
    }

    #[test]
    fn test_truncate_zero_allowance_is_empty() {
        let enc = encoder();
        let cut = enc.truncate("anything at all", 0);
        assert_eq!(cut.text, "");
        assert_eq!(cut.tokens, 0);
    }

    #[test]
    fn test_take_chars() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("héllo", 10), "héllo");
        assert_eq!(take_chars("", 3), "");
    }
}
