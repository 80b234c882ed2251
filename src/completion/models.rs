//! Model identifier normalisation.
//!
//! The completion endpoint does not accept the newest model family. Such
//! identifiers are mapped onto the closest supported model when the
//! configuration is loaded.

/// How a rule matches a requested model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPattern {
    /// The identifier must equal this string.
    Exact(&'static str),
    /// The identifier must start with this family prefix.
    Family(&'static str),
}

/// An unsupported identifier pattern and the model to use instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelFallback {
    /// Which identifiers the rule applies to.
    pub pattern: ModelPattern,
    /// Model sent instead.
    pub fallback: &'static str,
}

/// Fallback rules, checked in order; the first match wins.
pub const MODEL_FALLBACKS: &[ModelFallback] = &[
    ModelFallback {
        pattern: ModelPattern::Exact("gpt-5-mini"),
        fallback: "gpt-4o-mini",
    },
    ModelFallback {
        pattern: ModelPattern::Exact("gpt-5-nano"),
        fallback: "gpt-4o-mini",
    },
    ModelFallback {
        pattern: ModelPattern::Family("gpt-5"),
        fallback: "gpt-4o",
    },
];

impl ModelPattern {
    fn matches(&self, model: &str) -> bool {
        match self {
            ModelPattern::Exact(id) => model == *id,
            ModelPattern::Family(prefix) => model.starts_with(prefix),
        }
    }
}

/// Map `requested` onto a model the endpoint supports.
///
/// Identifiers no rule matches are returned unchanged.
pub fn resolve_model(requested: &str) -> String {
    let requested = requested.trim();
    MODEL_FALLBACKS
        .iter()
        .find(|rule| rule.pattern.matches(requested))
        .map(|rule| rule.fallback.to_string())
        .unwrap_or_else(|| requested.to_string())
}
