use thiserror::Error;

/// Problems with a rule table or numeric parameters, detected before any
/// generation starts. Never recovered from.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("malformed repeat notation in {text:?}: {reason}")]
    MalformedRepeat { text: String, reason: &'static str },

    #[error("repeat count must be a positive integer in {text:?}")]
    NonPositiveRepeat { text: String },

    #[error("digit at offset {offset} in {text:?} does not follow a letter")]
    StrayDigit { text: String, offset: usize },

    #[error("rule predecessor {text:?} must be exactly one symbol")]
    InvalidPredecessor { text: String },

    #[error("rule for {predecessor:?} has weight {weight}, expected a finite value > 0")]
    InvalidWeight { predecessor: String, weight: f32 },

    #[error("context pattern {text:?} may not contain branch brackets")]
    BracketInContext { text: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("YAML parse error: {0}")]
    Yaml(String),
}

impl ConfigError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// The symbol sequence does not describe a well-formed branch structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("unbalanced brackets: `]` at position {position} closes no open branch")]
    UnbalancedClose { position: usize },
}

/// Failure of a whole grammar → skeleton → mesh run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Structure(#[from] StructureError),
}
