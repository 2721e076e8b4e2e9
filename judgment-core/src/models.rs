//! Recognized judge-model identifiers.

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Model names the backend accepts verbatim.
pub const RECOGNIZED_MODELS: &[&str] = &[
    // OpenAI
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4.1",
    "gpt-4.1-mini",
    "gpt-4.1-nano",
    "gpt-4-turbo",
    "o1",
    "o1-mini",
    "o3",
    "o3-mini",
    "o4-mini",
    // Anthropic
    "claude-3-5-sonnet-latest",
    "claude-3-5-haiku-latest",
    "claude-3-7-sonnet-latest",
    "claude-3-opus-latest",
    // Google
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-2.0-flash",
    "gemini-2.5-pro",
    // Meta (Together-hosted)
    "meta-llama/Llama-3.3-70B-Instruct-Turbo",
    "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo",
    "Qwen/Qwen2.5-72B-Instruct-Turbo",
    "mistralai/Mixtral-8x22B-Instruct-v0.1",
];

/// Families accepted by prefix, covering dated snapshot names the exact
/// table would otherwise miss (e.g. `gpt-4o-2024-11-20`).
const RECOGNIZED_PREFIXES: &[&str] = &["gpt-", "o1-", "o3-", "o4-", "claude-", "gemini-"];

/// Whether the backend will accept this model identifier.
pub fn is_recognized_model(name: &str) -> bool {
    RECOGNIZED_MODELS.contains(&name)
        || RECOGNIZED_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
}

/// The judge model(s) an evaluation run scores with.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSpec {
    /// One judge model.
    Single(String),
    /// Several judge models whose outputs are combined by an aggregator
    /// model.
    Multiple(Vec<String>),
    /// A handle to a caller-managed external judge. Runs using one must
    /// carry only local scorers; there is nothing for the backend to call.
    Judge(String),
}

impl ModelSpec {
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    /// Every model name this spec mentions.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) | Self::Judge(name) => vec![name.as_str()],
            Self::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple(_))
    }

    pub fn is_judge(&self) -> bool {
        matches!(self, Self::Judge(_))
    }
}

// Wire shape: a string for single/judge models, an array for lists.
impl Serialize for ModelSpec {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Single(name) | Self::Judge(name) => ser.serialize_str(name),
            Self::Multiple(names) => {
                let mut seq = ser.serialize_seq(Some(names.len()))?;
                for name in names {
                    seq.serialize_element(name)?;
                }
                seq.end()
            }
        }
    }
}
