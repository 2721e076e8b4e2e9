//! The `Example` record: one evaluation case.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// A field that the backend accepts as either a single string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrVec {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for StringOrVec {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for StringOrVec {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for StringOrVec {
    fn from(value: Vec<String>) -> Self {
        Self::Multiple(value)
    }
}

impl StringOrVec {
    /// The single-string view used by scorers that compare plain text.
    /// A multi-part value is joined with newlines.
    pub fn as_text(&self) -> String {
        match self {
            Self::Single(s) => s.clone(),
            Self::Multiple(parts) => parts.join("\n"),
        }
    }
}

/// One evaluation case: input, outputs, and retrieval context.
///
/// Created by the caller, normalized once by the orchestrator at run start
/// (`example_index` is overwritten with the position in the run and
/// `timestamp` is refreshed), read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<StringOrVec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<StringOrVec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_context: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_metadata: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_called: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_tools: Option<Vec<String>>,
    /// Display name; serialized as `"example"` when unset.
    #[serde(serialize_with = "serialize_name", default)]
    pub name: Option<String>,
    /// Globally unique id, generated as a UUIDv4 when not supplied.
    pub example_id: String,
    /// Position within the run. Authoritative only after orchestrator
    /// normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_index: Option<usize>,
    /// RFC3339 creation timestamp, reassigned at run start.
    pub timestamp: String,
    /// Optional link to a distributed trace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

fn serialize_name<S: Serializer>(name: &Option<String>, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(name.as_deref().unwrap_or("example"))
}

impl Example {
    /// Create an example with only the required `input` field set.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            actual_output: None,
            expected_output: None,
            context: None,
            retrieval_context: None,
            additional_metadata: None,
            tools_called: None,
            expected_tools: None,
            name: None,
            example_id: Uuid::new_v4().to_string(),
            example_index: None,
            timestamp: Utc::now().to_rfc3339(),
            trace_id: None,
        }
    }

    pub fn with_actual_output(mut self, output: impl Into<StringOrVec>) -> Self {
        self.actual_output = Some(output.into());
        self
    }

    pub fn with_expected_output(mut self, output: impl Into<StringOrVec>) -> Self {
        self.expected_output = Some(output.into());
        self
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_retrieval_context(mut self, retrieval_context: Vec<String>) -> Self {
        self.retrieval_context = Some(retrieval_context);
        self
    }

    pub fn with_additional_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.additional_metadata = Some(metadata);
        self
    }

    pub fn with_tools_called(mut self, tools: Vec<String>) -> Self {
        self.tools_called = Some(tools);
        self
    }

    pub fn with_expected_tools(mut self, tools: Vec<String>) -> Self {
        self.expected_tools = Some(tools);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Orchestrator bookkeeping: pin the example to its position in the
    /// run and refresh the timestamp. Overwrites any caller-supplied index.
    pub fn normalize(&mut self, index: usize) {
        self.example_index = Some(index);
        self.timestamp = Utc::now().to_rfc3339();
    }
}
