//! Provenance capture: what each executed algorithm saw and produced.
//!
//! One record per executed algorithm: which input alternative was resolved
//! (or missing), the shape of each produced value, and token state. Shapes
//! summarize values without embedding payloads, so records stay small.
//!
//! Records are written through a [`ProvenanceSink`]; the bundled sink emits
//! one JSON object per line.

use crate::ledger::TokenLedger;
use crate::models::{AlgorithmDescriptor, Token};
use crate::registry::TypeMapping;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, Write};

/// Resolution of one declared input at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStatus {
    /// Input name.
    pub name: String,
    /// Acceptable type ids, in declaration order.
    pub alternatives: Vec<String>,
    /// The type id that was actually bound, with its value shape.
    /// `None` when no alternative was present.
    pub resolved: Option<ResolvedInput>,
}

/// The alternative an input resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInput {
    /// Bound type id.
    pub type_id: String,
    /// Shape summary of the bound value.
    pub shape: String,
}

/// Presence of one declared token at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatus {
    /// The declared token.
    pub token: Token,
    /// Whether it was complete when the algorithm ran.
    pub complete: bool,
}

/// Shape of one produced output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputShape {
    /// Declared output type id.
    pub type_id: String,
    /// Shape summary, or `None` when the algorithm produced nothing for it.
    pub shape: Option<String>,
}

/// Everything recorded about one algorithm execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// The executed algorithm.
    pub algorithm_id: String,
    /// Required input resolution.
    pub required_inputs: Vec<InputStatus>,
    /// Optional input resolution.
    pub optional_inputs: Vec<InputStatus>,
    /// Required token presence.
    pub required_tokens: Vec<TokenStatus>,
    /// Optional token presence.
    pub optional_tokens: Vec<TokenStatus>,
    /// Declared outputs and the shapes actually produced.
    pub outputs: Vec<OutputShape>,
    /// Tokens the algorithm generates.
    pub generated_tokens: Vec<Token>,
}

impl ProvenanceRecord {
    /// Captures a record from the state surrounding one execution.
    ///
    /// `state` is the type map before merging `results`; `results` is what
    /// the algorithm returned.
    pub fn capture(
        descriptor: &AlgorithmDescriptor,
        state: &TypeMapping,
        results: Option<&HashMap<String, Value>>,
        ledger: &TokenLedger,
    ) -> Self {
        let input_status = |inputs: &[crate::models::InputDescriptor]| {
            inputs
                .iter()
                .map(|input| {
                    let alternatives = input.accepted_types();
                    let resolved = alternatives
                        .iter()
                        .find_map(|type_id| {
                            state.get(type_id).map(|value| ResolvedInput {
                                type_id: type_id.clone(),
                                shape: value_shape(value),
                            })
                        });
                    InputStatus {
                        name: input.name(),
                        alternatives,
                        resolved,
                    }
                })
                .collect()
        };
        let token_status = |tokens: &[Token]| {
            tokens
                .iter()
                .map(|token| TokenStatus {
                    token: token.clone(),
                    complete: ledger.is_complete(token),
                })
                .collect()
        };

        Self {
            algorithm_id: descriptor.id.clone(),
            required_inputs: input_status(&descriptor.required_inputs),
            optional_inputs: input_status(&descriptor.optional_inputs),
            required_tokens: token_status(&descriptor.required_tokens),
            optional_tokens: token_status(&descriptor.optional_tokens),
            outputs: descriptor
                .outputs
                .iter()
                .map(|type_id| OutputShape {
                    type_id: type_id.clone(),
                    shape: results
                        .and_then(|r| r.get(type_id))
                        .map(value_shape),
                })
                .collect(),
            generated_tokens: descriptor.generated_tokens.clone(),
        }
    }
}

/// Summarizes a value without embedding its payload.
pub fn value_shape(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("str(len={})", s.len()),
        Value::Array(items) if items.is_empty() => "empty list".to_string(),
        Value::Array(items) => format!("list(len={})", items.len()),
        Value::Object(map) if map.is_empty() => "empty map".to_string(),
        Value::Object(map) => format!("map(len={})", map.len()),
    }
}

/// Receives one record per executed algorithm.
pub trait ProvenanceSink {
    /// Appends one record. Failures are logged by the executor and never
    /// abort the run.
    fn record(&mut self, record: &ProvenanceRecord) -> io::Result<()>;
}

/// Writes records as JSON lines.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwraps the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProvenanceSink for JsonLinesSink<W> {
    fn record(&mut self, record: &ProvenanceRecord) -> io::Result<()> {
        let line = serde_json::to_string(record).map_err(io::Error::other)?;
        writeln!(self.writer, "{line}")
    }
}
