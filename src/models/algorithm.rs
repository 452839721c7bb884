//! Algorithm descriptor: the declared contract of one unit of work.
//!
//! Immutable once built. The resolver reads these contracts to deduce an
//! execution order; the executor uses them to bind inputs and record
//! provenance. The implementation behind a descriptor lives in the registry.

use serde::{Deserialize, Serialize};

use super::{InputDescriptor, Token};

/// The input/output/token contract of one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmDescriptor {
    /// Unique algorithm identifier.
    pub id: String,
    /// Inputs that must be available before the algorithm may run.
    pub required_inputs: Vec<InputDescriptor>,
    /// Inputs used when available but never blocking on their own.
    pub optional_inputs: Vec<InputDescriptor>,
    /// Tokens that must be complete before the algorithm may run.
    pub required_tokens: Vec<Token>,
    /// Tokens consumed when complete but not strictly required.
    pub optional_tokens: Vec<Token>,
    /// Type ids this algorithm produces.
    pub outputs: Vec<String>,
    /// Tokens this algorithm marks complete.
    pub generated_tokens: Vec<Token>,
}

impl AlgorithmDescriptor {
    /// Creates a descriptor with the given id and an empty contract.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            required_inputs: Vec::new(),
            optional_inputs: Vec::new(),
            required_tokens: Vec::new(),
            optional_tokens: Vec::new(),
            outputs: Vec::new(),
            generated_tokens: Vec::new(),
        }
    }

    /// Adds a required input.
    pub fn with_required_input(mut self, input: InputDescriptor) -> Self {
        self.required_inputs.push(input);
        self
    }

    /// Adds an optional input.
    pub fn with_optional_input(mut self, input: InputDescriptor) -> Self {
        self.optional_inputs.push(input);
        self
    }

    /// Adds a required input token.
    pub fn with_required_token(mut self, token: Token) -> Self {
        self.required_tokens.push(token);
        self
    }

    /// Adds an optional input token.
    pub fn with_optional_token(mut self, token: Token) -> Self {
        self.optional_tokens.push(token);
        self
    }

    /// Adds a produced output type id.
    pub fn with_output(mut self, type_id: impl Into<String>) -> Self {
        self.outputs.push(type_id.into());
        self
    }

    /// Adds a generated token.
    pub fn with_generated_token(mut self, token: Token) -> Self {
        self.generated_tokens.push(token);
        self
    }
}
