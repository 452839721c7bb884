//! Algorithm registry: descriptors paired with runnable bodies.
//!
//! Descriptors arrive pre-parsed from an external source (metadata loading is
//! out of scope); the registry only indexes them by id and resolves name
//! lists at setup time, so a misspelled algorithm name fails before any
//! ordering work starts. Converters — low-priority format adapters — live in
//! their own pool.

use crate::error::{BodyError, PlanError};
use crate::models::AlgorithmDescriptor;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The accumulating type-id → value state of one execution run.
pub type TypeMapping = HashMap<String, Value>;

/// The runnable side of an algorithm.
///
/// Bodies are pure with respect to the type map: they read declared inputs
/// from it and return newly produced values (or `None` for producers of
/// tokens/side effects only). Explicit lookup-and-bind — no injection.
pub trait AlgorithmBody {
    /// Runs the algorithm against the current state.
    fn run(&self, state: &TypeMapping) -> Result<Option<HashMap<String, Value>>, BodyError>;
}

impl<F> AlgorithmBody for F
where
    F: Fn(&TypeMapping) -> Result<Option<HashMap<String, Value>>, BodyError>,
{
    fn run(&self, state: &TypeMapping) -> Result<Option<HashMap<String, Value>>, BodyError> {
        self(state)
    }
}

#[derive(Clone)]
struct RegisteredAlgorithm {
    descriptor: AlgorithmDescriptor,
    body: Arc<dyn AlgorithmBody>,
}

/// Indexes registered algorithms by id.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: HashMap<String, RegisteredAlgorithm>,
    converter_order: Vec<String>,
}

impl AlgorithmRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an algorithm. A later registration with the same id replaces
    /// the earlier one.
    pub fn register<B: AlgorithmBody + 'static>(
        &mut self,
        descriptor: AlgorithmDescriptor,
        body: B,
    ) {
        self.algorithms.insert(
            descriptor.id.clone(),
            RegisteredAlgorithm {
                descriptor,
                body: Arc::new(body),
            },
        );
    }

    /// Registers a converter: a format adapter scheduled only when nothing
    /// else supplies a required output.
    pub fn register_converter<B: AlgorithmBody + 'static>(
        &mut self,
        descriptor: AlgorithmDescriptor,
        body: B,
    ) {
        self.converter_order.push(descriptor.id.clone());
        self.register(descriptor, body);
    }

    /// Looks up one descriptor.
    pub fn descriptor(&self, id: &str) -> Option<&AlgorithmDescriptor> {
        self.algorithms.get(id).map(|a| &a.descriptor)
    }

    /// Looks up one body.
    pub fn body(&self, id: &str) -> Option<Arc<dyn AlgorithmBody>> {
        self.algorithms.get(id).map(|a| Arc::clone(&a.body))
    }

    /// Resolves a name list to descriptors, preserving list order.
    ///
    /// Fails with [`PlanError::UnknownAlgorithm`] on the first name that has
    /// no registered descriptor.
    pub fn descriptors_for<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<AlgorithmDescriptor>, PlanError> {
        names
            .iter()
            .map(|name| {
                self.descriptor(name.as_ref())
                    .cloned()
                    .ok_or_else(|| PlanError::UnknownAlgorithm(name.as_ref().to_string()))
            })
            .collect()
    }

    /// All converter descriptors, in registration order.
    pub fn converters(&self) -> Vec<AlgorithmDescriptor> {
        self.converter_order
            .iter()
            .filter_map(|id| self.descriptor(id).cloned())
            .collect()
    }
}

impl std::fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.algorithms.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("AlgorithmRegistry")
            .field("algorithms", &ids)
            .field("converters", &self.converter_order)
            .finish()
    }
}
