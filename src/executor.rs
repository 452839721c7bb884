//! Executor: runs a computed schedule against an accumulating type map.
//!
//! Strictly sequential: each algorithm runs to completion before the next,
//! and the shared type map is mutated one algorithm at a time. Per-algorithm
//! timing and provenance capture are optional; a provenance write failure is
//! logged and the run continues.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ExecutionError, PlanError};
use crate::ledger::TokenLedger;
use crate::models::{AlgorithmDescriptor, Token};
use crate::provenance::{ProvenanceRecord, ProvenanceSink};
use crate::registry::{AlgorithmBody, AlgorithmRegistry, TypeMapping};
use crate::resolver::ExecutionPlan;

/// How long one algorithm took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmTiming {
    /// The timed algorithm.
    pub algorithm_id: String,
    /// Wall-clock execution time.
    pub elapsed: Duration,
    /// Label identifying the run this timing belongs to.
    pub run_label: String,
}

/// Runs scheduled algorithms in order.
pub struct Executor {
    schedule: Vec<(AlgorithmDescriptor, Arc<dyn AlgorithmBody>)>,
    type_mapping: TypeMapping,
    ledger: TokenLedger,
    timings: Vec<AlgorithmTiming>,
    do_timing: bool,
    run_label: String,
    provenance: Option<Box<dyn ProvenanceSink>>,
}

impl Executor {
    /// Binds a plan's algorithms to their registered bodies and seeds the
    /// type map with the initial inputs.
    ///
    /// Fails with [`PlanError::UnknownAlgorithm`] if a scheduled id has no
    /// registered body.
    pub fn new(
        registry: &AlgorithmRegistry,
        plan: &ExecutionPlan,
        inputs: TypeMapping,
    ) -> Result<Self, PlanError> {
        let schedule = plan
            .algorithms
            .iter()
            .map(|descriptor| {
                registry
                    .body(&descriptor.id)
                    .map(|body| (descriptor.clone(), body))
                    .ok_or_else(|| PlanError::UnknownAlgorithm(descriptor.id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut ledger = TokenLedger::new();
        for token in &plan.completed_tokens {
            ledger.mark_complete(token);
        }

        Ok(Self {
            schedule,
            type_mapping: inputs,
            ledger,
            timings: Vec::new(),
            do_timing: true,
            run_label: "mapping".to_string(),
            provenance: None,
        })
    }

    /// Enables or disables per-algorithm timing (enabled by default).
    pub fn with_timing(mut self, enabled: bool) -> Self {
        self.do_timing = enabled;
        self
    }

    /// Sets the label recorded with each timing entry.
    pub fn with_run_label(mut self, label: impl Into<String>) -> Self {
        self.run_label = label.into();
        self
    }

    /// Attaches a provenance sink; one record is appended per executed
    /// algorithm.
    pub fn with_provenance(mut self, sink: Box<dyn ProvenanceSink>) -> Self {
        self.provenance = Some(sink);
        self
    }

    /// Executes the schedule in order.
    ///
    /// An algorithm body failure aborts the run; a provenance write failure
    /// does not.
    pub fn run(&mut self) -> Result<(), ExecutionError> {
        for index in 0..self.schedule.len() {
            let body = Arc::clone(&self.schedule[index].1);
            let timer = self.do_timing.then(Instant::now);

            let results =
                body.run(&self.type_mapping)
                    .map_err(|source| ExecutionError::Algorithm {
                        id: self.schedule[index].0.id.clone(),
                        source,
                    })?;

            let descriptor = &self.schedule[index].0;
            if let Some(sink) = &mut self.provenance {
                let record = ProvenanceRecord::capture(
                    descriptor,
                    &self.type_mapping,
                    results.as_ref(),
                    &self.ledger,
                );
                if let Err(error) = sink.record(&record) {
                    warn!(algorithm = %descriptor.id, %error, "failed to write provenance");
                }
            }

            if let Some(start) = timer {
                let elapsed = start.elapsed();
                info!(algorithm = %descriptor.id, ?elapsed, "algorithm finished");
                self.timings.push(AlgorithmTiming {
                    algorithm_id: descriptor.id.clone(),
                    elapsed,
                    run_label: self.run_label.clone(),
                });
            }

            if let Some(results) = results {
                self.type_mapping.extend(results);
            }
        }
        Ok(())
    }

    /// A produced or initial value by type id.
    pub fn get(&self, type_id: &str) -> Option<&Value> {
        self.type_mapping.get(type_id)
    }

    /// The full type map.
    pub fn all_items(&self) -> &TypeMapping {
        &self.type_mapping
    }

    /// Every token complete for this run.
    pub fn completed_tokens(&self) -> Vec<Token> {
        self.ledger.completed_tokens()
    }

    /// Per-algorithm timings, in execution order.
    pub fn timings(&self) -> &[AlgorithmTiming] {
        &self.timings
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field(
                "schedule",
                &self
                    .schedule
                    .iter()
                    .map(|(d, _)| d.id.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("run_label", &self.run_label)
            .field("do_timing", &self.do_timing)
            .finish()
    }
}
