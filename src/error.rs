//! Error types for planning, execution, and routing.

use crate::models::Token;
use crate::routing::Coord;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Boxed error type returned by algorithm bodies.
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// Errors arising while deducing an execution order.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// A requested algorithm id has no registered descriptor.
    #[error("cannot find algorithm {0}")]
    UnknownAlgorithm(String),

    /// No algorithm is eligible in any search pass while goals remain unmet.
    #[error("unable to deduce a future algorithm to use\n{0}")]
    Unresolvable(Box<ScheduleDiagnostic>),

    /// The loop completed but a required output was never generated.
    #[error("unable to generate required outputs: {}", missing.join(", "))]
    UnreachableOutputs {
        /// The required output type ids that were never produced.
        missing: Vec<String>,
    },
}

/// Errors arising while running a computed schedule.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// An algorithm body returned an error.
    #[error("algorithm {id} failed")]
    Algorithm {
        /// The failing algorithm's id.
        id: String,
        /// The underlying failure.
        #[source]
        source: BodyError,
    },
}

/// Errors arising while building or repairing a routing tree.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// No reconnection path exists between an orphaned subtree and the rest
    /// of the tree.
    #[error("could not find path from {from} to {to}")]
    NoPath {
        /// Root of the orphaned subtree.
        from: Coord,
        /// The node the search was steered towards.
        to: Coord,
    },

    /// The multicast source chip is dead; nothing can be routed.
    #[error("multicast route cannot be sourced from dead chip {0}")]
    DeadSource(Coord),

    /// A repair path revisited a coordinate already in the tree.
    #[error("route repair would revisit {0}")]
    CycleCreated(Coord),
}

/// One unsatisfied input of a stalled algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput {
    /// Parameter name.
    pub name: String,
    /// Acceptable type ids that are not available (really or fake).
    pub unfound: Vec<String>,
    /// Acceptable type ids that are available — present when an alternative
    /// exists but a preferred type is missing.
    pub found: Vec<String>,
    /// Whether the input was declared optional.
    pub optional: bool,
}

/// What a single stalled algorithm is still waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmNeeds {
    /// The stalled algorithm's id.
    pub algorithm_id: String,
    /// Unsatisfied inputs.
    pub missing_inputs: Vec<MissingInput>,
    /// Required tokens not yet complete.
    pub missing_tokens: Vec<Token>,
}

/// Full diagnostic for an unresolvable schedule: what was available, what was
/// still sought, and who could have produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDiagnostic {
    /// Type ids available when the deadlock was detected.
    pub inputs: BTreeSet<String>,
    /// Optional-input type ids treated as perpetually available.
    pub fake_inputs: BTreeSet<String>,
    /// Required output type ids still unsatisfied.
    pub outputs_to_find: BTreeSet<String>,
    /// Tokens genuinely complete.
    pub tokens_complete: Vec<Token>,
    /// Optional tokens completed only in the shadow ledger.
    pub fake_tokens_complete: Vec<Token>,
    /// Required output token names still unsatisfied.
    pub tokens_to_find: BTreeSet<String>,
    /// Required algorithms not yet scheduled.
    pub required_remaining: Vec<String>,
    /// Optional algorithms not yet scheduled.
    pub optional_remaining: Vec<String>,
    /// Algorithms scheduled before the deadlock.
    pub scheduled: Vec<String>,
    /// Which algorithms could produce each output type id.
    pub producers_by_output: BTreeMap<String, Vec<String>>,
    /// Which algorithms could generate each token name.
    pub producers_by_token: BTreeMap<String, Vec<String>>,
    /// Per-algorithm breakdown of unmet inputs and tokens.
    pub unmet: Vec<AlgorithmNeeds>,
}

impl fmt::Display for ScheduleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
            items
                .into_iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }

        writeln!(f, "    Inputs: [{}]", join(&self.inputs))?;
        writeln!(f, "    Fake inputs: [{}]", join(&self.fake_inputs))?;
        writeln!(f, "    Outputs to find: [{}]", join(&self.outputs_to_find))?;
        writeln!(f, "    Tokens complete: [{}]", join(&self.tokens_complete))?;
        writeln!(
            f,
            "    Fake tokens complete: [{}]",
            join(&self.fake_tokens_complete)
        )?;
        writeln!(f, "    Tokens to find: [{}]", join(&self.tokens_to_find))?;
        writeln!(
            f,
            "    Required algorithms remaining: [{}]",
            join(&self.required_remaining)
        )?;
        writeln!(
            f,
            "    Optional algorithms unused: [{}]",
            join(&self.optional_remaining)
        )?;
        writeln!(f, "    Algorithms used: [{}]", join(&self.scheduled))?;
        writeln!(f, "    Producers by output:")?;
        for (output, producers) in &self.producers_by_output {
            writeln!(f, "        {output}: [{}]", join(producers))?;
        }
        writeln!(f, "    Producers by token:")?;
        for (token, producers) in &self.producers_by_token {
            writeln!(f, "        {token}: [{}]", join(producers))?;
        }
        writeln!(f, "    Inputs required per algorithm:")?;
        for needs in &self.unmet {
            write!(f, "        {}: [", needs.algorithm_id)?;
            let mut separator = "";
            for missing in &needs.missing_inputs {
                write!(
                    f,
                    "{separator}{} wants [{}]{}",
                    missing.name,
                    join(&missing.unfound),
                    if missing.optional { " (optional)" } else { "" }
                )?;
                if !missing.found.is_empty() {
                    write!(f, " (but found [{}])", join(&missing.found))?;
                }
                separator = ", ";
            }
            for token in &needs.missing_tokens {
                write!(f, "{separator}token '{token}'")?;
                separator = ", ";
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
