//! Dependency resolver: deduces a valid linear execution order.
//!
//! Given three pools of algorithm contracts (required, optional, converter),
//! an initial set of available type ids, and the outputs/tokens the run must
//! end with, the resolver computes a total order in which every algorithm's
//! required inputs and tokens are satisfied at the moment it is scheduled.
//!
//! # Algorithm
//!
//! 1. Precompute `fake` inputs/tokens: optional dependencies nothing can ever
//!    produce are treated as perpetually available, so they influence ordering
//!    without blocking it.
//! 2. Seed the token ledger with caller-supplied pre-completed tokens and
//!    track every token some algorithm could generate.
//! 3. Greedy loop: five search passes in strict priority order pick the first
//!    eligible algorithm; its outputs and tokens become available; repeat
//!    until the required pool and both goal sets are empty.
//! 4. Defensive re-check that every originally required output was generated.
//!
//! Each successful iteration consumes one algorithm from a finite pool, so the
//! loop runs at most |required| + |optional| + |converter| times or fails with
//! a structured diagnostic. The result is deterministic: ties are broken by
//! pool order then list position, a pinned contract (see the tests).

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{AlgorithmNeeds, MissingInput, PlanError, ScheduleDiagnostic};
use crate::ledger::TokenLedger;
use crate::models::{AlgorithmDescriptor, Token};
use crate::registry::AlgorithmRegistry;

/// Which candidate pool a search pass scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pool {
    Required,
    Optional,
    Converter,
}

/// One search pass: pool to scan, whether the candidate must contribute a new
/// output or token, whether optional dependencies are treated as required.
type SearchPass = (Pool, bool, bool);

/// The authoritative pass order. Do not reorder: the two optional-pool passes
/// differ only in the force flag and are easy to transpose by mistake;
/// `test_search_pass_table_is_pinned` guards against that.
const SEARCH_PASSES: [SearchPass; 5] = [
    (Pool::Required, false, true),
    (Pool::Optional, true, true),
    (Pool::Required, false, false),
    (Pool::Optional, true, false),
    (Pool::Converter, true, false),
];

/// Input container for order deduction.
#[derive(Debug, Clone, Default)]
pub struct ResolutionRequest {
    /// Algorithms that must all be scheduled.
    pub required: Vec<AlgorithmDescriptor>,
    /// Algorithms scheduled only while they contribute something new.
    pub optional: Vec<AlgorithmDescriptor>,
    /// Format adapters, scheduled as a last resort.
    pub converters: Vec<AlgorithmDescriptor>,
    /// Type ids available before anything runs.
    pub inputs: BTreeSet<String>,
    /// Tokens to be considered already generated.
    pub pre_completed_tokens: Vec<Token>,
    /// Type ids the run must end with.
    pub required_outputs: BTreeSet<String>,
    /// Token names the run must complete.
    pub required_output_tokens: BTreeSet<String>,
}

impl ResolutionRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a request from registry name lists. The registry's converter
    /// pool is included automatically. Fails on the first unknown name.
    pub fn from_registry<S: AsRef<str>>(
        registry: &AlgorithmRegistry,
        required: &[S],
        optional: &[S],
    ) -> Result<Self, PlanError> {
        Ok(Self {
            required: registry.descriptors_for(required)?,
            optional: registry.descriptors_for(optional)?,
            converters: registry.converters(),
            ..Self::default()
        })
    }

    /// Adds a required algorithm.
    pub fn with_required_algorithm(mut self, descriptor: AlgorithmDescriptor) -> Self {
        self.required.push(descriptor);
        self
    }

    /// Adds an optional algorithm.
    pub fn with_optional_algorithm(mut self, descriptor: AlgorithmDescriptor) -> Self {
        self.optional.push(descriptor);
        self
    }

    /// Adds a converter algorithm.
    pub fn with_converter(mut self, descriptor: AlgorithmDescriptor) -> Self {
        self.converters.push(descriptor);
        self
    }

    /// Adds an initially available type id.
    pub fn with_input(mut self, type_id: impl Into<String>) -> Self {
        self.inputs.insert(type_id.into());
        self
    }

    /// Adds a token considered already generated.
    pub fn with_pre_completed_token(mut self, token: Token) -> Self {
        self.pre_completed_tokens.push(token);
        self
    }

    /// Adds a type id the run must produce.
    pub fn with_required_output(mut self, type_id: impl Into<String>) -> Self {
        self.required_outputs.insert(type_id.into());
        self
    }

    /// Adds a token name the run must complete.
    pub fn with_required_output_token(mut self, name: impl Into<String>) -> Self {
        self.required_output_tokens.insert(name.into());
        self
    }
}

/// A valid linear schedule plus the tokens complete after it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    /// Algorithms in execution order.
    pub algorithms: Vec<AlgorithmDescriptor>,
    /// Every token complete at the end of the schedule.
    pub completed_tokens: Vec<Token>,
}

impl ExecutionPlan {
    /// Algorithm ids in execution order.
    pub fn algorithm_ids(&self) -> Vec<&str> {
        self.algorithms.iter().map(|a| a.id.as_str()).collect()
    }
}

/// All mutable scheduling state, owned exclusively for one resolution.
struct SchedulerState {
    available_types: BTreeSet<String>,
    generated_outputs: BTreeSet<String>,
    outputs_to_find: BTreeSet<String>,
    tokens_to_find: BTreeSet<String>,
    ledger: TokenLedger,
    fake_inputs: BTreeSet<String>,
    fake_ledger: TokenLedger,
    required_pool: Vec<AlgorithmDescriptor>,
    optional_pool: Vec<AlgorithmDescriptor>,
    converter_pool: Vec<AlgorithmDescriptor>,
    schedule: Vec<AlgorithmDescriptor>,
}

/// Deduces execution orders from algorithm contracts.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver;

impl DependencyResolver {
    /// Creates a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Computes a valid execution order for the request.
    pub fn resolve(&self, request: &ResolutionRequest) -> Result<ExecutionPlan, PlanError> {
        let mut state = SchedulerState::seed(request);
        let outputs_goal = state.outputs_to_find.clone();

        while !state.goals_met() {
            let located = SEARCH_PASSES.iter().find_map(|&(pool, check, force)| {
                state
                    .locate_suitable(pool, check, force)
                    .map(|index| (pool, index))
            });

            match located {
                Some((pool, index)) => {
                    let id = state.select(pool, index);
                    debug!(algorithm = %id, pool = ?pool, "scheduled");
                }
                None => {
                    return Err(PlanError::Unresolvable(Box::new(state.diagnostic(request))));
                }
            }
        }

        let missing: Vec<String> = outputs_goal
            .iter()
            .filter(|output| !state.generated_outputs.contains(*output))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PlanError::UnreachableOutputs { missing });
        }

        Ok(ExecutionPlan {
            completed_tokens: state.ledger.completed_tokens(),
            algorithms: state.schedule,
        })
    }
}

impl SchedulerState {
    /// Phases 1 and 2: fake-input/fake-token precomputation and token
    /// pre-seeding.
    fn seed(request: &ResolutionRequest) -> Self {
        let contract_pools = || request.required.iter().chain(request.optional.iter());

        // Everything that could ever be available. An output that merely
        // echoes one of the same algorithm's optional inputs is not a forward
        // dependency and is left out.
        let mut all_outputs = request.inputs.clone();
        for algorithm in contract_pools() {
            let mut algorithm_outputs: BTreeSet<String> =
                algorithm.outputs.iter().cloned().collect();
            for optional_input in &algorithm.optional_inputs {
                for matching in optional_input.matching_inputs(&algorithm_outputs) {
                    algorithm_outputs.remove(&matching);
                }
            }
            all_outputs.extend(algorithm_outputs);
        }

        let mut ledger = TokenLedger::new();
        for token in &request.pre_completed_tokens {
            ledger.track(token);
            ledger.mark_complete(token);
        }
        // Track every token an algorithm could generate so completeness
        // queries behave correctly before the producer runs.
        for algorithm in contract_pools() {
            for token in &algorithm.generated_tokens {
                if !ledger.is_complete(token) {
                    ledger.track(token);
                }
            }
        }

        // Optional dependencies nothing can satisfy become fakes.
        let mut fake_inputs = BTreeSet::new();
        let mut fake_ledger = TokenLedger::new();
        for algorithm in contract_pools() {
            for optional_input in &algorithm.optional_inputs {
                if !optional_input.matches(&all_outputs) {
                    fake_inputs.extend(optional_input.fake_inputs(&all_outputs));
                }
            }
            for token in &algorithm.optional_tokens {
                if !ledger.is_tracked(token) && !fake_ledger.is_complete(token) {
                    fake_ledger.track(token);
                    fake_ledger.mark_complete(token);
                }
            }
        }

        let outputs_to_find: BTreeSet<String> = request
            .required_outputs
            .difference(&request.inputs)
            .cloned()
            .collect();
        let tokens_to_find: BTreeSet<String> = request
            .required_output_tokens
            .iter()
            .filter(|name| !ledger.is_complete(&Token::new(name.as_str())))
            .cloned()
            .collect();

        Self {
            available_types: request.inputs.clone(),
            generated_outputs: BTreeSet::new(),
            outputs_to_find,
            tokens_to_find,
            ledger,
            fake_inputs,
            fake_ledger,
            required_pool: request.required.clone(),
            optional_pool: request.optional.clone(),
            converter_pool: request.converters.clone(),
            schedule: Vec::new(),
        }
    }

    fn goals_met(&self) -> bool {
        self.required_pool.is_empty()
            && self.outputs_to_find.is_empty()
            && self.tokens_to_find.is_empty()
    }

    fn pool(&self, pool: Pool) -> &[AlgorithmDescriptor] {
        match pool {
            Pool::Required => &self.required_pool,
            Pool::Optional => &self.optional_pool,
            Pool::Converter => &self.converter_pool,
        }
    }

    /// Finds the first algorithm in the pool eligible under this pass.
    /// List position is the only tie-break.
    fn locate_suitable(
        &self,
        pool: Pool,
        check_new_output: bool,
        force_optionals: bool,
    ) -> Option<usize> {
        for (index, algorithm) in self.pool(pool).iter().enumerate() {
            if !self.eligible(algorithm, force_optionals) {
                continue;
            }
            if !check_new_output {
                return Some(index);
            }
            // Only pick the algorithm if it contributes a type id not yet
            // generated or available, or failing that an incomplete token.
            let new_output = algorithm.outputs.iter().any(|output| {
                !self.generated_outputs.contains(output)
                    && !self.available_types.contains(output)
            });
            let new_token = algorithm
                .generated_tokens
                .iter()
                .any(|token| !self.ledger.is_complete(token));
            if new_output || new_token {
                return Some(index);
            }
        }
        None
    }

    fn eligible(&self, algorithm: &AlgorithmDescriptor, force_optionals: bool) -> bool {
        let required_met = algorithm
            .required_inputs
            .iter()
            .all(|input| input.matches(&self.available_types))
            && algorithm
                .required_tokens
                .iter()
                .all(|token| self.ledger.is_complete(token));
        if !required_met {
            return false;
        }
        if !force_optionals {
            return true;
        }
        algorithm.optional_inputs.iter().all(|input| {
            input.matches(&self.available_types) || input.matches(&self.fake_inputs)
        }) && algorithm.optional_tokens.iter().all(|token| {
            self.ledger.is_complete(token) || self.fake_ledger.is_complete(token)
        })
    }

    /// Removes the chosen algorithm from its pool and folds its outputs and
    /// generated tokens into the state. Returns the algorithm id.
    fn select(&mut self, pool: Pool, index: usize) -> String {
        let algorithm = match pool {
            Pool::Required => self.required_pool.remove(index),
            Pool::Optional => self.optional_pool.remove(index),
            Pool::Converter => self.converter_pool.remove(index),
        };

        for output in &algorithm.outputs {
            self.available_types.insert(output.clone());
            self.generated_outputs.insert(output.clone());
            self.outputs_to_find.remove(output);
        }
        for token in &algorithm.generated_tokens {
            self.ledger.mark_complete(token);
            if self.ledger.is_complete(&Token::new(token.name.clone())) {
                self.tokens_to_find.remove(&token.name);
            }
        }

        let id = algorithm.id.clone();
        self.schedule.push(algorithm);
        id
    }

    /// Builds the unresolvable-schedule diagnostic.
    fn diagnostic(&self, request: &ResolutionRequest) -> ScheduleDiagnostic {
        let mut producers_by_output: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut producers_by_token: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for algorithm in request.required.iter().chain(request.optional.iter()) {
            for output in &algorithm.outputs {
                producers_by_output
                    .entry(output.clone())
                    .or_default()
                    .push(algorithm.id.clone());
            }
            for token in &algorithm.generated_tokens {
                let producer = match &token.part {
                    Some(part) => format!("{} (part {part})", algorithm.id),
                    None => algorithm.id.clone(),
                };
                producers_by_token
                    .entry(token.name.clone())
                    .or_default()
                    .push(producer);
            }
        }

        let unmet = self
            .required_pool
            .iter()
            .chain(self.optional_pool.iter())
            .map(|algorithm| self.needs_of(algorithm))
            .collect();

        ScheduleDiagnostic {
            inputs: self.available_types.clone(),
            fake_inputs: self.fake_inputs.clone(),
            outputs_to_find: self.outputs_to_find.clone(),
            tokens_complete: self.ledger.completed_tokens(),
            fake_tokens_complete: self.fake_ledger.completed_tokens(),
            tokens_to_find: self.tokens_to_find.clone(),
            required_remaining: self.required_pool.iter().map(|a| a.id.clone()).collect(),
            optional_remaining: self.optional_pool.iter().map(|a| a.id.clone()).collect(),
            scheduled: self.schedule.iter().map(|a| a.id.clone()).collect(),
            producers_by_output,
            producers_by_token,
            unmet,
        }
    }

    /// What one stalled algorithm is still waiting for.
    fn needs_of(&self, algorithm: &AlgorithmDescriptor) -> AlgorithmNeeds {
        let mut missing_inputs = Vec::new();
        for (inputs, optional) in [
            (&algorithm.required_inputs, false),
            (&algorithm.optional_inputs, true),
        ] {
            for input in inputs {
                let (found, unfound): (Vec<String>, Vec<String>) =
                    input.accepted_types().into_iter().partition(|type_id| {
                        self.available_types.contains(type_id)
                            || self.fake_inputs.contains(type_id)
                    });
                if !unfound.is_empty() {
                    missing_inputs.push(MissingInput {
                        name: input.name(),
                        unfound,
                        found,
                        optional,
                    });
                }
            }
        }
        let missing_tokens = algorithm
            .required_tokens
            .iter()
            .filter(|token| {
                !self.ledger.is_complete(token) && !self.fake_ledger.is_complete(token)
            })
            .cloned()
            .collect();
        AlgorithmNeeds {
            algorithm_id: algorithm.id.clone(),
            missing_inputs,
            missing_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InputDescriptor;

    fn algorithm(id: &str, requires: &[&str], produces: &[&str]) -> AlgorithmDescriptor {
        let mut descriptor = AlgorithmDescriptor::new(id);
        for input in requires {
            descriptor = descriptor.with_required_input(InputDescriptor::single(
                input.to_lowercase(),
                [*input],
            ));
        }
        for output in produces {
            descriptor = descriptor.with_output(*output);
        }
        descriptor
    }

    #[test]
    fn test_search_pass_table_is_pinned() {
        // The two optional-pool passes differ only in the force flag; this
        // test exists to catch an accidental transposition.
        assert_eq!(
            SEARCH_PASSES,
            [
                (Pool::Required, false, true),
                (Pool::Optional, true, true),
                (Pool::Required, false, false),
                (Pool::Optional, true, false),
                (Pool::Converter, true, false),
            ]
        );
    }

    #[test]
    fn test_simple_chain() {
        // inputs {A}, X: A->B, Y: B->C, want C => [X, Y]
        let request = ResolutionRequest::new()
            .with_required_algorithm(algorithm("X", &["A"], &["B"]))
            .with_required_algorithm(algorithm("Y", &["B"], &["C"]))
            .with_input("A")
            .with_required_output("C");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["X", "Y"]);
    }

    #[test]
    fn test_chain_order_independent_of_listing() {
        let request = ResolutionRequest::new()
            .with_required_algorithm(algorithm("Y", &["B"], &["C"]))
            .with_required_algorithm(algorithm("X", &["A"], &["B"]))
            .with_input("A")
            .with_required_output("C");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["X", "Y"]);
    }

    #[test]
    fn test_schedule_respects_prior_outputs() {
        // Diamond: A -> (B, C) -> D; every algorithm's inputs must be covered
        // by initial inputs plus earlier outputs.
        let request = ResolutionRequest::new()
            .with_required_algorithm(algorithm("MakeD", &["B", "C"], &["D"]))
            .with_required_algorithm(algorithm("MakeB", &["A"], &["B"]))
            .with_required_algorithm(algorithm("MakeC", &["A"], &["C"]))
            .with_input("A")
            .with_required_output("D");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        let mut seen: BTreeSet<String> = ["A".to_string()].into();
        for scheduled in &plan.algorithms {
            for input in &scheduled.required_inputs {
                assert!(
                    input.matches(&seen),
                    "{} ran before its inputs were ready",
                    scheduled.id
                );
            }
            seen.extend(scheduled.outputs.iter().cloned());
        }
        assert_eq!(plan.algorithms.len(), 3);
    }

    #[test]
    fn test_pool_order_determinism() {
        // Two independent algorithms both runnable: list position decides.
        let forward = ResolutionRequest::new()
            .with_required_algorithm(algorithm("P", &["A"], &["B"]))
            .with_required_algorithm(algorithm("Q", &["A"], &["C"]))
            .with_input("A");
        let plan = DependencyResolver::new().resolve(&forward).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["P", "Q"]);

        let swapped = ResolutionRequest::new()
            .with_required_algorithm(algorithm("Q", &["A"], &["C"]))
            .with_required_algorithm(algorithm("P", &["A"], &["B"]))
            .with_input("A");
        let plan = DependencyResolver::new().resolve(&swapped).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["Q", "P"]);
    }

    #[test]
    fn test_missing_producer_is_unresolvable() {
        let request = ResolutionRequest::new()
            .with_required_algorithm(algorithm("Y", &["B"], &["C"]))
            .with_input("A")
            .with_required_output("C");

        let error = DependencyResolver::new().resolve(&request).unwrap_err();
        match error {
            PlanError::Unresolvable(diagnostic) => {
                assert_eq!(diagnostic.required_remaining, vec!["Y"]);
                assert_eq!(diagnostic.unmet.len(), 1);
                assert_eq!(diagnostic.unmet[0].missing_inputs[0].unfound, vec!["B"]);
            }
            other => panic!("expected unresolvable, got {other:?}"),
        }
    }

    #[test]
    fn test_converter_fills_the_gap() {
        // Same broken chain; a converter producing B makes it schedulable.
        let request = ResolutionRequest::new()
            .with_required_algorithm(algorithm("Y", &["B"], &["C"]))
            .with_converter(algorithm("AtoB", &["A"], &["B"]))
            .with_input("A")
            .with_required_output("C");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["AtoB", "Y"]);
    }

    #[test]
    fn test_converter_not_used_when_not_required() {
        let request = ResolutionRequest::new()
            .with_required_algorithm(algorithm("X", &["A"], &["B"]))
            .with_converter(algorithm("AtoB", &["A"], &["B"]))
            .with_input("A")
            .with_required_output("B");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["X"]);
    }

    #[test]
    fn test_unreachable_output_no_algorithms() {
        let request = ResolutionRequest::new().with_required_output("Z");
        let error = DependencyResolver::new().resolve(&request).unwrap_err();
        assert!(matches!(
            error,
            PlanError::Unresolvable(_) | PlanError::UnreachableOutputs { .. }
        ));
    }

    #[test]
    fn test_required_output_already_an_input() {
        // Nothing to do: the goal is pre-satisfied.
        let request = ResolutionRequest::new()
            .with_input("A")
            .with_required_output("A");
        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert!(plan.algorithms.is_empty());
    }

    #[test]
    fn test_pre_completed_token_unblocks_immediately() {
        let gated = AlgorithmDescriptor::new("Gated")
            .with_required_token(Token::new("DataLoaded"))
            .with_output("Result");
        let request = ResolutionRequest::new()
            .with_required_algorithm(gated)
            .with_pre_completed_token(Token::new("DataLoaded"))
            .with_required_output("Result");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["Gated"]);
        assert!(plan.completed_tokens.contains(&Token::new("DataLoaded")));
    }

    #[test]
    fn test_token_ordering_without_data_dependency() {
        // Gated requires a token only Loader generates: Loader must go first
        // even though no type id connects them.
        let loader = AlgorithmDescriptor::new("Loader")
            .with_generated_token(Token::new("DataLoaded"));
        let gated = AlgorithmDescriptor::new("Gated")
            .with_required_token(Token::new("DataLoaded"))
            .with_output("Result");
        let request = ResolutionRequest::new()
            .with_required_algorithm(gated)
            .with_required_algorithm(loader)
            .with_required_output("Result");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["Loader", "Gated"]);
    }

    #[test]
    fn test_parted_token_goal_needs_all_parts() {
        let part_a = AlgorithmDescriptor::new("PartA")
            .with_generated_token(Token::with_part("Written", "a"));
        let part_b = AlgorithmDescriptor::new("PartB")
            .with_generated_token(Token::with_part("Written", "b"));
        let request = ResolutionRequest::new()
            .with_optional_algorithm(part_a)
            .with_optional_algorithm(part_b)
            .with_required_output_token("Written");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["PartA", "PartB"]);
        assert!(plan.completed_tokens.contains(&Token::new("Written")));
    }

    #[test]
    fn test_optional_producer_ordered_before_consumer() {
        // Consumer optionally reads R, which Producer (optional pool) emits.
        // The force-optionals pass holds Consumer back until R exists.
        let producer = algorithm("Producer", &["A"], &["R"]);
        let consumer = AlgorithmDescriptor::new("Consumer")
            .with_required_input(InputDescriptor::single("a", ["A"]))
            .with_optional_input(InputDescriptor::single("r", ["R"]))
            .with_output("Out");
        let request = ResolutionRequest::new()
            .with_required_algorithm(consumer)
            .with_optional_algorithm(producer)
            .with_input("A")
            .with_required_output("Out");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["Producer", "Consumer"]);
    }

    #[test]
    fn test_unsatisfiable_optional_input_becomes_fake() {
        // Nothing produces R, so Consumer must not be blocked forever.
        let consumer = AlgorithmDescriptor::new("Consumer")
            .with_required_input(InputDescriptor::single("a", ["A"]))
            .with_optional_input(InputDescriptor::single("r", ["R"]))
            .with_output("Out");
        let request = ResolutionRequest::new()
            .with_required_algorithm(consumer)
            .with_input("A")
            .with_required_output("Out");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["Consumer"]);
    }

    #[test]
    fn test_self_echo_optional_input() {
        // The algorithm's optional input is satisfied by its own output:
        // not a forward dependency, and must not deadlock (covered by the
        // unforced fallback passes).
        let echoer = AlgorithmDescriptor::new("Echoer")
            .with_required_input(InputDescriptor::single("a", ["A"]))
            .with_optional_input(InputDescriptor::single("out", ["Out"]))
            .with_output("Out");
        let request = ResolutionRequest::new()
            .with_required_algorithm(echoer)
            .with_input("A")
            .with_required_output("Out");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["Echoer"]);
    }

    #[test]
    fn test_optional_algorithm_skipped_when_contributing_nothing() {
        // The optional algorithm's only output is already an input, so it
        // fails the new-output check and is never scheduled.
        let request = ResolutionRequest::new()
            .with_required_algorithm(algorithm("X", &["A"], &["B"]))
            .with_optional_algorithm(algorithm("Redundant", &["A"], &["A"]))
            .with_input("A")
            .with_required_output("B");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["X"]);
    }

    #[test]
    fn test_one_of_input_satisfied_by_either() {
        let flexible = AlgorithmDescriptor::new("Flexible")
            .with_required_input(InputDescriptor::one_of(vec![
                InputDescriptor::single("a", ["A"]),
                InputDescriptor::single("b", ["B"]),
            ]))
            .with_output("Out");
        let request = ResolutionRequest::new()
            .with_required_algorithm(flexible)
            .with_input("B")
            .with_required_output("Out");

        let plan = DependencyResolver::new().resolve(&request).unwrap();
        assert_eq!(plan.algorithm_ids(), vec!["Flexible"]);
    }

    #[test]
    fn test_diagnostic_lists_producers() {
        let request = ResolutionRequest::new()
            .with_required_algorithm(algorithm("NeedsB", &["B"], &["C"]))
            .with_optional_algorithm(algorithm("CouldMakeB", &["Missing"], &["B"]))
            .with_input("A")
            .with_required_output("C");

        let error = DependencyResolver::new().resolve(&request).unwrap_err();
        let PlanError::Unresolvable(diagnostic) = error else {
            panic!("expected unresolvable");
        };
        assert_eq!(
            diagnostic.producers_by_output.get("B"),
            Some(&vec!["CouldMakeB".to_string()])
        );
        assert_eq!(diagnostic.optional_remaining, vec!["CouldMakeB"]);
    }
}
