//! Dependency-driven algorithm scheduling and execution.
//!
//! Algorithms declare what they consume and produce — typed inputs (some
//! optional, some accepting alternatives), outputs, and completion tokens —
//! and the resolver deduces a total execution order from those contracts
//! alone. The executor then runs the order against one accumulating type
//! map, with optional per-algorithm timing and provenance capture.
//!
//! # Modules
//!
//! - **`models`**: Contract types — `AlgorithmDescriptor`, `InputDescriptor`,
//!   `Token`
//! - **`registry`**: Descriptors paired with runnable bodies
//! - **`resolver`**: Five-pass greedy ordering with failure diagnostics
//! - **`ledger`**: Completion tracking for whole and parted tokens
//! - **`executor`**: Sequential execution over the shared type map
//! - **`provenance`**: Per-execution input/output/token records
//! - **`routing`**: Multicast routing-tree construction (NER with
//!   dead-link repair), a second consumer of the same graph-search core
//!
//! # References
//!
//! - Rowley et al. (2019), "SpiNNTools: The Execution Engine for the
//!   SpiNNaker-1 Machine"
//! - Navaridas et al. (2015), "SpiNNaker: Enhanced multicast routing"

pub mod error;
pub mod executor;
pub mod ledger;
pub mod models;
pub mod provenance;
pub mod registry;
pub mod resolver;
pub mod routing;

pub use error::{ExecutionError, PlanError, RoutingError};
pub use executor::Executor;
pub use ledger::TokenLedger;
pub use models::{AlgorithmDescriptor, InputDescriptor, Token};
pub use registry::{AlgorithmBody, AlgorithmRegistry, TypeMapping};
pub use resolver::{DependencyResolver, ExecutionPlan, ResolutionRequest};
