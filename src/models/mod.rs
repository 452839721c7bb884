//! Scheduling domain models.
//!
//! The declarative side of the system: tokens, input descriptors, and
//! algorithm contracts. These are plain immutable records — the resolver and
//! executor consume them read-only.

mod algorithm;
mod input;
mod token;

pub use algorithm::AlgorithmDescriptor;
pub use input::InputDescriptor;
pub use token::Token;
