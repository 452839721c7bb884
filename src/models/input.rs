//! Input descriptors: what an algorithm accepts, by type identifier.
//!
//! A closed tagged variant rather than an open trait hierarchy: `Single`
//! matches when any of its acceptable type ids is available, `OneOf` when any
//! nested descriptor matches. Extension happens by adding a variant, not by
//! subclassing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declares one input an algorithm reads, with acceptable alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputDescriptor {
    /// A named input satisfied by any one of the listed type ids.
    Single {
        /// Parameter name, used in provenance and diagnostics.
        name: String,
        /// Acceptable type ids, in preference order.
        accepts: Vec<String>,
    },
    /// Satisfied when any nested descriptor is satisfied.
    OneOf {
        /// The alternative descriptors.
        alternatives: Vec<InputDescriptor>,
    },
}

impl InputDescriptor {
    /// Creates a single named input with acceptable type alternatives.
    pub fn single<S, I, T>(name: S, accepts: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::Single {
            name: name.into(),
            accepts: accepts.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a one-of group over nested descriptors.
    pub fn one_of(alternatives: Vec<InputDescriptor>) -> Self {
        Self::OneOf { alternatives }
    }

    /// Whether this input is satisfied by the available type set.
    pub fn matches(&self, available: &BTreeSet<String>) -> bool {
        match self {
            Self::Single { accepts, .. } => accepts.iter().any(|t| available.contains(t)),
            Self::OneOf { alternatives } => alternatives.iter().any(|d| d.matches(available)),
        }
    }

    /// Acceptable type ids that are absent from `available`.
    ///
    /// Used for optional inputs that can never be satisfied: treating these
    /// ids as perpetually present unblocks ordering without requiring a
    /// producer to run.
    pub fn fake_inputs(&self, available: &BTreeSet<String>) -> BTreeSet<String> {
        match self {
            Self::Single { accepts, .. } => accepts
                .iter()
                .filter(|t| !available.contains(*t))
                .cloned()
                .collect(),
            Self::OneOf { alternatives } => alternatives
                .iter()
                .flat_map(|d| d.fake_inputs(available))
                .collect(),
        }
    }

    /// Acceptable type ids that are present in `available`.
    pub fn matching_inputs(&self, available: &BTreeSet<String>) -> BTreeSet<String> {
        match self {
            Self::Single { accepts, .. } => accepts
                .iter()
                .filter(|t| available.contains(*t))
                .cloned()
                .collect(),
            Self::OneOf { alternatives } => alternatives
                .iter()
                .flat_map(|d| d.matching_inputs(available))
                .collect(),
        }
    }

    /// Display name; a `OneOf` derives one from its alternatives.
    pub fn name(&self) -> String {
        match self {
            Self::Single { name, .. } => name.clone(),
            Self::OneOf { alternatives } => format!(
                "one of [{}]",
                alternatives
                    .iter()
                    .map(|d| d.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Every acceptable type id, flattened, in declaration order.
    pub fn accepted_types(&self) -> Vec<String> {
        match self {
            Self::Single { accepts, .. } => accepts.clone(),
            Self::OneOf { alternatives } => alternatives
                .iter()
                .flat_map(|d| d.accepted_types())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available(types: &[&str]) -> BTreeSet<String> {
        types.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_matches_any_alternative() {
        let input = InputDescriptor::single("graph", ["MachineGraph", "ApplicationGraph"]);
        assert!(input.matches(&available(&["ApplicationGraph"])));
        assert!(input.matches(&available(&["MachineGraph", "Extra"])));
        assert!(!input.matches(&available(&["Placements"])));
    }

    #[test]
    fn test_single_fake_and_matching() {
        let input = InputDescriptor::single("graph", ["A", "B"]);
        let avail = available(&["B", "C"]);
        assert_eq!(input.fake_inputs(&avail), available(&["A"]));
        assert_eq!(input.matching_inputs(&avail), available(&["B"]));
    }

    #[test]
    fn test_one_of_matches_any_nested() {
        let input = InputDescriptor::one_of(vec![
            InputDescriptor::single("a", ["A"]),
            InputDescriptor::single("b", ["B"]),
        ]);
        assert!(input.matches(&available(&["B"])));
        assert!(!input.matches(&available(&["C"])));
        assert_eq!(input.name(), "one of [a, b]");
        assert_eq!(input.accepted_types(), vec!["A", "B"]);
    }

    #[test]
    fn test_one_of_fake_inputs_union() {
        let input = InputDescriptor::one_of(vec![
            InputDescriptor::single("a", ["A", "X"]),
            InputDescriptor::single("b", ["B"]),
        ]);
        assert_eq!(input.fake_inputs(&available(&["X"])), available(&["A", "B"]));
    }
}
