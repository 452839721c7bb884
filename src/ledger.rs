//! Token ledger: tracks which completion tokens (and parts) are done.
//!
//! Tracking is lazy — a family is registered on first encounter. Completion
//! marks are idempotent. Querying an untracked token answers `false` rather
//! than erroring, so the resolver can probe freely.
//!
//! Single-threaded by design: mutated by the resolver while it computes an
//! order, and by a fresh instance inside the executor for bookkeeping.

use crate::models::Token;
use std::collections::{BTreeMap, BTreeSet};

/// Completion state of one token family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TokenFamily {
    /// Set when the bare (part-less) token was marked complete.
    whole_complete: bool,
    incomplete_parts: BTreeSet<String>,
    completed_parts: BTreeSet<String>,
}

impl TokenFamily {
    fn track_part(&mut self, part: &str) {
        if !self.completed_parts.contains(part) {
            self.incomplete_parts.insert(part.to_string());
        }
    }

    fn complete_part(&mut self, part: &str) {
        self.incomplete_parts.remove(part);
        self.completed_parts.insert(part.to_string());
    }

    /// Completing the whole family also completes every tracked part.
    fn complete_whole(&mut self) {
        self.whole_complete = true;
        let parts = std::mem::take(&mut self.incomplete_parts);
        self.completed_parts.extend(parts);
    }

    fn is_part_tracked(&self, part: &str) -> bool {
        self.incomplete_parts.contains(part) || self.completed_parts.contains(part)
    }

    /// A never-partitioned family is complete when its bare token was
    /// completed; a partitioned family when no tracked part is outstanding.
    fn is_family_complete(&self) -> bool {
        if self.incomplete_parts.is_empty() && self.completed_parts.is_empty() {
            self.whole_complete
        } else {
            self.incomplete_parts.is_empty()
        }
    }
}

/// Tracks named, optionally-partitioned completion tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    families: BTreeMap<String, TokenFamily>,
}

impl TokenLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token family (and part, if given). No-op if already tracked.
    pub fn track(&mut self, token: &Token) {
        let family = self.families.entry(token.name.clone()).or_default();
        if let Some(part) = &token.part {
            family.track_part(part);
        }
    }

    /// Marks the given part (or the whole family) complete. Auto-tracks
    /// unseen tokens; idempotent.
    pub fn mark_complete(&mut self, token: &Token) {
        let family = self.families.entry(token.name.clone()).or_default();
        match &token.part {
            Some(part) => family.complete_part(part),
            None => family.complete_whole(),
        }
    }

    /// Whether the family (or the given part) has been seen.
    pub fn is_tracked(&self, token: &Token) -> bool {
        match self.families.get(&token.name) {
            None => false,
            Some(family) => match &token.part {
                Some(part) => family.is_part_tracked(part),
                None => true,
            },
        }
    }

    /// Whether the token is complete. Untracked tokens answer `false`.
    pub fn is_complete(&self, token: &Token) -> bool {
        match self.families.get(&token.name) {
            None => false,
            Some(family) => match &token.part {
                Some(part) => family.completed_parts.contains(part),
                None => family.is_family_complete(),
            },
        }
    }

    /// Snapshot of every completed token: one entry per completed part, plus
    /// the bare token for each fully-complete family. Sorted for determinism.
    pub fn completed_tokens(&self) -> Vec<Token> {
        let mut out = Vec::new();
        for (name, family) in &self.families {
            for part in &family.completed_parts {
                out.push(Token::with_part(name.clone(), part.clone()));
            }
            if family.is_family_complete() {
                out.push(Token::new(name.clone()));
            }
        }
        out.sort();
        out
    }
}
