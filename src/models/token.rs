//! Completion token model.
//!
//! A token is a named "done" marker used to order algorithms that share no
//! direct data dependency. A token may be split into named parts; the family
//! is complete only once every tracked part has been completed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, optionally multi-part completion marker.
///
/// Two tokens belong to the same family when their names match. A bare token
/// (`part == None`) refers to the family as a whole; a parted token refers to
/// one slice of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token {
    /// Family name.
    pub name: String,
    /// Part within the family. `None` = the whole family.
    pub part: Option<String>,
}

impl Token {
    /// Creates a whole-family token.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            part: None,
        }
    }

    /// Creates a token for one part of a family.
    pub fn with_part(name: impl Into<String>, part: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            part: Some(part.into()),
        }
    }

    /// Whether this token names the whole family rather than a part.
    pub fn is_whole(&self) -> bool {
        self.part.is_none()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.part {
            Some(part) => write!(f, "{} ({part})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_token() {
        let token = Token::new("DataLoaded");
        assert_eq!(token.name, "DataLoaded");
        assert!(token.is_whole());
        assert_eq!(token.to_string(), "DataLoaded");
    }

    #[test]
    fn test_parted_token() {
        let token = Token::with_part("DataLoaded", "region_0");
        assert!(!token.is_whole());
        assert_eq!(token.to_string(), "DataLoaded (region_0)");
    }

    #[test]
    fn test_family_equality() {
        // Same family, different identity
        let whole = Token::new("T");
        let part = Token::with_part("T", "a");
        assert_eq!(whole.name, part.name);
        assert_ne!(whole, part);
    }
}
