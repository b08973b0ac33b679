//! Stable ID newtypes for trees and skills.
//!
//! Both IDs are distinct newtype wrappers over `i64`, providing type safety
//! so that a `SkillId` cannot be accidentally used where a `TreeId` is
//! expected. Skill IDs carry a sign convention: positive IDs are
//! server-assigned (persisted), negative IDs identify skills created in an
//! edit session that have not been saved yet. The persistence layer remaps
//! negative IDs to fresh positive ones on save.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Skill identifier. Positive = persisted, negative = session-local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkillId(pub i64);

/// Skill tree identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeId(pub i64);

impl SkillId {
    /// True for server-assigned IDs (strictly positive).
    pub fn is_persisted(self) -> bool {
        self.0 > 0
    }

    /// True for IDs allocated locally in an edit session (strictly negative).
    pub fn is_local(self) -> bool {
        self.0 < 0
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
