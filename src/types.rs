//! Basic type definitions for the chat server
//!
//! Provides:
//! - `ClientId`: UUID-based unique connection identifier
//! - `NameCandidates`: the `name, name1, name2, ...` sequence used to
//!   disambiguate display names at join time

use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4. Display names can be reused after a client leaves,
/// so the id is what tells two sessions with the same name apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Infinite sequence of display-name candidates
///
/// Yields the base name first, then the base with an increasing numeric
/// suffix: `bob`, `bob1`, `bob2`, ...
#[derive(Debug, Clone)]
pub struct NameCandidates<'a> {
    base: &'a str,
    next_suffix: u64,
}

impl<'a> NameCandidates<'a> {
    /// Start the sequence at `base` itself
    pub fn new(base: &'a str) -> Self {
        Self {
            base,
            next_suffix: 0,
        }
    }

    /// Produce the next candidate; the sequence never runs out
    pub fn next_candidate(&mut self) -> String {
        let candidate = if self.next_suffix == 0 {
            self.base.to_string()
        } else {
            format!("{}{}", self.base, self.next_suffix)
        };
        self.next_suffix += 1;
        candidate
    }
}

impl Iterator for NameCandidates<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.next_candidate())
    }
}
