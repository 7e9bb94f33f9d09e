//! Opaque identifier generation.
//!
//! Selections, captures and conversation turns are keyed by opaque unique
//! strings. The algorithm is injected so embedders (and tests) can supply
//! their own.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of opaque unique identifiers.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> String;
}

/// Format a random 128-bit value as a 32-char hex id.
pub fn random_id(rng: &mut impl Rng) -> String {
    format!("{:032x}", rng.r#gen::<u128>())
}

/// Random hex identifiers, seeded from OS entropy.
pub struct RandomIds {
    rng: StdRng,
}

impl RandomIds {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomIds {
    fn next_id(&mut self) -> String {
        random_id(&mut self.rng)
    }
}

/// Deterministic `prefix-N` identifiers for tests and reproducible runs.
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 0,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_unique_and_hex() {
        let mut ids = RandomIds::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sequential_ids_count_up() {
        let mut ids = SequentialIds::new("sel");
        assert_eq!(ids.next_id(), "sel-0");
        assert_eq!(ids.next_id(), "sel-1");
    }
}
