//! Identifier generation.

use std::collections::HashSet;

use uuid::Uuid;

/// Mint a fresh identifier for any entity.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Tracks the ids already used inside one collection.
#[derive(Debug, Default)]
pub struct IdSet {
    seen: HashSet<String>,
}

impl IdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `raw` when it is non-empty and unused, otherwise mint a new id.
    pub fn claim(&mut self, raw: Option<&str>) -> String {
        let id = match raw.map(str::trim) {
            Some(id) if !id.is_empty() && !self.seen.contains(id) => id.to_string(),
            _ => loop {
                let id = new_id();
                if !self.seen.contains(&id) {
                    break id;
                }
            },
        };
        self.seen.insert(id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_distinct() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn claim_keeps_unused_id() {
        let mut ids = IdSet::new();
        assert_eq!(ids.claim(Some("phase-1")), "phase-1");
    }

    #[test]
    fn claim_replaces_duplicate_and_empty_ids() {
        let mut ids = IdSet::new();
        ids.claim(Some("a"));

        let dup = ids.claim(Some("a"));
        let empty = ids.claim(Some("  "));
        let missing = ids.claim(None);

        assert_ne!(dup, "a");
        assert!(!empty.trim().is_empty());
        assert_ne!(missing, dup);
    }
}
