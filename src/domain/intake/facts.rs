//! Fact store and merge engine.
//!
//! Owns the critical/optional fact maps collected over a conversation
//! and applies each turn's extraction to them. The merge rules are the
//! heart of the intake flow: facts lock once answered, contradictions
//! become explicit conflicts instead of silent overwrites, and the
//! counters it reports drive the readiness anti-inflation guard.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::canonical::NOT_AVAILABLE;

/// A canonical key for which two non-equivalent, non-subsuming values
/// were supplied across turns.
///
/// Conflicts are kept in the order they were detected; the question
/// targeter resolves them front to back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactConflict {
    pub key: String,
    pub previous: String,
    pub proposed: String,
}

/// Lifecycle of a canonical key inside the store.
///
/// Every key is in exactly one of these states at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactStatus {
    Unanswered,
    Answered,
    Conflicted,
}

/// Counters from one merge pass, consumed by the readiness scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Keys answered for the first time this turn.
    pub newly_added: usize,
    /// Conflicts resolved by an explicit new answer this turn.
    pub resolved_conflicts: usize,
}

impl MergeReport {
    /// True if this turn produced no new information.
    pub fn is_empty(&self) -> bool {
        self.newly_added == 0 && self.resolved_conflicts == 0
    }
}

/// Collected facts for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactStore {
    critical: HashMap<String, String>,
    optional: HashMap<String, String>,
    answered: HashMap<String, String>,
    conflicts: Vec<FactConflict>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one turn's canonicalized extraction.
    ///
    /// Critical facts follow the full locking/conflict protocol;
    /// optional facts lock on first sight only. Inputs are expected to
    /// already be canonicalized (keys rewritten, values normalized).
    pub fn merge(
        &mut self,
        new_critical: Vec<(String, String)>,
        new_optional: Vec<(String, String)>,
    ) -> MergeReport {
        let mut report = MergeReport::default();

        for (key, value) in new_critical {
            self.merge_critical(key, value, &mut report);
        }

        for (key, value) in new_optional {
            // First-time keys only; no conflict tracking for optional facts.
            if self.status(&key) == FactStatus::Unanswered {
                self.answered.insert(key.clone(), value.clone());
                self.optional.insert(key, value);
            }
        }

        report
    }

    fn merge_critical(&mut self, key: String, value: String, report: &mut MergeReport) {
        if value == NOT_AVAILABLE {
            // Lock the key as explicitly unavailable. This removes it
            // from question candidates for good, and settles any open
            // conflict on the key so it cannot stay in two states.
            if self.remove_conflict(&key) {
                report.resolved_conflicts += 1;
            } else if !self.answered.contains_key(&key) {
                report.newly_added += 1;
            }
            self.answered.insert(key.clone(), NOT_AVAILABLE.to_string());
            self.critical.insert(key, NOT_AVAILABLE.to_string());
            return;
        }

        if self.conflict_index(&key).is_some() {
            // The user supplied a value for a specifically conflicted
            // field; interpret it as the resolution.
            self.remove_conflict(&key);
            self.answered.insert(key.clone(), value.clone());
            self.critical.insert(key, value);
            report.resolved_conflicts += 1;
            return;
        }

        if let Some(existing) = self.answered.get(&key).cloned() {
            let existing_lower = existing.to_lowercase();
            let value_lower = value.to_lowercase();

            if existing_lower == value_lower {
                // Reinforcement, not new information.
                return;
            }

            if existing_lower.contains(&value_lower) || value_lower.contains(&existing_lower) {
                // Elaboration: one value subsumes the other, keep the
                // longer form.
                if value.len() > existing.len() {
                    self.answered.insert(key.clone(), value.clone());
                    self.critical.insert(key, value);
                }
                return;
            }

            // Genuine contradiction. Numeric fields must never be
            // silently overwritten, and neither is anything else: the
            // key leaves the visible fact set until the user settles it.
            self.answered.remove(&key);
            self.critical.remove(&key);
            self.conflicts.push(FactConflict {
                key,
                previous: existing,
                proposed: value,
            });
            return;
        }

        // Brand new fact.
        self.answered.insert(key.clone(), value.clone());
        self.critical.insert(key, value);
        report.newly_added += 1;
    }

    /// Current lifecycle state of a key.
    pub fn status(&self, key: &str) -> FactStatus {
        if self.conflict_index(key).is_some() {
            FactStatus::Conflicted
        } else if self.answered.contains_key(key) {
            FactStatus::Answered
        } else {
            FactStatus::Unanswered
        }
    }

    /// Facts answered with a locked value.
    pub fn answered(&self) -> &HashMap<String, String> {
        &self.answered
    }

    /// Open conflicts in detection order.
    pub fn conflicts(&self) -> &[FactConflict] {
        &self.conflicts
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Critical fact values, for placeholder detection.
    pub fn critical_values(&self) -> impl Iterator<Item = &String> {
        self.critical.values()
    }

    /// The externally visible fact set: union of critical and optional.
    pub fn merged(&self) -> HashMap<String, String> {
        let mut merged = self.critical.clone();
        for (k, v) in &self.optional {
            merged.entry(k.clone()).or_insert_with(|| v.clone());
        }
        merged
    }

    fn conflict_index(&self, key: &str) -> Option<usize> {
        self.conflicts.iter().position(|c| c.key == key)
    }

    fn remove_conflict(&mut self, key: &str) -> bool {
        match self.conflict_index(key) {
            Some(idx) => {
                self.conflicts.remove(idx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crit(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    mod new_facts {
        use super::*;

        #[test]
        fn brand_new_key_is_answered_and_counted() {
            let mut store = FactStore::new();
            let report = store.merge(crit(&[("amount_involved", "50,000 rupees")]), vec![]);

            assert_eq!(report.newly_added, 1);
            assert_eq!(report.resolved_conflicts, 0);
            assert_eq!(store.status("amount_involved"), FactStatus::Answered);
            assert_eq!(
                store.answered().get("amount_involved"),
                Some(&"50,000 rupees".to_string())
            );
        }

        #[test]
        fn optional_facts_lock_first_time_only() {
            let mut store = FactStore::new();
            store.merge(vec![], crit(&[("witness_details", "neighbour saw it")]));
            store.merge(vec![], crit(&[("witness_details", "someone else entirely")]));

            // No conflict tracking for optional facts; first value wins.
            assert!(!store.has_conflicts());
            assert_eq!(
                store.answered().get("witness_details"),
                Some(&"neighbour saw it".to_string())
            );
        }

        #[test]
        fn merged_view_unions_critical_and_optional() {
            let mut store = FactStore::new();
            store.merge(
                crit(&[("amount_involved", "50,000")]),
                crit(&[("witness_details", "a neighbour")]),
            );

            let merged = store.merged();
            assert_eq!(merged.len(), 2);
            assert!(merged.contains_key("amount_involved"));
            assert!(merged.contains_key("witness_details"));
        }
    }

    mod locking {
        use super::*;

        #[test]
        fn not_available_locks_the_key() {
            let mut store = FactStore::new();
            let report = store.merge(crit(&[("incident_date", NOT_AVAILABLE)]), vec![]);

            assert_eq!(report.newly_added, 1);
            assert_eq!(store.status("incident_date"), FactStatus::Answered);
            assert_eq!(
                store.answered().get("incident_date"),
                Some(&NOT_AVAILABLE.to_string())
            );
        }

        #[test]
        fn reinforcement_is_a_no_op() {
            let mut store = FactStore::new();
            store.merge(crit(&[("amount_involved", "50,000 rupees")]), vec![]);
            let report = store.merge(crit(&[("amount_involved", "50,000 RUPEES")]), vec![]);

            assert!(report.is_empty());
            assert!(!store.has_conflicts());
            assert_eq!(
                store.answered().get("amount_involved"),
                Some(&"50,000 rupees".to_string())
            );
        }

        #[test]
        fn elaboration_keeps_the_longer_value() {
            let mut store = FactStore::new();
            store.merge(crit(&[("incident_location", "Chennai")]), vec![]);
            let report = store.merge(
                crit(&[("incident_location", "Anna Nagar, Chennai")]),
                vec![],
            );

            assert!(report.is_empty());
            assert!(!store.has_conflicts());
            assert_eq!(
                store.answered().get("incident_location"),
                Some(&"Anna Nagar, Chennai".to_string())
            );
        }

        #[test]
        fn shorter_substring_does_not_shrink_the_value() {
            let mut store = FactStore::new();
            store.merge(crit(&[("incident_location", "Anna Nagar, Chennai")]), vec![]);
            store.merge(crit(&[("incident_location", "Chennai")]), vec![]);

            assert_eq!(
                store.answered().get("incident_location"),
                Some(&"Anna Nagar, Chennai".to_string())
            );
        }
    }

    mod conflicts {
        use super::*;

        #[test]
        fn numeric_contradiction_records_a_conflict() {
            let mut store = FactStore::new();
            store.merge(crit(&[("amount_involved", "50,000")]), vec![]);
            let report = store.merge(crit(&[("amount_involved", "60,000")]), vec![]);

            assert!(report.is_empty());
            assert_eq!(store.status("amount_involved"), FactStatus::Conflicted);
            assert_eq!(
                store.conflicts(),
                &[FactConflict {
                    key: "amount_involved".to_string(),
                    previous: "50,000".to_string(),
                    proposed: "60,000".to_string(),
                }]
            );
        }

        #[test]
        fn textual_contradiction_records_a_conflict() {
            let mut store = FactStore::new();
            store.merge(crit(&[("opposing_party", "Suresh")]), vec![]);
            store.merge(crit(&[("opposing_party", "Ramesh")]), vec![]);

            assert_eq!(store.status("opposing_party"), FactStatus::Conflicted);
            assert!(store.answered().get("opposing_party").is_none());
        }

        #[test]
        fn conflicted_key_is_not_answered() {
            let mut store = FactStore::new();
            store.merge(crit(&[("amount_involved", "50,000")]), vec![]);
            store.merge(crit(&[("amount_involved", "60,000")]), vec![]);

            // Exactly one state at a time: conflicted, not answered.
            assert!(!store.answered().contains_key("amount_involved"));
            assert!(store.has_conflicts());
        }

        #[test]
        fn new_value_resolves_the_conflict() {
            let mut store = FactStore::new();
            store.merge(crit(&[("amount_involved", "50,000")]), vec![]);
            store.merge(crit(&[("amount_involved", "60,000")]), vec![]);
            let report = store.merge(crit(&[("amount_involved", "60,000")]), vec![]);

            assert_eq!(report.resolved_conflicts, 1);
            assert_eq!(store.status("amount_involved"), FactStatus::Answered);
            assert_eq!(
                store.answered().get("amount_involved"),
                Some(&"60,000".to_string())
            );
            assert!(!store.has_conflicts());
        }

        #[test]
        fn not_available_settles_an_open_conflict() {
            let mut store = FactStore::new();
            store.merge(crit(&[("incident_date", "January 1st")]), vec![]);
            store.merge(crit(&[("incident_date", "March 5th")]), vec![]);
            let report = store.merge(crit(&[("incident_date", NOT_AVAILABLE)]), vec![]);

            assert_eq!(report.resolved_conflicts, 1);
            assert_eq!(store.status("incident_date"), FactStatus::Answered);
        }

        #[test]
        fn conflicts_keep_detection_order() {
            let mut store = FactStore::new();
            store.merge(
                crit(&[("amount_involved", "50,000"), ("opposing_party", "Suresh")]),
                vec![],
            );
            store.merge(
                crit(&[("opposing_party", "Ramesh"), ("amount_involved", "60,000")]),
                vec![],
            );

            let keys: Vec<&str> = store.conflicts().iter().map(|c| c.key.as_str()).collect();
            assert_eq!(keys, vec!["opposing_party", "amount_involved"]);
        }
    }
}
