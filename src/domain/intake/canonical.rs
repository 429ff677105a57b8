//! Canonical fact dimensions.
//!
//! The extraction oracle names fields however the underlying model
//! happens to phrase them ("witness", "eyewitnesses", "amount owed").
//! Everything downstream (merging, conflict tracking, question
//! targeting) works on a fixed set of canonical dimensions, so raw
//! field names are rewritten through an alias table before any state
//! is touched. Unknown keys pass through unchanged.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Sentinel value for a fact the user explicitly cannot provide.
///
/// A key locked to this value is answered and never asked again.
pub const NOT_AVAILABLE: &str = "NOT_AVAILABLE";

/// Closed set of negative answers that normalize to [`NOT_AVAILABLE`].
const NEGATIVE_ANSWERS: &[&str] = &["unknown", "null", "none", "not available", "na", "no"];

static KEY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    // Identity of the complainant
    m.insert("name", "full_name");
    m.insert("complainant", "full_name");
    m.insert("complainant_name", "full_name");
    m.insert("user_name", "full_name");
    m.insert("petitioner_name", "full_name");
    // Opposing party
    m.insert("accused", "opposing_party");
    m.insert("accused_name", "opposing_party");
    m.insert("respondent", "opposing_party");
    m.insert("landlord", "opposing_party");
    m.insert("landlord_name", "opposing_party");
    m.insert("defendant", "opposing_party");
    // When it happened
    m.insert("date", "incident_date");
    m.insert("incident_day", "incident_date");
    m.insert("date_of_incident", "incident_date");
    m.insert("when", "incident_date");
    // Where it happened
    m.insert("location", "incident_location");
    m.insert("place", "incident_location");
    m.insert("address", "incident_location");
    m.insert("city", "incident_location");
    // Money involved
    m.insert("amount", "amount_involved");
    m.insert("amount_owed", "amount_involved");
    m.insert("deposit_amount", "amount_involved");
    m.insert("financial_loss", "amount_involved");
    m.insert("money", "amount_involved");
    // Witnesses
    m.insert("witness", "witness_details");
    m.insert("witnesses", "witness_details");
    m.insert("eyewitness", "witness_details");
    m.insert("eyewitnesses", "witness_details");
    // Evidence
    m.insert("evidence", "evidence_available");
    m.insert("proof", "evidence_available");
    m.insert("documents", "evidence_available");
    // Contact
    m.insert("phone", "contact_details");
    m.insert("phone_number", "contact_details");
    m.insert("contact", "contact_details");
    m.insert("email", "contact_details");
    // Narrative
    m.insert("description", "incident_description");
    m.insert("details", "incident_description");
    m.insert("summary", "incident_description");
    m
});

/// Rewrites a raw extracted field name to its canonical dimension.
///
/// Matching is case-insensitive on the trimmed key. Unknown keys are
/// returned lowercased but otherwise unchanged.
pub fn canonical_key(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    match KEY_ALIASES.get(key.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => key,
    }
}

/// Normalizes an extracted value.
///
/// Values from the closed negative-answer set become the
/// [`NOT_AVAILABLE`] sentinel; everything else is trimmed.
pub fn normalize_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    if NEGATIVE_ANSWERS.contains(&lowered.as_str()) {
        NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Canonicalizes a whole extraction payload, preserving entry order.
///
/// Pure and total: every input entry maps to exactly one output entry.
/// Empty values are dropped (the oracle emitted a key with nothing to
/// say about it).
pub fn canonicalize(raw: Vec<(String, String)>) -> Vec<(String, String)> {
    raw.into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (canonical_key(&k), normalize_value(&v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod key_rewriting {
        use super::*;

        #[test]
        fn witness_synonyms_map_to_witness_details() {
            assert_eq!(canonical_key("witness"), "witness_details");
            assert_eq!(canonical_key("witnesses"), "witness_details");
            assert_eq!(canonical_key("eyewitness"), "witness_details");
        }

        #[test]
        fn matching_is_case_insensitive() {
            assert_eq!(canonical_key("Landlord_Name"), "opposing_party");
            assert_eq!(canonical_key("  DATE  "), "incident_date");
        }

        #[test]
        fn unknown_keys_pass_through() {
            assert_eq!(canonical_key("vehicle_number"), "vehicle_number");
        }

        #[test]
        fn canonical_keys_are_stable() {
            // A key already in canonical form must not change.
            assert_eq!(canonical_key("incident_location"), "incident_location");
            assert_eq!(canonical_key("full_name"), "full_name");
        }
    }

    mod value_normalization {
        use super::*;

        #[test]
        fn negative_answers_become_not_available() {
            for raw in ["unknown", "NULL", " none ", "Not Available", "NA", "no"] {
                assert_eq!(normalize_value(raw), NOT_AVAILABLE, "for input {raw:?}");
            }
        }

        #[test]
        fn ordinary_values_are_trimmed() {
            assert_eq!(normalize_value("  Chennai  "), "Chennai");
        }

        #[test]
        fn values_containing_negatives_are_untouched() {
            // "no written agreement" is an answer, not a refusal.
            assert_eq!(normalize_value("no written agreement"), "no written agreement");
        }
    }

    mod payload_canonicalization {
        use super::*;

        #[test]
        fn rewrites_keys_and_values_in_order() {
            let raw = vec![
                ("Landlord".to_string(), "Suresh".to_string()),
                ("amount".to_string(), "50,000 rupees".to_string()),
                ("witnesses".to_string(), "none".to_string()),
            ];
            let out = canonicalize(raw);
            assert_eq!(
                out,
                vec![
                    ("opposing_party".to_string(), "Suresh".to_string()),
                    ("amount_involved".to_string(), "50,000 rupees".to_string()),
                    ("witness_details".to_string(), NOT_AVAILABLE.to_string()),
                ]
            );
        }

        #[test]
        fn empty_values_are_dropped() {
            let raw = vec![("date".to_string(), "   ".to_string())];
            assert!(canonicalize(raw).is_empty());
        }
    }
}
