//! Readiness scoring.
//!
//! Computes the 0-100 completion score for the collected facts against
//! the currently required schema. The raw ratio is easy to inflate (a
//! chatty model re-emitting known facts, a shrunken schema), so the
//! score passes through a series of non-increasing clamps; the final
//! value is the minimum of the raw score and every applicable cap.

use std::collections::HashMap;

use super::facts::MergeReport;

/// Cap while any fact conflict remains unresolved.
pub const CONFLICT_CAP: u8 = 70;

/// Cap for the first two turns, forcing at least two rounds of
/// investigation before high confidence is possible.
pub const EARLY_TURN_CAP: u8 = 60;

/// Cap while any critical value is a recognized placeholder token.
pub const PLACEHOLDER_CAP: u8 = 80;

/// Floor applied when the schema is empty but facts are flowing, so a
/// schema-less oracle response does not stall the score at zero.
const EMPTY_SCHEMA_FLOOR: u8 = 50;

/// Tokens that mark a value as a placeholder rather than a real answer.
const PLACEHOLDER_TOKENS: &[&str] = &["unknown", "tbd", "insert", "placeholder"];

/// Guard inputs for one turn's scoring pass.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessGuards {
    /// Score at the end of the previous turn.
    pub previous_score: u8,
    /// Turn counter after this turn was counted.
    pub turn_count: u32,
    /// Merge counters from this turn.
    pub merge: MergeReport,
    /// Whether any fact conflicts remain open.
    pub open_conflicts: bool,
    /// Whether any critical value is a placeholder token.
    pub has_placeholder: bool,
}

/// Returns true if the value is a recognized placeholder token.
pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_TOKENS.contains(&value.trim().to_lowercase().as_str())
}

/// Scores fact completeness against the required schema.
///
/// Base score is the answered fraction of `required_keys` scaled to
/// 0-100. Guards apply in order as clamps: anti-inflation (no new
/// facts and no resolutions means the score cannot rise), the
/// unresolved-conflict cap, the early-turn cap, and the placeholder
/// cap.
pub fn score(
    required_keys: &[String],
    answered: &HashMap<String, String>,
    guards: &ReadinessGuards,
) -> u8 {
    let mut score = base_score(required_keys, answered);

    if guards.merge.is_empty() {
        score = score.min(guards.previous_score);
    }
    if guards.open_conflicts {
        score = score.min(CONFLICT_CAP);
    }
    if guards.turn_count <= 2 {
        score = score.min(EARLY_TURN_CAP);
    }
    if guards.has_placeholder {
        score = score.min(PLACEHOLDER_CAP);
    }

    score
}

fn base_score(required_keys: &[String], answered: &HashMap<String, String>) -> u8 {
    let base = if required_keys.is_empty() {
        0
    } else {
        let present = required_keys
            .iter()
            .filter(|k| answered.contains_key(k.as_str()))
            .count();
        (present * 100 / required_keys.len()) as u8
    };

    if base == 0 && answered.len() > 3 {
        EMPTY_SCHEMA_FLOOR
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn answered(names: &[&str]) -> HashMap<String, String> {
        names
            .iter()
            .map(|s| (s.to_string(), "value".to_string()))
            .collect()
    }

    fn open_guards() -> ReadinessGuards {
        ReadinessGuards {
            previous_score: 0,
            turn_count: 5,
            merge: MergeReport {
                newly_added: 1,
                resolved_conflicts: 0,
            },
            open_conflicts: false,
            has_placeholder: false,
        }
    }

    mod base_scoring {
        use super::*;

        #[test]
        fn full_schema_scores_one_hundred() {
            let required = keys(&["a", "b"]);
            let facts = answered(&["a", "b"]);
            assert_eq!(score(&required, &facts, &open_guards()), 100);
        }

        #[test]
        fn partial_schema_scores_the_ratio() {
            let required = keys(&["a", "b", "c", "d"]);
            let facts = answered(&["a", "b", "c"]);
            assert_eq!(score(&required, &facts, &open_guards()), 75);
        }

        #[test]
        fn empty_schema_scores_zero() {
            let facts = answered(&["a"]);
            assert_eq!(score(&[], &facts, &open_guards()), 0);
        }

        #[test]
        fn empty_schema_floor_bumps_to_fifty_with_many_facts() {
            let facts = answered(&["a", "b", "c", "d"]);
            assert_eq!(score(&[], &facts, &open_guards()), 50);
        }
    }

    mod guards {
        use super::*;

        #[test]
        fn anti_inflation_holds_score_without_new_information() {
            let required = keys(&["a", "b"]);
            let facts = answered(&["a", "b"]);
            let guards = ReadinessGuards {
                previous_score: 40,
                merge: MergeReport::default(),
                ..open_guards()
            };
            assert_eq!(score(&required, &facts, &guards), 40);
        }

        #[test]
        fn anti_inflation_allows_decrease() {
            let required = keys(&["a", "b", "c", "d"]);
            let facts = answered(&["a"]);
            let guards = ReadinessGuards {
                previous_score: 90,
                merge: MergeReport::default(),
                ..open_guards()
            };
            // Clamp is an upper bound only; a drop passes through.
            assert_eq!(score(&required, &facts, &guards), 25);
        }

        #[test]
        fn resolved_conflict_counts_as_progress() {
            let required = keys(&["a", "b"]);
            let facts = answered(&["a", "b"]);
            let guards = ReadinessGuards {
                previous_score: 40,
                merge: MergeReport {
                    newly_added: 0,
                    resolved_conflicts: 1,
                },
                ..open_guards()
            };
            assert_eq!(score(&required, &facts, &guards), 100);
        }

        #[test]
        fn open_conflicts_cap_at_seventy() {
            let required = keys(&["a", "b"]);
            let facts = answered(&["a", "b"]);
            let guards = ReadinessGuards {
                open_conflicts: true,
                ..open_guards()
            };
            assert_eq!(score(&required, &facts, &guards), 70);
        }

        #[test]
        fn early_turns_cap_at_sixty() {
            let required = keys(&["a", "b"]);
            let facts = answered(&["a", "b"]);
            for turn in [1, 2] {
                let guards = ReadinessGuards {
                    turn_count: turn,
                    ..open_guards()
                };
                assert_eq!(score(&required, &facts, &guards), 60, "turn {turn}");
            }
        }

        #[test]
        fn third_turn_is_not_capped() {
            let required = keys(&["a", "b"]);
            let facts = answered(&["a", "b"]);
            let guards = ReadinessGuards {
                turn_count: 3,
                ..open_guards()
            };
            assert_eq!(score(&required, &facts, &guards), 100);
        }

        #[test]
        fn placeholders_cap_at_eighty() {
            let required = keys(&["a", "b"]);
            let facts = answered(&["a", "b"]);
            let guards = ReadinessGuards {
                has_placeholder: true,
                ..open_guards()
            };
            assert_eq!(score(&required, &facts, &guards), 80);
        }

        #[test]
        fn caps_compose_by_minimum() {
            let required = keys(&["a", "b"]);
            let facts = answered(&["a", "b"]);
            let guards = ReadinessGuards {
                turn_count: 1,
                open_conflicts: true,
                has_placeholder: true,
                ..open_guards()
            };
            assert_eq!(score(&required, &facts, &guards), 60);
        }
    }

    mod placeholder_detection {
        use super::*;

        #[test]
        fn recognizes_placeholder_tokens() {
            assert!(is_placeholder("TBD"));
            assert!(is_placeholder(" placeholder "));
            assert!(is_placeholder("insert"));
            assert!(is_placeholder("unknown"));
        }

        #[test]
        fn real_values_are_not_placeholders() {
            assert!(!is_placeholder("Chennai"));
            assert!(!is_placeholder("50,000 rupees"));
        }
    }

    proptest::proptest! {
        /// Anti-inflation: with no new facts and no resolutions, the
        /// score never exceeds the previous turn's score.
        #[test]
        fn score_never_rises_without_progress(
            previous in 0u8..=100,
            n_required in 0usize..6,
            n_answered in 0usize..6,
            turn in 1u32..10,
        ) {
            let required: Vec<String> = (0..n_required).map(|i| format!("k{i}")).collect();
            let facts: HashMap<String, String> = (0..n_answered)
                .map(|i| (format!("k{i}"), "v".to_string()))
                .collect();
            let guards = ReadinessGuards {
                previous_score: previous,
                turn_count: turn,
                merge: MergeReport::default(),
                open_conflicts: false,
                has_placeholder: false,
            };
            proptest::prop_assert!(score(&required, &facts, &guards) <= previous);
        }
    }
}
