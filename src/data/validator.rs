//! Cardinality, membership and uniqueness checks on the normalized list.

use std::collections::HashSet;

use crate::data::models::NormalizedStandings;
use crate::data::teams::is_canonical;
use crate::errors::StandingsError;

/// Accept `names` only if it holds exactly `expected_count` distinct
/// canonical names.
///
/// The count is checked first so a short list reports as incomplete even
/// when it also contains a repeat.
pub fn validate(
    names: Vec<String>,
    expected_count: usize,
) -> Result<NormalizedStandings, StandingsError> {
    if names.len() != expected_count {
        return Err(StandingsError::IncompleteStandings {
            expected: expected_count,
            actual: names.len(),
            partial: names,
            dropped: Vec::new(),
        });
    }

    if let Some(name) = names.iter().find(|name| !is_canonical(name)) {
        return Err(StandingsError::UnknownTeam { name: name.clone() });
    }

    let mut seen = HashSet::with_capacity(names.len());
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(StandingsError::DuplicateTeam { name: name.clone() });
        }
    }

    Ok(NormalizedStandings::new_unchecked(names))
}
