//! Run-level failure taxonomy.
//!
//! Every stage either produces its output or returns one of these, and the
//! run stops there. Nothing is written unless all prior stages succeed.

use thiserror::Error;

use crate::source::errors::FetchError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum StandingsError {
    #[error("Source unavailable after {attempts} attempts: {last_error}")]
    SourceUnavailable { attempts: u32, last_error: FetchError },

    #[error("Source request rejected: {0}")]
    SourceRejected(FetchError),

    #[error("Standings structure not found (tried: {})", .locators_tried.join(", "))]
    StructureNotFound { locators_tried: Vec<&'static str> },

    #[error("Incomplete standings: expected {expected} teams, got {actual} (dropped: {dropped:?})")]
    IncompleteStandings {
        expected: usize,
        actual: usize,
        partial: Vec<String>,
        dropped: Vec<String>,
    },

    #[error("Team outside the canonical set: {name}")]
    UnknownTeam { name: String },

    #[error("Duplicate team in standings: {name}")]
    DuplicateTeam { name: String },

    #[error("Persistence failed: {0}")]
    PersistenceFailed(#[from] StoreError),
}

impl StandingsError {
    /// Pipeline stage that raised the error, for log tagging.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } | Self::SourceRejected(_) => "fetch",
            Self::StructureNotFound { .. } => "extract",
            Self::IncompleteStandings { .. }
            | Self::UnknownTeam { .. }
            | Self::DuplicateTeam { .. } => "validate",
            Self::PersistenceFailed(_) => "persist",
        }
    }

    /// Whether re-running later could plausibly succeed without code changes.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::PersistenceFailed(_)
        )
    }
}
