//! Core data models for a standings run.
//!
//! A run moves a `RawDocument` through extraction (`TeamEntry`),
//! normalization and validation (`NormalizedStandings`) and finally
//! into the persisted `StandingsDocument`.

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};
use std::fmt;

// =============================================================================
// Raw source payload
// =============================================================================

/// What kind of payload the source returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Markup,
    Json,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markup => write!(f, "markup"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Payload fetched from the source, consumed once by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub kind: ContentKind,
    pub body: String,
}

impl RawDocument {
    pub fn new(kind: ContentKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    pub fn markup(body: impl Into<String>) -> Self {
        Self::new(ContentKind::Markup, body)
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::new(ContentKind::Json, body)
    }
}

// =============================================================================
// Extracted entries
// =============================================================================

/// One team name as spelled by the source.
///
/// Sequence order is standings order. `rank` is only set when the source
/// carries an explicit position field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamEntry {
    pub name: String,
    pub rank: Option<u32>,
}

impl TeamEntry {
    pub fn ranked(name: impl Into<String>, rank: u32) -> Self {
        Self {
            name: name.into(),
            rank: Some(rank),
        }
    }
}

// =============================================================================
// Validated output
// =============================================================================

/// Ordered canonical team names, rank 1 first.
///
/// Only `data::validator::validate` constructs this, so holding one means
/// the count, membership and uniqueness checks have passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedStandings(Vec<String>);

impl NormalizedStandings {
    pub(crate) fn new_unchecked(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Persisted document
// =============================================================================

/// Write time recorded with the standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastUpdated {
    /// Assigned by the destination store when the write lands.
    ServerTime,
    /// Generated by this process in a fixed offset.
    Client(DateTime<FixedOffset>),
}

impl Serialize for LastUpdated {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::ServerTime => serializer.serialize_str("SERVER_TIMESTAMP"),
            Self::Client(ts) => serializer.serialize_str(&ts.to_rfc3339()),
        }
    }
}

/// The record written to the destination, replacing any prior value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsDocument {
    pub standings: NormalizedStandings,
    pub last_updated: LastUpdated,
}

impl StandingsDocument {
    pub fn new(standings: NormalizedStandings, last_updated: LastUpdated) -> Self {
        Self {
            standings,
            last_updated,
        }
    }
}
