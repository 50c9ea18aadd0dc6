//! One standings run: fetch → extract → normalize → validate → persist.
//!
//! Stages run strictly in order and the first failure ends the run. The
//! store is only called once every earlier stage has succeeded, so a failed
//! run leaves the previously persisted document untouched.

use chrono::{FixedOffset, Utc};
use tracing::{info, warn};

use crate::data::extractor::extract;
use crate::data::models::{LastUpdated, NormalizedStandings, RawDocument, StandingsDocument};
use crate::data::teams::normalize_all;
use crate::data::validator::validate;
use crate::errors::StandingsError;
use crate::source::client::{StandingsFetcher, Transport};
use crate::store::{DocumentPath, StandingsStore};

/// Where `lastUpdated` comes from. Keep this fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampMode {
    Server,
    Client(FixedOffset),
}

impl TimestampMode {
    pub fn stamp(&self) -> LastUpdated {
        match self {
            Self::Server => LastUpdated::ServerTime,
            Self::Client(offset) => LastUpdated::Client(Utc::now().with_timezone(offset)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub expected_count: usize,
    pub destination: DocumentPath,
    pub timestamp: TimestampMode,
    /// Run every stage but log the document instead of writing it.
    pub dry_run: bool,
}

/// Output of the in-memory stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub locator: &'static str,
    pub standings: NormalizedStandings,
    /// Raw names with no mapping, dropped before validation.
    pub dropped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub locator: &'static str,
    pub dropped: Vec<String>,
    pub document: StandingsDocument,
    pub persisted: bool,
}

/// Extract, normalize and validate a fetched payload.
pub fn process_document(
    doc: &RawDocument,
    expected_count: usize,
) -> Result<Processed, StandingsError> {
    let extraction = extract(doc)?;

    let normalized = normalize_all(extraction.entries.iter().map(|e| e.name.as_str()));
    if !normalized.dropped.is_empty() {
        warn!(
            dropped = ?normalized.dropped,
            "Unrecognized team names dropped; update the name mapping table"
        );
    }

    let standings = match validate(normalized.names, expected_count) {
        Ok(standings) => standings,
        Err(StandingsError::IncompleteStandings {
            expected,
            actual,
            partial,
            ..
        }) => {
            return Err(StandingsError::IncompleteStandings {
                expected,
                actual,
                partial,
                dropped: normalized.dropped,
            })
        }
        Err(e) => return Err(e),
    };

    info!(teams = standings.len(), locator = extraction.locator, "Standings validated");
    Ok(Processed {
        locator: extraction.locator,
        standings,
        dropped: normalized.dropped,
    })
}

pub struct StandingsPipeline<T, S> {
    fetcher: StandingsFetcher<T>,
    store: S,
    config: PipelineConfig,
}

impl<T: Transport, S: StandingsStore> StandingsPipeline<T, S> {
    pub fn new(fetcher: StandingsFetcher<T>, store: S, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
        }
    }

    pub fn fetcher(&self) -> &StandingsFetcher<T> {
        &self.fetcher
    }

    pub async fn run(&self) -> Result<RunReport, StandingsError> {
        let raw = self.fetcher.fetch().await?;
        let processed = process_document(&raw, self.config.expected_count)?;

        let document = StandingsDocument::new(processed.standings, self.config.timestamp.stamp());

        if self.config.dry_run {
            let rendered = serde_json::to_string(&document).unwrap_or_default();
            info!(
                destination = %self.config.destination,
                document = %rendered,
                "Dry run, skipping write"
            );
            return Ok(RunReport {
                locator: processed.locator,
                dropped: processed.dropped,
                document,
                persisted: false,
            });
        }

        self.store
            .write(&self.config.destination, &document)
            .await
            .map_err(StandingsError::PersistenceFailed)?;

        info!(
            destination = %self.config.destination,
            teams = document.standings.len(),
            leader = document.standings.names().first().map(String::as_str).unwrap_or(""),
            "Standings persisted"
        );
        Ok(RunReport {
            locator: processed.locator,
            dropped: processed.dropped,
            document,
            persisted: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    #[test]
    fn test_client_stamp_uses_configured_offset() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        match TimestampMode::Client(jst).stamp() {
            LastUpdated::Client(ts) => assert_eq!(ts.offset().fix(), jst),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(TimestampMode::Server.stamp(), LastUpdated::ServerTime);
    }

    #[test]
    fn test_dropped_names_reach_incomplete_error() {
        let html = r#"<table><tbody>
            <tr data-team-id="1"><td><span class="long">Liverpool</span></td></tr>
            <tr data-team-id="2"><td><span class="long">Atlantis FC</span></td></tr>
        </tbody></table>"#;

        match process_document(&RawDocument::markup(html), 2) {
            Err(StandingsError::IncompleteStandings {
                actual,
                partial,
                dropped,
                ..
            }) => {
                assert_eq!(actual, 1);
                assert_eq!(partial, vec!["Liverpool"]);
                assert_eq!(dropped, vec!["Atlantis FC"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_commit_is_persistence_failure() {
        use std::time::Duration;

        use crate::auth::Credentials;
        use crate::source::client::{FetchPolicy, ReqwestTransport, SourceRequest};
        use crate::store::firestore::FirestoreStore;
        use crate::store::StoreError;
        use crate::testing::{json_response, LocalServer};

        let page = r#"<table><tbody>
            <tr data-team-id="1"><td><span class="long">Arsenal</span></td></tr>
            <tr data-team-id="2"><td><span class="long">Spurs</span></td></tr>
        </tbody></table>"#;
        let source = LocalServer::start(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{page}",
            page.len()
        ))
        .await;
        let emulator = LocalServer::start(json_response(
            "500 Internal Server Error",
            r#"{"error": {"code": 500, "message": "backend error", "status": "INTERNAL"}}"#,
        ))
        .await;

        let fetcher = StandingsFetcher::new(
            ReqwestTransport::new().unwrap(),
            SourceRequest::web_page(source.url("/tables")),
            FetchPolicy {
                timeout: Duration::from_secs(5),
                max_attempts: 1,
                retry_delay: Duration::ZERO,
            },
        );
        let store = FirestoreStore::new(
            Credentials::Emulator {
                host: emulator.host(),
            },
            "standings-test",
            "",
            5,
        )
        .unwrap();
        let pipeline = StandingsPipeline::new(
            fetcher,
            store,
            PipelineConfig {
                expected_count: 2,
                destination: DocumentPath::new("standings", "currentWeek").unwrap(),
                timestamp: TimestampMode::Server,
                dry_run: false,
            },
        );

        match pipeline.run().await {
            Err(err @ StandingsError::PersistenceFailed(StoreError::Http { status_code: 500, .. })) => {
                assert_eq!(err.stage(), "persist");
            }
            other => panic!("unexpected {other:?}"),
        }
        // The commit is sent once and not retried.
        assert_eq!(emulator.requests().len(), 1);
    }
}
