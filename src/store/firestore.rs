//! Firestore REST writer.
//!
//! Each write is a single `documents:commit` with one `update` on the full
//! document name and no update mask, which replaces every field. With
//! server timestamps the `lastUpdated` field is filled by a
//! `REQUEST_TIME` transform inside the same commit.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::auth::Credentials;
use crate::data::models::{LastUpdated, StandingsDocument};

use super::{DocumentPath, StandingsStore, StoreError};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";

/// Firestore client handle. Build once per process and pass it to the
/// pipeline; the OAuth token is minted on first use and reused.
pub struct FirestoreStore {
    client: Client,
    credentials: Credentials,
    base_url: String,
    project_id: String,
    database: String,
    token: OnceCell<String>,
}

impl FirestoreStore {
    pub fn new(
        credentials: Credentials,
        project_id: &str,
        database: &str,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        if project_id.is_empty() {
            return Err(StoreError::InvalidPath(
                "Firestore project id is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let base_url = match &credentials {
            Credentials::Emulator { host } => format!("http://{}/v1", host.trim_end_matches('/')),
            _ => FIRESTORE_BASE_URL.to_string(),
        };

        Ok(Self {
            client,
            credentials,
            base_url,
            project_id: project_id.to_string(),
            database: if database.is_empty() {
                DEFAULT_DATABASE.to_string()
            } else {
                database.to_string()
            },
            token: OnceCell::new(),
        })
    }

    fn database_root(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database)
    }

    /// Fully qualified resource name of a document.
    pub fn document_name(&self, path: &DocumentPath) -> String {
        format!("{}/documents/{}", self.database_root(), path)
    }

    pub fn commit_url(&self) -> String {
        format!("{}/{}/documents:commit", self.base_url, self.database_root())
    }

    async fn bearer_token(&self) -> Result<String, StoreError> {
        match &self.credentials {
            // The emulator accepts this fixed token and bypasses security rules.
            Credentials::Emulator { .. } => Ok("owner".to_string()),
            Credentials::AccessToken(token) => Ok(token.clone()),
            Credentials::ServiceAccount(key) => {
                let token = self
                    .token
                    .get_or_try_init(|| key.exchange_token(&self.client))
                    .await?;
                Ok(token.clone())
            }
        }
    }
}

/// Commit request body for a whole-document overwrite.
pub fn commit_body(document_name: &str, document: &StandingsDocument) -> Value {
    let values: Vec<Value> = document
        .standings
        .names()
        .iter()
        .map(|name| json!({ "stringValue": name }))
        .collect();

    let mut fields = serde_json::Map::new();
    fields.insert(
        "standings".to_string(),
        json!({ "arrayValue": { "values": values } }),
    );

    let mut write = serde_json::Map::new();
    match document.last_updated {
        LastUpdated::Client(ts) => {
            fields.insert(
                "lastUpdated".to_string(),
                json!({ "timestampValue": ts.to_rfc3339() }),
            );
        }
        LastUpdated::ServerTime => {
            write.insert(
                "updateTransforms".to_string(),
                json!([{ "fieldPath": "lastUpdated", "setToServerValue": "REQUEST_TIME" }]),
            );
        }
    }
    write.insert(
        "update".to_string(),
        json!({ "name": document_name, "fields": fields }),
    );

    json!({ "writes": [Value::Object(write)] })
}

#[async_trait]
impl StandingsStore for FirestoreStore {
    async fn write(
        &self,
        path: &DocumentPath,
        document: &StandingsDocument,
    ) -> Result<(), StoreError> {
        let name = self.document_name(path);
        let body = commit_body(&name, document);
        let token = self.bearer_token().await?;

        debug!(document = %name, teams = document.standings.len(), "Firestore commit");

        let response = self
            .client
            .post(self.commit_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::from_response(status.as_u16(), &text));
        }

        info!(document = %path, teams = document.standings.len(), "Standings written to Firestore");
        Ok(())
    }
}
