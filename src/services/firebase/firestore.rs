//! Journal entries stored in Firestore.

use super::document::{entry_fields, entry_from_document};
use super::{FirebaseSession, FirebaseSettings, FirestoreClient, RestError};
use crate::constants::ENTRIES_COLLECTION;
use crate::errors::JournalError;
use crate::models::JournalEntry;
use crate::retry::{with_retry, RetryPolicy};
use crate::services::JournalService;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const MUST_EXIST: [(&str, &str); 1] = [("currentDocument.exists", "true")];
const MUST_NOT_EXIST: [(&str, &str); 1] = [("currentDocument.exists", "false")];

/// Live [`JournalService`]; every call goes through the retry policy.
#[derive(Debug, Clone)]
pub struct FirestoreJournalService {
    client: FirestoreClient,
    retry: RetryPolicy,
}

impl FirestoreJournalService {
    pub fn new(
        settings: &FirebaseSettings,
        session: Arc<FirebaseSession>,
        retry: RetryPolicy,
    ) -> Self {
        Self::with_client(Client::new(), settings, session, retry)
    }

    pub fn with_client(
        http: Client,
        settings: &FirebaseSettings,
        session: Arc<FirebaseSession>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: FirestoreClient::new(http, settings, session),
            retry,
        }
    }

    fn session(&self) -> &FirebaseSession {
        self.client.session()
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, JournalError> {
        self.client
            .request(method, path, query, body)
            .await
            .map_err(|e: RestError| e.into_journal_error(self.session()))
    }

    fn query_body(user_id: &str) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": ENTRIES_COLLECTION }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "userId" },
                        "op": "EQUAL",
                        "value": { "stringValue": user_id },
                    }
                },
                "orderBy": [{
                    "field": { "fieldPath": "createdAt" },
                    "direction": "DESCENDING",
                }],
            }
        })
    }

    fn decode_query_results(response: &Value) -> Result<Vec<JournalEntry>, JournalError> {
        let rows = response.as_array().ok_or(JournalError::DecodingError)?;
        rows.iter()
            // rows without a document only carry a readTime
            .filter_map(|row| row.get("document"))
            .map(|document| {
                entry_from_document(document).map_err(|e| {
                    warn!("Undecodable entry document: {}", e);
                    JournalError::DecodingError
                })
            })
            .collect()
    }

    fn entry_path(entry_id: &str) -> String {
        format!("/{}/{}", ENTRIES_COLLECTION, entry_id)
    }

    async fn fetch_document(&self, path: &str) -> Result<JournalEntry, JournalError> {
        let document = with_retry(self.retry, "fetch_entry", || {
            self.call(Method::GET, path, &[], None)
        })
        .await?;
        entry_from_document(&document).map_err(|e| {
            warn!("Undecodable entry document: {}", e);
            JournalError::DecodingError
        })
    }

    /// Whether the document at `path` already holds `entry`, as when an
    /// earlier attempt committed but its response was lost.
    async fn already_stored(&self, path: &str, entry: &JournalEntry) -> bool {
        let sent = json!({ "name": path, "fields": entry_fields(entry) });
        match (self.fetch_document(path).await, entry_from_document(&sent)) {
            (Ok(stored), Ok(sent)) => stored == sent,
            _ => false,
        }
    }
}

#[async_trait]
impl JournalService for FirestoreJournalService {
    async fn fetch_entries(&self, user_id: &str) -> Result<Vec<JournalEntry>, JournalError> {
        debug!("Fetching entries for user {}", user_id);
        let body = Self::query_body(user_id);
        let response = with_retry(self.retry, "fetch_entries", || {
            self.call(Method::POST, ":runQuery", &[], Some(&body))
        })
        .await?;

        let entries = Self::decode_query_results(&response)?;
        info!("Fetched {} entries", entries.len());
        Ok(entries)
    }

    async fn create_entry(&self, mut entry: JournalEntry) -> Result<JournalEntry, JournalError> {
        let id = entry
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let path = Self::entry_path(&id);
        let body = json!({ "fields": entry_fields(&entry) });

        let (path_ref, body_ref) = (&path, &body);
        let created = with_retry(self.retry, "create_entry", move || async move {
            match self
                .client
                .request(Method::PATCH, path_ref, &MUST_NOT_EXIST, Some(body_ref))
                .await
            {
                Ok(_) => Ok(true),
                Err(err) if err.is_conflict() => Ok(false),
                Err(err) => Err(err.into_journal_error(self.session())),
            }
        })
        .await?;

        if !created {
            if !self.already_stored(&path, &entry).await {
                return Err(JournalError::InvalidData(format!(
                    "Entry {} already exists",
                    id
                )));
            }
            debug!("Entry {} was stored by an earlier attempt", id);
        }

        info!("Created entry {}", id);
        Ok(entry)
    }

    async fn update_entry(&self, entry: JournalEntry) -> Result<JournalEntry, JournalError> {
        let id = entry
            .id
            .as_deref()
            .ok_or_else(|| JournalError::InvalidData("Entry has no id".to_string()))?;
        let path = Self::entry_path(id);
        let body = json!({ "fields": entry_fields(&entry) });

        with_retry(self.retry, "update_entry", || {
            self.call(Method::PATCH, &path, &MUST_EXIST, Some(&body))
        })
        .await?;

        debug!("Updated entry {}", id);
        Ok(entry)
    }

    async fn delete_entry(&self, user_id: &str, entry_id: &str) -> Result<(), JournalError> {
        let path = Self::entry_path(entry_id);
        let stored = self.fetch_document(&path).await?;
        if stored.user_id != user_id {
            warn!("Refusing to delete entry {} owned by another user", entry_id);
            return Err(JournalError::Unauthorized);
        }

        with_retry(self.retry, "delete_entry", || {
            self.call(Method::DELETE, &path, &MUST_EXIST, None)
        })
        .await?;

        info!("Deleted entry {}", entry_id);
        Ok(())
    }
}
