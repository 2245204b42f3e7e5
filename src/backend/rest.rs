//! REST client for a PostgREST-style data API.
//!
//! Rows are written with `POST /rest/v1/{table}`, and updated or deleted with
//! `PATCH`/`DELETE /rest/v1/{table}?id=eq.{id}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{AuditEntry, Backend, AUDIT_TABLE};
use crate::config::BackendConfig;
use crate::error::SyncError;
use crate::sync::ActionId;

/// Header carrying the queued action id.
pub const ACTION_ID_HEADER: &str = "X-Client-Action-Id";

/// Backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl RestBackend {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` if the URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, SyncError> {
        let mut base = Url::parse(&config.url)
            .map_err(|e| SyncError::Config(format!("Invalid backend url {}: {e}", config.url)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, SyncError> {
        self.base
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| SyncError::Config(format!("Invalid table name {table}: {e}")))
    }

    fn row_url(&self, table: &str, id: &str) -> Result<Url, SyncError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Prefer", "return=minimal");
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<(), SyncError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Backend {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }
}

/// Pull the human readable part out of an error response.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

#[async_trait]
impl Backend for RestBackend {
    async fn insert(&self, table: &str, row: &Value, dedup: ActionId) -> Result<(), SyncError> {
        debug!(table, %dedup, "insert");
        let request = self
            .client
            .post(self.table_url(table)?)
            .header(ACTION_ID_HEADER, dedup.to_string())
            .json(row);
        self.send(request).await
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        row: &Value,
        dedup: ActionId,
    ) -> Result<(), SyncError> {
        debug!(table, id, %dedup, "update");
        let request = self
            .client
            .patch(self.row_url(table, id)?)
            .header(ACTION_ID_HEADER, dedup.to_string())
            .json(row);
        self.send(request).await
    }

    async fn delete(&self, table: &str, id: &str, dedup: ActionId) -> Result<(), SyncError> {
        debug!(table, id, %dedup, "delete");
        let request = self
            .client
            .delete(self.row_url(table, id)?)
            .header(ACTION_ID_HEADER, dedup.to_string());
        self.send(request).await
    }

    async fn record_audit(&self, entry: &AuditEntry) -> Result<(), SyncError> {
        let request = self.client.post(self.table_url(AUDIT_TABLE)?).json(entry);
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{OrganizationId, UserId};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn backend(url: &str) -> RestBackend {
        RestBackend::new(&BackendConfig {
            url: url.to_string(),
            api_key: Some("anon-key".to_string()),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_posts_row() {
        let mut server = Server::new_async().await;
        let dedup = ActionId::generate();
        let mock = server
            .mock("POST", "/rest/v1/sav_tickets")
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer anon-key")
            .match_header("x-client-action-id", dedup.to_string().as_str())
            .match_header("prefer", "return=minimal")
            .match_body(Matcher::Json(json!({"title": "Leak"})))
            .with_status(201)
            .create_async()
            .await;

        backend(&server.url())
            .insert("sav_tickets", &json!({"title": "Leak"}), dedup)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_filters_by_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/rest/v1/messages")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.m-7".into()))
            .match_header("apikey", "anon-key")
            .match_body(Matcher::Json(json!({"body": "edited"})))
            .with_status(204)
            .create_async()
            .await;

        backend(&server.url())
            .update("messages", "m-7", &json!({"body": "edited"}), ActionId::generate())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_filters_by_id() {
        let mut server = Server::new_async().await;
        let dedup = ActionId::generate();
        let mock = server
            .mock("DELETE", "/rest/v1/site_diary_entries")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.d-1".into()))
            .match_header("x-client-action-id", dedup.to_string().as_str())
            .with_status(204)
            .create_async()
            .await;

        backend(&server.url())
            .delete("site_diary_entries", "d-1", dedup)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_base_path_is_kept() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/project/rest/v1/messages")
            .with_status(201)
            .create_async()
            .await;

        backend(&format!("{}/project", server.url()))
            .insert("messages", &json!({"body": "hi"}), ActionId::generate())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_maps_to_backend_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/sav_tickets")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"23502","message":"null value in column \"title\""}"#)
            .create_async()
            .await;

        let err = backend(&server.url())
            .insert("sav_tickets", &json!({}), ActionId::generate())
            .await
            .unwrap_err();
        mock.assert_async().await;

        match err {
            SyncError::Backend { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "null value in column \"title\"");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_audit_goes_to_audit_table() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/audit_logs")
            .match_body(Matcher::PartialJson(json!({
                "resource_type": "ticket",
                "action": "offline_sync.CREATE",
            })))
            .with_status(201)
            .create_async()
            .await;

        let entry = AuditEntry {
            user_id: UserId::new("u-1"),
            organization_id: OrganizationId::new("o-1"),
            resource_type: "ticket".to_string(),
            resource_id: None,
            action: "offline_sync.CREATE".to_string(),
            details: json!({}),
        };
        backend(&server.url()).record_audit(&entry).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = backend(&url)
            .insert("messages", &json!({"body": "hi"}), ActionId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
        assert_eq!(error_message(StatusCode::BAD_REQUEST, "plain text"), "plain text");
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = RestBackend::new(&BackendConfig {
            url: "::nope".to_string(),
            api_key: None,
            request_timeout_secs: 1,
        })
        .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
