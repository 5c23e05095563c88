//! Single point of access to the hosted backend.
//!
//! Screens receive an `Arc<dyn Gateway>` at construction. [`connect`] picks
//! the strategy once at startup: [`RestGateway`] when backend credentials are
//! configured, [`UnconfiguredGateway`] otherwise. The unconfigured strategy
//! fails every call with [`GatewayError::NotConfigured`], which is what
//! drives the screens onto their demo data.

mod query;
mod rest;
mod unconfigured;

pub use query::{Direction, Filter, Order, Query};
pub use rest::RestGateway;
pub use unconfigured::UnconfiguredGateway;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::{BackendMode, Config};

/// Table names on the backend.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const POSTS: &str = "posts";
    pub const COMMENTS: &str = "comments";
    pub const POST_LIKES: &str = "post_likes";
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("backend is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no rows returned from {0}")]
    NoRows(String),
    #[error("storage upload failed: {0}")]
    Storage(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Whether the failure means the backend is absent rather than broken.
    #[must_use]
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured)
    }
}

/// The signed-in user behind the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Supported OAuth identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

/// Session, row and blob operations against the backend.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Whether calls can reach a real backend.
    fn is_configured(&self) -> bool;

    /// The signed-in user, or `None` for an anonymous session.
    async fn current_user(&self) -> Result<Option<SessionUser>, GatewayError>;

    async fn sign_out(&self) -> Result<(), GatewayError>;

    /// URL that starts an OAuth sign-in in the browser.
    fn oauth_url(&self, provider: OAuthProvider, redirect_to: &str) -> Result<String, GatewayError>;

    /// Email a one-time sign-in link.
    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), GatewayError>;

    async fn select(&self, query: &Query) -> Result<Vec<serde_json::Value>, GatewayError>;

    /// Insert one row. `returning` names the columns to echo back.
    async fn insert(
        &self,
        table: &str,
        row: serde_json::Value,
        returning: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, GatewayError>;

    /// Insert or replace one row keyed by its primary key.
    async fn upsert(&self, table: &str, row: serde_json::Value) -> Result<(), GatewayError>;

    async fn update(
        &self,
        table: &str,
        patch: serde_json::Value,
        filters: &[Filter],
    ) -> Result<(), GatewayError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), GatewayError>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), GatewayError>;

    fn public_url(&self, bucket: &str, path: &str) -> Result<String, GatewayError>;
}

/// Build the gateway selected by configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client or storage client cannot be created.
pub fn connect(config: &Config) -> Result<Arc<dyn Gateway>, GatewayError> {
    match &config.backend {
        BackendMode::Rest { .. } => Ok(Arc::new(RestGateway::new(config)?)),
        BackendMode::Unconfigured => {
            warn!("SUPABASE_URL and/or SUPABASE_ANON_KEY are not set. Using mock client.");
            Ok(Arc::new(UnconfiguredGateway))
        }
    }
}

/// Run `query` and decode every row as `T`.
///
/// # Errors
///
/// Returns the gateway error, or a decode error naming the table.
pub async fn fetch_rows<T: DeserializeOwned>(
    gateway: &dyn Gateway,
    query: &Query,
) -> Result<Vec<T>, GatewayError> {
    let rows = gateway.select(query).await?;
    decode_rows(query.table(), rows)
}

/// Run `query` and decode the first row, failing with `NoRows` if empty.
///
/// # Errors
///
/// Returns the gateway error, `NoRows`, or a decode error.
pub async fn fetch_one<T: DeserializeOwned>(
    gateway: &dyn Gateway,
    query: &Query,
) -> Result<T, GatewayError> {
    let query = query.clone().limit(1);
    fetch_rows(gateway, &query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::NoRows(query.table().to_string()))
}

/// Decode raw rows returned by `select` or `insert`.
///
/// # Errors
///
/// Returns a decode error naming `table`.
pub fn decode_rows<T: DeserializeOwned>(
    table: &str,
    rows: Vec<serde_json::Value>,
) -> Result<Vec<T>, GatewayError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| GatewayError::Decode {
                what: format!("{table} row"),
                source,
            })
        })
        .collect()
}

/// Serialize an insert or patch payload.
///
/// # Errors
///
/// Returns `InvalidRequest` if the value cannot be represented as JSON.
pub fn to_row<T: Serialize>(value: &T) -> Result<serde_json::Value, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        id: String,
    }

    #[test]
    fn test_decode_rows() {
        let rows: Vec<Row> = decode_rows("posts", vec![json!({"id": "a"}), json!({"id": "b"})]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id, "b");
    }

    #[test]
    fn test_decode_rows_names_table_on_error() {
        let err = decode_rows::<Row>("comments", vec![json!({"nope": 1})]).unwrap_err();
        assert!(err.to_string().contains("comments row"));
    }

    #[test]
    fn test_connect_without_backend_is_unconfigured() {
        let gateway = connect(&Config::for_testing()).unwrap();
        assert!(!gateway.is_configured());
    }

    #[tokio::test]
    async fn test_fetch_one_reports_not_configured() {
        let err = fetch_one::<Row>(&UnconfiguredGateway, &Query::from("posts"))
            .await
            .unwrap_err();
        assert!(err.is_not_configured());
    }
}
