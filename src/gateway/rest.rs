use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;
use tracing::{debug, info, warn};

use super::{Filter, Gateway, GatewayError, OAuthProvider, Query, SessionUser};
use crate::config::{BackendMode, Config};
use crate::constants::CLIENT_USER_AGENT;
use crate::storage::{public_object_url, S3Store};

/// Gateway for the hosted backend's REST, auth and storage APIs.
pub struct RestGateway {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
    s3: Option<S3Store>,
}

impl RestGateway {
    /// Create a gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` if the configuration has no backend, or an
    /// error if the HTTP or storage client cannot be built.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let BackendMode::Rest { url, anon_key } = &config.backend else {
            return Err(GatewayError::NotConfigured);
        };

        let http = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(CLIENT_USER_AGENT)
            .build()?;

        let s3 = config
            .storage_s3
            .as_ref()
            .map(|creds| S3Store::new(url, creds))
            .transpose()?;

        if s3.is_some() {
            info!("Uploads go through the S3-compatible storage endpoint");
        }

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.clone(),
            access_token: RwLock::new(None),
            s3,
        })
    }

    /// Attach a user access token (from an OAuth or magic-link redirect).
    #[must_use]
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        self.set_access_token(Some(token.into()));
        self
    }

    pub fn set_access_token(&self, token: Option<String>) {
        let mut slot = self.access_token.write().unwrap_or_else(|poisoned| {
            warn!("Access token lock poisoned, recovering");
            poisoned.into_inner()
        });
        *slot = token;
    }

    fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| {
                warn!("Access token lock poisoned, recovering");
                poisoned.into_inner()
            })
            .clone()
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        request.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn check(response: Response) -> Result<Response, GatewayError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        Err(GatewayError::Status { status, body })
    }

    fn require_filters(table: &str, filters: &[Filter]) -> Result<(), GatewayError> {
        if filters.is_empty() {
            return Err(GatewayError::InvalidRequest(format!(
                "refusing to modify every row of {table}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for RestGateway {
    fn is_configured(&self) -> bool {
        true
    }

    async fn current_user(&self) -> Result<Option<SessionUser>, GatewayError> {
        let Some(token) = self.access_token() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        if matches!(response.status().as_u16(), 401 | 403) {
            debug!("Access token rejected, treating session as anonymous");
            return Ok(None);
        }

        let user = Self::check(response)
            .await?
            .json::<SessionUser>()
            .await?;
        Ok(Some(user))
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        if self.access_token().is_none() {
            return Ok(());
        }

        let response = self
            .authorized(self.http.post(self.auth_url("logout")))
            .send()
            .await?;
        Self::check(response).await?;

        self.set_access_token(None);
        info!("Signed out");
        Ok(())
    }

    fn oauth_url(&self, provider: OAuthProvider, redirect_to: &str) -> Result<String, GatewayError> {
        let mut url = url::Url::parse(&self.auth_url("authorize"))
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to);
        Ok(url.into())
    }

    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), GatewayError> {
        debug!(email = %email, "Requesting sign-in link");

        let response = self
            .http
            .post(self.auth_url("otp"))
            .header("apikey", &self.anon_key)
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email, "create_user": true }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn select(&self, query: &Query) -> Result<Vec<serde_json::Value>, GatewayError> {
        debug!(table = %query.table(), "Selecting rows");

        let response = self
            .authorized(self.http.get(self.rest_url(query.table())))
            .query(&query.to_params())
            .send()
            .await?;

        let rows = Self::check(response)
            .await?
            .json::<Vec<serde_json::Value>>()
            .await?;
        debug!(table = %query.table(), count = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn insert(
        &self,
        table: &str,
        row: serde_json::Value,
        returning: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, GatewayError> {
        debug!(table = %table, "Inserting row");

        let mut request = self.authorized(self.http.post(self.rest_url(table)));
        request = match returning {
            Some(columns) => request
                .header("Prefer", "return=representation")
                .query(&[("select", columns)]),
            None => request.header("Prefer", "return=minimal"),
        };

        let response = Self::check(request.json(&row).send().await?).await?;

        if returning.is_none() {
            return Ok(Vec::new());
        }
        Ok(response.json::<Vec<serde_json::Value>>().await?)
    }

    async fn upsert(&self, table: &str, row: serde_json::Value) -> Result<(), GatewayError> {
        debug!(table = %table, "Upserting row");

        let response = self
            .authorized(self.http.post(self.rest_url(table)))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        patch: serde_json::Value,
        filters: &[Filter],
    ) -> Result<(), GatewayError> {
        Self::require_filters(table, filters)?;
        debug!(table = %table, "Updating rows");

        let params: Vec<(String, String)> = filters.iter().map(Filter::to_param).collect();
        let response = self
            .authorized(self.http.patch(self.rest_url(table)))
            .header("Prefer", "return=minimal")
            .query(&params)
            .json(&patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), GatewayError> {
        Self::require_filters(table, filters)?;
        debug!(table = %table, "Deleting rows");

        let params: Vec<(String, String)> = filters.iter().map(Filter::to_param).collect();
        let response = self
            .authorized(self.http.delete(self.rest_url(table)))
            .query(&params)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), GatewayError> {
        if let Some(s3) = &self.s3 {
            return s3.upload_bytes(bucket, path, &bytes, content_type).await;
        }

        debug!(bucket = %bucket, path = %path, size = bytes.len(), "Uploading object");

        let url = format!(
            "{}/storage/v1/object/{bucket}/{}",
            self.base_url,
            path.trim_start_matches('/')
        );
        let response = self
            .authorized(self.http.post(url))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        match Self::check(response).await {
            Ok(_) => Ok(()),
            Err(GatewayError::Status { status, body }) => {
                warn!(bucket = %bucket, path = %path, status, "Upload rejected");
                Err(GatewayError::Storage(format!("{status}: {body}")))
            }
            Err(e) => Err(e),
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String, GatewayError> {
        Ok(public_object_url(&self.base_url, bucket, path))
    }
}

impl std::fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestGateway")
            .field("base_url", &self.base_url)
            .field("signed_in", &self.access_token().is_some())
            .field("s3", &self.s3)
            .finish_non_exhaustive()
    }
}
