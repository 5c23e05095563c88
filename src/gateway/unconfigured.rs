use async_trait::async_trait;

use super::{Filter, Gateway, GatewayError, OAuthProvider, Query, SessionUser};

/// Gateway used when no backend is configured.
///
/// Every operation fails with [`GatewayError::NotConfigured`] so screens
/// take their fallback path without any network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGateway;

#[async_trait]
impl Gateway for UnconfiguredGateway {
    fn is_configured(&self) -> bool {
        false
    }

    async fn current_user(&self) -> Result<Option<SessionUser>, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn oauth_url(&self, _provider: OAuthProvider, _redirect_to: &str) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn send_magic_link(&self, _email: &str, _redirect_to: &str) -> Result<(), GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn select(&self, _query: &Query) -> Result<Vec<serde_json::Value>, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn insert(
        &self,
        _table: &str,
        _row: serde_json::Value,
        _returning: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn upsert(&self, _table: &str, _row: serde_json::Value) -> Result<(), GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn update(
        &self,
        _table: &str,
        _patch: serde_json::Value,
        _filters: &[Filter],
    ) -> Result<(), GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn delete(&self, _table: &str, _filters: &[Filter]) -> Result<(), GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn upload(
        &self,
        _bucket: &str,
        _path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn public_url(&self, _bucket: &str, _path: &str) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}
