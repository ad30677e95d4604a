// Authenticated request forwarding

use axum::http::Method;
use tracing::debug;

use crate::api_client::{ExternalApi, OutboundBody, UpstreamRequest, UpstreamResponse};
use crate::auth::models::Role;
use crate::error::ApiError;
use crate::session::TokenStore;

/// Whose token, if any, a forwarded call carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    As(Role),
}

/// Relays calls to the external API with the session's bearer token attached
///
/// No authorization happens here. A role-scoped call without a stored token is
/// sent anyway and the external API decides.
#[derive(Clone)]
pub struct Forwarder {
    api: ExternalApi,
}

impl Forwarder {
    pub fn new(api: ExternalApi) -> Self {
        Self { api }
    }

    /// Map a browser path under `/api` onto the configured upstream prefix
    pub fn upstream_path(&self, browser_path: &str, query: Option<&str>) -> String {
        let rest = browser_path
            .strip_prefix("/api")
            .unwrap_or(browser_path)
            .trim_start_matches('/');
        let path = self.api.config().resource_path(rest);
        match query {
            Some(query) if !query.is_empty() => format!("{}?{}", path, query),
            _ => path,
        }
    }

    pub async fn relay(
        &self,
        tokens: &TokenStore,
        access: Access,
        method: Method,
        path: String,
        body: OutboundBody,
    ) -> Result<UpstreamResponse, ApiError> {
        let token = match access {
            Access::Public => None,
            Access::As(role) => {
                let token = tokens.token(role).await?;
                if token.is_none() {
                    debug!("No {} token in session, forwarding {} {} without one", role, method, path);
                }
                token
            }
        };

        let request = UpstreamRequest::new(method, path).bearer(token).body(body);
        Ok(self.api.send(request).await?)
    }
}
