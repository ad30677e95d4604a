// HTTP client wrapper for the external storefront API

use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api_client::{AuthOutcome, OutboundBody};
use crate::auth::models::{AuthFlow, Role};
use crate::auth::token::BearerToken;
use crate::config::{ApiConfig, CredentialEncoding};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Transport(error.to_string())
    }
}

/// A request bound for the external API
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub token: Option<BearerToken>,
    pub body: OutboundBody,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            token: None,
            body: OutboundBody::Empty,
        }
    }

    /// Attach a bearer token when one is available
    pub fn bearer(mut self, token: Option<BearerToken>) -> Self {
        self.token = token;
        self
    }

    pub fn body(mut self, body: OutboundBody) -> Self {
        self.body = body;
        self
    }
}

/// Decoded body of an upstream response
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Empty,
    Json(Value),
    Text(String),
}

/// Status and body of an upstream response, relayed verbatim to the browser
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    async fn read(response: reqwest::Response) -> Result<Self, ClientError> {
        let status = response.status();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            UpstreamBody::Empty
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => UpstreamBody::Json(value),
                Err(_) => UpstreamBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
            }
        };

        Ok(Self { status, body })
    }

    /// JSON body, if the upstream answered with JSON
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            UpstreamBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        match self.body {
            UpstreamBody::Empty => self.status.into_response(),
            UpstreamBody::Json(value) => (self.status, Json(value)).into_response(),
            UpstreamBody::Text(text) => (self.status, text).into_response(),
        }
    }
}

/// Client for the external API, cheap to clone
#[derive(Clone)]
pub struct ExternalApi {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
}

impl ExternalApi {
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Send a request and decode the response, whatever its status
    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ClientError> {
        let url = self.config.url(&request.path);
        debug!(
            "Upstream {} {} (authenticated: {})",
            request.method,
            request.path,
            request.token.is_some()
        );

        let mut builder = self
            .http
            .request(request.method, &url)
            .header(header::ACCEPT, "application/json");

        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token.expose());
        }

        builder = match request.body {
            OutboundBody::Empty => builder,
            OutboundBody::Json(value) => builder.json(&value),
            OutboundBody::Form(fields) => builder.form(&fields),
            OutboundBody::Multipart(form) => builder.multipart(form.into_reqwest()?),
        };

        let response = builder.send().await.map_err(|e| {
            warn!("Upstream request to {} failed: {}", request.path, e);
            ClientError::from(e)
        })?;

        let response = UpstreamResponse::read(response).await?;
        debug!("Upstream {} answered {}", request.path, response.status);
        Ok(response)
    }

    /// POST credentials to a role's login or register endpoint and normalize the answer
    pub async fn authenticate(
        &self,
        role: Role,
        flow: AuthFlow,
        fields: Vec<(String, String)>,
    ) -> Result<AuthOutcome, ClientError> {
        let endpoints = self.config.endpoints(role);
        let path = match flow {
            AuthFlow::Login => &endpoints.login,
            AuthFlow::Register => &endpoints.register,
        };

        let body = match self.config.credential_encoding {
            CredentialEncoding::Json => {
                let map: Map<String, Value> = fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::String(value)))
                    .collect();
                OutboundBody::Json(Value::Object(map))
            }
            CredentialEncoding::Form => OutboundBody::Form(fields),
        };

        let response = self
            .send(UpstreamRequest::new(Method::POST, path.clone()).body(body))
            .await?;

        Ok(AuthOutcome::from_response(&response))
    }

    /// Tell the external API a role's token is no longer in use
    pub async fn logout(&self, role: Role, token: BearerToken) -> Result<UpstreamResponse, ClientError> {
        let path = self.config.endpoints(role).logout.clone();
        self.send(UpstreamRequest::new(Method::POST, path).bearer(Some(token)))
            .await
    }
}
