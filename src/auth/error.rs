// Authentication failure types and their rendering

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api_client::FALLBACK_MESSAGE;
use crate::auth::models::{AuthFlow, Role};
use crate::error::ApiError;
use crate::extract::ResponseFormat;
use crate::validation::field_messages;
use crate::views::{self, AuthState, FormView};

/// Why a login or registration did not produce a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthRejection {
    #[serde(skip)]
    pub status: StatusCode,
    pub message: String,
    #[serde(rename = "errors", skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl AuthRejection {
    pub fn new(
        status: StatusCode,
        message: impl Into<String>,
        field_errors: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            field_errors,
        }
    }

    /// The external API could not be reached
    pub fn unreachable() -> Self {
        Self::new(StatusCode::BAD_GATEWAY, FALLBACK_MESSAGE, BTreeMap::new())
    }

    /// Local validation failed before anything was sent upstream
    ///
    /// The headline message belongs to the first failing field in form order.
    pub fn invalid(errors: &validator::ValidationErrors, field_order: &[&str]) -> Self {
        let field_errors = field_messages(errors);
        let message = field_order
            .iter()
            .find_map(|field| field_errors.get(*field))
            .or_else(|| field_errors.values().next())
            .and_then(|messages| messages.first())
            .cloned()
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, field_errors)
    }

    /// First message recorded for a field
    pub fn first_error(&self, field: &str) -> Option<&str> {
        self.field_errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }
}

/// A rejected submission together with what is needed to answer the browser
#[derive(Debug)]
pub struct AuthFailure {
    pub role: Role,
    pub flow: AuthFlow,
    pub rejection: AuthRejection,
    pub old_input: BTreeMap<String, String>,
    pub auth_state: AuthState,
    pub format: ResponseFormat,
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        if self.rejection.status.is_server_error() {
            warn!(
                "{} {} failed upstream with {}",
                self.role, self.flow, self.rejection.status
            );
        } else {
            debug!(
                "{} {} rejected with {}: {}",
                self.role, self.flow, self.rejection.status, self.rejection.message
            );
        }

        match self.format {
            ResponseFormat::Json => (self.rejection.status, Json(self.rejection)).into_response(),
            ResponseFormat::Html => {
                // Browsers get the form back; upstream 5xx still reads as a form error
                let status = if self.rejection.status.is_client_error() {
                    self.rejection.status
                } else {
                    StatusCode::UNPROCESSABLE_ENTITY
                };
                let page = views::auth_form(
                    &self.auth_state,
                    &FormView {
                        role: self.role,
                        flow: self.flow,
                        old_input: &self.old_input,
                        rejection: Some(&self.rejection),
                    },
                );
                match page {
                    Ok(page) => (status, Html(page)).into_response(),
                    Err(e) => ApiError::from(e).into_response(),
                }
            }
        }
    }
}
