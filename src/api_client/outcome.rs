// Normalization of login/register answers into a tagged result

use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde_json::Value;

use crate::api_client::{UpstreamBody, UpstreamResponse};
use crate::auth::error::AuthRejection;
use crate::auth::token::{extract_token, BearerToken};

/// Message shown when the upstream gives nothing more specific
pub const FALLBACK_MESSAGE: &str = "The provided credentials are incorrect.";

/// Result of a login or register call
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// 2xx answer carrying a token
    Authenticated { token: BearerToken, payload: Value },
    /// Anything else
    Rejected(AuthRejection),
}

impl AuthOutcome {
    pub fn from_response(response: &UpstreamResponse) -> Self {
        let body = match &response.body {
            UpstreamBody::Json(value) => Some(value),
            _ => None,
        };

        if response.status.is_success() {
            if let Some(token) = body.and_then(extract_token) {
                return AuthOutcome::Authenticated {
                    token,
                    payload: body.cloned().unwrap_or(Value::Null),
                };
            }
        }

        // A 2xx without a token is still a failed login
        let status = if response.status.is_success() {
            StatusCode::UNAUTHORIZED
        } else {
            response.status
        };

        let (message, field_errors) = match body {
            Some(value) => (
                extract_message(value).unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
                extract_field_errors(value),
            ),
            None => (FALLBACK_MESSAGE.to_string(), BTreeMap::new()),
        };

        AuthOutcome::Rejected(AuthRejection::new(status, message, field_errors))
    }
}

/// Human-readable error: first message of the first `errors` key, else `message`
pub fn extract_message(body: &Value) -> Option<String> {
    let from_errors = body
        .get("errors")
        .and_then(Value::as_object)
        .and_then(|errors| errors.values().next())
        .and_then(first_message);

    from_errors.or_else(|| {
        body.get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    })
}

/// Every `errors` entry, keyed by field
pub fn extract_field_errors(body: &Value) -> BTreeMap<String, Vec<String>> {
    let Some(errors) = body.get("errors").and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    errors
        .iter()
        .filter_map(|(field, value)| {
            let messages: Vec<String> = match value {
                Value::String(message) => vec![message.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                _ => Vec::new(),
            };
            (!messages.is_empty()).then(|| (field.clone(), messages))
        })
        .collect()
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
        _ => None,
    }
}
