// Client bootstrap document and session state endpoints
//
// Browser scripts read their API settings from here instead of page globals.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::models::Role;
use crate::config::{ApiConfig, AuthEndpoints};
use crate::error::ApiError;
use crate::session::TokenStore;
use crate::views::AuthState;
use crate::AppState;

/// Browser storage key holding the bearer token of a script-driven login
pub const TOKEN_STORAGE_KEY: &str = "API_TOKEN";

/// Browser storage key holding the role of a script-driven login
pub const ROLE_STORAGE_KEY: &str = "API_ROLE";

/// Configuration handed to browser scripts
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClientBootstrap {
    #[schema(example = "http://localhost:8000")]
    pub api_base_url: String,
    #[schema(example = "/api")]
    pub api_prefix: String,
    pub user: AuthEndpoints,
    pub entrepreneur: AuthEndpoints,
    #[schema(example = "API_TOKEN")]
    pub token_storage_key: String,
    #[schema(example = "API_ROLE")]
    pub role_storage_key: String,
}

impl ClientBootstrap {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            api_base_url: api.base_url.clone(),
            api_prefix: api.prefix.clone(),
            user: api.endpoints(Role::User).clone(),
            entrepreneur: api.endpoints(Role::Entrepreneur).clone(),
            token_storage_key: TOKEN_STORAGE_KEY.to_string(),
            role_storage_key: ROLE_STORAGE_KEY.to_string(),
        }
    }
}

/// Handler for GET /client-config
#[utoipa::path(
    get,
    path = "/client-config",
    responses(
        (status = 200, description = "API settings for browser scripts", body = ClientBootstrap)
    ),
    tag = "session"
)]
pub async fn client_config(State(state): State<AppState>) -> Json<ClientBootstrap> {
    Json(ClientBootstrap::from_config(&state.config.api))
}

/// Handler for GET /session
/// Reports which roles the current browser session is logged in as
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Authentication state of the session", body = AuthState),
        (status = 500, description = "Session store unavailable", body = String, example = json!({"error_code": "SESSION_ERROR", "message": "Session store error"}))
    ),
    tag = "session"
)]
pub async fn session_state(tokens: TokenStore) -> Result<Json<AuthState>, ApiError> {
    Ok(Json(tokens.auth_state().await?))
}
