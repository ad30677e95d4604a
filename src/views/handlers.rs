// HTTP handlers for server-rendered pages

use axum::{
    extract::State,
    http::Method,
    response::{Html, IntoResponse, Response},
};

use crate::auth::models::Role;
use crate::error::ApiError;
use crate::forwarder::Access;
use crate::session::TokenStore;
use crate::views;
use crate::AppState;

/// Handler for GET /
pub async fn home(tokens: TokenStore) -> Result<Html<String>, ApiError> {
    let auth_state = tokens.auth_state().await?;
    Ok(Html(views::home(&auth_state)?))
}

/// Handler for GET /products
/// Renders the public catalogue from the upstream listing
pub async fn products(
    State(state): State<AppState>,
    tokens: TokenStore,
) -> Result<Html<String>, ApiError> {
    let path = state.config.api.resource_path("products");
    let response = state
        .forwarder
        .relay(&tokens, Access::Public, Method::GET, path, Default::default())
        .await?;

    if !response.status.is_success() {
        tracing::warn!("Catalogue listing returned {}", response.status);
    }

    let auth_state = tokens.auth_state().await?;
    let listing = response.status.is_success().then(|| response.json()).flatten();
    Ok(Html(views::catalogue(&auth_state, "Products", listing)?))
}

/// Handler for GET /entrepreneur/dashboard
pub async fn entrepreneur_dashboard(
    State(state): State<AppState>,
    tokens: TokenStore,
) -> Result<Response, ApiError> {
    profile_page(&state, &tokens, Role::Entrepreneur).await
}

/// Handler for GET /profile
pub async fn user_profile(
    State(state): State<AppState>,
    tokens: TokenStore,
) -> Result<Response, ApiError> {
    profile_page(&state, &tokens, Role::User).await
}

async fn profile_page(state: &AppState, tokens: &TokenStore, role: Role) -> Result<Response, ApiError> {
    let path = state
        .config
        .api
        .resource_path(&format!("{}/profile", role));
    let response = state
        .forwarder
        .relay(tokens, Access::As(role), Method::GET, path, Default::default())
        .await?;

    let auth_state = tokens.auth_state().await?;

    // The page keeps the upstream status so a 401 still reads as one
    if response.status.is_success() {
        Ok(Html(views::profile(&auth_state, role, response.json())?).into_response())
    } else {
        tracing::debug!("{} profile returned {}", role, response.status);
        Ok((response.status, Html(views::profile(&auth_state, role, None)?)).into_response())
    }
}
