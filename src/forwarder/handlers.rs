// HTTP handlers relaying JSON API calls to the external API
//
// Route -> access mapping lives in the router; each handler only knows whose
// token to attach.

use axum::{
    extract::{OriginalUri, State},
    http::{Method, Uri},
    response::{IntoResponse, Response},
};

use crate::api_client::OutboundBody;
use crate::auth::models::Role;
use crate::error::ApiError;
use crate::forwarder::{payload::ForwardPayload, service::Access};
use crate::session::TokenStore;
use crate::AppState;

/// Handler for public catalogue reads (GET /api/products, /api/servicios, ...)
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Upstream listing relayed verbatim", body = String, example = json!({"data": [{"id": 1, "name": "Lamp"}]})),
        (status = 502, description = "External API unreachable")
    ),
    tag = "catalogue"
)]
pub async fn forward_public(
    State(state): State<AppState>,
    tokens: TokenStore,
    method: Method,
    OriginalUri(uri): OriginalUri,
    ForwardPayload(body): ForwardPayload,
) -> Result<Response, ApiError> {
    relay(&state, &tokens, Access::Public, method, &uri, body).await
}

/// Handler for calls made on behalf of the logged-in end user (profile, password, orders)
#[utoipa::path(
    post,
    path = "/api/orders",
    responses(
        (status = 201, description = "Order created upstream", body = String, example = json!({"data": {"id": 10, "status": "pending"}})),
        (status = 401, description = "No valid user token", body = String, example = json!({"message": "Unauthenticated."})),
        (status = 502, description = "External API unreachable")
    ),
    tag = "user"
)]
pub async fn forward_as_user(
    State(state): State<AppState>,
    tokens: TokenStore,
    method: Method,
    OriginalUri(uri): OriginalUri,
    ForwardPayload(body): ForwardPayload,
) -> Result<Response, ApiError> {
    relay(&state, &tokens, Access::As(Role::User), method, &uri, body).await
}

/// Handler for calls made on behalf of the logged-in entrepreneur (catalogue writes, avatar, profile)
#[utoipa::path(
    post,
    path = "/api/products",
    responses(
        (status = 201, description = "Product created upstream", body = String, example = json!({"data": {"id": 3, "name": "Lamp"}})),
        (status = 401, description = "No valid entrepreneur token", body = String, example = json!({"message": "Unauthenticated."})),
        (status = 502, description = "External API unreachable")
    ),
    tag = "entrepreneur"
)]
pub async fn forward_as_entrepreneur(
    State(state): State<AppState>,
    tokens: TokenStore,
    method: Method,
    OriginalUri(uri): OriginalUri,
    ForwardPayload(body): ForwardPayload,
) -> Result<Response, ApiError> {
    relay(&state, &tokens, Access::As(Role::Entrepreneur), method, &uri, body).await
}

async fn relay(
    state: &AppState,
    tokens: &TokenStore,
    access: Access,
    method: Method,
    uri: &Uri,
    body: OutboundBody,
) -> Result<Response, ApiError> {
    let path = state.forwarder.upstream_path(uri.path(), uri.query());
    let response = state
        .forwarder
        .relay(tokens, access, method, path, body)
        .await?;
    Ok(response.into_response())
}
