pub mod api_client;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod forwarder;
pub mod session;
pub mod validation;
pub mod views;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_client::{ClientError, ExternalApi};
use auth::AuthService;
use config::AppConfig;
use forwarder::Forwarder;
use session::SessionStore;

/// Largest body accepted on forwarded routes (product galleries included)
const FORWARD_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::user_login,
        auth::handlers::user_register,
        auth::handlers::user_logout,
        auth::handlers::entrepreneur_login,
        auth::handlers::entrepreneur_register,
        auth::handlers::entrepreneur_logout,
        forwarder::handlers::forward_public,
        forwarder::handlers::forward_as_user,
        forwarder::handlers::forward_as_entrepreneur,
        bootstrap::client_config,
        bootstrap::session_state,
    ),
    components(
        schemas(
            auth::models::LoginCredentials,
            auth::models::UserRegistration,
            auth::models::EntrepreneurRegistration,
            auth::models::AuthenticatedResponse,
            auth::models::LoggedOutResponse,
            auth::models::Role,
            config::AuthEndpoints,
            bootstrap::ClientBootstrap,
            views::AuthState,
        )
    ),
    tags(
        (name = "auth", description = "Login, registration and logout for both roles"),
        (name = "session", description = "Session state and browser bootstrap"),
        (name = "catalogue", description = "Public catalogue reads"),
        (name = "user", description = "Calls made on behalf of the logged-in user"),
        (name = "entrepreneur", description = "Calls made on behalf of the logged-in entrepreneur")
    ),
    info(
        title = "Storefront Web Gateway",
        version = "1.0.0",
        description = "Browser-facing gateway bridging sessions to the external storefront API"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub forwarder: Forwarder,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(config: AppConfig, sessions: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let api = ExternalApi::new(config.api.clone())?;
        Ok(Self {
            config: Arc::new(config),
            auth: AuthService::new(api.clone()),
            forwarder: Forwarder::new(api),
            sessions,
        })
    }
}

/// Creates and configures the application router
/// Maps pages, auth endpoints and forwarded API calls, with the session layer on all of them
pub fn create_router(state: AppState) -> Router {
    use auth::handlers::*;
    use forwarder::handlers::*;

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let forwarded = Router::new()
        .route(
            "/api/products",
            get(forward_public).post(forward_as_entrepreneur),
        )
        .route(
            "/api/products/:id",
            get(forward_public)
                .post(forward_as_entrepreneur)
                .put(forward_as_entrepreneur)
                .delete(forward_as_entrepreneur),
        )
        .route(
            "/api/servicios",
            get(forward_public).post(forward_as_entrepreneur),
        )
        .route(
            "/api/servicios/:id",
            get(forward_public)
                .post(forward_as_entrepreneur)
                .put(forward_as_entrepreneur)
                .delete(forward_as_entrepreneur),
        )
        .route("/api/user/profile", get(forward_as_user).put(forward_as_user))
        .route("/api/user/password", put(forward_as_user))
        .route(
            "/api/entrepreneur/profile",
            get(forward_as_entrepreneur).put(forward_as_entrepreneur),
        )
        .route(
            "/api/entrepreneur/password",
            put(forward_as_entrepreneur),
        )
        .route(
            "/api/entrepreneur/avatar",
            post(forward_as_entrepreneur)
                .put(forward_as_entrepreneur)
                .delete(forward_as_entrepreneur),
        )
        .route("/api/orders", get(forward_as_user).post(forward_as_user))
        .layer(DefaultBodyLimit::max(FORWARD_BODY_LIMIT));

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Pages
        .route("/", get(views::handlers::home))
        .route("/products", get(views::handlers::products))
        .route("/profile", get(views::handlers::user_profile))
        .route(
            "/entrepreneur/dashboard",
            get(views::handlers::entrepreneur_dashboard),
        )
        // Auth
        .route("/login", get(user_login_form).post(user_login))
        .route("/register", get(user_register_form).post(user_register))
        .route("/logout", post(user_logout))
        .route(
            "/entrepreneur/login",
            get(entrepreneur_login_form).post(entrepreneur_login),
        )
        .route(
            "/entrepreneur/register",
            get(entrepreneur_register_form).post(entrepreneur_register),
        )
        .route("/entrepreneur/logout", post(entrepreneur_logout))
        // Session
        .route("/client-config", get(bootstrap::client_config))
        .route("/session", get(bootstrap::session_state))
        // Forwarded API calls
        .merge(forwarded)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::ensure_session,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests;
