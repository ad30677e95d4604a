// HTTP handlers for authentication endpoints
//
// The same routes serve the full-page forms and the script-driven modal: the
// response is a redirect/HTML page or JSON depending on ResponseFormat.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};

use crate::api_client::AuthOutcome;
use crate::auth::{
    error::AuthFailure,
    models::{
        AuthFlow, AuthenticatedResponse, CredentialForm, EntrepreneurRegistration,
        LoggedOutResponse, LoginCredentials, Role, UserRegistration,
    },
};
use crate::error::ApiError;
use crate::extract::{ResponseFormat, Submission};
use crate::session::TokenStore;
use crate::views::{self, FormView};
use crate::AppState;

/// Handler for POST /login
/// Logs an end user in
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Logged in (JSON callers)", body = AuthenticatedResponse),
        (status = 303, description = "Logged in, redirected to the home route"),
        (status = 401, description = "Credentials refused", body = String, example = json!({"message": "The provided credentials are incorrect."})),
        (status = 422, description = "Validation failed", body = String, example = json!({"message": "required", "errors": {"email": ["required"]}}))
    ),
    tag = "auth"
)]
pub async fn user_login(
    State(state): State<AppState>,
    tokens: TokenStore,
    format: ResponseFormat,
    Submission(form): Submission<LoginCredentials>,
) -> Result<Response, ApiError> {
    submit(&state, tokens, format, Role::User, AuthFlow::Login, form).await
}

/// Handler for POST /register
/// Registers an end user and logs them in
#[utoipa::path(
    post,
    path = "/register",
    request_body = UserRegistration,
    responses(
        (status = 200, description = "Registered (JSON callers)", body = AuthenticatedResponse),
        (status = 303, description = "Registered, redirected to the home route"),
        (status = 422, description = "Validation failed", body = String, example = json!({"message": "The email has already been taken.", "errors": {"email": ["The email has already been taken."]}}))
    ),
    tag = "auth"
)]
pub async fn user_register(
    State(state): State<AppState>,
    tokens: TokenStore,
    format: ResponseFormat,
    Submission(form): Submission<UserRegistration>,
) -> Result<Response, ApiError> {
    submit(&state, tokens, format, Role::User, AuthFlow::Register, form).await
}

/// Handler for POST /entrepreneur/login
/// Logs an entrepreneur in
#[utoipa::path(
    post,
    path = "/entrepreneur/login",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Logged in (JSON callers)", body = AuthenticatedResponse),
        (status = 303, description = "Logged in, redirected to the dashboard"),
        (status = 401, description = "Credentials refused", body = String, example = json!({"message": "The provided credentials are incorrect."}))
    ),
    tag = "auth"
)]
pub async fn entrepreneur_login(
    State(state): State<AppState>,
    tokens: TokenStore,
    format: ResponseFormat,
    Submission(form): Submission<LoginCredentials>,
) -> Result<Response, ApiError> {
    submit(&state, tokens, format, Role::Entrepreneur, AuthFlow::Login, form).await
}

/// Handler for POST /entrepreneur/register
/// Registers an entrepreneur and logs them in
#[utoipa::path(
    post,
    path = "/entrepreneur/register",
    request_body = EntrepreneurRegistration,
    responses(
        (status = 200, description = "Registered (JSON callers)", body = AuthenticatedResponse),
        (status = 303, description = "Registered, redirected to the dashboard"),
        (status = 422, description = "Validation failed", body = String, example = json!({"message": "required", "errors": {"last_name": ["required"]}}))
    ),
    tag = "auth"
)]
pub async fn entrepreneur_register(
    State(state): State<AppState>,
    tokens: TokenStore,
    format: ResponseFormat,
    Submission(form): Submission<EntrepreneurRegistration>,
) -> Result<Response, ApiError> {
    submit(
        &state,
        tokens,
        format,
        Role::Entrepreneur,
        AuthFlow::Register,
        form,
    )
    .await
}

/// Handler for POST /logout
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out (JSON callers)", body = LoggedOutResponse),
        (status = 303, description = "Logged out, redirected home")
    ),
    tag = "auth"
)]
pub async fn user_logout(
    State(state): State<AppState>,
    tokens: TokenStore,
    format: ResponseFormat,
) -> Result<Response, ApiError> {
    logout(&state, tokens, format, Role::User).await
}

/// Handler for POST /entrepreneur/logout
#[utoipa::path(
    post,
    path = "/entrepreneur/logout",
    responses(
        (status = 200, description = "Logged out (JSON callers)", body = LoggedOutResponse),
        (status = 303, description = "Logged out, redirected home")
    ),
    tag = "auth"
)]
pub async fn entrepreneur_logout(
    State(state): State<AppState>,
    tokens: TokenStore,
    format: ResponseFormat,
) -> Result<Response, ApiError> {
    logout(&state, tokens, format, Role::Entrepreneur).await
}

/// Handler for GET /login
pub async fn user_login_form(tokens: TokenStore) -> Result<Html<String>, ApiError> {
    empty_form(tokens, Role::User, AuthFlow::Login).await
}

/// Handler for GET /register
pub async fn user_register_form(tokens: TokenStore) -> Result<Html<String>, ApiError> {
    empty_form(tokens, Role::User, AuthFlow::Register).await
}

/// Handler for GET /entrepreneur/login
pub async fn entrepreneur_login_form(tokens: TokenStore) -> Result<Html<String>, ApiError> {
    empty_form(tokens, Role::Entrepreneur, AuthFlow::Login).await
}

/// Handler for GET /entrepreneur/register
pub async fn entrepreneur_register_form(tokens: TokenStore) -> Result<Html<String>, ApiError> {
    empty_form(tokens, Role::Entrepreneur, AuthFlow::Register).await
}

async fn empty_form(tokens: TokenStore, role: Role, flow: AuthFlow) -> Result<Html<String>, ApiError> {
    let auth_state = tokens.auth_state().await?;
    let old_input = BTreeMap::new();
    Ok(Html(views::auth_form(
        &auth_state,
        &FormView {
            role,
            flow,
            old_input: &old_input,
            rejection: None,
        },
    )?))
}

async fn submit<F: CredentialForm>(
    state: &AppState,
    tokens: TokenStore,
    format: ResponseFormat,
    role: Role,
    flow: AuthFlow,
    form: F,
) -> Result<Response, ApiError> {
    tracing::debug!("Received {} {} submission", role, flow);

    match state.auth.authenticate(&tokens, role, flow, &form).await? {
        AuthOutcome::Authenticated { token, .. } => {
            let redirect = role.home_route();
            Ok(match format {
                ResponseFormat::Json => Json(AuthenticatedResponse {
                    authenticated: true,
                    role,
                    token: token.expose().to_string(),
                    redirect: redirect.to_string(),
                })
                .into_response(),
                ResponseFormat::Html => Redirect::to(redirect).into_response(),
            })
        }
        AuthOutcome::Rejected(rejection) => Ok(AuthFailure {
            role,
            flow,
            rejection,
            old_input: form.old_input(),
            auth_state: tokens.auth_state().await?,
            format,
        }
        .into_response()),
    }
}

async fn logout(
    state: &AppState,
    tokens: TokenStore,
    format: ResponseFormat,
    role: Role,
) -> Result<Response, ApiError> {
    state.auth.logout(&tokens, role).await?;

    Ok(match format {
        ResponseFormat::Json => Json(LoggedOutResponse {
            authenticated: false,
            role,
            redirect: "/".to_string(),
        })
        .into_response(),
        ResponseFormat::Html => Redirect::to("/").into_response(),
    })
}
