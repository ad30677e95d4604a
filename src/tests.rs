// Router tests for the storefront web gateway
// Drives the real router through axum-test with wiremock standing in for the external API

use super::*;
use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::{ApiConfig, SessionConfig};
use crate::session::{MemorySessionStore, SessionId, SessionStore};

const COOKIE: &str = "storefront_session";

// ============================================================================
// Test Helpers
// ============================================================================

/// Helper function to build a test app talking to a mock external API
/// Returns the server and a handle on the session store behind it
fn create_test_app(upstream: &MockServer) -> (TestServer, MemorySessionStore) {
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        api: ApiConfig::new(upstream.uri(), "/api"),
        session: SessionConfig::default(),
    };
    let store = MemorySessionStore::new();
    let state = AppState::new(config, Arc::new(store.clone())).unwrap();

    (TestServer::new(create_router(state)).unwrap(), store)
}

/// Helper function to seed a session with tokens and get its cookie
async fn seeded_session(store: &MemorySessionStore, tokens: &[(&str, &str)]) -> (SessionId, Cookie<'static>) {
    let id = SessionId::generate();
    for (key, value) in tokens {
        store.insert(&id, key, value).await.unwrap();
    }
    (id, Cookie::new(COOKIE, id.to_string()))
}

fn session_id_of(cookie: &Cookie<'_>) -> SessionId {
    SessionId::parse(cookie.value()).expect("session cookie should hold a session id")
}

fn json_accept() -> HeaderValue {
    HeaderValue::from_static("application/json")
}

/// Helper function to build a raw multipart body
/// Each part is (field name, optional file name, content)
fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &str)]) -> Bytes {
    let mut body = String::new();
    for (name, file_name, content) in parts {
        body.push_str(&format!("--{}\r\n", boundary));
        match file_name {
            Some(file_name) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, file_name
                ));
                body.push_str("Content-Type: image/jpeg\r\n\r\n");
            }
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                name
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    Bytes::from(body)
}

// ============================================================================
// Login / Register Tests
// ============================================================================

/// Test the full-page login stores the token under the user key and redirects home
#[tokio::test]
async fn test_user_login_stores_token_and_redirects() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"email": "a@b.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
        .expect(1)
        .mount(&upstream)
        .await;

    let (server, store) = create_test_app(&upstream);

    let response = server
        .post("/login")
        .form(&[("email", "a@b.com"), ("password", "secret")])
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/");

    let id = session_id_of(&response.cookie(COOKIE));
    assert_eq!(store.get(&id, "user_token").await.unwrap().as_deref(), Some("abc"));
    assert_eq!(store.get(&id, "entrepreneur_token").await.unwrap(), None);
}

/// Test entrepreneur login keeps an existing user token in the same session
#[tokio::test]
async fn test_entrepreneur_login_keeps_user_token() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/entrepreneur/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"token": "seller-1"}})),
        )
        .mount(&upstream)
        .await;

    let (server, store) = create_test_app(&upstream);
    let (old_id, cookie) = seeded_session(&store, &[("user_token", "buyer-1")]).await;

    let response = server
        .post("/entrepreneur/login")
        .add_cookie(cookie)
        .form(&[("email", "shop@b.com"), ("password", "secret")])
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/entrepreneur/dashboard");

    // Both tokens move together to the rotated session
    let id = session_id_of(&response.cookie(COOKIE));
    assert_ne!(id, old_id);
    assert_eq!(store.get(&old_id, "user_token").await.unwrap(), None);
    assert_eq!(store.get(&id, "user_token").await.unwrap().as_deref(), Some("buyer-1"));
    assert_eq!(
        store.get(&id, "entrepreneur_token").await.unwrap().as_deref(),
        Some("seller-1")
    );
}

/// Test a session id planted before login never ends up holding the token
#[tokio::test]
async fn test_login_rotates_planted_session_id() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "victim-token"})))
        .mount(&upstream)
        .await;

    let (server, store) = create_test_app(&upstream);
    let planted = SessionId::generate();

    let response = server
        .post("/login")
        .add_cookie(Cookie::new(COOKIE, planted.to_string()))
        .form(&[("email", "victim@b.com"), ("password", "secret")])
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let rotated = session_id_of(&response.cookie(COOKIE));
    assert_ne!(rotated, planted);
    assert_eq!(store.get(&planted, "user_token").await.unwrap(), None);
    assert_eq!(
        store.get(&rotated, "user_token").await.unwrap().as_deref(),
        Some("victim-token")
    );

    let planted_state = server
        .get("/session")
        .add_cookie(Cookie::new(COOKIE, planted.to_string()))
        .await
        .json::<Value>();
    assert_eq!(planted_state, json!({"user": false, "entrepreneur": false}));
}

/// Test a refused login keeps the existing session id
#[tokio::test]
async fn test_refused_login_keeps_session_id() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&upstream)
        .await;

    let (server, _store) = create_test_app(&upstream);
    let existing = SessionId::generate();

    let response = server
        .post("/login")
        .add_cookie(Cookie::new(COOKIE, existing.to_string()))
        .form(&[("email", "a@b.com"), ("password", "wrong")])
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

/// Test entrepreneur registration without last name re-renders the form
#[tokio::test]
async fn test_entrepreneur_register_missing_last_name_rerenders_form() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/entrepreneur/register"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({
                "message": "The given data was invalid.",
                "errors": {"last_name": ["required"]}
            })),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let (server, store) = create_test_app(&upstream);

    let response = server
        .post("/entrepreneur/register")
        .form(&[
            ("first_name", "Luis"),
            ("email", "luis@shop.test"),
            ("password", "hunter22"),
            ("password_confirmation", "hunter22"),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let page = response.text();
    assert!(page.contains(r#"<span class="error" data-field="last_name">required</span>"#));
    assert!(page.contains(r#"value="Luis""#));
    assert!(page.contains(r#"value="luis@shop.test""#));
    assert!(!page.contains("hunter22"), "password must never be echoed");

    let id = session_id_of(&response.cookie(COOKIE));
    assert_eq!(store.get(&id, "entrepreneur_token").await.unwrap(), None);
}

/// Test script-driven login gets JSON instead of a redirect
#[tokio::test]
async fn test_login_json_negotiation() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "xyz"})))
        .mount(&upstream)
        .await;

    let (server, _store) = create_test_app(&upstream);

    let response = server
        .post("/login")
        .add_header(header::ACCEPT, json_accept())
        .json(&json!({"email": "a@b.com", "password": "secret"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["role"], "user");
    assert_eq!(body["token"], "xyz");
    assert_eq!(body["redirect"], "/");
}

/// Test a refused login without upstream details falls back to the generic message
#[tokio::test]
async fn test_login_refused_json_uses_fallback_message() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({})))
        .mount(&upstream)
        .await;

    let (server, _store) = create_test_app(&upstream);

    let response = server
        .post("/login")
        .add_header(
            header::HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        )
        .json(&json!({"email": "a@b.com", "password": "wrong"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body = response.json::<Value>();
    assert_eq!(body["message"], "The provided credentials are incorrect.");
    assert!(body.get("errors").is_none());
    assert!(!response.text().contains("wrong"));
}

/// Test a malformed email is rejected locally without calling the external API
#[tokio::test]
async fn test_invalid_email_never_reaches_upstream() {
    let upstream = MockServer::start().await;
    let (server, _store) = create_test_app(&upstream);

    let response = server
        .post("/register")
        .form(&[("name", "Ana"), ("email", "not-an-email"), ("password", "pw")])
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().contains("The email must be a valid email address."));
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

/// Test an unreachable external API renders the generic message with 502
#[tokio::test]
async fn test_login_with_unreachable_api() {
    let upstream = MockServer::start().await;
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        api: ApiConfig::new("http://127.0.0.1:9", "/api"),
        session: SessionConfig::default(),
    };
    let state = AppState::new(config, Arc::new(MemorySessionStore::new())).unwrap();
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/login")
        .add_header(header::ACCEPT, json_accept())
        .json(&json!({"email": "a@b.com", "password": "secret"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.json::<Value>()["message"],
        "The provided credentials are incorrect."
    );
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Logout Tests
// ============================================================================

/// Test logout removes only the current role's token
#[tokio::test]
async fn test_logout_removes_only_current_role() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/entrepreneur/logout"))
        .and(header_is("authorization", "Bearer seller-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&upstream)
        .await;

    let (server, store) = create_test_app(&upstream);
    let (id, cookie) = seeded_session(
        &store,
        &[("user_token", "buyer-1"), ("entrepreneur_token", "seller-1")],
    )
    .await;

    let response = server.post("/entrepreneur/logout").add_cookie(cookie).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/");
    assert_eq!(store.get(&id, "entrepreneur_token").await.unwrap(), None);
    assert_eq!(store.get(&id, "user_token").await.unwrap().as_deref(), Some("buyer-1"));
}

/// Test logout still clears the token when the external API fails
#[tokio::test]
async fn test_logout_is_best_effort() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;

    let (server, store) = create_test_app(&upstream);
    let (id, cookie) = seeded_session(&store, &[("user_token", "buyer-1")]).await;

    let response = server
        .post("/logout")
        .add_cookie(cookie)
        .add_header(header::ACCEPT, json_accept())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["authenticated"], false);
    assert_eq!(store.get(&id, "user_token").await.unwrap(), None);
}

// ============================================================================
// Forwarding Tests
// ============================================================================

/// Test a protected call without a token is still sent, without Authorization
#[tokio::test]
async fn test_forward_without_token_sends_no_authorization() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthenticated."})),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let (server, _store) = create_test_app(&upstream);

    let response = server.get("/api/user/profile").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>(), json!({"message": "Unauthenticated."}));

    let received = upstream.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

/// Test JSON bodies are relayed with the role token and without internal fields
#[tokio::test]
async fn test_forward_profile_update_as_entrepreneur() {
    let upstream = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/entrepreneur/profile"))
        .and(header_is("authorization", "Bearer seller-1"))
        .and(body_json(json!({"first_name": "Luis"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"first_name": "Luis"}})),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let (server, store) = create_test_app(&upstream);
    let (_id, cookie) = seeded_session(
        &store,
        &[("user_token", "buyer-1"), ("entrepreneur_token", "seller-1")],
    )
    .await;

    let response = server
        .put("/api/entrepreneur/profile")
        .add_cookie(cookie)
        .json(&json!({"first_name": "Luis", "_token": "csrf", "_method": "PUT"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["first_name"], "Luis");
}

/// Test query strings reach the upstream listing and the status is relayed
#[tokio::test]
async fn test_forward_public_listing_with_query() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servicios"))
        .and(wiremock::matchers::query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [], "current_page": 2})),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let (server, _store) = create_test_app(&upstream);

    let response = server
        .get("/api/servicios")
        .add_query_param("page", "2")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["current_page"], 2);
}

/// Test a bodiless GET that still declares a JSON content type is forwarded
#[tokio::test]
async fn test_forward_get_with_json_content_type_and_no_body() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"name": "Lamp"}]})))
        .expect(1)
        .mount(&upstream)
        .await;

    let (server, _store) = create_test_app(&upstream);

    let response = server
        .get("/api/products")
        .add_header(header::CONTENT_TYPE, json_accept())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"][0]["name"], "Lamp");

    let received = upstream.received_requests().await.unwrap();
    assert!(received[0].body.is_empty());
}

/// Test N gallery images reach the external API as N indexed file parts
#[tokio::test]
async fn test_multipart_gallery_is_reindexed() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .and(header_is("authorization", "Bearer seller-1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 7}})))
        .expect(1)
        .mount(&upstream)
        .await;

    let (server, store) = create_test_app(&upstream);
    let (_id, cookie) = seeded_session(&store, &[("entrepreneur_token", "seller-1")]).await;

    let boundary = "storefront-test-boundary";
    let body = multipart_body(
        boundary,
        &[
            ("_token", None, "csrf"),
            ("name", None, "Lamp"),
            ("gallery[]", Some("front.jpg"), "front-bytes"),
            ("gallery[]", Some("side.jpg"), "side-bytes"),
            ("gallery[]", Some("back.jpg"), "back-bytes"),
        ],
    );

    let response = server
        .post("/api/products")
        .add_cookie(cookie)
        .content_type(&format!("multipart/form-data; boundary={}", boundary))
        .bytes(body)
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);

    let received = upstream.received_requests().await.unwrap();
    let sent = String::from_utf8_lossy(&received[0].body).into_owned();

    for (index, file_name) in ["front.jpg", "side.jpg", "back.jpg"].iter().enumerate() {
        assert!(
            sent.contains(&format!(
                "name=\"gallery[{}]\"; filename=\"{}\"",
                index, file_name
            )),
            "missing part gallery[{}]",
            index
        );
    }
    assert_eq!(sent.matches("filename=").count(), 3);
    assert!(sent.contains("name=\"name\""));
    assert!(!sent.contains("_token"));
}

// ============================================================================
// Page & Session Tests
// ============================================================================

/// Test the navbar reflects the session's auth state
#[tokio::test]
async fn test_home_navbar_follows_session() {
    let upstream = MockServer::start().await;
    let (server, store) = create_test_app(&upstream);

    let anonymous = server.get("/").await;
    assert_eq!(anonymous.status_code(), StatusCode::OK);
    assert!(anonymous.text().contains(r#"href="/login""#));

    let (_id, cookie) = seeded_session(&store, &[("user_token", "buyer-1")]).await;
    let logged_in = server.get("/").add_cookie(cookie).await;
    assert!(logged_in.text().contains(r#"action="/logout""#));
}

/// Test the catalogue page splices the upstream listing
#[tokio::test]
async fn test_products_page_lists_upstream_items() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"name": "Lamp"}, {"name": "Chair <b>"}]
        })))
        .mount(&upstream)
        .await;

    let (server, _store) = create_test_app(&upstream);

    let page = server.get("/products").await.text();
    assert!(page.contains("<li>Lamp</li>"));
    assert!(page.contains("<li>Chair &lt;b&gt;</li>"));
}

/// Test the dashboard keeps the upstream status when the token is refused
#[tokio::test]
async fn test_dashboard_relays_upstream_refusal() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/entrepreneur/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthenticated."})))
        .mount(&upstream)
        .await;

    let (server, _store) = create_test_app(&upstream);

    let response = server.get("/entrepreneur/dashboard").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(response.text().contains(r#"href="/entrepreneur/login""#));
}

/// Test the session endpoint and the client bootstrap document
#[tokio::test]
async fn test_session_state_and_client_config() {
    let upstream = MockServer::start().await;
    let (server, store) = create_test_app(&upstream);
    let (_id, cookie) = seeded_session(&store, &[("entrepreneur_token", "seller-1")]).await;

    let state = server.get("/session").add_cookie(cookie).await.json::<Value>();
    assert_eq!(state, json!({"user": false, "entrepreneur": true}));

    let config = server.get("/client-config").await.json::<Value>();
    assert_eq!(config["api_base_url"], upstream.uri());
    assert_eq!(config["entrepreneur"]["register"], "/api/entrepreneur/register");
    assert_eq!(config["token_storage_key"], "API_TOKEN");
}

/// Test a new session cookie is issued once and is HttpOnly
#[tokio::test]
async fn test_session_cookie_attributes() {
    let upstream = MockServer::start().await;
    let (server, store) = create_test_app(&upstream);

    let response = server.get("/login").await;
    let cookie = response.cookie(COOKIE);
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert!(SessionId::parse(cookie.value()).is_some());

    let again = server.get("/login").add_cookie(cookie).await;
    assert!(again.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(store.len().await, 0);
}
