//! Router-level tests for the accounts API
//!
//! Drives the real `Router` over the in-memory repository with
//! `tower::ServiceExt::oneshot`, carrying the session cookie between calls
//! the way a browser would.

use axum::Router;
use axum::body::{Body, to_bytes};
use std::time::Duration;

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::application::config::AccountsConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::infra::MemoryAccountsRepository;
use crate::presentation::router::accounts_router;

const LOGIN_URL: &str = "/api/accounts/login/";
const LOGOUT_URL: &str = "/api/accounts/logout/";
const SIGNUP_URL: &str = "/api/accounts/signup/";
const LOGIN_STATUS_URL: &str = "/api/accounts/login_status/";

const BROWSER: &str = "Mozilla/5.0 (X11; Linux x86_64) test";

enum TestBody {
    Empty,
    Form(Vec<(&'static str, String)>),
    Multipart(Vec<(&'static str, &'static str)>),
    Json(Value),
    Raw(&'static str, &'static str),
}

struct TestResponse {
    status: StatusCode,
    allow: Option<String>,
    json: Value,
}

/// Minimal browser: one router, one cookie jar entry, one User-Agent
struct TestClient {
    app: Router,
    cookie: Option<String>,
    user_agent: &'static str,
}

impl TestClient {
    fn new(app: Router) -> Self {
        Self {
            app,
            cookie: None,
            user_agent: BROWSER,
        }
    }

    async fn request(&mut self, method: Method, uri: &str, body: TestBody) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, self.user_agent);

        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, format!("sessionid={cookie}"));
        }

        let request = match body {
            TestBody::Empty => builder.body(Body::empty()).unwrap(),
            TestBody::Form(pairs) => {
                let encoded = pairs
                    .iter()
                    .map(|(k, v)| format!("{k}={}", v.replace(' ', "+")))
                    .collect::<Vec<_>>()
                    .join("&");
                builder
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(encoded))
                    .unwrap()
            }
            TestBody::Multipart(pairs) => {
                let boundary = "accounts-test-boundary";
                let mut encoded = String::new();
                for (name, value) in pairs {
                    encoded.push_str(&format!(
                        "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                    ));
                }
                encoded.push_str(&format!("--{boundary}--\r\n"));
                builder
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(encoded))
                    .unwrap()
            }
            TestBody::Json(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            TestBody::Raw(content_type, raw) => builder
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(raw))
                .unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let pair = set_cookie.split(';').next().unwrap();
            let (_, value) = pair.split_once('=').unwrap();
            self.cookie = (!value.is_empty()).then(|| value.to_string());
        }

        let status = response.status();
        let allow = response
            .headers()
            .get(header::ALLOW)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            allow,
            json,
        }
    }

    async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, TestBody::Empty).await
    }

    async fn post(&mut self, uri: &str, pairs: &[(&'static str, &str)]) -> TestResponse {
        let pairs = pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        self.request(Method::POST, uri, TestBody::Form(pairs)).await
    }

    async fn has_logged_in(&mut self) -> bool {
        let response = self.get(LOGIN_STATUS_URL).await;
        assert_eq!(response.status, StatusCode::OK);
        response.json["has_logged_in"].as_bool().unwrap()
    }
}

fn test_config() -> AccountsConfig {
    AccountsConfig::development()
}

fn app(repo: MemoryAccountsRepository) -> Router {
    app_with_config(repo, test_config())
}

fn app_with_config(repo: MemoryAccountsRepository, config: AccountsConfig) -> Router {
    Router::new().nest("/api/accounts", accounts_router(repo, config))
}

async fn create_user(repo: &MemoryAccountsRepository, username: &str, email: &str, password: &str) -> User {
    let raw = RawPassword::new(password.to_string()).unwrap();
    let user = User::new(
        UserName::new(username).unwrap(),
        Email::new(email).unwrap(),
        UserPassword::from_raw(&raw, test_config().pepper()).unwrap(),
    );
    UserRepository::create(repo, &user).await.unwrap();
    user
}

/// Client plus a seeded `admin1` account
async fn setup() -> (TestClient, MemoryAccountsRepository, User) {
    let repo = MemoryAccountsRepository::new();
    let user = create_user(&repo, "admin1", "admin@jiuzhang.com", "correct password").await;
    (TestClient::new(app(repo.clone())), repo, user)
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login() {
    let (mut client, _, user) = setup().await;
    let username = user.user_name.as_str();

    // must use post
    let response = client.get(LOGIN_URL).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);

    // wrong password
    let response = client
        .post(LOGIN_URL, &[("username", username), ("password", "wrong password")])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["message"], "Username and password does not match.");

    assert!(!client.has_logged_in().await);

    // correct password
    let response = client
        .post(LOGIN_URL, &[("username", username), ("password", "correct password")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["success"], true);
    assert_eq!(response.json["user"]["email"], "admin@jiuzhang.com");
    assert_eq!(response.json["user"]["id"], user.user_id.to_string());

    assert!(client.has_logged_in().await);
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_username() {
    let (mut client, _, _) = setup().await;

    let response = client
        .post(LOGIN_URL, &[("username", "ADMIN1"), ("password", "correct password")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["user"]["username"], "admin1");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let (mut client, _, _) = setup().await;

    let response = client
        .post(LOGIN_URL, &[("username", "nobody1"), ("password", "correct password")])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["errors"]["username"][0], "User does not exist.");
}

#[tokio::test]
async fn test_login_missing_fields() {
    let (mut client, _, _) = setup().await;

    let response = client.post(LOGIN_URL, &[("username", "admin1")]).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["message"], "Please check input");
    assert_eq!(response.json["errors"]["password"][0], "This field is required.");
    assert!(response.json["errors"].get("username").is_none());
}

#[tokio::test]
async fn test_login_inactive_user() {
    let (mut client, repo, mut user) = setup().await;
    user.set_active(false);
    repo.update(&user).await.unwrap();

    let response = client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!client.has_logged_in().await);
}

#[tokio::test]
async fn test_login_records_last_login() {
    let (mut client, repo, user) = setup().await;
    assert!(user.last_login_at.is_none());

    client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;

    let stored = UserRepository::find_by_id(&repo, &user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn test_login_accepts_json() {
    let (mut client, _, _) = setup().await;

    let response = client
        .request(
            Method::POST,
            LOGIN_URL,
            TestBody::Json(json!({"username": "admin1", "password": "correct password"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(client.has_logged_in().await);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (mut client, _, _) = setup().await;

    let response = client
        .request(
            Method::POST,
            LOGIN_URL,
            TestBody::Raw("application/json", "{\"username\": "),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["success"], false);
}

#[tokio::test]
async fn test_login_accepts_multipart() {
    let (mut client, _, _) = setup().await;

    let response = client
        .request(
            Method::POST,
            LOGIN_URL,
            TestBody::Multipart(vec![("username", "admin1"), ("password", "correct password")]),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["user"]["username"], "admin1");
    assert!(client.has_logged_in().await);

    // Missing parts are field errors, same as the other encodings
    let response = client
        .request(
            Method::POST,
            LOGIN_URL,
            TestBody::Multipart(vec![("username", "admin1")]),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["errors"]["password"][0], "This field is required.");
}

#[tokio::test]
async fn test_login_upgrades_weak_password_hash() {
    let repo = MemoryAccountsRepository::new();
    let salt = SaltString::from_b64("c29tZXNhbHRzb21lc2FsdA").unwrap();
    let weak_hash = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(8 * 1024, 1, 1, None).unwrap(),
    )
    .hash_password(b"correct password", &salt)
    .unwrap()
    .to_string();

    let user = User::new(
        UserName::new("admin1").unwrap(),
        Email::new("admin@jiuzhang.com").unwrap(),
        UserPassword::from_phc_string(weak_hash.clone()).unwrap(),
    );
    assert!(user.password.needs_rehash());
    UserRepository::create(&repo, &user).await.unwrap();

    let mut client = TestClient::new(app(repo.clone()));
    let credentials = [("username", "admin1"), ("password", "correct password")];
    let response = client.post(LOGIN_URL, &credentials).await;
    assert_eq!(response.status, StatusCode::OK);

    let stored = UserRepository::find_by_id(&repo, &user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password.as_phc_string(), weak_hash);
    assert!(!stored.password.needs_rehash());

    // The upgraded hash still accepts the same password
    client.request(Method::POST, LOGOUT_URL, TestBody::Empty).await;
    let response = client.post(LOGIN_URL, &credentials).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unrepresentable_session_ttl_is_server_error() {
    let repo = MemoryAccountsRepository::new();
    create_user(&repo, "admin1", "admin@jiuzhang.com", "correct password").await;
    let config = AccountsConfig {
        session_ttl: Duration::from_secs(100_000_000_000_000),
        ..test_config()
    };
    let mut client = TestClient::new(app_with_config(repo, config));

    let response = client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json["success"], false);
    assert!(client.cookie.is_none());
}

#[tokio::test]
async fn test_login_rotates_session() {
    let (mut client, _, _) = setup().await;
    let credentials = [("username", "admin1"), ("password", "correct password")];

    client.post(LOGIN_URL, &credentials).await;
    let first = client.cookie.clone().unwrap();

    client.post(LOGIN_URL, &credentials).await;
    let second = client.cookie.clone().unwrap();
    assert_ne!(first, second);

    // The session from the first login is gone
    client.cookie = Some(first);
    assert!(!client.has_logged_in().await);

    client.cookie = Some(second);
    assert!(client.has_logged_in().await);
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout() {
    let (mut client, _, _) = setup().await;

    client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;
    assert!(client.has_logged_in().await);

    // must use post
    let response = client.get(LOGOUT_URL).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);

    let response = client.request(Method::POST, LOGOUT_URL, TestBody::Empty).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["success"], true);
    assert!(client.cookie.is_none());

    assert!(!client.has_logged_in().await);
}

#[tokio::test]
async fn test_logout_invalidates_server_session() {
    let (mut client, _, _) = setup().await;

    client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;
    let token = client.cookie.clone().unwrap();

    client.request(Method::POST, LOGOUT_URL, TestBody::Empty).await;

    // Replaying the old cookie does not bring the session back
    client.cookie = Some(token);
    assert!(!client.has_logged_in().await);
}

#[tokio::test]
async fn test_logout_without_session() {
    let (mut client, _, _) = setup().await;

    let response = client.request(Method::POST, LOGOUT_URL, TestBody::Empty).await;
    assert_eq!(response.status, StatusCode::OK);
}

// ============================================================================
// Signup
// ============================================================================

#[tokio::test]
async fn test_signup() {
    let mut client = TestClient::new(app(MemoryAccountsRepository::new()));

    // get is not allowed
    let response = client.get(SIGNUP_URL).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);

    // wrong email
    let response = client
        .post(
            SIGNUP_URL,
            &[
                ("username", "someone"),
                ("email", "not a correct email"),
                ("password", "any password"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["errors"]["email"][0], "Enter a valid email address.");

    // short password, and no username at all
    let response = client
        .post(
            SIGNUP_URL,
            &[
                ("name", "someone"),
                ("email", "not a correct email"),
                ("password", "123"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors = &response.json["errors"];
    assert_eq!(errors["username"][0], "This field is required.");
    assert_eq!(errors["email"][0], "Enter a valid email address.");
    assert_eq!(
        errors["password"][0],
        "Ensure this field has at least 6 characters."
    );

    // long username
    let response = client
        .post(
            SIGNUP_URL,
            &[
                (
                    "username",
                    "user_name_is_toooooooooooooooooooooooooooooo_looooooooooooooooooog",
                ),
                ("email", "someone@jiuzhang.com"),
                ("password", "any password"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json["errors"]["username"][0],
        "Ensure this field has no more than 20 characters."
    );

    assert!(!client.has_logged_in().await);

    // correct input
    let response = client
        .post(
            SIGNUP_URL,
            &[
                ("username", "someone"),
                ("email", "someone@jiuzhang.com"),
                ("password", "any password"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json["user"]["username"], "someone");
    assert_eq!(response.json["user"]["email"], "someone@jiuzhang.com");

    assert!(client.has_logged_in().await);
}

#[tokio::test]
async fn test_signup_duplicates() {
    let (mut client, _, _) = setup().await;

    let response = client
        .post(
            SIGNUP_URL,
            &[
                ("username", "Admin1"),
                ("email", "ADMIN@jiuzhang.com"),
                ("password", "any password"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json["errors"]["username"][0],
        "This username has been occupied."
    );
    assert_eq!(
        response.json["errors"]["email"][0],
        "This email address has been occupied."
    );
}

#[tokio::test]
async fn test_signup_rotates_session() {
    let (mut client, _, _) = setup().await;

    client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;
    let before_signup = client.cookie.clone().unwrap();

    let response = client
        .post(
            SIGNUP_URL,
            &[
                ("username", "someone"),
                ("email", "someone@jiuzhang.com"),
                ("password", "any password"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let after_signup = client.cookie.clone().unwrap();
    assert_ne!(before_signup, after_signup);

    // The session presented with the signup request is gone
    client.cookie = Some(before_signup);
    assert!(!client.has_logged_in().await);

    client.cookie = Some(after_signup);
    let response = client.get(LOGIN_STATUS_URL).await;
    assert_eq!(response.json["user"]["username"], "someone");
}

#[tokio::test]
async fn test_signup_then_login() {
    let mut client = TestClient::new(app(MemoryAccountsRepository::new()));

    let response = client
        .request(
            Method::POST,
            SIGNUP_URL,
            TestBody::Json(json!({
                "username": "Linghu01",
                "email": "linghu@jiuzhang.com",
                "password": "any password",
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json["user"]["username"], "linghu01");

    client.request(Method::POST, LOGOUT_URL, TestBody::Empty).await;
    assert!(!client.has_logged_in().await);

    let response = client
        .post(LOGIN_URL, &[("username", "linghu01"), ("password", "any password")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

// ============================================================================
// Login status
// ============================================================================

#[tokio::test]
async fn test_login_status_payload() {
    let (mut client, _, user) = setup().await;

    let response = client.get(LOGIN_STATUS_URL).await;
    assert_eq!(response.json["has_logged_in"], false);
    assert!(response.json.get("user").is_none());

    client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;

    let response = client.get(LOGIN_STATUS_URL).await;
    assert_eq!(response.json["has_logged_in"], true);
    assert_eq!(response.json["user"]["id"], user.user_id.to_string());
    assert_eq!(response.json["user"]["username"], "admin1");
}

#[tokio::test]
async fn test_login_status_rejects_other_methods() {
    let (mut client, _, _) = setup().await;

    let response = client.request(Method::POST, LOGIN_STATUS_URL, TestBody::Empty).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.allow.as_deref(), Some("GET, HEAD"));
}

#[tokio::test]
async fn test_method_not_allowed_body() {
    let (mut client, _, _) = setup().await;

    let response = client.request(Method::PUT, LOGIN_URL, TestBody::Empty).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.allow.as_deref(), Some("POST"));
    assert_eq!(response.json["success"], false);
    assert_eq!(response.json["message"], "Method \"PUT\" not allowed.");
}

#[tokio::test]
async fn test_session_bound_to_user_agent() {
    let (mut client, _, _) = setup().await;

    client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;
    assert!(client.has_logged_in().await);

    // Same cookie, different browser
    client.user_agent = "curl/8.0";
    assert!(!client.has_logged_in().await);
}

#[tokio::test]
async fn test_forged_cookie_is_not_logged_in() {
    let (mut client, _, _) = setup().await;

    client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;
    let token = client.cookie.clone().unwrap();
    let (session_id, _) = token.split_once('.').unwrap();

    client.cookie = Some(format!("{session_id}.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"));
    assert!(!client.has_logged_in().await);

    client.cookie = Some("garbage".to_string());
    assert!(!client.has_logged_in().await);
}

#[tokio::test]
async fn test_deactivated_user_loses_session() {
    let (mut client, repo, mut user) = setup().await;

    client
        .post(LOGIN_URL, &[("username", "admin1"), ("password", "correct password")])
        .await;
    assert!(client.has_logged_in().await);

    user.set_active(false);
    repo.update(&user).await.unwrap();
    assert!(!client.has_logged_in().await);
}
