//! Common test utilities for integration tests
//!
//! Every test gets a fresh router backed by the in-memory store and cache,
//! so no PostgreSQL or Redis is needed. Helpers cover registration, login,
//! promotion to ADMIN and sending JSON requests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tasktrack_api::app::{build_router, AppState};
use tasktrack_api::config::Config;
use tasktrack_shared::cache::{MemoryCache, ResponseCache};
use tasktrack_shared::models::{Role, UpdateUser};
use tasktrack_shared::store::{MemoryStore, Store};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "longpass1";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub app: axum::Router,
    pub config: Config,
}

/// A decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A registered and logged-in account
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgresql://unused@localhost/tasktrack_test".to_string(),
        ),
        (
            "JWT_SECRET".to_string(),
            "integration-test-secret-at-least-32-chars".to_string(),
        ),
        ("RATE_LIMIT_MAX_REQUESTS".to_string(), "10000".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config must be valid")
}

impl TestContext {
    /// Fresh in-memory context with default test settings
    pub fn new() -> Self {
        Self::with_config(test_config(&[]))
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());

        let response_cache = if config.cache.enabled {
            ResponseCache::new(cache.clone(), Duration::from_secs(config.cache.ttl_secs))
        } else {
            ResponseCache::disabled()
        };
        let state = AppState::new(store.clone(), response_cache, config.clone());

        Self {
            store,
            cache,
            app: build_router(state),
            config,
        }
    }

    /// Sends a request and decodes the JSON body (Null when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        decode(self.app.clone().oneshot(request).await.unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> TestResponse {
        self.post(
            "/api/v1/auth/register",
            None,
            json!({ "username": username, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post(
            "/api/v1/auth/login",
            None,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Registers and logs in a USER account
    pub async fn create_user(&self, username: &str, email: &str) -> TestUser {
        let registered = self.register(username, email, TEST_PASSWORD).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

        let logged_in = self.login(email, TEST_PASSWORD).await;
        assert_eq!(logged_in.status, StatusCode::OK, "{}", logged_in.body);

        TestUser {
            id: registered.body["user"]["id"].as_str().unwrap().parse().unwrap(),
            email: email.to_string(),
            token: logged_in.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Registers an account, promotes it, and logs in so the token carries ADMIN
    pub async fn create_admin(&self, username: &str, email: &str) -> TestUser {
        let user = self.create_user(username, email).await;
        self.store
            .update_user(
                user.id,
                UpdateUser {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .expect("user exists");

        let logged_in = self.login(email, TEST_PASSWORD).await;
        assert_eq!(logged_in.body["user"]["role"], "ADMIN");

        TestUser {
            token: logged_in.body["token"].as_str().unwrap().to_string(),
            ..user
        }
    }

    /// Creates a task through the API and returns its id
    pub async fn create_task(&self, token: &str, title: &str) -> String {
        let response = self
            .post("/api/v1/tasks", Some(token), json!({ "title": title }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }
}

async fn decode(response: Response) -> TestResponse {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
