#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use hushchat::{app, AppState, Config};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub db_pool: SqlitePool,
}

/// A signed-in client: the session cookie plus the user's id.
#[derive(Clone)]
pub struct TestUser {
    pub user_id: i64,
    pub cookie: String,
}

pub async fn spawn_app() -> TestApp {
    let app_state = AppState::init(Config::for_tests()).await.unwrap();
    let db_pool = app_state.db_pool.clone();
    TestApp { router: app(app_state), db_pool }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, set_cookie, json)
    }

    pub async fn get(&self, path: &str, user: &TestUser) -> (StatusCode, Value) {
        let (status, _, json) = self.request(Method::GET, path, None, Some(&user.cookie)).await;
        (status, json)
    }

    pub async fn post(&self, path: &str, body: Value, user: &TestUser) -> (StatusCode, Value) {
        let (status, _, json) = self
            .request(Method::POST, path, Some(body), Some(&user.cookie))
            .await;
        (status, json)
    }

    pub async fn register(&self, username: &str) -> TestUser {
        let (status, cookie, json) = self
            .request(
                Method::POST,
                "/register",
                Some(serde_json::json!({ "username": username, "password": "correct horse" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register {username}: {json}");

        TestUser {
            user_id: json["userId"].as_i64().unwrap(),
            cookie: cookie.expect("session cookie"),
        }
    }
}
