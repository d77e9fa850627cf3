#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use cashcard_api::app::{app, AppState};
use cashcard_api::auth::Credentials;
use cashcard_api::config::AppConfig;
use cashcard_api::database::fixtures::demo_cards;

pub const SARAH: (&str, &str) = ("sarah1", "abc123");
pub const KUMAR: (&str, &str) = ("kumar2", "xyz789");
pub const HANK: (&str, &str) = ("hank-owns-no-cards", "qrs456");

/// Router over a fresh in-memory store seeded with the demo cards
pub fn test_app() -> Router {
    test_app_with(AppConfig::development())
}

pub fn test_app_with(config: AppConfig) -> Router {
    let state = AppState::in_memory(&config, demo_cards()).expect("valid test config");
    app(state)
}

pub fn basic(user: (&str, &str)) -> String {
    Credentials {
        username: user.0.to_string(),
        password: user.1.to_string(),
    }
    .to_basic_header()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).with_context(|| {
            format!("response body is not JSON: {:?}", String::from_utf8_lossy(&self.body))
        })
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<(&str, &str)>,
    body: Option<Value>,
) -> Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, basic(user));
    }
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body)?).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

    Ok(TestResponse { status, headers, body: bytes.to_vec() })
}

pub async fn get_as(app: &Router, uri: &str, user: (&str, &str)) -> Result<TestResponse> {
    send(app, Method::GET, uri, Some(user), None).await
}

/// Amounts of a JSON array of cards, in response order
pub fn amounts(body: &Value) -> Vec<f64> {
    body.as_array()
        .map(|cards| cards.iter().filter_map(|c| c["amount"].as_f64()).collect())
        .unwrap_or_default()
}

pub fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .map(|cards| cards.iter().filter_map(|c| c["id"].as_i64()).collect())
        .unwrap_or_default()
}

/// The server binary running against the in-memory store on a free port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let server = Self::spawn()?;
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cashcard-api"));
        cmd.args(["--memory", "--seed-demo", "--port", &port.to_string()])
            .env_clear()
            .env("APP_ENV", "development")
            .env("SERVER_HOST", "127.0.0.1")
            .env("SECURITY_USERS", "sarah1:abc123:CARD-OWNER,hank-owns-no-cards:qrs456:NON-OWNER,kumar2:xyz789:CARD-OWNER")
            .env("SECURITY_REQUIRED_ROLE", "CARD-OWNER")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
