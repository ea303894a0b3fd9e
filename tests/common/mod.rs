//! Shared utilities for scaffold integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use reqwest::header::ACCEPT;
use service_scaffold::config::SurfaceConfig;
use service_scaffold::{BoundAddress, Scaffold, ScaffoldConfig, ScaffoldResult, ShutdownCause};
use tokio::task::JoinHandle;

/// Loopback, ephemeral-port configuration.
pub fn test_config() -> ScaffoldConfig {
    let mut config = ScaffoldConfig::default();
    config.listener = SurfaceConfig::new("127.0.0.1", 0);
    config
}

pub fn with_management(mut config: ScaffoldConfig) -> ScaffoldConfig {
    config.management = Some(SurfaceConfig::new("127.0.0.1", 0));
    config
}

/// Delegate that answers 200 after an optional `?delay=<n>ms|<n>s`.
pub fn test_router() -> Router {
    Router::new().fallback(delay_handler)
}

async fn delay_handler(Query(params): Query<HashMap<String, String>>) -> Response {
    let delay = match params.get("delay") {
        Some(raw) => match parse_delay(raw) {
            Some(delay) => delay,
            None => return StatusCode::BAD_REQUEST.into_response(),
        },
        None => Duration::ZERO,
    };
    tokio::time::sleep(delay).await;
    StatusCode::OK.into_response()
}

fn parse_delay(raw: &str) -> Option<Duration> {
    if let Some(ms) = raw.strip_suffix("ms") {
        return ms.parse().ok().map(Duration::from_millis);
    }
    raw.strip_suffix('s')?.parse().ok().map(Duration::from_secs)
}

/// Open the scaffold and run `listen` in the background.
pub async fn start(scaffold: &Arc<Scaffold>) -> JoinHandle<ScaffoldResult<ShutdownCause>> {
    scaffold.open().await.expect("open failed");
    let s = Arc::clone(scaffold);
    tokio::spawn(async move { s.listen(test_router()).await })
}

/// Client without connection reuse, so a stopped server is observed immediately.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn url(addr: &BoundAddress, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

pub fn primary(scaffold: &Scaffold) -> BoundAddress {
    scaffold.primary_address().expect("primary address")
}

pub fn management(scaffold: &Scaffold) -> BoundAddress {
    scaffold.management_address().expect("management address")
}

pub async fn get_status(client: &reqwest::Client, url: &str) -> u16 {
    client.get(url).send().await.expect("request failed").status().as_u16()
}

pub async fn get_text(client: &reqwest::Client, url: &str) -> (u16, String) {
    let res = client
        .get(url)
        .header(ACCEPT, "text/plain")
        .send()
        .await
        .expect("request failed");
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}

pub async fn get_json(client: &reqwest::Client, url: &str) -> (u16, HashMap<String, String>) {
    let res = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .expect("request failed");
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}

/// Poll `GET /` on the primary surface until it answers 200.
pub async fn wait_until_serving(client: &reqwest::Client, scaffold: &Scaffold) {
    let target = url(&primary(scaffold), "/");
    let target = target.as_str();
    eventually(Duration::from_secs(5), move || async move {
        matches!(client.get(target).send().await, Ok(res) if res.status() == 200)
    })
    .await;
}

pub async fn wait_for_in_flight(scaffold: &Scaffold, count: u64) {
    eventually(Duration::from_secs(5), move || async move { scaffold.in_flight() == count }).await;
}

pub async fn eventually<F, Fut>(timeout: Duration, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await {
            return;
        }
        assert!(Instant::now() < deadline, "condition not met within {:?}", timeout);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
