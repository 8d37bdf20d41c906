use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

/// Control plane of the managed inference hosting service.
#[async_trait]
pub trait EndpointPlatform: Send + Sync {
    /// Live status string of the endpoint, or `None` if it does not exist.
    async fn describe_endpoint(&self, name: &str) -> Result<Option<String>>;
    async fn create_endpoint(&self, name: &str, config_name: &str) -> Result<()>;
    async fn delete_endpoint(&self, name: &str) -> Result<()>;
}

/// Data plane: one synchronous inference call.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn invoke_endpoint(&self, name: &str, body: Vec<u8>, content_type: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct DescribeEndpointResponse {
    #[serde(rename = "EndpointStatus")]
    endpoint_status: String,
}

/// REST client for a managed hosting service.
///
/// Control plane: `GET|POST|DELETE {control_url}/endpoints/{name}`.
/// Data plane: `POST {runtime_url}/endpoints/{name}/invocations`.
#[derive(Debug, Clone)]
pub struct ManagedPlatform {
    http: reqwest::Client,
    control_url: String,
    runtime_url: String,
}

impl ManagedPlatform {
    pub fn new(http: reqwest::Client, control_url: &str, runtime_url: &str) -> Self {
        Self {
            http,
            control_url: control_url.trim_end_matches('/').to_string(),
            runtime_url: runtime_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint_url(&self, name: &str) -> String {
        format!("{}/endpoints/{}", self.control_url, name)
    }
}

#[async_trait]
impl EndpointPlatform for ManagedPlatform {
    async fn describe_endpoint(&self, name: &str) -> Result<Option<String>> {
        let resp = self.http.get(self.endpoint_url(name)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            bail!("describe endpoint returned {}", resp.status());
        }
        let desc: DescribeEndpointResponse = resp.json().await?;
        Ok(Some(desc.endpoint_status))
    }

    async fn create_endpoint(&self, name: &str, config_name: &str) -> Result<()> {
        let body = serde_json::json!({ "EndpointConfigName": config_name });
        let resp = self.http.post(self.endpoint_url(name)).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("create endpoint returned {status}: {text}");
        }
        Ok(())
    }

    async fn delete_endpoint(&self, name: &str) -> Result<()> {
        let resp = self.http.delete(self.endpoint_url(name)).send().await?;
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            bail!("delete endpoint returned {}", resp.status());
        }
        Ok(())
    }
}

#[async_trait]
impl InferenceClient for ManagedPlatform {
    async fn invoke_endpoint(&self, name: &str, body: Vec<u8>, content_type: &str) -> Result<String> {
        let url = format!("{}/endpoints/{}/invocations", self.runtime_url, name);
        invoke(&self.http, url, body, content_type).await
    }
}

/// A model server that is always running at a fixed address. The endpoint is
/// in service whenever its `/ping` route answers 200; create and delete only
/// log, since the lifecycle is owned by whoever runs the server.
#[derive(Debug, Clone)]
pub struct StaticEndpoint {
    http: reqwest::Client,
    base_url: String,
}

impl StaticEndpoint {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EndpointPlatform for StaticEndpoint {
    async fn describe_endpoint(&self, _name: &str) -> Result<Option<String>> {
        let url = format!("{}/ping", self.base_url);
        match self.http.get(url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(Some("InService".to_string())),
            Ok(resp) => Ok(Some(format!("Unhealthy({})", resp.status().as_u16()))),
            Err(e) if e.is_connect() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_endpoint(&self, name: &str, _config_name: &str) -> Result<()> {
        tracing::info!(endpoint=%name, base_url=%self.base_url, "static endpoint: create is a no-op");
        Ok(())
    }

    async fn delete_endpoint(&self, name: &str) -> Result<()> {
        tracing::info!(endpoint=%name, base_url=%self.base_url, "static endpoint: delete is a no-op");
        Ok(())
    }
}

#[async_trait]
impl InferenceClient for StaticEndpoint {
    async fn invoke_endpoint(&self, _name: &str, body: Vec<u8>, content_type: &str) -> Result<String> {
        let url = format!("{}/invocations", self.base_url);
        invoke(&self.http, url, body, content_type).await
    }
}

async fn invoke(http: &reqwest::Client, url: String, body: Vec<u8>, content_type: &str) -> Result<String> {
    let resp = http
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, content_type)
        .header(reqwest::header::ACCEPT, "application/json")
        .body(body)
        .send()
        .await?;
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        bail!("endpoint returned {status}: {text}");
    }
    Ok(text)
}

/// In-process platform with scripted behavior.
#[derive(Debug)]
pub struct MemoryEndpointPlatform {
    status: Mutex<Option<String>>,
    describe_fails: AtomicBool,
    response: Mutex<std::result::Result<String, String>>,
    latency: Mutex<Duration>,
    creates: AtomicU64,
    deletes: AtomicU64,
    invocations: Mutex<Vec<(String, Vec<u8>, String)>>,
}

impl Default for MemoryEndpointPlatform {
    fn default() -> Self {
        Self {
            status: Mutex::new(None),
            describe_fails: AtomicBool::new(false),
            response: Mutex::new(Ok(String::new())),
            latency: Mutex::new(Duration::ZERO),
            creates: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            invocations: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryEndpointPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(status: &str) -> Self {
        let p = Self::default();
        p.set_status(Some(status));
        p
    }

    pub fn set_status(&self, status: Option<&str>) {
        *lock(&self.status) = status.map(str::to_string);
    }

    pub fn status(&self) -> Option<String> {
        lock(&self.status).clone()
    }

    pub fn fail_describe(&self, fail: bool) {
        self.describe_fails.store(fail, Ordering::Relaxed);
    }

    pub fn respond_with(&self, text: &str) {
        *lock(&self.response) = Ok(text.to_string());
    }

    pub fn fail_invocations(&self, message: &str) {
        *lock(&self.response) = Err(message.to_string());
    }

    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    pub fn creates(&self) -> u64 {
        self.creates.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// `(endpoint name, body, content type)` of every invocation so far.
    pub fn invocations(&self) -> Vec<(String, Vec<u8>, String)> {
        lock(&self.invocations).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl EndpointPlatform for MemoryEndpointPlatform {
    async fn describe_endpoint(&self, _name: &str) -> Result<Option<String>> {
        if self.describe_fails.load(Ordering::Relaxed) {
            return Err(anyhow!("describe endpoint unavailable"));
        }
        Ok(self.status())
    }

    async fn create_endpoint(&self, _name: &str, _config_name: &str) -> Result<()> {
        self.creates.fetch_add(1, Ordering::Relaxed);
        self.set_status(Some("Creating"));
        Ok(())
    }

    async fn delete_endpoint(&self, _name: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.set_status(None);
        Ok(())
    }
}

#[async_trait]
impl InferenceClient for MemoryEndpointPlatform {
    async fn invoke_endpoint(&self, name: &str, body: Vec<u8>, content_type: &str) -> Result<String> {
        lock(&self.invocations).push((name.to_string(), body, content_type.to_string()));
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        lock(&self.response).clone().map_err(|e| anyhow!(e))
    }
}
