//! Tool Client — allow-list-enforced RPC facade over the external tool
//! registry HTTP API (`GET /tools/list`, `POST /tools/invoke`).
//!
//! One instance is constructed per worker node, carrying that worker's
//! allow-list. A call for a tool outside the allow-list never reaches the
//! network — it fails closed with `Error::ToolPermission`.

use ao_domain::config::{BoundsConfig, ToolRegistryConfig};
use ao_domain::error::{Error, Result};
use ao_domain::tool::ToolDefinition;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::RwLock;
use std::time::Duration;

pub struct ToolClient {
    worker: String,
    base_url: String,
    allowed_tools: HashSet<String>,
    client: RwLock<reqwest::Client>,
    connect_timeout: Duration,
    call_timeout: Duration,
    retry_attempts: u32,
    retry_backoff_ms: u64,
}

impl ToolClient {
    pub fn new(worker: impl Into<String>, registry: &ToolRegistryConfig, bounds: &BoundsConfig) -> Self {
        let worker = worker.into();
        let allowed_tools = registry
            .worker_policies
            .get(&worker)
            .map(|p| p.allowed_tools.iter().cloned().collect())
            .unwrap_or_default();

        let connect_timeout = Duration::from_secs(bounds.tool_connect_timeout_secs);
        let call_timeout = Duration::from_secs(bounds.tool_call_deadline_secs);

        Self {
            worker,
            base_url: registry.base_url.trim_end_matches('/').to_string(),
            allowed_tools,
            client: RwLock::new(build_http_client(connect_timeout, call_timeout)),
            connect_timeout,
            call_timeout,
            retry_attempts: bounds.tool_retry_attempts,
            retry_backoff_ms: bounds.tool_retry_backoff_ms,
        }
    }

    fn is_allowed(&self, tool_name: &str) -> bool {
        self.allowed_tools.contains(tool_name)
    }

    /// List tools available to this worker (registry catalog filtered to
    /// the worker's allow-list).
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        let url = format!("{}/tools/list", self.base_url);
        let resp = self
            .http()
            .get(&url)
            .send()
            .await
            .map_err(from_reqwest)?;

        if !resp.status().is_success() {
            return Err(Error::ToolInvocation {
                tool: "tools/list".into(),
                message: format!("HTTP {}", resp.status().as_u16()),
            });
        }

        let all: Vec<ToolDefinition> = resp.json().await.map_err(from_reqwest)?;
        Ok(all.into_iter().filter(|t| self.is_allowed(&t.name)).collect())
    }

    /// Invoke a tool by name. Fails closed (no network call) if the tool
    /// is outside this worker's allow-list.
    ///
    /// Retries up to `retry_attempts` times on connection-class failures,
    /// backing off `retry_backoff_ms * attempt` between tries. A broken
    /// transport triggers a transparent session reset before the next
    /// attempt.
    pub async fn invoke(&self, tool_name: &str, arguments: Value) -> Result<Value> {
        if !self.is_allowed(tool_name) {
            return Err(Error::ToolPermission {
                node: self.worker.clone(),
                tool: tool_name.to_string(),
            });
        }

        let url = format!("{}/tools/invoke", self.base_url);
        let body = serde_json::json!({ "tool_name": tool_name, "arguments": arguments });

        let mut last_err: Option<Error> = None;
        for attempt in 1..=self.retry_attempts {
            match self.try_invoke(&url, &body).await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retriable_class() && attempt < self.retry_attempts => {
                    tracing::warn!(tool = %tool_name, attempt, error = %e, "tool call failed, retrying");
                    self.reset_session();
                    tokio::time::sleep(Duration::from_millis(self.retry_backoff_ms * attempt as u64)).await;
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::ToolInvocation {
            tool: tool_name.to_string(),
            message: "exhausted retries".into(),
        }))
    }

    async fn try_invoke(&self, url: &str, body: &Value) -> Result<Value> {
        let resp = self.http().post(url).json(body).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::ToolInvocation {
                tool: "tools/invoke".into(),
                message: format!("HTTP {} - {}", status.as_u16(), text),
            });
        }

        serde_json::from_str(&text).map_err(Error::Json)
    }

    fn http(&self) -> reqwest::Client {
        self.client.read().unwrap().clone()
    }

    /// Rebuild the underlying HTTP client, dropping any pooled connections.
    /// Called transparently after a transport-class failure so the next
    /// retry doesn't reuse a broken keep-alive connection.
    fn reset_session(&self) {
        *self.client.write().unwrap() = build_http_client(self.connect_timeout, self.call_timeout);
    }
}

fn build_http_client(connect_timeout: Duration, call_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(call_timeout)
        .build()
        .expect("reqwest client builder never fails with only timeouts set")
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_domain::config::WorkerToolPolicy;
    use std::collections::HashMap;

    fn registry_with_flight_policy() -> ToolRegistryConfig {
        let mut worker_policies = HashMap::new();
        worker_policies.insert(
            "flight".to_string(),
            WorkerToolPolicy { allowed_tools: vec!["search_flights_oneway".into()] },
        );
        ToolRegistryConfig { base_url: "http://localhost:9400".into(), worker_policies }
    }

    #[tokio::test]
    async fn disallowed_tool_fails_closed_without_network_call() {
        let client = ToolClient::new("flight", &registry_with_flight_policy(), &BoundsConfig::default());
        let err = client.invoke("book_hotel", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, Error::ToolPermission { .. }));
    }

    #[tokio::test]
    async fn allowed_tool_passes_allow_list_check() {
        let client = ToolClient::new("flight", &registry_with_flight_policy(), &BoundsConfig::default());
        assert!(client.is_allowed("search_flights_oneway"));
        assert!(!client.is_allowed("book_hotel"));
    }

    #[test]
    fn unknown_worker_gets_empty_allow_list() {
        let client = ToolClient::new("unknown_worker", &registry_with_flight_policy(), &BoundsConfig::default());
        assert!(client.allowed_tools.is_empty());
    }
}
