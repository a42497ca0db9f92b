use async_trait::async_trait;
use serde::de::DeserializeOwned;
use streaming::endpoints::Endpoints;
use streaming::error::TransportError;
use streaming::protocol::{InputAck, InputMutation, ModuleState, SchedulerState};
use streaming::transport::Transport;

fn network(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

/// Blocking-free HTTP transport for the headless host.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl ReqwestTransport {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }

    async fn post_raw(&self, url: &str, body: Option<String>) -> Result<String, TransportError> {
        let mut req = self
            .http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            req = req
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        let resp = req.send().await.map_err(network)?;
        let status = resp.status();
        let text = resp.text().await.map_err(network)?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    async fn post<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let text = self.post_raw(url, None).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn fetch_module(&self, id: &str) -> Result<ModuleState, TransportError> {
        self.post(&self.endpoints.module(id)).await
    }

    async fn fetch_scheduler(&self) -> Result<SchedulerState, TransportError> {
        self.post(&self.endpoints.scheduler()).await
    }

    async fn send_input(&self, mutation: &InputMutation) -> Result<InputAck, TransportError> {
        let body = serde_json::to_string(&mutation.var_values)?;
        let text = self
            .post_raw(&self.endpoints.input(&mutation.path), Some(body))
            .await?;
        if text.trim().is_empty() {
            return Ok(InputAck::default());
        }
        Ok(serde_json::from_str(&text)?)
    }
}
