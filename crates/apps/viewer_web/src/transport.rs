use async_trait::async_trait;
use gloo_net::http::Request;
use serde::de::DeserializeOwned;
use streaming::endpoints::Endpoints;
use streaming::error::TransportError;
use streaming::protocol::{InputAck, InputMutation, ModuleState, SchedulerState};
use streaming::transport::Transport;

fn network(err: gloo_net::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

/// Browser transport: JSON over `fetch`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoints: Endpoints,
}

impl HttpTransport {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// POSTs `body` and returns the response text of a 2xx answer.
    async fn post_raw(&self, url: &str, body: Option<String>) -> Result<String, TransportError> {
        let builder = Request::post(url).header("Accept", "application/json");
        let resp = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(body)
                .map_err(network)?
                .send()
                .await
                .map_err(network)?,
            None => builder.send().await.map_err(network)?,
        };
        let status = resp.status();
        let text = resp.text().await.map_err(network)?;
        if !resp.ok() {
            return Err(TransportError::Status { status, body: text });
        }
        Ok(text)
    }

    async fn post<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let text = self.post_raw(url, None).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
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
