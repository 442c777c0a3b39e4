//! HTTP transport to the MTProto gateway.
//!
//! The gateway owns connection setup, encryption and framing; this side only
//! sends `{method, params}` envelopes with the credentials and session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::rpc::{RpcError, Transport};

#[derive(Serialize)]
struct Envelope<'a> {
    dc_id: u32,
    api_id: i32,
    api_hash: &'a str,
    session: Option<&'a Value>,
    method: &'a str,
    params: &'a Value,
}

#[derive(Deserialize)]
struct GatewayReply {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error_code: Option<i32>,
    #[serde(default)]
    error_message: Option<String>,
}

pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
    api_id: i32,
    api_hash: String,
    session: RwLock<Option<Value>>,
}

impl HttpTransport {
    pub fn new(gateway_url: &str, api_id: i32, api_hash: String, session: Option<Value>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/rpc", gateway_url.trim_end_matches('/')),
            api_id,
            api_hash,
            session: RwLock::new(session),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn invoke(&self, dc_id: u32, method: &str, params: &Value) -> Result<Value, RpcError> {
        let session = self.session.read().await;
        let envelope = Envelope {
            dc_id,
            api_id: self.api_id,
            api_hash: &self.api_hash,
            session: session.as_ref(),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        debug!(method, status = %response.status(), "Gateway responded");

        let reply: GatewayReply = response.json().await.map_err(|e| RpcError::Decode {
            method: method.to_string(),
            detail: e.to_string(),
        })?;

        if reply.ok {
            return Ok(reply.result.unwrap_or(Value::Null));
        }

        let message = reply.error_message.unwrap_or_else(|| "UNKNOWN_ERROR".to_string());
        warn!(method, dc_id, error = %message, "Gateway reported an RPC error");
        Err(RpcError::remote(reply.error_code.unwrap_or(500), message))
    }

    async fn install_session(&self, session: &Value) {
        *self.session.write().await = Some(session.clone());
    }
}
