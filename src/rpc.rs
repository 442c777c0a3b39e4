//! # RPC Client Module
//!
//! Wraps calls to the user-account API. A call that fails because the account
//! lives on another data-center (`PHONE_MIGRATE_5` and friends) repoints the
//! client to that data-center for good and is retried exactly once.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

lazy_static! {
    static ref MIGRATE_REGEX: Regex =
        Regex::new(r"^(?:PHONE|NETWORK|USER)_MIGRATE_(\d+)$").expect("Migrate pattern should be valid");
}

/// Failure of a single remote call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RpcError {
    /// The server rejected the call, e.g. `PHONE_CODE_INVALID`
    #[error("{message}")]
    Remote { code: i32, message: String },
    /// The request never produced a server answer
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with something we could not decode
    #[error("unexpected response to {method}: {detail}")]
    Decode { method: String, detail: String },
}

impl RpcError {
    pub fn remote(code: i32, message: impl Into<String>) -> Self {
        RpcError::Remote {
            code,
            message: message.into(),
        }
    }

    /// Data-center the server asks us to move to, if this is a migrate signal
    pub fn migrate_dc(&self) -> Option<u32> {
        match self {
            RpcError::Remote { message, .. } => MIGRATE_REGEX
                .captures(message)
                .and_then(|caps| caps[1].parse().ok()),
            _ => None,
        }
    }
}

/// Carries one request to a given data-center and returns its raw result
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(&self, dc_id: u32, method: &str, params: &Value) -> Result<Value, RpcError>;

    /// Adopt freshly signed-in session material for subsequent calls
    async fn install_session(&self, _session: &Value) {}
}

/// User-account API client with data-center migration handling
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    dc_id: AtomicU32,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn Transport>, default_dc: u32) -> Self {
        Self {
            transport,
            dc_id: AtomicU32::new(default_dc),
        }
    }

    /// Data-center that the next call will be sent to
    pub fn current_dc(&self) -> u32 {
        self.dc_id.load(Ordering::SeqCst)
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Invoke `method` with `params`, following one migrate redirect
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let dc_id = self.current_dc();
        debug!(method, dc_id, "Invoking remote method");

        match self.transport.invoke(dc_id, method, &params).await {
            Ok(result) => Ok(result),
            Err(err) => match err.migrate_dc() {
                Some(new_dc) => {
                    info!(method, from_dc = dc_id, to_dc = new_dc, "Account migrated, redirecting");
                    self.dc_id.store(new_dc, Ordering::SeqCst);
                    self.transport.invoke(new_dc, method, &params).await
                }
                None => {
                    error!(method, dc_id, error = %err, "Remote call failed");
                    Err(err)
                }
            },
        }
    }
}
