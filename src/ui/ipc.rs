//! Messages exchanged with the page over the webview IPC channel.
//!
//! The page posts `{"id": "k3f9:1", "method": "download_file", "params": [documentId, filename]}`
//! through `window.ipc.postMessage`; the answer is delivered by evaluating
//! `window.__docshellResolve(id, result)` in the page. Ids carry a per-load
//! token so they never repeat across reloads.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::application::DownloadBridge;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("malformed bridge message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown bridge method: {0}")]
    UnknownMethod(String),

    #[error("bridge call {0} is missing a document id")]
    MissingDocumentId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMethod {
    /// Resolves to the saved path or `null`.
    DownloadFile,
    /// Resolves to the full outcome object.
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeCall {
    pub id: String,
    pub method: BridgeMethod,
    pub document_id: String,
    pub filename: String,
}

#[derive(Deserialize)]
struct RawCall {
    id: String,
    method: String,
    #[serde(default)]
    params: Vec<Value>,
}

/// Counts page loads in the webview. A reply is only delivered to the load
/// that issued the call.
#[derive(Debug, Default)]
pub struct PageLoads(AtomicU64);

impl PageLoads {
    /// Record a new navigation and return its number.
    pub fn begin_load(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, load: u64) -> bool {
        self.current() == load
    }
}

pub fn parse_call(body: &str) -> Result<BridgeCall, IpcError> {
    let raw: RawCall = serde_json::from_str(body)?;

    let method = match raw.method.as_str() {
        "download_file" => BridgeMethod::DownloadFile,
        "download" => BridgeMethod::Download,
        other => return Err(IpcError::UnknownMethod(other.to_string())),
    };

    let document_id = match raw.params.first().and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => return Err(IpcError::MissingDocumentId(raw.id)),
    };
    let filename = raw
        .params
        .get(1)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(BridgeCall {
        id: raw.id,
        method,
        document_id,
        filename,
    })
}

/// Run a call against the bridge and produce the value the page receives.
pub async fn dispatch(bridge: &DownloadBridge, call: &BridgeCall) -> Value {
    match call.method {
        BridgeMethod::DownloadFile => {
            Value::from(bridge.download_file(&call.document_id, &call.filename).await)
        }
        BridgeMethod::Download => {
            let outcome = bridge
                .download_outcome(&call.document_id, &call.filename)
                .await;
            serde_json::to_value(outcome).unwrap_or(Value::Null)
        }
    }
}

pub fn reply_script(id: &str, result: &Value) -> String {
    format!("window.__docshellResolve({}, {});", Value::from(id), result)
}
