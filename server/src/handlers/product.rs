//! Product handler - turns an HTTP call into an engine dispatch.

use crate::error::{AppError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use stockroom_engine::api::{self, Operation, Request, SERVICE_NAME};
use stockroom_engine::{Envelope, MemoryStore, Params, ProductService};

/// The service the server runs.
pub type Catalogue = ProductService<MemoryStore>;

/// Query-string pairs as a parameter mapping. Every value is a string.
pub fn query_params(raw: HashMap<String, String>) -> Params {
    raw.into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}

/// A JSON object body as a parameter mapping.
///
/// Anything that is not a JSON object yields an empty mapping.
pub fn body_params(raw: &[u8]) -> Params {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => Params::new(),
    }
}

/// Resolve `service`/`method` and run the operation.
pub async fn handle_call(
    catalogue: Arc<Catalogue>,
    service: &str,
    method: &str,
    request: Request,
) -> Result<Envelope> {
    if service != SERVICE_NAME {
        return Err(AppError::NotFound(format!("Service '{}' not found", service)));
    }

    let operation: Operation = method
        .parse()
        .map_err(|e: api::UnknownOperation| AppError::NotFound(e.to_string()))?;

    tracing::debug!(%operation, "Dispatching {}/{}", service, operation);

    // Updates and deletes may wait on a per-record lock.
    tokio::task::spawn_blocking(move || api::dispatch(&*catalogue, operation, &request))
        .await
        .map_err(|e| AppError::Internal(format!("dispatch task failed: {}", e)))
}
