//! Product API routes.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::Method,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use stockroom_engine::api::{Operation, Request, SERVICE_NAME};
use stockroom_engine::Params;

use crate::error::{ApiReply, Result};
use crate::handlers::{body_params, handle_call, query_params};
use crate::AppState;

/// API index response.
#[derive(Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

/// Create API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api", get(index))
        .route("/api/", get(index))
        .route("/api/{service}/{method}", get(call).post(call))
}

/// GET /api - list the available endpoints.
async fn index() -> Json<IndexResponse> {
    let endpoints = Operation::ALL
        .iter()
        .map(|op| {
            let path = match op {
                Operation::Read => format!("/api/{}/{}?id={{id}}", SERVICE_NAME, op),
                _ => format!("/api/{}/{}", SERVICE_NAME, op),
            };
            (format!("{} {}", op.http_method(), path), op.summary().to_string())
        })
        .collect();

    Json(IndexResponse {
        message: "Stockroom API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

/// GET|POST /api/{service}/{method} - run one operation.
async fn call(
    State(state): State<AppState>,
    Path((service, method_name)): Path<(String, String)>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<ApiReply> {
    let body = if method == Method::POST {
        body_params(&body)
    } else {
        Params::new()
    };
    let request = Request::new(query_params(query), body);

    let envelope = handle_call(state.catalogue, &service, &method_name, request).await?;
    Ok(ApiReply(envelope))
}
