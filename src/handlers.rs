// src/handlers.rs

pub mod auth;
pub mod rbac;
pub mod tenancy;

use axum::Json;
use serde_json::{json, Value};

use crate::common::response::ApiResponse;

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Serviço no ar"))
)]
pub async fn health() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(json!({ "status": "ok" })))
}
