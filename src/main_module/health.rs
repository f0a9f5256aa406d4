//! Liveness endpoint

use axum::http::StatusCode;
use axum::Json;

pub const SERVICE_NAME: &str = "insighta";

pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
