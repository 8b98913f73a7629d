use axum::response::Json;
use serde_json::{json, Value};
use tracing::instrument;

/// Health check endpoint handler
#[instrument(name = "health_check")]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_document() {
        let Json(body) = health_check().await;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "bunnyfood-rs");
        assert!(body["timestamp"].as_str().is_some());
    }
}
