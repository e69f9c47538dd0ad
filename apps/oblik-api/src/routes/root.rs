//! Liveness and health.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use oblik_db::migrations::migration_status;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct Welcome {
    pub message: &'static str,
}

/// `GET /`: answers even when the store is unavailable.
pub async fn welcome() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to the Oblik inventory bookkeeping API!",
    })
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub migrations_total: usize,
    pub migrations_applied: usize,
}

/// `GET /health`: 200 when the store answers a query, 503 otherwise.
pub async fn health(State(state): State<SharedState>) -> ApiResult<Json<Health>> {
    let inventory = state.inventory()?;

    if !inventory.health_check().await {
        return Err(ApiError::unavailable("health check failed"));
    }

    let (total, applied) = migration_status(inventory.database().pool()).await?;
    Ok(Json(Health {
        status: "ok",
        migrations_total: total,
        migrations_applied: applied,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::routes::router;
    use crate::routes::test_support::{app, send};
    use crate::state::AppState;

    #[tokio::test]
    async fn test_welcome_without_store() {
        let app = router(Arc::new(AppState::unavailable("client not initialized")));

        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().starts_with("Welcome"));

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].as_str().unwrap().contains("client not initialized"));
    }

    #[tokio::test]
    async fn test_health_reports_migrations() {
        let app = app().await;

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["migrations_total"], body["migrations_applied"]);
    }
}
