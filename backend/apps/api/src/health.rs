//! Liveness and database reachability

use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use mongodb::{Database, bson::doc};
use serde::Serialize;

const PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

pub fn health_router(db: Database) -> Router {
    Router::new().route("/", get(health)).with_state(db)
}

async fn health(State(db): State<Database>) -> impl IntoResponse {
    let ping = tokio::time::timeout(PING_TIMEOUT, db.run_command(doc! { "ping": 1 })).await;

    match ping {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "up",
            }),
        ),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Health check ping failed");
            degraded()
        }
        Err(_) => {
            tracing::warn!("Health check ping timed out");
            degraded()
        }
    }
}

fn degraded() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(HealthResponse {
            status: "degraded",
            database: "down",
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use mongodb::Client;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unreachable_database_reports_degraded() {
        let client =
            Client::with_uri_str("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=100")
                .await
                .unwrap();
        let app = health_router(client.database("health_test"));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["database"], "down");
    }
}
