use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::database::Database;

pub async fn health(db: web::Data<Arc<Database>>) -> HttpResponse {
    match db.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "database": "disconnected"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::TestState;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_reports_connected() {
        let state = TestState::new();
        let app = test::init_service(
            App::new()
                .app_data(state.db_data())
                .route("/health", web::get().to(health)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["database"], "connected");
    }
}
