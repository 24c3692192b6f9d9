use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use shared_types::{
    ErrorResponse, RedistributeResponse, UploadHistoryResponse, UploadResponse,
};
use std::sync::Arc;

use crate::database::upload_history;
use crate::database::Database;
use crate::handlers::{list_error_response, roster_error_response};
use crate::jobs::list_manager::ListManager;

/// Header carrying the caller identity, set by whatever authenticated the request
pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadHistoryQuery {
    pub limit: Option<u32>,
}

/// Accepts the raw file as the request body
pub async fn upload_list(
    manager: web::Data<Arc<ListManager>>,
    query: web::Query<UploadQuery>,
    req: HttpRequest,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    let Some(file_name) = query.file_name.as_deref().filter(|n| !n.trim().is_empty()) else {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse::new("file_name is required")));
    };

    if body.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse::new("No file uploaded")));
    }

    let uploaded_by = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match manager
        .ingest(file_name, body.to_vec(), uploaded_by.as_deref())
        .await
    {
        Ok(outcome) => Ok(HttpResponse::Ok().json(UploadResponse {
            message: "File uploaded and processed successfully".to_string(),
            total_records: outcome.accepted,
            upload_id: outcome.upload_id,
            errors: (!outcome.rejections.is_empty()).then_some(outcome.rejections),
            distribution: outcome.distribution,
        })),
        Err(e) => Ok(list_error_response(&e)),
    }
}

pub async fn redistribute(manager: web::Data<Arc<ListManager>>) -> ActixResult<HttpResponse> {
    match manager.redistribute().await {
        Ok(distribution) => Ok(HttpResponse::Ok().json(RedistributeResponse {
            message: "Lists redistributed successfully".to_string(),
            distribution,
        })),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

pub async fn get_distribution(manager: web::Data<Arc<ListManager>>) -> ActixResult<HttpResponse> {
    match manager.distribution().await {
        Ok(distribution) => Ok(HttpResponse::Ok().json(distribution)),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

pub async fn list_uploads(
    db: web::Data<Arc<Database>>,
    query: web::Query<UploadHistoryQuery>,
) -> ActixResult<HttpResponse> {
    let uploads = upload_history::list_uploads(
        db.async_connection.clone(),
        query.limit.unwrap_or(50).min(500),
    )
    .await
    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(UploadHistoryResponse { uploads }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::TestState;
    use actix_web::{http::StatusCode, test, App};
    use shared_types::{CreateAgentRequest, DistributionResponse, UploadStatus};

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.db_data())
                    .app_data($state.manager_data())
                    .configure(crate::handlers::configure),
            )
            .await
        };
    }

    async fn add_agent(state: &TestState, name: &str) {
        state
            .manager
            .create_agent(&CreateAgentRequest {
                name: name.to_string(),
                email: format!("{}@example.com", name),
                mobile: "555".to_string(),
            })
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn test_upload_reports_rejections_and_distribution() {
        let state = TestState::new();
        add_agent(&state, "ana").await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/lists/upload?file_name=leads.csv")
            .insert_header((USER_ID_HEADER, "admin-1"))
            .set_payload("FirstName,Phone,Notes\nAl,555,\n,556,missing name\nBea,557,\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: UploadResponse = test::read_body_json(resp).await;
        assert_eq!(body.total_records, 2);
        let errors = body.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert_eq!(body.distribution.shares[0].contact_count, 2);

        let req = test::TestRequest::get().uri("/api/lists/uploads").to_request();
        let history: UploadHistoryResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(history.uploads.len(), 1);
        assert_eq!(history.uploads[0].status, UploadStatus::Success);
        assert_eq!(history.uploads[0].uploaded_by.as_deref(), Some("admin-1"));
    }

    #[actix_web::test]
    async fn test_upload_failures_map_to_client_errors() {
        let state = TestState::new();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/lists/upload?file_name=leads.txt")
            .set_payload("FirstName,Phone\nAl,555\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.message.contains("Unsupported file format"));

        let req = test::TestRequest::post()
            .uri("/api/lists/upload?file_name=leads.csv")
            .set_payload("FirstName,Phone\n,555\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "No valid contacts found in file");
        assert_eq!(body.errors[0].row, 2);

        let req = test::TestRequest::post()
            .uri("/api/lists/upload?file_name=leads.csv")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/lists/upload")
            .set_payload("FirstName,Phone\nAl,555\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "file_name is required");
    }

    #[actix_web::test]
    async fn test_redistribute_and_distribution_view() {
        let state = TestState::new();
        add_agent(&state, "ana").await;
        add_agent(&state, "bo").await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/lists/upload?file_name=leads.csv")
            .set_payload("FirstName,Phone\nA,1\nB,2\nC,3\n")
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::post()
            .uri("/api/lists/redistribute")
            .to_request();
        let body: RedistributeResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.distribution.total_contacts, 3);
        assert_eq!(body.distribution.agent_count, 2);

        let req = test::TestRequest::get()
            .uri("/api/lists/distribution")
            .to_request();
        let view: DistributionResponse = test::call_and_read_body_json(&app, req).await;
        let sizes: Vec<usize> = view.agents.iter().map(|a| a.contacts.len()).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(view.unassigned_count, 0);
    }
}
