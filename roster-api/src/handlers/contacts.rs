use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use shared_types::{
    BulkUpdateContactsRequest, BulkUpdateContactsResponse, ContactStatus, ContactsResponse,
    ErrorResponse, UpdateContactRequest,
};
use std::sync::Arc;

use crate::database::contacts::ContactFilter;
use crate::handlers::roster_error_response;
use crate::jobs::list_manager::ListManager;

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 200;

#[derive(Debug, Deserialize)]
pub struct ContactsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub agent_id: Option<i64>,
    pub status: Option<String>,
}

pub async fn list_contacts(
    manager: web::Data<Arc<ListManager>>,
    query: web::Query<ContactsQuery>,
) -> ActixResult<HttpResponse> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(value) => match ContactStatus::parse(value) {
            Some(status) => Some(status),
            None => {
                return Ok(HttpResponse::BadRequest()
                    .json(ErrorResponse::new(format!("Unknown status '{}'", value))))
            }
        },
        None => None,
    };

    let filter = ContactFilter {
        search: query.search.clone(),
        agent_id: query.agent_id,
        status,
    };
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    match manager.list_contacts(&filter, page, limit).await {
        Ok((contacts, total)) => Ok(HttpResponse::Ok().json(ContactsResponse {
            contacts,
            total,
            total_pages: total.div_ceil(limit),
            current_page: page,
        })),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

pub async fn get_contact(
    manager: web::Data<Arc<ListManager>>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    match manager.get_contact(path.into_inner()).await {
        Ok(contact) => Ok(HttpResponse::Ok().json(contact)),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

pub async fn update_contact(
    manager: web::Data<Arc<ListManager>>,
    path: web::Path<i64>,
    request: web::Json<UpdateContactRequest>,
) -> ActixResult<HttpResponse> {
    match manager.update_contact(path.into_inner(), &request).await {
        Ok(contact) => Ok(HttpResponse::Ok().json(contact)),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

pub async fn delete_contact(
    manager: web::Data<Arc<ListManager>>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    match manager.delete_contact(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Contact deleted successfully"
        }))),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

pub async fn bulk_update_contacts(
    manager: web::Data<Arc<ListManager>>,
    request: web::Json<BulkUpdateContactsRequest>,
) -> ActixResult<HttpResponse> {
    match manager.bulk_update_contacts(&request).await {
        Ok(updated) => Ok(HttpResponse::Ok().json(BulkUpdateContactsResponse { updated })),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::TestState;
    use actix_web::{http::StatusCode, test, App};
    use shared_types::{Contact, CreateAgentRequest, DashboardStats};

    #[actix_web::test]
    async fn test_contact_listing_and_updates() {
        let state = TestState::new();
        let agent = state
            .manager
            .create_agent(&CreateAgentRequest {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                mobile: "555".to_string(),
            })
            .await
            .unwrap();
        let mut csv = String::from("FirstName,Phone\n");
        for i in 0..25 {
            csv.push_str(&format!("Lead{},555{}\n", i, i));
        }
        state
            .manager
            .ingest("leads.csv", csv.into_bytes(), None)
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(state.db_data())
                .app_data(state.manager_data())
                .configure(crate::handlers::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/contacts").to_request();
        let page: ContactsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page.total, 25);
        assert_eq!(page.contacts.len(), 20);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/contacts?agent_id={}&search=Lead1&page=1&limit=50", agent.id))
            .to_request();
        let page: ContactsResponse = test::call_and_read_body_json(&app, req).await;
        // Lead1 and Lead10..Lead19
        assert_eq!(page.total, 11);

        let req = test::TestRequest::get()
            .uri(&format!("/api/contacts?page={}&limit=20", u64::MAX))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.message.contains("out of range"));

        let req = test::TestRequest::get()
            .uri("/api/contacts?status=bogus")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let id = page.contacts[0].id;
        let req = test::TestRequest::put()
            .uri(&format!("/api/contacts/{}", id))
            .set_json(serde_json::json!({ "status": "contacted", "notes": "left voicemail" }))
            .to_request();
        let contact: Contact = test::call_and_read_body_json(&app, req).await;
        assert_eq!(contact.notes, "left voicemail");
        assert!(contact.last_contacted_at.is_some());

        let req = test::TestRequest::put()
            .uri(&format!("/api/contacts/{}", id))
            .set_json(serde_json::json!({ "phone": "   " }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::put()
            .uri("/api/contacts/bulk")
            .set_json(serde_json::json!({
                "contact_ids": [page.contacts[1].id, page.contacts[2].id],
                "status": "converted"
            }))
            .to_request();
        let bulk: BulkUpdateContactsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(bulk.updated, 2);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/contacts/{}", id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/contacts/{}", id))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::get()
            .uri("/api/dashboard/stats")
            .to_request();
        let stats: DashboardStats = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats.contacts.total, 24);
        assert_eq!(stats.contacts.by_status["converted"], 2);
        assert_eq!(stats.distribution[0].contact_count, 24);
        assert_eq!(stats.recent_uploads.len(), 1);
    }
}
