pub mod agents;
pub mod contacts;
pub mod dashboard;
pub mod health;
pub mod lists;

use actix_web::{web, HttpResponse};
use shared_types::{ErrorResponse, ListError, RosterError};

/// Every API route, mounted under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health))
            .route("/lists/upload", web::post().to(lists::upload_list))
            .route("/lists/redistribute", web::post().to(lists::redistribute))
            .route("/lists/distribution", web::get().to(lists::get_distribution))
            .route("/lists/uploads", web::get().to(lists::list_uploads))
            .route("/agents", web::get().to(agents::list_agents))
            .route("/agents", web::post().to(agents::create_agent))
            .route("/agents/{id}", web::get().to(agents::get_agent))
            .route("/agents/{id}", web::put().to(agents::update_agent))
            .route("/agents/{id}", web::delete().to(agents::delete_agent))
            .route("/contacts", web::get().to(contacts::list_contacts))
            .route("/contacts/bulk", web::put().to(contacts::bulk_update_contacts))
            .route("/contacts/{id}", web::get().to(contacts::get_contact))
            .route("/contacts/{id}", web::put().to(contacts::update_contact))
            .route("/contacts/{id}", web::delete().to(contacts::delete_contact))
            .route("/dashboard/stats", web::get().to(dashboard::get_stats)),
    );
}

pub(crate) fn list_error_response(error: &ListError) -> HttpResponse {
    match error {
        ListError::ValidationEmpty {
            message,
            rejections,
        } => HttpResponse::BadRequest().json(ErrorResponse {
            message: message.clone(),
            errors: rejections.clone(),
        }),
        ListError::PersistenceFailure(_) => HttpResponse::InternalServerError()
            .json(ErrorResponse::new(format!("Error processing file: {}", error))),
        ListError::UnsupportedFormat(_) | ListError::MalformedInput(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new(error.to_string()))
        }
    }
}

pub(crate) fn roster_error_response(error: &RosterError) -> HttpResponse {
    let body = ErrorResponse::new(error.to_string());
    match error {
        RosterError::AgentNotFound(_) | RosterError::ContactNotFound(_) => {
            HttpResponse::NotFound().json(body)
        }
        RosterError::InactiveAgent(_)
        | RosterError::DuplicateEmail(_)
        | RosterError::InvalidRequest(_) => HttpResponse::BadRequest().json(body),
        RosterError::PersistenceFailure(_) => {
            tracing::error!("{}", error);
            HttpResponse::InternalServerError().json(body)
        }
    }
}
