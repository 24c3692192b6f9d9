use actix_web::{web, HttpResponse, Result as ActixResult};
use shared_types::{AgentsResponse, CreateAgentRequest, UpdateAgentRequest};
use std::sync::Arc;

use crate::database::agents as agents_db;
use crate::database::Database;
use crate::handlers::roster_error_response;
use crate::jobs::list_manager::ListManager;

pub async fn list_agents(db: web::Data<Arc<Database>>) -> ActixResult<HttpResponse> {
    let agents = agents_db::list_agents(db.async_connection.clone())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AgentsResponse { agents }))
}

pub async fn get_agent(
    manager: web::Data<Arc<ListManager>>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    match manager.get_agent(path.into_inner()).await {
        Ok(agent) => Ok(HttpResponse::Ok().json(agent)),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

pub async fn create_agent(
    manager: web::Data<Arc<ListManager>>,
    request: web::Json<CreateAgentRequest>,
) -> ActixResult<HttpResponse> {
    match manager.create_agent(&request).await {
        Ok(agent) => Ok(HttpResponse::Created().json(agent)),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

pub async fn update_agent(
    manager: web::Data<Arc<ListManager>>,
    path: web::Path<i64>,
    request: web::Json<UpdateAgentRequest>,
) -> ActixResult<HttpResponse> {
    match manager.update_agent(path.into_inner(), &request).await {
        Ok(agent) => Ok(HttpResponse::Ok().json(agent)),
        Err(e) => Ok(roster_error_response(&e)),
    }
}

pub async fn delete_agent(
    manager: web::Data<Arc<ListManager>>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    match manager.delete_agent(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Agent deleted successfully"
        }))),
        Err(e) => Ok(roster_error_response(&e)),
    }
}
