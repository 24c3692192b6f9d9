use actix_web::{web, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::database::stats;
use crate::database::Database;

pub async fn get_stats(db: web::Data<Arc<Database>>) -> ActixResult<HttpResponse> {
    let stats = stats::dashboard_stats(db.async_connection.clone())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(stats))
}
