use actix_web::{get, web, HttpResponse};

use crate::error::ApiError;
use crate::models::dashboard::DashboardStore;

#[get("/admin/user-dashboard")]
pub async fn user_dashboard(store: web::Data<DashboardStore>) -> Result<HttpResponse, ApiError> {
    let breakdown = store.breakdown().await?;
    Ok(HttpResponse::Ok().json(breakdown))
}

#[get("/admin/dashboard-stats")]
pub async fn dashboard_stats(store: web::Data<DashboardStore>) -> Result<HttpResponse, ApiError> {
    let stats = store.stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
