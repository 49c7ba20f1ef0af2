use actix_web::{get, post, web, HttpResponse};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::error::ApiError;
use crate::models::incident::{
    IncidentQuery, IncidentRequest, IncidentStatusRequest, IncidentStore, IncidentUpdateRequest,
};

// An id that does not parse cannot match any record.
fn parse_id(id: &str) -> Result<ObjectId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::NotFound(String::from("Incident not found")))
}

#[post("/report-incident")]
pub async fn report_incident(
    store: web::Data<IncidentStore>,
    payload: web::Json<IncidentRequest>,
) -> Result<HttpResponse, ApiError> {
    let short_id = store.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Incident reported successfully",
        "short_id": short_id,
    })))
}

#[get("/incidents")]
pub async fn get_incidents(
    store: web::Data<IncidentStore>,
    query: web::Query<IncidentQuery>,
) -> Result<HttpResponse, ApiError> {
    let incidents = store.find_many(&query).await?;
    Ok(HttpResponse::Ok().json(incidents))
}

#[get("/incidents/{id}")]
pub async fn get_incident(
    store: web::Data<IncidentStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let _id = parse_id(&id)?;
    let incident = store.find_by_id(&_id).await?;
    Ok(HttpResponse::Ok().json(incident))
}

#[post("/incidents/{id}/update")]
pub async fn update_incident(
    store: web::Data<IncidentStore>,
    id: web::Path<String>,
    payload: web::Json<IncidentUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let _id = parse_id(&id)?;
    let payload = payload.into_inner();
    store
        .update_status_and_team(&_id, &payload.status, &payload.team)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Incident updated successfully" })))
}

#[post("/incidents/{id}/update-status")]
pub async fn update_incident_status(
    store: web::Data<IncidentStore>,
    id: web::Path<String>,
    payload: web::Json<IncidentStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let _id = parse_id(&id)?;
    let status = payload.status.as_deref().unwrap_or("");
    if status.is_empty() {
        return Err(ApiError::Validation(String::from("Status is required")));
    }

    store.update_status(&_id, status).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Status updated successfully" })))
}
