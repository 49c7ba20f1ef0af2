use actix_web::{delete, get, post, put, web, HttpResponse};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::error::ApiError;
use crate::models::user::{AdminUserUpdate, ProfileUpdate, UserRequest, UserStore};

fn parse_id(id: &str) -> Result<ObjectId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::NotFound(String::from("User not found")))
}

#[get("/admin/users")]
pub async fn get_users(store: web::Data<UserStore>) -> Result<HttpResponse, ApiError> {
    let users = store.find_many().await?;
    Ok(HttpResponse::Ok().json(users))
}

#[post("/admin/users")]
pub async fn create_user(
    store: web::Data<UserStore>,
    payload: web::Json<UserRequest>,
) -> Result<HttpResponse, ApiError> {
    store.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "message": "User created successfully" })))
}

#[put("/admin/users/{id}")]
pub async fn update_user(
    store: web::Data<UserStore>,
    id: web::Path<String>,
    payload: web::Json<AdminUserUpdate>,
) -> Result<HttpResponse, ApiError> {
    let _id = parse_id(&id)?;
    store.admin_update(&_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "User updated successfully" })))
}

#[delete("/admin/users/{id}")]
pub async fn delete_user(
    store: web::Data<UserStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let _id = parse_id(&id)?;
    store.delete(&_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully" })))
}

#[put("/user/{id}/profile")]
pub async fn update_profile(
    store: web::Data<UserStore>,
    id: web::Path<String>,
    payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    let _id = parse_id(&id)?;
    store.profile_update(&_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Profile updated successfully" })))
}
