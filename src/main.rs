use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;

mod database;
mod error;
mod hash;
mod models;
mod routes;

use models::{dashboard::DashboardStore, incident::IncidentStore, user::UserStore};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let db_uri: String =
        std::env::var("MONGODB_URI").unwrap_or_else(|_| String::from("mongodb://localhost:27017"));
    let bind_address: String =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| String::from("127.0.0.1:5001"));
    let cors_origin: String =
        std::env::var("CORS_ORIGIN").unwrap_or_else(|_| String::from("http://localhost:5173"));

    let db = database::connect(&db_uri)
        .await
        .map_err(|error| io::Error::new(io::ErrorKind::Other, error))?;
    database::ensure_indexes(&db)
        .await
        .map_err(|error| io::Error::new(io::ErrorKind::Other, error))?;

    let incidents = web::Data::new(IncidentStore::new(&db));
    let users = web::Data::new(UserStore::new(&db));
    let dashboard = web::Data::new(DashboardStore::new(&db));

    log::info!("listening on {bind_address}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(incidents.clone())
            .app_data(users.clone())
            .app_data(dashboard.clone())
            .service(routes::incident::report_incident)
            .service(routes::incident::get_incidents)
            .service(routes::incident::get_incident)
            .service(routes::incident::update_incident)
            .service(routes::incident::update_incident_status)
            .service(routes::user::get_users)
            .service(routes::user::create_user)
            .service(routes::user::update_user)
            .service(routes::user::delete_user)
            .service(routes::user::update_profile)
            .service(routes::dashboard::user_dashboard)
            .service(routes::dashboard::dashboard_stats)
    })
    .bind(bind_address)?
    .run()
    .await
}
