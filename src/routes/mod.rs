pub mod dashboard;
pub mod incident;
pub mod user;
