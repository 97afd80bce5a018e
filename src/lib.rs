pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod oauth;
pub mod routes;
pub mod templates_structs;
