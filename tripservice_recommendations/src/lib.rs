pub mod api;
pub mod app_config;
pub mod auth;
pub mod model_client;

mod handlers;
