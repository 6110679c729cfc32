pub mod app_state;
pub mod handlers;
pub mod reports;
pub mod routes;
pub mod settings;
pub mod utils;
