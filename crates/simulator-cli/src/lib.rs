pub mod client;
pub mod commands;
pub mod render;
pub mod session;
