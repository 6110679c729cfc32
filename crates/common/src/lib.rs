pub mod api;
pub mod billing;
pub mod configuration;
pub mod consts;
pub mod dates;
pub mod document;
pub mod errors;
pub mod model;
pub mod sales;
pub mod store;
