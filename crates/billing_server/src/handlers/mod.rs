pub mod admin;
pub mod errors;
pub mod ingestion;
pub mod invoices;
pub mod query;
pub mod request;
pub mod response;
