//! Postino - client for the dates tracker REST API.
//!
//! Wraps the remote collaborator that owns the date records: listing with
//! filters, single-record lookup, create/update/delete and the login that
//! opens a session.

pub mod api;
pub mod config;
pub mod error;
pub mod types;

pub use api::ApiClient;
pub use config::{ClientConfig, Credentials};
pub use error::ClientError;
pub use types::{parse_date_day, DateFilter, DateInput, DateRecord, Photo};
