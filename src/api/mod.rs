mod client;
mod models;

pub use client::{ApiClient, ApiError};
pub use models::BackendConfig;
