pub mod client;
pub mod models;

pub use client::{build_headers, HttpClient};
pub use models::ClientConfig;
