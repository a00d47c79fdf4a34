//! Provides the shared HTTP client.

use reqwest::{
    blocking::Client,
    header::{self, HeaderMap, HeaderValue},
};

/// Identifies us to the favorites endpoint and the location service.
pub const USER_AGENT: &str = concat!("favmap/", env!("CARGO_PKG_VERSION"), " (Rust)");

pub fn build_client() -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    Client::builder()
        .gzip(true)
        .use_rustls_tls()
        .default_headers(headers)
        .build()
}
