//! HTTP client construction shared by the provider and the object store

use crate::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

/// Default headers sent on every outbound request.
pub fn default_header_map() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(ACCEPT, HeaderValue::from_static("application/json"));
    h.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("athlete-sync/", env!("CARGO_PKG_VERSION"))),
    );
    h
}

/// Build the shared client. Every request made through it carries `timeout`.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .default_headers(default_header_map())
        .timeout(timeout)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_header_map() {
        let headers = default_header_map();
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
        assert!(headers
            .get(USER_AGENT)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("athlete-sync/"));
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }
}
