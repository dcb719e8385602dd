//! Shared HTTP plumbing for the routing providers

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::core::error::{Error, Result};

/// Process-wide HTTP client, so every computation reuses provider connections
pub(crate) static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(20)
        .timeout(Duration::from_secs(300))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("isochrone/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// Send a GET request and decode a JSON body
///
/// A status other than 200, a missing content type or one that is not
/// `application/json` are transport errors, checked before the body is read.
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let url = response.url().to_string();

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(Error::HttpStatus { status: status.as_u16(), url });
    }

    match response.headers().get(reqwest::header::CONTENT_TYPE) {
        None => {
            return Err(Error::ContentType(
                "no contentType from server received.".to_string(),
            ))
        }
        Some(value) => {
            let content_type = value.to_str().unwrap_or_default();
            if !content_type.contains("application/json") {
                return Err(Error::ContentType(format!(
                    "invalid contentType({content_type}) from server."
                )));
            }
        }
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}
