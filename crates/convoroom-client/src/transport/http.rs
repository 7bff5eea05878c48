//! Request/response calls to the history and compute endpoints.

use convoroom_core::error::HttpError;
use reqwest::{Response, header::CONTENT_TYPE};

use super::TransportError;

/// HTTP client for the backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    /// Build a client with the crate user agent.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("convoroom/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::HttpSetup(e.to_string()))?;
        Ok(Self { client })
    }

    /// `GET url`, returning the body on 2xx.
    pub async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self.client.get(url).send().await.map_err(network)?;
        read_body(response).await
    }

    /// `POST url` with a JSON body, returning the response body on 2xx.
    ///
    /// No timeout beyond the transport default.
    pub async fn post_json(&self, url: &str, body: String) -> Result<Vec<u8>, HttpError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(network)?;
        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<Vec<u8>, HttpError> {
    let status = response.status();
    if !status.is_success() {
        return Err(HttpError::Status { status: status.as_u16() });
    }
    let bytes = response.bytes().await.map_err(network)?;
    Ok(bytes.to_vec())
}

fn network(error: reqwest::Error) -> HttpError {
    HttpError::Network(error.to_string())
}
