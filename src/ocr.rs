//! OCR service client.

use std::fmt;

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Errors from OCR API calls.
#[derive(Debug)]
pub enum OcrError {
    /// HTTP request failed
    Request(reqwest::Error),
    /// API returned an error response
    Api { status: u16, message: String },
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrError::Request(e) => write!(f, "HTTP request failed: {e}"),
            OcrError::Api { status, message } => {
                write!(f, "OCR API error (status {status}): {message}")
            }
        }
    }
}

impl std::error::Error for OcrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OcrError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OcrError {
    fn from(err: reqwest::Error) -> Self {
        OcrError::Request(err)
    }
}

#[derive(Serialize)]
struct OcrRequest<'a> {
    #[serde(rename = "base64Image")]
    base64_image: &'a str,
}

#[derive(Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the external text-recognition endpoint.
#[derive(Clone)]
pub struct OcrClient {
    client: Client,
    endpoint: String,
}

impl OcrClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Submit a base64-encoded image and return the recognized text.
    /// An empty string means the service found no text.
    pub async fn recognize(&self, base64_image: &str) -> Result<String, OcrError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&OcrRequest { base64_image })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(OcrError::Api { status, message });
        }

        let body: OcrResponse = response.json().await?;
        Ok(body.text.unwrap_or_default())
    }
}
