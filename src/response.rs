//! Classification of background-removal API responses
//!
//! The removal endpoint answers in several shapes: an HTTP error, a JSON body
//! pointing at a download URL, some other JSON, or (occasionally) the image bytes
//! themselves. [`RemovalOutcome::classify`] decides which one a response is in a
//! single step so the pipeline only has to dispatch on the tag.

use bytes::Bytes;
use serde::Deserialize;

/// Status and body of a submitted request, before interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body decoded as (lossy) UTF-8 for diagnostics
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Interpreted removal response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// JSON success with a result URL to fetch
    Success { url: String },
    /// Non-JSON body, treated as the image itself
    RawBytes { content: Bytes },
    /// Non-JSON and empty: nothing to save
    Empty,
    /// JSON without the expected success/URL shape
    Malformed { body: String },
    /// Any status other than 200
    HttpError { status: u16, text: String },
}

#[derive(Debug, Deserialize)]
struct SuccessBody {
    status: Option<String>,
    data: Option<SuccessData>,
}

#[derive(Debug, Deserialize)]
struct SuccessData {
    url: Option<String>,
}

impl RemovalOutcome {
    /// Decide the outcome of a removal request
    pub fn classify(response: &RawResponse) -> Self {
        if response.status != 200 {
            return Self::HttpError {
                status: response.status,
                text: response.text(),
            };
        }

        let Ok(value) = serde_json::from_slice::<serde_json::Value>(&response.body) else {
            if response.body.is_empty() {
                return Self::Empty;
            }
            return Self::RawBytes {
                content: response.body.clone(),
            };
        };

        match serde_json::from_value::<SuccessBody>(value) {
            Ok(SuccessBody {
                status: Some(status),
                data: Some(SuccessData { url: Some(url) }),
            }) if status == "success" && !url.is_empty() => Self::Success { url },
            _ => Self::Malformed {
                body: response.text(),
            },
        }
    }

    /// Short label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::RawBytes { .. } => "raw_bytes",
            Self::Empty => "empty",
            Self::Malformed { .. } => "malformed",
            Self::HttpError { .. } => "http_error",
        }
    }
}
