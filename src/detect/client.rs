//! DetectorClient - uploads frames to the remote detection service.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

use super::types::{DetectResponse, HealthResponse};

/// The environment variable that overrides the detection service URL.
pub const DETECT_URL_ENV: &str = "STAND_DETECT_URL";

/// Default base URL of the detection service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the detection endpoint.
pub const DETECT_PATH: &str = "/api/detect";

/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Client-side limit for one upload (3 seconds).
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_millis(3000);

/// Multipart field carrying the frame.
const FRAME_FIELD: &str = "file";

const FRAME_FILE_NAME: &str = "frame.jpg";

const FRAME_MIME: &str = "image/jpeg";

/// Client for the detection service.
#[derive(Debug, Clone)]
pub struct DetectorClient {
    base_url: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl DetectorClient {
    /// Create a client for the URL in `STAND_DETECT_URL`, or the default
    /// local service when it is unset.
    pub fn new() -> Result<Self, DetectError> {
        let base_url =
            std::env::var(DETECT_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    /// Create a client for a specific service URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DetectError> {
        Self::with_timeout(base_url, DEFAULT_UPLOAD_TIMEOUT)
    }

    /// Create a client with a custom upload timeout.
    ///
    /// Useful for testing against a mock server.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DetectError> {
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(DetectError::InvalidUrl(base_url));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DetectError::Client)?;

        Ok(Self {
            base_url,
            timeout,
            http_client,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the upload timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upload one JPEG frame and return the service's detections.
    ///
    /// # Errors
    ///
    /// Returns `DetectError::Timeout` if no response arrives within the
    /// timeout, `DetectError::PayloadTooLarge` on 413,
    /// `DetectError::BadRequest` on 400, `DetectError::Server` on 5xx,
    /// `DetectError::Rejected` on other non-success statuses, or
    /// `DetectError::Network` if the request could not be made.
    pub async fn detect(&self, jpeg: Vec<u8>) -> Result<DetectResponse, DetectError> {
        let url = format!("{}{}", self.base_url, DETECT_PATH);

        let part = Part::bytes(jpeg)
            .file_name(FRAME_FILE_NAME)
            .mime_str(FRAME_MIME)
            .map_err(DetectError::Client)?;
        let form = Form::new().part(FRAME_FIELD, part);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DetectError::from_status(status, message));
        }

        response
            .json::<DetectResponse>()
            .await
            .map_err(|e| self.transport_error(e))
    }

    /// Check that the service is up.
    pub async fn health(&self) -> Result<HealthResponse, DetectError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DetectError::from_status(status, message));
        }

        response
            .json::<HealthResponse>()
            .await
            .map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, error: reqwest::Error) -> DetectError {
        if error.is_timeout() {
            DetectError::Timeout(self.timeout)
        } else if error.is_decode() {
            DetectError::InvalidResponse(error.to_string())
        } else {
            DetectError::Network(error)
        }
    }
}

/// Errors that can occur while talking to the detection service.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("Invalid detection service URL: '{0}'")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Frame too large: {0}")]
    PayloadTooLarge(String),

    #[error("Invalid image: {0}")]
    BadRequest(String),

    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status code (5xx)
        status: u16,
        /// Response body
        message: String,
    },

    #[error("Request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

impl DetectError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::PAYLOAD_TOO_LARGE => DetectError::PayloadTooLarge(message),
            StatusCode::BAD_REQUEST => DetectError::BadRequest(message),
            s if s.is_server_error() => DetectError::Server {
                status: s.as_u16(),
                message,
            },
            s => DetectError::Rejected {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// True for client-side aborts and network failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, DetectError::Timeout(_) | DetectError::Network(_))
    }
}
