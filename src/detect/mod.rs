//! Detection service integration.
//!
//! Frames go to `POST /api/detect` through an [`UploadGate`] that admits one
//! request at a time and cools down after timeouts and server errors. Results
//! are published as a [`DetectionSnapshot`].

mod backoff;
mod client;
mod gate;
mod types;
mod uploader;

pub use backoff::{
    log_failure, CooldownPolicy, DEFAULT_SERVER_ERROR_COOLDOWN, DEFAULT_TIMEOUT_COOLDOWN,
};
pub use client::{
    DetectError, DetectorClient, DEFAULT_BASE_URL, DEFAULT_UPLOAD_TIMEOUT, DETECT_PATH,
    DETECT_URL_ENV, HEALTH_PATH,
};
pub use gate::{GatePermit, UploadGate};
pub use types::{DetectResponse, Detection, DetectionSnapshot, HealthResponse};
pub use uploader::{FrameUploader, SubmitOutcome, UploadOutcome};
