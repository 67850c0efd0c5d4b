//! Frame sampler: grabs the current frame and encodes it for upload.

use std::time::{Duration, Instant};

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use super::session::StreamSlot;
use crate::camera::{CameraError, Frame, Resolution};

/// Default sampling rate (3 frames per second).
pub const DEFAULT_SAMPLES_PER_SECOND: u32 = 3;

/// Default JPEG quality (0.8 on a 0-1 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Interval between samples for a given rate.
///
/// A rate of 0 is treated as 1.
pub fn sample_period(samples_per_second: u32) -> Duration {
    Duration::from_secs_f64(1.0 / samples_per_second.max(1) as f64)
}

/// A frame ready to upload.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// JPEG bytes
    pub bytes: Vec<u8>,
    /// Native resolution the frame was captured at
    pub resolution: Resolution,
    /// When the frame was read from the stream
    pub captured_at: Instant,
}

/// Errors that can occur while sampling a frame.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Frame buffer does not match {width}x{height}")]
    MalformedFrame { width: u32, height: u32 },

    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Encoder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Reads frames from the session's stream slot.
#[derive(Clone)]
pub struct FrameSampler {
    slot: StreamSlot,
    quality: u8,
}

impl FrameSampler {
    pub fn new(slot: StreamSlot, quality: u8) -> Self {
        Self {
            slot,
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Capture and encode the current frame.
    ///
    /// Returns `Ok(None)` when no stream is attached. Encoding runs on the
    /// blocking pool so the timer task is never stalled by it.
    pub async fn sample(&self) -> Result<Option<EncodedFrame>, SampleError> {
        let frame = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_mut() {
                Some(stream) if stream.is_active() => stream.read_frame()?,
                _ => return Ok(None),
            }
        };

        let quality = self.quality;
        let resolution = frame.resolution();
        let captured_at = frame.timestamp;
        let bytes = tokio::task::spawn_blocking(move || encode_jpeg(&frame, quality)).await??;

        Ok(Some(EncodedFrame {
            bytes,
            resolution,
            captured_at,
        }))
    }
}

/// Encode an RGB frame as JPEG.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, SampleError> {
    if !frame.is_well_formed() || frame.resolution().is_empty() {
        return Err(SampleError::MalformedFrame {
            width: frame.width,
            height: frame.height,
        });
    }

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode(
        &frame.data,
        frame.width,
        frame.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}
