//! Capture session and the sample/upload loop.
//!
//! - [`CaptureSession`] owns the camera stream between start and stop
//! - [`FrameSampler`] reads and encodes the current frame
//! - [`CaptureLoop`] drives the sampler on a timer and feeds the uploader

mod capture_loop;
mod liveness;
mod sampler;
mod session;

pub use capture_loop::{CaptureLoop, LoopSettings};
pub use liveness::{Liveness, LivenessToken};
pub use sampler::{
    encode_jpeg, sample_period, EncodedFrame, FrameSampler, SampleError,
    DEFAULT_JPEG_QUALITY, DEFAULT_SAMPLES_PER_SECOND,
};
pub use session::{CaptureSession, SessionError, StreamSlot};
