//! Camera access: device enumeration and live streams.
//!
//! This module provides a high-level API for camera operations:
//! - The platform seam via [`CameraBackend`] and [`CameraStream`]
//! - Device enumeration via [`list_devices`]
//! - Built-in platforms: [`TestPatternBackend`] and [`StillImageBackend`]

mod device;
mod pattern;
mod still;
mod types;

pub use device::{display_label, list_devices, CameraBackend, CameraStream};
pub use pattern::TestPatternBackend;
pub use still::StillImageBackend;
pub use types::{
    CameraDescriptor, CameraError, CameraSelector, FacingMode, Frame, FrameFormat, Range,
    Resolution, StreamConstraints,
};
