//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

/// Orientation hint for a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Front-facing camera (selfie side)
    User,
    /// Rear-facing camera
    Environment,
}

impl FacingMode {
    /// Platform name of the facing mode, also used as the id of probed cameras.
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }

    /// Friendly label used when the platform does not provide one.
    pub fn default_label(&self) -> &'static str {
        match self {
            FacingMode::User => "Front Camera",
            FacingMode::Environment => "Back Camera",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An available camera input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDescriptor {
    /// Platform device id (or the facing mode name for probed cameras)
    pub id: String,
    /// Human-readable label. Empty until camera permission has been granted.
    pub label: String,
    /// Facing mode, when known
    pub facing: Option<FacingMode>,
}

impl CameraDescriptor {
    /// Descriptor for a camera discovered by probing a facing mode.
    pub fn probed(facing: FacingMode) -> Self {
        Self {
            id: facing.as_str().to_string(),
            label: facing.default_label().to_string(),
            facing: Some(facing),
        }
    }

    /// Whether this descriptor came from a facing-mode probe rather than
    /// a real device id.
    pub fn is_probed(&self) -> bool {
        self.facing.map(|f| f.as_str() == self.id).unwrap_or(false)
    }

    /// How to ask the platform for this camera.
    pub fn selector(&self) -> CameraSelector {
        match self.facing {
            Some(facing) if self.is_probed() => CameraSelector::Facing(facing),
            _ if !self.id.is_empty() => CameraSelector::DeviceId(self.id.clone()),
            _ => CameraSelector::Any,
        }
    }
}

impl fmt::Display for CameraDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.facing {
            Some(facing) => write!(f, "{} ({}, {})", self.label, self.id, facing),
            None => write!(f, "{} ({})", self.label, self.id),
        }
    }
}

/// Camera resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Resolution used when probing for permission (640x480)
    pub const PROBE: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// Full HD (1920x1080), the capture target and the upper bound
    pub const FULL_HD: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero (no picture yet).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An ideal value with an upper bound, as understood by camera platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub ideal: u32,
    pub max: u32,
}

impl Range {
    /// The value a source should aim for given its own capability.
    pub fn resolve(&self, capability: u32) -> u32 {
        self.ideal.min(self.max).min(capability)
    }
}

/// Which camera a stream request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSelector {
    /// Let the platform pick
    Any,
    /// A camera with the given orientation
    Facing(FacingMode),
    /// Exactly this device
    DeviceId(String),
}

/// Constraints passed to the platform when opening a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub width: Range,
    pub height: Range,
    pub frame_rate: Range,
    pub selector: CameraSelector,
}

impl StreamConstraints {
    const FRAME_RATE: Range = Range { ideal: 30, max: 60 };

    /// Lightweight request used to trigger the permission prompt.
    pub fn probe(selector: CameraSelector) -> Self {
        Self {
            width: Range {
                ideal: Resolution::PROBE.width,
                max: Resolution::FULL_HD.width,
            },
            height: Range {
                ideal: Resolution::PROBE.height,
                max: Resolution::FULL_HD.height,
            },
            frame_rate: Self::FRAME_RATE,
            selector,
        }
    }

    /// Request used when starting a capture session.
    pub fn capture(selector: CameraSelector) -> Self {
        Self {
            width: Range {
                ideal: Resolution::FULL_HD.width,
                max: Resolution::FULL_HD.width,
            },
            height: Range {
                ideal: Resolution::FULL_HD.height,
                max: Resolution::FULL_HD.height,
            },
            frame_rate: Self::FRAME_RATE,
            selector,
        }
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }

    /// Native resolution of the frame.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Whether the buffer length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize * self.bytes_per_pixel()
    }
}

/// Errors reported by the camera platform.
///
/// None of these are retryable without user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The user or the OS refused camera access
    PermissionDenied,
    /// No camera matches the request
    DeviceNotFound(String),
    /// The platform cannot capture video at all, or not in this format
    DeviceUnsupported(String),
    /// The camera is held by another application or stream
    DeviceBusy(String),
    /// The stream stopped delivering frames
    ReadFailed(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(
                f,
                "Camera permission denied. Grant camera access in your system settings"
            ),
            CameraError::DeviceNotFound(device) => write!(f, "Camera not found: {}", device),
            CameraError::DeviceUnsupported(msg) => {
                write!(f, "Camera capture is not supported: {}", msg)
            }
            CameraError::DeviceBusy(device) => write!(
                f,
                "Camera {} is being used by another application",
                device
            ),
            CameraError::ReadFailed(msg) => write!(f, "Failed to read camera frame: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}
