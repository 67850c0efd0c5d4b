//! Camera platform that serves a single decoded image as a live stream.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::imageops::FilterType;
use image::{ImageError, RgbImage};

use super::device::{CameraBackend, CameraStream};
use super::types::{
    CameraDescriptor, CameraError, CameraSelector, Frame, FrameFormat, Resolution,
    StreamConstraints,
};

/// Camera platform with one input whose picture never changes.
#[derive(Debug, Clone)]
pub struct StillImageBackend {
    descriptor: CameraDescriptor,
    image: Arc<RgbImage>,
}

impl StillImageBackend {
    /// Decode an image file (JPEG or PNG).
    ///
    /// # Errors
    /// * `CameraError::DeviceNotFound` - If the file does not exist
    /// * `CameraError::DeviceUnsupported` - If the file cannot be decoded
    pub fn open_file(path: &Path) -> Result<Self, CameraError> {
        let image = image::open(path).map_err(|e| match e {
            ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                CameraError::DeviceNotFound(path.display().to_string())
            }
            other => CameraError::DeviceUnsupported(format!("{}: {}", path.display(), other)),
        })?;

        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::from_image(
            path.display().to_string(),
            label,
            image.into_rgb8(),
        ))
    }

    /// Serve an in-memory image.
    pub fn from_image(id: String, label: String, image: RgbImage) -> Self {
        Self {
            descriptor: CameraDescriptor {
                id,
                label,
                facing: None,
            },
            image: Arc::new(image),
        }
    }
}

impl CameraBackend for StillImageBackend {
    fn video_inputs(&self) -> Result<Vec<CameraDescriptor>, CameraError> {
        Ok(vec![self.descriptor.clone()])
    }

    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn CameraStream>, CameraError> {
        match &constraints.selector {
            CameraSelector::Any => {}
            CameraSelector::DeviceId(id) if *id == self.descriptor.id => {}
            CameraSelector::DeviceId(id) => return Err(CameraError::DeviceNotFound(id.clone())),
            CameraSelector::Facing(facing) => {
                return Err(CameraError::DeviceNotFound(format!("{} camera", facing)))
            }
        }

        let (width, height) = self.image.dimensions();
        let max_w = constraints.width.max.max(1);
        let max_h = constraints.height.max.max(1);
        let image = if width > max_w || height > max_h {
            // Fit inside the bounds, keeping the aspect ratio
            let scale = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
            let w = ((width as f64 * scale).round() as u32).max(1);
            let h = ((height as f64 * scale).round() as u32).max(1);
            Arc::new(image::imageops::resize(
                self.image.as_ref(),
                w,
                h,
                FilterType::Triangle,
            ))
        } else {
            Arc::clone(&self.image)
        };

        Ok(Box::new(StillStream {
            device_id: self.descriptor.id.clone(),
            image,
            active: true,
        }))
    }
}

struct StillStream {
    device_id: String,
    image: Arc<RgbImage>,
    active: bool,
}

impl CameraStream for StillStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn resolution(&self) -> Resolution {
        let (width, height) = self.image.dimensions();
        Resolution::new(width, height)
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.active {
            return Err(CameraError::ReadFailed(format!(
                "{} has been stopped",
                self.device_id
            )));
        }
        let (width, height) = self.image.dimensions();
        Ok(Frame {
            data: self.image.as_raw().clone(),
            width,
            height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        })
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
