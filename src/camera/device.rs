//! Camera platform seam and device enumeration.

use super::types::{
    CameraDescriptor, CameraError, CameraSelector, FacingMode, Frame, Resolution,
    StreamConstraints,
};

/// A live stream holding a claim on camera hardware.
///
/// The claim is released by `stop()`; implementations must also release it
/// when dropped.
pub trait CameraStream: Send {
    /// Id of the device backing this stream.
    fn device_id(&self) -> &str;

    /// Native resolution of the frames this stream produces.
    fn resolution(&self) -> Resolution;

    /// Read the current frame.
    fn read_frame(&mut self) -> Result<Frame, CameraError>;

    /// Release the hardware. Calling this more than once is harmless.
    fn stop(&mut self);

    /// Whether the stream still holds the hardware.
    fn is_active(&self) -> bool;
}

/// A camera platform: something that can list inputs and open streams.
pub trait CameraBackend: Send + Sync {
    /// List video inputs. Labels may be empty before permission is granted.
    fn video_inputs(&self) -> Result<Vec<CameraDescriptor>, CameraError>;

    /// Open a stream matching the constraints.
    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// List the cameras a session can be started on.
///
/// Opens and immediately stops a probe stream first so the platform grants
/// permission and exposes device labels. If the platform still reports no
/// labeled inputs, each facing mode is probed in turn and the ones that open
/// are returned instead.
pub fn list_devices(backend: &dyn CameraBackend) -> Result<Vec<CameraDescriptor>, CameraError> {
    let mut probe = backend.open(&StreamConstraints::probe(CameraSelector::Any))?;
    log::debug!("Camera permission granted by {}", probe.device_id());
    probe.stop();

    let inputs = backend.video_inputs()?;
    log::debug!("Video inputs found: {:?}", inputs);

    if inputs.is_empty() || inputs.iter().all(|d| d.label.is_empty()) {
        log::info!("No labeled cameras reported, probing facing modes");
        let probed = probe_facing_modes(backend);
        if !probed.is_empty() {
            return Ok(probed);
        }
    }

    Ok(inputs)
}

fn probe_facing_modes(backend: &dyn CameraBackend) -> Vec<CameraDescriptor> {
    [FacingMode::User, FacingMode::Environment]
        .into_iter()
        .filter_map(|facing| {
            match backend.open(&StreamConstraints::probe(CameraSelector::Facing(facing))) {
                Ok(mut stream) => {
                    stream.stop();
                    Some(CameraDescriptor::probed(facing))
                }
                Err(e) => {
                    log::debug!("{} camera not available: {}", facing.default_label(), e);
                    None
                }
            }
        })
        .collect()
}

/// Label shown to the user for a camera.
pub fn display_label(camera: Option<&CameraDescriptor>, index: usize) -> String {
    let Some(camera) = camera.filter(|c| !c.label.is_empty()) else {
        return format!("Camera {}", index + 1);
    };

    let lower = camera.label.to_lowercase();
    if lower.contains("front") || lower.contains("user") {
        FacingMode::User.default_label().to_string()
    } else if lower.contains("back") || lower.contains("environment") {
        FacingMode::Environment.default_label().to_string()
    } else {
        camera.label.clone()
    }
}
