//! End-to-end tests for camera discovery and capture sessions.
//!
//! These tests verify:
//! - Cameras are listed after the permission probe
//! - Facing modes are probed when the platform hides labels
//! - Switching cameras never holds two streams at once
//! - Still images can stand in for a live camera

use std::sync::Arc;

use image::{Rgb, RgbImage};

use stand_capture::camera::{
    display_label, list_devices, CameraBackend, CameraError, FacingMode, Resolution,
    StillImageBackend, TestPatternBackend,
};
use stand_capture::capture::{CaptureSession, FrameSampler, SessionError};

fn pattern_session(backend: &Arc<TestPatternBackend>, index: usize) -> CaptureSession {
    let cameras = list_devices(backend.as_ref()).unwrap();
    let shared: Arc<dyn CameraBackend> = backend.clone();
    CaptureSession::open(shared, cameras, index).unwrap()
}

// === Device Listing Tests ===

#[test]
fn test_list_devices_reports_labeled_inputs() {
    let backend = TestPatternBackend::new();
    let cameras = list_devices(&backend).unwrap();

    assert_eq!(cameras.len(), 2);
    assert_eq!(cameras[0].id, "pattern-front");
    assert_eq!(display_label(cameras.first(), 0), "Front Camera");
    assert_eq!(display_label(cameras.get(1), 1), "Back Camera");
    // The permission probe must not keep the camera
    assert_eq!(backend.active_streams(), 0);
}

#[test]
fn test_list_devices_probes_facing_modes_without_labels() {
    let backend = TestPatternBackend::new().without_labels();
    let cameras = list_devices(&backend).unwrap();

    assert_eq!(cameras.len(), 2);
    assert_eq!(cameras[0].id, "user");
    assert_eq!(cameras[0].facing, Some(FacingMode::User));
    assert_eq!(cameras[0].label, "Front Camera");
    assert_eq!(cameras[1].id, "environment");
    assert_eq!(cameras[1].label, "Back Camera");
    assert!(cameras.iter().all(|c| c.is_probed()));
    assert_eq!(backend.active_streams(), 0);
}

#[test]
fn test_list_devices_permission_denied() {
    let backend = TestPatternBackend::new().permission_denied();
    let result = list_devices(&backend);
    assert!(matches!(result, Err(CameraError::PermissionDenied)));
}

// === Capture Session Tests ===

#[test]
fn test_session_opens_requested_camera() {
    let backend = Arc::new(TestPatternBackend::new());
    let session = pattern_session(&backend, 1);

    assert_eq!(session.active_index(), 1);
    assert_eq!(session.facing(), Some(FacingMode::Environment));
    assert_eq!(session.label(), "Back Camera");
    assert_eq!(session.native_resolution(), Some(Resolution::FULL_HD));
    assert!(!session.is_mirrored());
    assert_eq!(backend.active_streams(), 1);

    session.close();
    assert_eq!(backend.active_streams(), 0);
}

#[test]
fn test_session_rejects_out_of_range_index() {
    let backend = Arc::new(TestPatternBackend::new());
    let cameras = list_devices(backend.as_ref()).unwrap();
    let result = CaptureSession::open(backend, cameras, 5);
    assert!(matches!(
        result,
        Err(SessionError::InvalidCamera {
            index: 5,
            available: 2
        })
    ));
}

#[test]
fn test_session_with_no_cameras() {
    let backend = Arc::new(TestPatternBackend::new());
    let result = CaptureSession::open(backend, Vec::new(), 0);
    assert!(matches!(result, Err(SessionError::NoCameras)));
}

#[test]
fn test_switching_never_holds_two_streams() {
    let backend = Arc::new(TestPatternBackend::new());
    let mut session = pattern_session(&backend, 0);
    assert!(session.is_mirrored());

    for round in 0..6 {
        assert!(session.switch_camera().unwrap());
        assert_eq!(backend.active_streams(), 1, "round {}", round);
    }
    // Six switches over two cameras lands back on the first
    assert_eq!(session.active_index(), 0);
    assert_eq!(session.native_resolution(), Some(Resolution::new(1280, 720)));
}

#[test]
fn test_switching_with_probed_cameras() {
    let backend = Arc::new(TestPatternBackend::new().without_labels());
    let mut session = pattern_session(&backend, 0);
    assert_eq!(session.facing(), Some(FacingMode::User));

    session.switch_camera().unwrap();
    assert_eq!(session.facing(), Some(FacingMode::Environment));
    assert_eq!(session.label(), "Back Camera");
    assert_eq!(backend.active_streams(), 1);
}

// === Still Image Tests ===

#[test]
fn test_still_image_file_as_camera() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desk.png");
    RgbImage::from_pixel(80, 60, Rgb([10, 200, 30]))
        .save(&path)
        .unwrap();

    let backend = Arc::new(StillImageBackend::open_file(&path).unwrap());
    let cameras = list_devices(backend.as_ref()).unwrap();
    assert_eq!(cameras.len(), 1);
    assert_eq!(cameras[0].label, "desk.png");

    let mut session = CaptureSession::open(backend, cameras, 0).unwrap();
    assert_eq!(session.native_resolution(), Some(Resolution::new(80, 60)));
    assert!(!session.switch_camera().unwrap());
}

#[test]
fn test_still_image_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = StillImageBackend::open_file(&dir.path().join("missing.png"));
    assert!(matches!(result, Err(CameraError::DeviceNotFound(_))));
}

#[test]
fn test_still_image_undecodable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let result = StillImageBackend::open_file(&path);
    assert!(matches!(result, Err(CameraError::DeviceUnsupported(_))));
}

#[tokio::test]
async fn test_sampler_encodes_session_frames() {
    let backend = Arc::new(StillImageBackend::from_image(
        "still".to_string(),
        "Still".to_string(),
        RgbImage::from_pixel(32, 24, Rgb([255, 0, 0])),
    ));
    let cameras = list_devices(backend.as_ref()).unwrap();
    let session = CaptureSession::open(backend, cameras, 0).unwrap();

    let sampler = FrameSampler::new(session.stream_slot(), 80);
    let frame = sampler.sample().await.unwrap().unwrap();

    assert_eq!(frame.resolution, Resolution::new(32, 24));
    // JPEG SOI marker
    assert_eq!(&frame.bytes[..2], &[0xFF, 0xD8]);

    let decoded = image::load_from_memory(&frame.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 24));
}
