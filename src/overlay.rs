//! Overlay layout: maps detections onto the displayed video.
//!
//! Detections arrive in the source frame's native pixel space. The video is
//! drawn at whatever size the display gives it, so every render pass scales
//! boxes by `rendered / native` independently on each axis.

use std::fmt;

use crate::camera::Resolution;
use crate::detect::{Detection, DetectionSnapshot};

/// Rendered size of the video surface, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

impl DisplaySize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl From<Resolution> for DisplaySize {
    fn from(res: Resolution) -> Self {
        Self::new(res.width as f32, res.height as f32)
    }
}

/// Native-to-rendered coordinate mapping for one render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
    scale_x: f32,
    scale_y: f32,
    /// Rendered width when the picture is flipped horizontally
    mirror_width: Option<f32>,
}

impl OverlayTransform {
    /// Returns `None` if the native resolution is empty.
    pub fn new(native: Resolution, rendered: DisplaySize) -> Option<Self> {
        if native.is_empty() {
            return None;
        }
        Some(Self {
            scale_x: rendered.width / native.width as f32,
            scale_y: rendered.height / native.height as f32,
            mirror_width: None,
        })
    }

    /// Flip x for a picture displayed mirrored (selfie view).
    pub fn mirrored(mut self, rendered: DisplaySize) -> Self {
        self.mirror_width = Some(rendered.width);
        self
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    /// Map `[x0, y0, x1, y1]` into rendered pixels.
    pub fn apply(&self, bbox: [f32; 4]) -> [f32; 4] {
        let [x0, y0, x1, y1] = bbox;
        let (x0, x1) = (x0 * self.scale_x, x1 * self.scale_x);
        let (x0, x1) = match self.mirror_width {
            Some(w) => (w - x1, w - x0),
            None => (x0, x1),
        };
        [x0, y0 * self.scale_y, x1, y1 * self.scale_y]
    }
}

/// A box ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
}

impl fmt::Display for OverlayBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at ({:.0}, {:.0}) {:.0}x{:.0}",
            self.label, self.left, self.top, self.width, self.height
        )
    }
}

/// `"person (87%)"`
pub fn detection_label(detection: &Detection) -> String {
    format!(
        "{} ({}%)",
        detection.class_name,
        detection.confidence_percent()
    )
}

/// Lay out every detection for one render pass.
///
/// `native` is the stream's resolution and `rendered` the surface size;
/// either being `None` means the video is not mounted and nothing is drawn.
pub fn layout(
    detections: &[Detection],
    native: Option<Resolution>,
    rendered: Option<DisplaySize>,
    mirror: bool,
) -> Vec<OverlayBox> {
    let (Some(native), Some(rendered)) = (native, rendered) else {
        return Vec::new();
    };
    let Some(mut transform) = OverlayTransform::new(native, rendered) else {
        return Vec::new();
    };
    if mirror {
        transform = transform.mirrored(rendered);
    }

    detections
        .iter()
        .map(|d| {
            let [x0, y0, x1, y1] = transform.apply(d.bbox);
            OverlayBox {
                left: x0,
                top: y0,
                width: x1 - x0,
                height: y1 - y0,
                label: detection_label(d),
            }
        })
        .collect()
}

/// One-line summary: camera, service fps and object count.
pub fn status_line(camera_label: &str, snapshot: &DetectionSnapshot) -> String {
    let mut line = camera_label.to_string();
    if snapshot.fps > 0.0 {
        line.push_str(&format!(" | FPS: {}", snapshot.fps.round() as u32));
    }
    if !snapshot.detections.is_empty() {
        line.push_str(&format!(
            " | {} objects detected",
            snapshot.detections.len()
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(bbox: [f32; 4]) -> Detection {
        Detection {
            bbox,
            class_name: "person".to_string(),
            confidence: 0.87,
            class_id: Some(0),
        }
    }

    #[test]
    fn test_half_size_scaling() {
        let transform =
            OverlayTransform::new(Resolution::FULL_HD, DisplaySize::new(960.0, 540.0)).unwrap();
        assert_eq!(
            transform.apply([100.0, 100.0, 500.0, 400.0]),
            [50.0, 50.0, 250.0, 200.0]
        );
    }

    #[test]
    fn test_independent_axes() {
        let transform =
            OverlayTransform::new(Resolution::new(640, 480), DisplaySize::new(1280.0, 240.0))
                .unwrap();
        assert_eq!(transform.scale_x(), 2.0);
        assert_eq!(transform.scale_y(), 0.5);
        assert_eq!(
            transform.apply([10.0, 10.0, 20.0, 20.0]),
            [20.0, 5.0, 40.0, 10.0]
        );
    }

    #[test]
    fn test_mirrored_flips_x() {
        let rendered = DisplaySize::new(100.0, 100.0);
        let transform = OverlayTransform::new(Resolution::new(100, 100), rendered)
            .unwrap()
            .mirrored(rendered);
        assert_eq!(
            transform.apply([10.0, 20.0, 30.0, 40.0]),
            [70.0, 20.0, 90.0, 40.0]
        );
    }

    #[test]
    fn test_empty_native_has_no_transform() {
        assert!(OverlayTransform::new(Resolution::new(0, 480), DisplaySize::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_layout_boxes() {
        let boxes = layout(
            &[detection([100.0, 100.0, 500.0, 400.0])],
            Some(Resolution::FULL_HD),
            Some(DisplaySize::new(960.0, 540.0)),
            false,
        );
        assert_eq!(
            boxes,
            vec![OverlayBox {
                left: 50.0,
                top: 50.0,
                width: 200.0,
                height: 150.0,
                label: "person (87%)".to_string(),
            }]
        );
    }

    #[test]
    fn test_layout_skips_when_unmounted() {
        let detections = [detection([0.0, 0.0, 1.0, 1.0])];
        assert!(layout(&detections, None, Some(DisplaySize::new(1.0, 1.0)), false).is_empty());
        assert!(layout(&detections, Some(Resolution::FULL_HD), None, false).is_empty());
    }

    #[test]
    fn test_status_line() {
        let empty = DetectionSnapshot::default();
        assert_eq!(status_line("Front Camera", &empty), "Front Camera");

        let snapshot = DetectionSnapshot {
            detections: vec![detection([0.0; 4]), detection([0.0; 4])],
            fps: 11.6,
        };
        assert_eq!(
            status_line("Back Camera", &snapshot),
            "Back Camera | FPS: 12 | 2 objects detected"
        );
    }

    #[test]
    fn test_overlay_box_display() {
        let b = OverlayBox {
            left: 1.0,
            top: 2.0,
            width: 3.0,
            height: 4.0,
            label: "cup (50%)".to_string(),
        };
        assert_eq!(b.to_string(), "cup (50%) at (1, 2) 3x4");
    }
}
