//! Wire types for the detection service.

use serde::{Deserialize, Serialize};

/// One detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// `[x0, y0, x1, y1]` in source-frame pixel coordinates
    pub bbox: [f32; 4],
    pub class_name: String,
    /// Score in `[0, 1]`
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<u32>,
}

impl Detection {
    /// Confidence as a whole percentage.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// Body of a successful `POST /api/detect` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectResponse {
    /// Absent when the service has nothing to report for this frame.
    #[serde(default)]
    pub detections: Option<Vec<Detection>>,
    /// Service-side processing rate
    #[serde(default)]
    pub fps: f32,
    /// Seconds spent on inference
    #[serde(default)]
    pub processing_time: Option<f64>,
    /// Unix timestamp of the response
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// What the overlay currently displays.
///
/// Replaced as a whole on every successful response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSnapshot {
    pub detections: Vec<Detection>,
    pub fps: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_deserializes_service_shape() {
        let json = r#"{"class_id": 0, "class_name": "person", "confidence": 0.87,
                       "bbox": [10.5, 20.0, 110.0, 220.25]}"#;
        let detection: Detection = parse(json);
        assert_eq!(detection.class_name, "person");
        assert_eq!(detection.class_id, Some(0));
        assert_eq!(detection.bbox, [10.5, 20.0, 110.0, 220.25]);
        assert_eq!(detection.confidence_percent(), 87);
    }

    #[test]
    fn test_response_without_detections_field() {
        let response: DetectResponse = parse(r#"{"fps": 4.0}"#);
        assert!(response.detections.is_none());
        assert_eq!(response.fps, 4.0);
    }

    #[test]
    fn test_confidence_percent_rounds() {
        let detection = Detection {
            bbox: [0.0; 4],
            class_name: "cup".to_string(),
            confidence: 0.556,
            class_id: None,
        };
        assert_eq!(detection.confidence_percent(), 56);
    }

    fn parse<T: serde::de::DeserializeOwned>(json: &str) -> T {
        serde_json::from_str(json).unwrap()
    }
}
