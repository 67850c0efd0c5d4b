//! Frame uploader: pushes sampled frames through the gate to the service.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::backoff::{log_failure, CooldownPolicy};
use super::client::{DetectError, DetectorClient};
use super::gate::{GatePermit, UploadGate};
use super::types::DetectionSnapshot;
use crate::capture::{EncodedFrame, LivenessToken};

/// Result of [`FrameUploader::submit`].
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The gate was open; the upload runs on this task.
    Dispatched(JoinHandle<UploadOutcome>),
    /// The gate was closed; the frame was dropped.
    Dropped,
}

impl SubmitOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, SubmitOutcome::Dropped)
    }
}

/// How one upload ended.
#[derive(Debug)]
pub enum UploadOutcome {
    /// Detections replaced with the response.
    Applied { detections: usize },
    /// The response carried no detections field; nothing changed.
    Unchanged,
    /// The session went away while the request was outstanding.
    Discarded,
    /// The request failed; detections were left as they were.
    Failed(DetectError),
}

/// Sends frames to the detection service, one at a time.
///
/// Cloning yields another handle sharing the same gate and snapshot.
#[derive(Clone)]
pub struct FrameUploader {
    client: Arc<DetectorClient>,
    gate: UploadGate,
    policy: CooldownPolicy,
    snapshot: Arc<watch::Sender<DetectionSnapshot>>,
}

impl FrameUploader {
    pub fn new(client: DetectorClient, policy: CooldownPolicy) -> Self {
        let (snapshot, _) = watch::channel(DetectionSnapshot::default());
        Self {
            client: Arc::new(client),
            gate: UploadGate::new(),
            policy,
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn gate(&self) -> &UploadGate {
        &self.gate
    }

    pub fn client(&self) -> &DetectorClient {
        &self.client
    }

    /// Receiver that sees every replacement of the snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DetectionSnapshot> {
        self.snapshot.subscribe()
    }

    /// The detections currently displayed.
    pub fn current(&self) -> DetectionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Reset to no detections and zero fps.
    pub fn clear(&self) {
        self.snapshot.send_replace(DetectionSnapshot::default());
    }

    /// Upload `frame` unless another upload is outstanding or cooling down,
    /// in which case the frame is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, frame: EncodedFrame, liveness: LivenessToken) -> SubmitOutcome {
        let Some(permit) = self.gate.try_acquire() else {
            log::debug!("Upload gate closed, dropping frame");
            return SubmitOutcome::Dropped;
        };

        let uploader = self.clone();
        SubmitOutcome::Dispatched(tokio::spawn(async move {
            uploader.upload(permit, frame, liveness).await
        }))
    }

    /// Run one upload while holding `permit`.
    ///
    /// The permit is released when this returns, whatever the outcome; a
    /// timeout or server error leaves it holding the gate for the cool-down.
    pub async fn upload(
        &self,
        mut permit: GatePermit,
        frame: EncodedFrame,
        liveness: LivenessToken,
    ) -> UploadOutcome {
        log::debug!(
            "Sending {} frame to detector ({} bytes)",
            frame.resolution,
            frame.bytes.len()
        );
        let result = self.client.detect(frame.bytes).await;

        if !liveness.is_alive() {
            log::debug!("Capture stopped while request was outstanding, discarding result");
            return UploadOutcome::Discarded;
        }

        match result {
            Ok(response) => match response.detections {
                Some(detections) => {
                    let count = detections.len();
                    log::debug!("Detector returned {} objects at {:.1} fps", count, response.fps);
                    self.snapshot.send_replace(DetectionSnapshot {
                        detections,
                        fps: response.fps,
                    });
                    UploadOutcome::Applied { detections: count }
                }
                None => UploadOutcome::Unchanged,
            },
            Err(error) => {
                log_failure(&error);
                if let Some(cooldown) = self.policy.cooldown_for(&error) {
                    log::info!("Pausing uploads for {:?}", cooldown);
                    permit.hold_closed_for(cooldown);
                }
                UploadOutcome::Failed(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Liveness;
    use crate::camera::Resolution;
    use std::time::Instant;

    fn frame() -> EncodedFrame {
        EncodedFrame {
            bytes: b"jpeg".to_vec(),
            resolution: Resolution::new(4, 4),
            captured_at: Instant::now(),
        }
    }

    #[tokio::test]
    async fn test_submit_drops_when_gate_closed() {
        let client = DetectorClient::with_base_url("http://127.0.0.1:9").unwrap();
        let uploader = FrameUploader::new(client, CooldownPolicy::default());
        let liveness = Liveness::new();

        let _held = uploader.gate().try_acquire().unwrap();
        let outcome = uploader.submit(frame(), liveness.token());
        assert!(outcome.is_dropped());
    }

    #[tokio::test]
    async fn test_clear_resets_snapshot() {
        let client = DetectorClient::with_base_url("http://127.0.0.1:9").unwrap();
        let uploader = FrameUploader::new(client, CooldownPolicy::default());
        let mut rx = uploader.subscribe();
        uploader.clear();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), DetectionSnapshot::default());
        assert_eq!(uploader.current(), DetectionSnapshot::default());
    }
}
