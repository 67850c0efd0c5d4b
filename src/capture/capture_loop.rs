//! The processing loop: sample on a timer, upload through the gate.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::liveness::{Liveness, LivenessToken};
use super::sampler::{sample_period, FrameSampler, DEFAULT_JPEG_QUALITY, DEFAULT_SAMPLES_PER_SECOND};
use super::session::CaptureSession;
use crate::detect::{DetectionSnapshot, FrameUploader};

/// Timing and encoding settings for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Time between samples
    pub period: Duration,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            period: sample_period(DEFAULT_SAMPLES_PER_SECOND),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Handle to a running processing loop.
///
/// Processing can be stopped while the camera keeps running; closing the
/// session also ends the loop on its next tick.
pub struct CaptureLoop {
    ticker: Option<JoinHandle<()>>,
    uploader: FrameUploader,
    liveness: Liveness,
}

impl CaptureLoop {
    /// Start sampling `session` every `settings.period`.
    ///
    /// The first sample is taken one period after starting. Must be called
    /// from within a tokio runtime.
    pub fn start(session: &CaptureSession, uploader: FrameUploader, settings: LoopSettings) -> Self {
        let liveness = Liveness::new();
        let token = session.liveness().join(&liveness.token());
        let sampler = FrameSampler::new(session.stream_slot(), settings.jpeg_quality);

        log::info!(
            "Starting detection every {:?} on {}",
            settings.period,
            session.label()
        );
        let ticker = tokio::spawn(run_ticks(sampler, uploader.clone(), token, settings.period));

        Self {
            ticker: Some(ticker),
            uploader,
            liveness,
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn uploader(&self) -> &FrameUploader {
        &self.uploader
    }

    /// Receiver for overlay updates.
    pub fn subscribe(&self) -> watch::Receiver<DetectionSnapshot> {
        self.uploader.subscribe()
    }

    /// Stop scheduling samples and clear the overlay.
    ///
    /// An upload that is still outstanding is left to finish; its result is
    /// discarded.
    pub fn stop(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        ticker.abort();
        self.liveness.kill();
        self.uploader.clear();
        log::info!("Detection stopped");
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticks(
    sampler: FrameSampler,
    uploader: FrameUploader,
    liveness: LivenessToken,
    period: Duration,
) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if !liveness.is_alive() {
            log::debug!("Session closed, ending capture loop");
            break;
        }
        // No point encoding a frame the gate would drop
        if !uploader.gate().is_open() {
            continue;
        }

        match sampler.sample().await {
            Ok(Some(frame)) => {
                uploader.submit(frame, liveness.clone());
            }
            Ok(None) => {}
            Err(e) => log::warn!("Failed to sample frame: {}", e),
        }
    }
}
