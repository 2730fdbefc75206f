use crate::{
    config::TrackerConfig,
    detection::Detection,
    error::TrackError,
    track::TrackSnapshot,
    tracker::Tracker,
};
use std::{sync::mpsc::Receiver, time::Instant};
use tracing::{info, warn};

/*-----------------------------------------------------------------------------
FrameLoop
-----------------------------------------------------------------------------*/

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub dropped: usize,
}

/// Drives a [`Tracker`] one frame at a time, measuring `dt` with a monotonic
/// clock.
#[derive(Debug)]
pub struct FrameLoop {
    tracker: Tracker,
    last_tick: Option<Instant>,
}

impl FrameLoop {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackError> {
        Ok(Self::from_tracker(Tracker::new(config)?))
    }

    pub fn from_tracker(tracker: Tracker) -> Self {
        Self {
            tracker,
            last_tick: None,
        }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Process a frame that arrived now.
    pub fn process(
        &mut self,
        detections: &[Detection],
    ) -> Result<Vec<TrackSnapshot>, TrackError> {
        let now = Instant::now();
        let dt = match self.last_tick {
            Some(prev) => now.duration_since(prev).as_secs_f32(),
            None => self.tracker.config().initial_dt,
        };
        self.last_tick = Some(now);
        self.tracker.update(detections, dt)
    }

    /// Process a frame with an explicit interval, e.g. when replaying a log.
    pub fn process_with_dt(
        &mut self,
        detections: &[Detection],
        dt: f32,
    ) -> Result<Vec<TrackSnapshot>, TrackError> {
        self.tracker.update(detections, dt)
    }

    /// Drain frames from a single-consumer queue until every sender is gone.
    ///
    /// Frames are processed strictly in arrival order. A frame that fails is
    /// skipped and tracking resumes from the last good track set.
    pub fn run<F>(
        &mut self,
        frames: Receiver<Vec<Detection>>,
        mut sink: F,
    ) -> RunSummary
    where
        F: FnMut(&[TrackSnapshot]),
    {
        let mut summary = RunSummary::default();
        for detections in frames.iter() {
            match self.process(&detections) {
                Ok(tracks) => {
                    summary.processed += 1;
                    sink(&tracks);
                }
                Err(err) => {
                    summary.dropped += 1;
                    warn!(%err, "frame skipped");
                }
            }
        }
        info!(
            processed = summary.processed,
            dropped = summary.dropped,
            "frame source closed"
        );
        summary
    }
}
