//! Frame-to-frame association and track lifecycle.
//!
//! [`Tracker`] owns the authoritative track set. Each call to
//! [`Tracker::update`] matches the previous frame's tracks against the new
//! detections, then continues, coasts, drops or creates tracks and advances
//! every surviving filter by one step.

use crate::{
    assignment,
    config::TrackerConfig,
    cost_matrix::CostMatrix,
    detection::Detection,
    error::TrackError,
    id_generator::IdGenerator,
    rect::Rect,
    track::{Track, TrackSnapshot},
};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/*-----------------------------------------------------------------------------
Tracker
-----------------------------------------------------------------------------*/

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub matched: usize,
    pub coasted: usize,
    pub dropped: usize,
    pub born: usize,
}

#[derive(Debug)]
pub struct Tracker {
    config: TrackerConfig,
    ids: IdGenerator,

    frame_count: usize,
    initialized: bool,
    last_stats: FrameStats,

    previous: Vec<Track>,
    current: Vec<Track>,
}

impl Default for Tracker {
    fn default() -> Self {
        let config = TrackerConfig::default();
        let ids = IdGenerator::new(config.id_policy, config.id_seed);
        Self::with_parts(config, ids)
    }
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackError> {
        config.validate()?;
        let ids = IdGenerator::new(config.id_policy, config.id_seed);
        Ok(Self::with_parts(config, ids))
    }

    fn with_parts(config: TrackerConfig, ids: IdGenerator) -> Self {
        Self {
            config,
            ids,
            frame_count: 0,
            initialized: false,
            last_stats: FrameStats::default(),
            previous: Vec::new(),
            current: Vec::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Tracks as of the last successfully processed frame.
    pub fn tracks(&self) -> &[Track] {
        &self.previous
    }

    pub fn track_count(&self) -> usize {
        self.previous.len()
    }

    /// Frames committed so far; dropped frames are not counted.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// `true` once a frame with at least one detection has been seen.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Forget every track; the next non-empty frame starts over.
    pub fn reset(&mut self) {
        self.previous.clear();
        self.current.clear();
        self.initialized = false;
        self.last_stats = FrameStats::default();
    }

    /// Process one frame of detections taken `dt` seconds after the last one.
    ///
    /// On error the frame is discarded and the previous track set is kept
    /// unchanged.
    pub fn update(
        &mut self,
        detections: &[Detection],
        dt: f32,
    ) -> Result<Vec<TrackSnapshot>, TrackError> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(TrackError::FilterError(format!(
                "frame interval must be finite and non-negative, got {}",
                dt
            )));
        }
        self.current.clear();

        let stats = if self.initialized {
            self.associate(detections)
        } else {
            self.spawn_all(detections)
        };
        let stats = match stats {
            Ok(stats) => stats,
            Err(err) => {
                warn!(
                    frame = self.frame_count + 1,
                    %err,
                    "dropping frame, keeping {} tracks",
                    self.previous.len()
                );
                self.current.clear();
                return Err(err);
            }
        };

        for track in self.current.iter_mut() {
            track.predict(dt);
        }

        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.clear();
        self.frame_count += 1;
        if !self.previous.is_empty() {
            self.initialized = true;
        }
        self.last_stats = stats;

        debug!(
            frame = self.frame_count,
            detections = detections.len(),
            tracks = self.previous.len(),
            matched = stats.matched,
            coasted = stats.coasted,
            dropped = stats.dropped,
            born = stats.born,
            "frame processed"
        );

        Ok(self.previous.iter().map(Track::snapshot).collect())
    }

    /// First frame: every detection becomes a track.
    fn spawn_all(
        &mut self,
        detections: &[Detection],
    ) -> Result<FrameStats, TrackError> {
        let mut live = HashSet::with_capacity(detections.len());
        for detection in detections {
            let id = self.ids.next_id(&live)?;
            live.insert(id);
            self.current.push(Track::new(id, detection, &self.config));
        }
        Ok(FrameStats {
            born: detections.len(),
            ..FrameStats::default()
        })
    }

    fn associate(
        &mut self,
        detections: &[Detection],
    ) -> Result<FrameStats, TrackError> {
        let previous = &self.previous;
        let current = &mut self.current;
        let ids = &mut self.ids;
        let config = &self.config;

        let prev_rects: Vec<Rect<f32>> =
            previous.iter().map(|t| *t.rect()).collect();
        let det_rects: Vec<Rect<f32>> =
            detections.iter().map(|d| *d.rect()).collect();
        let cost = CostMatrix::build(
            &prev_rects,
            &det_rects,
            config.iou_scale,
            config.padding_cost,
        );
        let perm = assignment::solve(&cost)?;
        trace!(
            ?perm,
            tracks = cost.real_rows(),
            detections = cost.real_cols(),
            dim = cost.dim(),
            "assignment"
        );

        let min_cost =
            (config.min_iou as f64 * config.iou_scale as f64).round() as i64;
        let mut live: HashSet<u64> = previous.iter().map(Track::id).collect();
        let mut stats = FrameStats::default();
        let mut unmatched = Vec::new();

        for (row, &col) in perm.iter().enumerate() {
            match (cost.is_real_row(row), cost.is_real_col(col)) {
                (true, true) if cost.get(row, col) >= min_cost => {
                    let mut track = previous[row].clone();
                    track.update(&detections[col])?;
                    current.push(track);
                    stats.matched += 1;
                }
                (true, true) => {
                    // overlap too weak: a miss for the track, a new detection
                    Self::coast_or_drop(
                        &previous[row],
                        current,
                        config,
                        &mut stats,
                    );
                    unmatched.push(col);
                }
                (true, false) => {
                    Self::coast_or_drop(
                        &previous[row],
                        current,
                        config,
                        &mut stats,
                    );
                }
                (false, true) => unmatched.push(col),
                (false, false) => {
                    return Err(TrackError::AssignmentError(format!(
                        "padding row {} paired with padding column {}",
                        row, col
                    )));
                }
            }
        }

        for col in unmatched {
            let id = ids.next_id(&live)?;
            live.insert(id);
            trace!(id, detection = col, "new track");
            current.push(Track::new(id, &detections[col], config));
            stats.born += 1;
        }

        Ok(stats)
    }

    fn coast_or_drop(
        track: &Track,
        current: &mut Vec<Track>,
        config: &TrackerConfig,
        stats: &mut FrameStats,
    ) {
        if track.miss_count() < config.max_misses {
            let mut track = track.clone();
            track.mark_missed();
            current.push(track);
            stats.coasted += 1;
        } else {
            trace!(
                id = track.id(),
                misses = track.miss_count(),
                "track dropped"
            );
            stats.dropped += 1;
        }
    }
}
