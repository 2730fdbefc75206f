use crate::{
    config::TrackerConfig,
    detection::Detection,
    error::TrackError,
    kalman_filter::{KalmanFilter, Measurement, StateMean},
    rect::Rect,
};
use serde::Serialize;
use std::fmt::Debug;

/*----------------------------------------------------------------------------
Track struct
----------------------------------------------------------------------------*/

impl Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Track {{ id: {}, miss_count: {}, age: {}, hits: {}, state: {:?}, \
             rect: {:?} }}",
            self.id,
            self.miss_count,
            self.age,
            self.hits,
            self.state.as_slice(),
            self.rect.get_xyxy()
        )
    }
}

#[derive(Clone)]
pub struct Track {
    id: u64,
    miss_count: usize,
    age: usize,
    hits: usize,
    rect: Rect<f32>,
    state: StateMean,
    measurement: Measurement,
    filter: KalmanFilter,
}

impl Track {
    /// Start a new identity at the detection's box, at rest.
    pub fn new(id: u64, detection: &Detection, config: &TrackerConfig) -> Self {
        let rect = *detection.rect();
        let measurement = rect.get_cxcywh();
        let state = StateMean::from([
            measurement[0],
            measurement[1],
            0.0,
            0.0,
            measurement[2],
            measurement[3],
        ]);
        let filter = KalmanFilter::new(
            state,
            &config.process_noise,
            config.measurement_noise,
            config.initial_covariance,
        );
        Self {
            id,
            miss_count: 0,
            age: 0,
            hits: 1,
            rect,
            state,
            measurement,
            filter,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn miss_count(&self) -> usize {
        self.miss_count
    }

    /// Frames since the track was created.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Frames in which the track was associated with a detection.
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn rect(&self) -> &Rect<f32> {
        &self.rect
    }

    pub fn state(&self) -> &StateMean {
        &self.state
    }

    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    pub fn center(&self) -> (f32, f32) {
        (self.state[0], self.state[1])
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.state[2], self.state[3])
    }

    pub fn size(&self) -> (f32, f32) {
        (self.state[4], self.state[5])
    }

    /// Fold a matched detection into the filter.
    pub(crate) fn update(
        &mut self,
        detection: &Detection,
    ) -> Result<(), TrackError> {
        self.measurement = detection.rect().get_cxcywh();
        self.state = self.filter.correct(&self.measurement)?;
        self.miss_count = 0;
        self.hits += 1;
        Ok(())
    }

    /// Coast through a frame without a detection.
    pub(crate) fn mark_missed(&mut self) {
        self.miss_count += 1;
    }

    /// Advance the filter by `dt` and refresh the displayed box.
    pub(crate) fn predict(&mut self, dt: f32) {
        self.filter.set_dt(dt);
        self.state = self.filter.predict();
        self.age += 1;
        self.update_rect();
    }

    fn update_rect(&mut self) {
        let (w, h) = self.size();
        self.rect = Rect::from_center(self.state[0], self.state[1], w, h);
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            id: self.id,
            center: self.center(),
            width: self.state[4],
            height: self.state[5],
            velocity: self.velocity(),
            rect: self.rect.get_xyxy(),
            miss_count: self.miss_count,
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// What a consumer sees of a track after a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub id: u64,
    pub center: (f32, f32),
    pub width: f32,
    pub height: f32,
    pub velocity: (f32, f32),
    /// `[x1, y1, x2, y2]` of the predicted box.
    pub rect: [f32; 4],
    pub miss_count: usize,
}
