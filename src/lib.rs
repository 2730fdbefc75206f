pub mod assignment;
pub mod config;
pub mod cost_matrix;
pub mod detection;
pub mod error;
pub mod frame_loop;
pub mod id_generator;
pub mod kalman_filter;
pub mod rect;
pub mod track;
pub mod tracker;

pub use config::{IdPolicy, TrackerConfig};
pub use detection::{Detection, RawBox};
pub use error::TrackError;
pub use frame_loop::{FrameLoop, RunSummary};
pub use rect::Rect;
pub use track::{Track, TrackSnapshot};
pub use tracker::{FrameStats, Tracker};
