//! Common types and utilities shared across the vegetation timelapse crates.

pub mod band;
pub mod bbox;
pub mod error;
pub mod query;
pub mod scene;
pub mod time;

pub use band::Band;
pub use bbox::BoundingBox;
pub use error::{PipelineError, PipelineResult};
pub use query::{Query, DEFAULT_CLOUD_COVER_MAX, POINT_BUFFER_DEG};
pub use scene::{Scene, SignedHref};
pub use time::{DateRange, DEFAULT_LOOKBACK_DAYS};
