//! # people-counter
//!
//! Counts people in a live camera feed without double-counting them.
//!
//! An external detector reports boxes per frame; the counter keeps people
//! above a confidence threshold, associates them with recently seen
//! identities by bounding-box overlap (IoU) and a time-to-live, and keeps a
//! running tally of how many distinct people have appeared.
//!
//! ## Features
//!
//! - IoU tracker with first-match or optimal (Hungarian) association
//! - Throttled, cancellable counting session over pluggable capture,
//!   detector, renderer and reporter collaborators
//! - `tracing`-backed and in-memory reporters
//!
//! ## Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use people_counter::{Detection, Tracker, TrackerConfig};
//!
//! let mut tracker = Tracker::new(TrackerConfig::default()).unwrap();
//! let t0 = Instant::now();
//!
//! let first = vec![Detection::person([10.0, 10.0, 40.0, 90.0], 0.9).unwrap()];
//! assert_eq!(tracker.update(&first, t0), 1);
//!
//! let moved = vec![Detection::person([12.0, 10.0, 40.0, 90.0], 0.9).unwrap()];
//! assert_eq!(tracker.update(&moved, t0 + Duration::from_millis(100)), 0);
//! ```

pub(crate) mod internal;

pub mod bbox;
pub mod collaborators;
pub mod detection;
pub mod matching;
pub mod report;
pub mod session;
pub mod tracked_identity;
pub mod tracker;

// Re-exports for convenience
pub use bbox::{iou, BoundingBox};
pub use collaborators::{Capture, Clock, Detector, FrameSize, ManualClock, NullRenderer, Renderer, SystemClock};
pub use detection::{filter_people, Detection};
pub use matching::MatchingStrategy;
pub use report::{FrameSummary, LogEvent, LogLine, MemoryReporter, Reporter, TracingReporter};
pub use session::{CountingSession, FrameOutcome, SessionConfig, SessionState, StopHandle, TickOutcome};
pub use tracked_identity::TrackedIdentity;
pub use tracker::{Tracker, TrackerConfig};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the people-counter library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid detection: {0}")]
        InvalidDetection(String),

        #[error("Unknown matching strategy: {0}")]
        UnknownStrategy(String),

        /// Capture device unavailable, permission denied, or no frame.
        #[error("Camera acquisition failed: {0}")]
        Acquisition(String),

        /// Detector failed to load or to process a frame.
        #[error("Detection failed: {0}")]
        Detection(String),

        #[error("Config parse error: {0}")]
        Json(#[from] serde_json::Error),
    }

    impl Error {
        /// The message without the variant's prefix, for user-facing log lines.
        pub fn detail(&self) -> String {
            match self {
                Self::InvalidConfig(msg)
                | Self::InvalidDetection(msg)
                | Self::UnknownStrategy(msg)
                | Self::Acquisition(msg)
                | Self::Detection(msg) => msg.clone(),
                Self::Json(e) => e.to_string(),
            }
        }
    }

    /// Result type for people-counter operations
    pub type Result<T> = std::result::Result<T, Error>;
}
