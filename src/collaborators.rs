//! Boundaries to the camera, the detection model, the overlay and the clock.
//!
//! The counting session only talks to these traits; concrete camera and
//! model backends live outside this crate.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::{Detection, Result, Tracker};

/// Pixel dimensions of the live video source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Live frame source.
pub trait Capture {
    type Frame;

    /// Open the device and wait until frame dimensions are known.
    ///
    /// # Errors
    /// `Error::Acquisition` when no device is available or access is denied.
    fn start(&mut self) -> Result<FrameSize>;

    /// Current frame.
    fn grab(&mut self) -> Result<Self::Frame>;

    /// Release the device. Safe to call when not started.
    fn stop(&mut self);
}

/// Object detection model.
pub trait Detector<F> {
    /// Prepare the model. Called once, on the first session start.
    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    /// Raw detections for `frame`, all classes and scores.
    ///
    /// # Errors
    /// `Error::Detection` when inference fails.
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>>;
}

/// Overlay output for one processed frame.
pub trait Renderer<F> {
    /// Draw `people` over `frame`.
    ///
    /// Implementations label each box with its score and, when
    /// `tracker.find_match` resolves one, the identity id.
    fn render(&mut self, frame: &F, people: &[Detection], tracker: &Tracker);
}

/// Renderer that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl<F> Renderer<F> for NullRenderer {
    fn render(&mut self, _frame: &F, _people: &[Detection], _tracker: &Tracker) {}
}

/// Box label text: confidence as a percentage with one decimal.
pub fn score_label(det: &Detection) -> String {
    format!("{:.1}%", det.score * 100.0)
}

/// Identity label text for a drawn box, if it resolves to an identity.
pub fn id_label(det: &Detection, tracker: &Tracker) -> Option<String> {
    tracker.find_match(&det.bbox).map(|identity| format!("ID:{}", identity.id()))
}

/// Time source for throttling, tracking and log timestamps.
pub trait Clock {
    /// Monotonic time.
    fn now(&self) -> Instant;

    /// Local wall-clock time.
    fn wall(&self) -> DateTime<Local>;
}

/// The operating system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Hand-advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<(Instant, DateTime<Local>)>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now(), Local::now())
    }

    pub fn starting_at(now: Instant, wall: DateTime<Local>) -> Self {
        Self {
            inner: Arc::new(Mutex::new((now, wall))),
        }
    }

    /// Move both clocks forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.0 += by;
        guard.1 += chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).0
    }

    fn wall(&self) -> DateTime<Local> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).1
    }
}
