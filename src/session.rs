//! Counting session: the controller that owns the tally and drives the
//! capture, detect, render, track and report cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collaborators::{Capture, Clock, Detector, FrameSize, Renderer, SystemClock};
use crate::detection::{filter_detections, DEFAULT_MIN_SCORE, PERSON_LABEL};
use crate::report::{format_clock, FrameSummary, LogEvent, LogLine, Reporter};
use crate::{Error, Result, Tracker, TrackerConfig};

/// Configuration for a counting session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum time between processed frames, in milliseconds.
    pub detection_interval_ms: u64,

    /// Sleep between loop turns in [`CountingSession::run`], in milliseconds.
    pub poll_interval_ms: u64,

    /// Detector class that counts as a person.
    pub person_label: String,

    /// Detections must score strictly above this.
    pub min_score: f64,

    /// Clear identities and totals on every start instead of resuming.
    pub reset_on_start: bool,

    pub tracker: TrackerConfig,
}

impl SessionConfig {
    /// Parse from JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.person_label.is_empty() {
            return Err(Error::InvalidConfig("person_label must not be empty".to_string()));
        }
        if !self.min_score.is_finite() || !(0.0..=1.0).contains(&self.min_score) {
            return Err(Error::InvalidConfig(format!(
                "min_score must be in [0, 1], got {}",
                self.min_score
            )));
        }
        self.tracker.validate()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detection_interval_ms: 100,
            poll_interval_ms: 16,
            person_label: PERSON_LABEL.to_string(),
            min_score: DEFAULT_MIN_SCORE,
            reset_on_start: false,
            tracker: TrackerConfig::default(),
        }
    }
}

/// Everything a session accumulates between frames.
#[derive(Debug, Clone)]
pub struct SessionState {
    current_count: usize,
    total_count: u64,
    tracker: Tracker,
    last_processed: Option<Instant>,
    frame_size: Option<FrameSize>,
}

impl SessionState {
    fn new(tracker: Tracker) -> Self {
        Self {
            current_count: 0,
            total_count: 0,
            tracker,
            last_processed: None,
            frame_size: None,
        }
    }

    /// People in the most recent processed frame.
    pub fn current_count(&self) -> usize {
        self.current_count
    }

    /// Distinct people counted so far.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn last_processed(&self) -> Option<Instant> {
        self.last_processed
    }

    /// Video dimensions reported by the capture on the last start.
    pub fn frame_size(&self) -> Option<FrameSize> {
        self.frame_size
    }

    fn reset(&mut self) {
        self.current_count = 0;
        self.total_count = 0;
        self.tracker.reset();
        self.last_processed = None;
    }
}

/// Clears a session's running flag from anywhere, including other threads.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// People in this frame after filtering.
    pub people: usize,
    /// Identities the tracker created for this frame.
    pub new_identities: usize,
    /// Running total after this frame.
    pub total: u64,
}

/// What a single [`CountingSession::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; the loop should end.
    Stopped,
    /// Too soon after the previous processed frame; nothing was done.
    Throttled,
    Processed(FrameOutcome),
}

/// Controller for one camera feed.
///
/// Owns the tally, the tracker and the running flag. Work happens in
/// [`tick`](Self::tick), which [`run`](Self::run) calls in a blocking loop.
pub struct CountingSession<C, D, R, P, K = SystemClock>
where
    C: Capture,
{
    config: SessionConfig,
    capture: C,
    detector: D,
    renderer: R,
    reporter: P,
    clock: K,
    state: SessionState,
    running: Arc<AtomicBool>,
    /// Capture started and not yet released.
    active: bool,
    model_loaded: bool,
}

impl<C, D, R, P> CountingSession<C, D, R, P, SystemClock>
where
    C: Capture,
    D: Detector<C::Frame>,
    R: Renderer<C::Frame>,
    P: Reporter,
{
    /// Create a session on the system clock.
    pub fn new(config: SessionConfig, capture: C, detector: D, renderer: R, reporter: P) -> Result<Self> {
        Self::with_clock(config, capture, detector, renderer, reporter, SystemClock)
    }
}

impl<C, D, R, P, K> CountingSession<C, D, R, P, K>
where
    C: Capture,
    D: Detector<C::Frame>,
    R: Renderer<C::Frame>,
    P: Reporter,
    K: Clock,
{
    pub fn with_clock(
        config: SessionConfig,
        capture: C,
        detector: D,
        renderer: R,
        reporter: P,
        clock: K,
    ) -> Result<Self> {
        config.validate()?;
        let tracker = Tracker::new(config.tracker.clone())?;

        Ok(Self {
            config,
            capture,
            detector,
            renderer,
            reporter,
            clock,
            state: SessionState::new(tracker),
            running: Arc::new(AtomicBool::new(false)),
            active: false,
            model_loaded: false,
        })
    }

    /// Open the camera, load the model on first use and set the running flag.
    ///
    /// Does nothing when already running. Identities and totals carry over
    /// from a previous run unless `reset_on_start` is set.
    ///
    /// # Errors
    /// The capture's `Error::Acquisition` or the detector's load error; the
    /// session is left stopped.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // A StopHandle may have cleared the flag without releasing the camera
        self.shutdown();
        self.running.store(true, Ordering::SeqCst);
        self.log(LogEvent::StartRequested);
        self.log(LogEvent::DetectionStarting);

        if self.config.reset_on_start {
            self.state.reset();
        }

        match self.capture.start() {
            Ok(size) => {
                self.active = true;
                self.state.frame_size = Some(size);
                self.log(LogEvent::CameraAcquired);
                debug!(width = size.width, height = size.height, "capture started");
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.log(LogEvent::CameraFailed(e.detail()));
                return Err(e);
            }
        }

        if !self.model_loaded {
            if let Err(e) = self.detector.load() {
                self.running.store(false, Ordering::SeqCst);
                self.release_capture();
                self.log(LogEvent::DetectionError(e.detail()));
                return Err(e);
            }
            self.model_loaded = true;
            self.log(LogEvent::ModelLoaded);
        }

        self.state.last_processed = None;
        info!(total = self.state.total_count, "counting session started");
        Ok(())
    }

    /// Clear the running flag and release the camera.
    ///
    /// Also releases a camera left open by a [`StopHandle`]. Does nothing
    /// once the camera is released.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown();
    }

    /// Process one frame if running and due.
    ///
    /// A stop requested while the detector is busy discards that frame's
    /// result. A capture or detector error stops the session and is returned.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if !self.is_running() {
            self.shutdown();
            return Ok(TickOutcome::Stopped);
        }

        let now = self.clock.now();
        if let Some(last) = self.state.last_processed {
            if now.saturating_duration_since(last) < self.config.detection_interval() {
                return Ok(TickOutcome::Throttled);
            }
        }
        self.state.last_processed = Some(now);

        let frame = match self.capture.grab() {
            Ok(frame) => frame,
            Err(e) => return self.fail(e),
        };

        let detected = self.detector.detect(&frame);
        if !self.is_running() {
            debug!("stopped during detection, frame discarded");
            self.shutdown();
            return Ok(TickOutcome::Stopped);
        }
        let raw = match detected {
            Ok(raw) => raw,
            Err(e) => return self.fail(e),
        };

        let people = filter_detections(raw, &self.config.person_label, self.config.min_score);
        self.renderer.render(&frame, &people, &self.state.tracker);

        self.state.current_count = people.len();
        self.reporter.current_count(people.len());

        let seen_at = self.clock.now();
        let added = self.state.tracker.update(&people, seen_at);
        if added > 0 {
            self.state.total_count += added as u64;
            self.reporter.total_count(self.state.total_count);
            self.log(LogEvent::NewPeople {
                added,
                total: self.state.total_count,
            });
        }

        self.reporter.frame(&FrameSummary {
            people_count: people.len(),
            clock: format_clock(&self.clock.wall()),
        });

        Ok(TickOutcome::Processed(FrameOutcome {
            people: people.len(),
            new_identities: added,
            total: self.state.total_count,
        }))
    }

    /// Tick until stopped, sleeping `poll_interval` between turns.
    ///
    /// Returns `Ok(())` once the running flag is cleared and the camera
    /// released, or the error that halted the loop.
    pub fn run(&mut self) -> Result<()> {
        loop {
            if let TickOutcome::Stopped = self.tick()? {
                break;
            }
            thread::sleep(self.config.poll_interval());
        }
        Ok(())
    }

    /// Start, then [`run`](Self::run).
    pub fn start_and_run(&mut self) -> Result<()> {
        self.start()?;
        self.run()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    fn fail(&mut self, e: Error) -> Result<TickOutcome> {
        self.running.store(false, Ordering::SeqCst);
        warn!(error = %e, "counting session halted");
        self.log(LogEvent::DetectionError(e.detail()));
        self.release_capture();
        Err(e)
    }

    // Release the camera and log the stop, once per start.
    fn shutdown(&mut self) {
        if self.active {
            self.release_capture();
            self.log(LogEvent::Stopped);
        }
    }

    fn release_capture(&mut self) {
        if self.active {
            self.active = false;
            self.capture.stop();
        }
    }

    fn log(&mut self, event: LogEvent) {
        let line = LogLine::new(self.clock.wall(), event);
        self.reporter.log(&line);
    }
}
