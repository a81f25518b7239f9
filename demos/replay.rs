//! Replays synthetic pedestrian traffic through a counting session.
//!
//! Usage:
//!     cargo run --example replay [first_match|optimal]
//!
//! Logging goes through tracing; set RUST_LOG=debug to see tracker events.

use std::env;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use people_counter::collaborators::{id_label, score_label};
use people_counter::{
    BoundingBox, Capture, CountingSession, Detection, Detector, FrameSize, MatchingStrategy, Renderer, Result,
    SessionConfig, StopHandle, Tracker, TrackerConfig, TracingReporter,
};

const FRAMES: u32 = 60;

/// Frame source that just numbers frames.
struct SyntheticCapture {
    next: u32,
}

impl Capture for SyntheticCapture {
    type Frame = u32;

    fn start(&mut self) -> Result<FrameSize> {
        Ok(FrameSize { width: 1280, height: 720 })
    }

    fn grab(&mut self) -> Result<u32> {
        self.next += 1;
        Ok(self.next)
    }

    fn stop(&mut self) {}
}

/// Walkers entering from the left every 20 frames, plus a parked car.
struct WalkerDetector {
    stop: Arc<Mutex<Option<StopHandle>>>,
}

impl Detector<u32> for WalkerDetector {
    fn detect(&mut self, frame: &u32) -> Result<Vec<Detection>> {
        if *frame >= FRAMES {
            if let Some(handle) = self.stop.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
                handle.stop();
            }
        }

        let mut out = vec![Detection::new(BoundingBox::new(900.0, 400.0, 200.0, 120.0), "car", 0.95)?];
        for start in (0..*frame).step_by(20) {
            let age = (*frame - start) as f64;
            let x = age * 12.0;
            if x < 1280.0 {
                let score = if age as u32 % 7 == 0 { 0.55 } else { 0.88 };
                out.push(Detection::person([x, 200.0, 60.0, 170.0], score)?);
            }
        }
        Ok(out)
    }
}

/// Prints each box with its labels.
struct StdoutRenderer;

impl Renderer<u32> for StdoutRenderer {
    fn render(&mut self, frame: &u32, people: &[Detection], tracker: &Tracker) {
        for det in people {
            println!(
                "frame {:>3}  x={:>6.1}  {:>6}  {}",
                frame,
                det.bbox.x,
                score_label(det),
                id_label(det, tracker).unwrap_or_else(|| "-".to_string())
            );
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let strategy: MatchingStrategy = env::args()
        .nth(1)
        .map(|s| s.parse::<MatchingStrategy>())
        .transpose()?
        .unwrap_or_default();

    let config = SessionConfig {
        detection_interval_ms: 20,
        poll_interval_ms: 5,
        tracker: TrackerConfig::default().with_matching(strategy),
        ..Default::default()
    };

    let stop = Arc::new(Mutex::new(None));
    let mut session = CountingSession::new(
        config,
        SyntheticCapture { next: 0 },
        WalkerDetector { stop: Arc::clone(&stop) },
        StdoutRenderer,
        TracingReporter,
    )?;
    *stop.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.stop_handle());

    session.start_and_run()?;

    println!(
        "{}: {} people counted, {} still tracked",
        strategy,
        session.state().total_count(),
        session.state().tracker().len()
    );
    Ok(())
}
