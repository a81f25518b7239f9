//! Counts, timestamped log lines and the reporters that receive them.

use std::fmt;

use chrono::{DateTime, Local};
use tracing::{info, warn};

/// Notable session events, rendered as free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    StartRequested,
    DetectionStarting,
    CameraAcquired,
    CameraFailed(String),
    ModelLoaded,
    NewPeople { added: usize, total: u64 },
    Stopped,
    DetectionError(String),
}

impl LogEvent {
    /// Failure events are forwarded at warn level.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::CameraFailed(_) | Self::DetectionError(_))
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartRequested => f.write_str("Start requested"),
            Self::DetectionStarting => f.write_str("Starting detection..."),
            Self::CameraAcquired => f.write_str("Camera stream acquired"),
            Self::CameraFailed(msg) => write!(f, "Failed to start camera: {}", msg),
            Self::ModelLoaded => f.write_str("Model loaded"),
            Self::NewPeople { added, total } => {
                write!(f, "{} new people detected (total {})", added, total)
            }
            Self::Stopped => f.write_str("Detection stopped"),
            Self::DetectionError(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// One log line: local time plus event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub event: LogEvent,
}

impl LogLine {
    pub fn new(timestamp: DateTime<Local>, event: LogEvent) -> Self {
        Self { timestamp, event }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.event)
    }
}

/// `YYYY/MM/DD HH:MM:SS`, zero padded.
pub fn format_clock(t: &DateTime<Local>) -> String {
    t.format("%Y/%m/%d %H:%M:%S").to_string()
}

/// Per-frame display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSummary {
    /// People in the current frame.
    pub people_count: usize,
    /// Wall clock, formatted by [`format_clock`].
    pub clock: String,
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "People Count: {}", self.people_count)
    }
}

/// Receiver of counts and log lines.
pub trait Reporter {
    /// People in the current frame; every processed frame.
    fn current_count(&mut self, count: usize);

    /// Cumulative distinct people; only when new identities appeared.
    fn total_count(&mut self, total: u64);

    /// A notable event.
    fn log(&mut self, line: &LogLine);

    /// End-of-frame display update.
    fn frame(&mut self, summary: &FrameSummary);
}

/// Forwards everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn current_count(&mut self, count: usize) {
        tracing::trace!(count, "current people");
    }

    fn total_count(&mut self, total: u64) {
        info!(total, "total people");
    }

    fn log(&mut self, line: &LogLine) {
        if line.event.is_error() {
            warn!("{}", line);
        } else {
            info!("{}", line);
        }
    }

    fn frame(&mut self, summary: &FrameSummary) {
        tracing::trace!(people = summary.people_count, clock = %summary.clock, "frame");
    }
}

/// Records everything it receives.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    pub current_counts: Vec<usize>,
    pub totals: Vec<u64>,
    pub lines: Vec<LogLine>,
    pub frames: Vec<FrameSummary>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logged events without timestamps.
    pub fn events(&self) -> Vec<&LogEvent> {
        self.lines.iter().map(|l| &l.event).collect()
    }

    /// Rendered log, one line per event.
    pub fn transcript(&self) -> String {
        self.lines.iter().map(|l| format!("{}\n", l)).collect()
    }
}

impl Reporter for MemoryReporter {
    fn current_count(&mut self, count: usize) {
        self.current_counts.push(count);
    }

    fn total_count(&mut self, total: u64) {
        self.totals.push(total);
    }

    fn log(&mut self, line: &LogLine) {
        self.lines.push(line.clone());
    }

    fn frame(&mut self, summary: &FrameSummary) {
        self.frames.push(summary.clone());
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn current_count(&mut self, count: usize) {
        (**self).current_count(count)
    }

    fn total_count(&mut self, total: u64) {
        (**self).total_count(total)
    }

    fn log(&mut self, line: &LogLine) {
        (**self).log(line)
    }

    fn frame(&mut self, summary: &FrameSummary) {
        (**self).frame(summary)
    }
}
