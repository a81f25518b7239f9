//! Identity tracker.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bbox::{iou_matrix, BoundingBox};
use crate::matching::{first_match, optimal_assignment, unmatched, MatchingStrategy};
use crate::{Detection, Error, Result, TrackedIdentity};

/// Default minimum IoU (exclusive) for a detection to continue an identity.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.3;

/// Default idle time after which an identity is forgotten.
pub const DEFAULT_TTL: Duration = Duration::from_millis(3000);

/// Configuration for the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Overlap a detection must exceed to match an identity.
    pub iou_threshold: f64,

    /// Idle time in milliseconds before an identity expires.
    pub ttl_ms: u64,

    /// Policy for pairing detections with identities.
    pub matching: MatchingStrategy,
}

impl TrackerConfig {
    /// `ttl` is rounded up to whole milliseconds, so any non-zero TTL stays valid.
    pub fn new(iou_threshold: f64, ttl: Duration) -> Self {
        let ttl_ms = ttl.as_nanos().div_ceil(1_000_000);
        Self {
            iou_threshold,
            ttl_ms: u64::try_from(ttl_ms).unwrap_or(u64::MAX),
            matching: MatchingStrategy::default(),
        }
    }

    pub fn with_matching(mut self, matching: MatchingStrategy) -> Self {
        self.matching = matching;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Check ranges; called by [`Tracker::new`].
    pub fn validate(&self) -> Result<()> {
        if !self.iou_threshold.is_finite() || !(0.0..1.0).contains(&self.iou_threshold) {
            return Err(Error::InvalidConfig(format!(
                "iou_threshold must be in [0, 1), got {}",
                self.iou_threshold
            )));
        }
        if self.ttl_ms == 0 {
            return Err(Error::InvalidConfig("ttl_ms must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_IOU_THRESHOLD, DEFAULT_TTL)
    }
}

/// Person tracker.
///
/// Associates each frame's detections with previously seen identities by
/// bounding-box overlap, forgets identities idle for longer than the TTL and
/// reports how many identities are new.
#[derive(Debug, Clone)]
pub struct Tracker {
    config: TrackerConfig,

    /// Live identities in insertion order.
    identities: Vec<TrackedIdentity>,

    /// Id handed to the next new identity.
    next_id: u64,
}

impl Tracker {
    /// Create a new tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            identities: Vec::new(),
            next_id: 1,
        })
    }

    /// Feed one frame of detections observed at `now`.
    ///
    /// Matched identities take the detection's box and `now` as their last
    /// sighting; unmatched detections become new identities. Afterwards every
    /// identity idle for at least the TTL, measured against the same `now`,
    /// is removed.
    ///
    /// # Returns
    /// Number of identities created by this call.
    pub fn update(&mut self, detections: &[Detection], now: Instant) -> usize {
        let created = match self.config.matching {
            MatchingStrategy::FirstMatch => self.update_first_match(detections, now),
            MatchingStrategy::Optimal => self.update_optimal(detections, now),
        };

        self.sweep(now);

        if created > 0 {
            debug!(
                created,
                tracked = self.identities.len(),
                next_id = self.next_id,
                "new identities"
            );
        }
        created
    }

    fn update_first_match(&mut self, detections: &[Detection], now: Instant) -> usize {
        let ttl = self.config.ttl();
        let mut created = 0;

        for det in detections {
            match first_match(&self.identities, &det.bbox, self.config.iou_threshold, Some((now, ttl))) {
                Some(idx) => self.identities[idx].hit(det.bbox, now),
                None => {
                    self.create_identity(det.bbox, now);
                    created += 1;
                }
            }
        }

        created
    }

    fn update_optimal(&mut self, detections: &[Detection], now: Instant) -> usize {
        let ttl = self.config.ttl();

        let live: Vec<usize> = self
            .identities
            .iter()
            .enumerate()
            .filter(|(_, identity)| identity.is_alive(now, ttl))
            .map(|(i, _)| i)
            .collect();

        let det_boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();
        let live_boxes: Vec<BoundingBox> = live.iter().map(|&i| self.identities[i].bbox).collect();

        let pairs = optimal_assignment(&iou_matrix(&det_boxes, &live_boxes), self.config.iou_threshold);

        let mut matched_dets = Vec::with_capacity(pairs.len());
        for (det_idx, live_idx) in pairs {
            self.identities[live[live_idx]].hit(det_boxes[det_idx], now);
            matched_dets.push(det_idx);
        }

        let fresh = unmatched(detections.len(), &matched_dets);
        for &det_idx in &fresh {
            self.create_identity(det_boxes[det_idx], now);
        }

        fresh.len()
    }

    fn create_identity(&mut self, bbox: BoundingBox, now: Instant) {
        let id = self.next_id;
        self.next_id += 1;
        self.identities.push(TrackedIdentity::new(id, bbox, now));
    }

    fn sweep(&mut self, now: Instant) {
        let ttl = self.config.ttl();
        let before = self.identities.len();
        self.identities.retain(|identity| identity.is_alive(now, ttl));

        let expired = before - self.identities.len();
        if expired > 0 {
            debug!(expired, tracked = self.identities.len(), "identities expired");
        }
    }

    /// First stored identity overlapping `bbox` above the threshold.
    ///
    /// Used to label drawn boxes. No TTL check is applied: identities that
    /// went idle but have not been swept yet still resolve.
    pub fn find_match(&self, bbox: &BoundingBox) -> Option<&TrackedIdentity> {
        first_match(&self.identities, bbox, self.config.iou_threshold, None)
            .map(|idx| &self.identities[idx])
    }

    /// Like [`find_match`](Self::find_match) but only among identities alive at `now`.
    pub fn find_live_match(&self, bbox: &BoundingBox, now: Instant) -> Option<&TrackedIdentity> {
        first_match(
            &self.identities,
            bbox,
            self.config.iou_threshold,
            Some((now, self.config.ttl())),
        )
        .map(|idx| &self.identities[idx])
    }

    /// Current identities in insertion order.
    pub fn identities(&self) -> &[TrackedIdentity] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Id the next new identity will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Number of identities created since construction or the last reset.
    pub fn total_identities(&self) -> u64 {
        self.next_id - 1
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Forget every identity and restart numbering at 1.
    pub fn reset(&mut self) {
        self.identities.clear();
        self.next_id = 1;
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self {
            config: TrackerConfig::default(),
            identities: Vec::new(),
            next_id: 1,
        }
    }
}
