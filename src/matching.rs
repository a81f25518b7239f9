//! Detection-to-identity matching policies.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::bbox::{iou, BoundingBox};
use crate::internal::optimize::linear_sum_assignment;
use crate::tracked_identity::TrackedIdentity;
use crate::{Error, Result};

/// How the tracker pairs a frame's detections with known identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingStrategy {
    /// Detections are handled in input order; each takes the first live
    /// identity (in insertion order) whose IoU exceeds the threshold.
    /// A matched identity's box is overwritten before the next detection is
    /// considered, so one identity can absorb several detections per frame.
    #[default]
    FirstMatch,

    /// One-to-one assignment maximising the number of matches, then total
    /// IoU, over all pairs above the threshold.
    Optimal,
}

impl MatchingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstMatch => "first_match",
            Self::Optimal => "optimal",
        }
    }
}

impl fmt::Display for MatchingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchingStrategy {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "first_match" | "greedy" => Ok(Self::FirstMatch),
            "optimal" | "hungarian" => Ok(Self::Optimal),
            _ => Err(Error::UnknownStrategy(name.to_string())),
        }
    }
}

/// Index of the first identity overlapping `bbox` by more than `threshold`.
///
/// With `liveness = Some((now, ttl))` identities idle for `ttl` or longer are
/// skipped; with `None` every stored identity is a candidate.
pub fn first_match(
    identities: &[TrackedIdentity],
    bbox: &BoundingBox,
    threshold: f64,
    liveness: Option<(Instant, Duration)>,
) -> Option<usize> {
    identities.iter().position(|identity| {
        let alive = liveness.map_or(true, |(now, ttl)| identity.is_alive(now, ttl));
        alive && iou(&identity.bbox, bbox) > threshold
    })
}

/// Optimal one-to-one pairs from an IoU matrix (detections x identities).
///
/// Pairs at or below `threshold` are never returned. Output is
/// `(detection_idx, identity_idx)` ordered by detection.
pub fn optimal_assignment(iou_matrix: &DMatrix<f64>, threshold: f64) -> Vec<(usize, usize)> {
    let cost = iou_matrix.map(|v| if v > threshold { 1.0 - v } else { f64::INFINITY });

    linear_sum_assignment(&cost, f64::INFINITY)
        .assignments
        .into_iter()
        .map(|a| (a.row_idx, a.col_idx))
        .collect()
}

/// Indices in `0..total` absent from `matched`.
pub fn unmatched(total: usize, matched: &[usize]) -> Vec<usize> {
    let mut is_matched = vec![false; total];
    for &idx in matched {
        is_matched[idx] = true;
    }
    (0..total).filter(|&i| !is_matched[i]).collect()
}
