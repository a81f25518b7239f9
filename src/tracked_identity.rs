//! TrackedIdentity record maintained by the tracker.

use std::fmt;
use std::time::{Duration, Instant};

use crate::bbox::BoundingBox;

/// A stable integer id linked to the most recent detection of one person.
///
/// Identities are created and mutated only by the [`Tracker`](crate::Tracker);
/// callers get shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedIdentity {
    /// Unique id, starting at 1 and never reused.
    pub(crate) id: u64,

    /// Last-known box, overwritten on every match.
    pub(crate) bbox: BoundingBox,

    /// When this identity was created or last matched.
    pub(crate) last_seen: Instant,
}

impl TrackedIdentity {
    pub(crate) fn new(id: u64, bbox: BoundingBox, now: Instant) -> Self {
        Self {
            id,
            bbox,
            last_seen: now,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// Time since the last match, saturating at zero if `now` is earlier.
    pub fn idle(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }

    /// Alive while idle strictly less than `ttl`.
    pub fn is_alive(&self, now: Instant, ttl: Duration) -> bool {
        self.idle(now) < ttl
    }

    pub(crate) fn hit(&mut self, bbox: BoundingBox, now: Instant) {
        self.bbox = bbox;
        self.last_seen = now;
    }
}

impl fmt::Display for TrackedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID:{} [{:.1}, {:.1}, {:.1}, {:.1}]",
            self.id, self.bbox.x, self.bbox.y, self.bbox.width, self.bbox.height
        )
    }
}
