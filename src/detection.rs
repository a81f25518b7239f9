//! Detection struct for input to the tracker.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::{Error, Result};

/// Class label the counter consumes.
pub const PERSON_LABEL: &str = "person";

/// Minimum score (exclusive) for a person detection to be counted.
pub const DEFAULT_MIN_SCORE: f64 = 0.6;

/// One detector output for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box in frame pixel coordinates.
    pub bbox: BoundingBox,

    /// Category reported by the detector, e.g. `"person"`.
    pub label: String,

    /// Detector confidence in `[0, 1]`.
    pub score: f64,
}

impl Detection {
    /// Create a validated detection.
    ///
    /// # Errors
    /// `Error::InvalidDetection` when a coordinate is not finite, the box has
    /// negative extent, or the score lies outside `[0, 1]`.
    pub fn new(bbox: BoundingBox, label: impl Into<String>, score: f64) -> Result<Self> {
        let coords = bbox.to_array();
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidDetection(format!(
                "bounding box has non-finite coordinates: {:?}",
                coords
            )));
        }
        if bbox.width < 0.0 || bbox.height < 0.0 {
            return Err(Error::InvalidDetection(format!(
                "bounding box has negative extent {}x{}",
                bbox.width, bbox.height
            )));
        }
        if !(0.0..=1.0).contains(&score) {
            return Err(Error::InvalidDetection(format!(
                "score {} outside [0, 1]",
                score
            )));
        }

        Ok(Self {
            bbox,
            label: label.into(),
            score,
        })
    }

    /// Create a person detection from a `[x, y, width, height]` slice.
    pub fn person(bbox: [f64; 4], score: f64) -> Result<Self> {
        Self::new(BoundingBox::from(bbox), PERSON_LABEL, score)
    }

    /// Whether this detection carries `label` with a score strictly above `min_score`.
    pub fn is_confident(&self, label: &str, min_score: f64) -> bool {
        self.label == label && self.score > min_score
    }
}

/// Keep only detections of `label` scoring strictly above `min_score`.
///
/// Input order is preserved; the tracker's first-match policy depends on it.
pub fn filter_detections(detections: Vec<Detection>, label: &str, min_score: f64) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.is_confident(label, min_score))
        .collect()
}

/// [`filter_detections`] with the default person label and threshold.
pub fn filter_people(detections: Vec<Detection>) -> Vec<Detection> {
    filter_detections(detections, PERSON_LABEL, DEFAULT_MIN_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_detection_new() {
        let det = Detection::new(BoundingBox::new(1.0, 2.0, 3.0, 4.0), "person", 0.9).unwrap();

        assert_eq!(det.label, "person");
        assert_relative_eq!(det.score, 0.9, epsilon = 1e-10);
        assert_relative_eq!(det.bbox.area(), 12.0, epsilon = 1e-10);
    }

    #[test]
    fn test_detection_person_helper() {
        let det = Detection::person([10.0, 20.0, 30.0, 40.0], 0.75).unwrap();
        assert_eq!(det.label, PERSON_LABEL);
        assert_eq!(det.bbox, BoundingBox::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_detection_rejects_bad_score() {
        assert!(Detection::person([0.0, 0.0, 1.0, 1.0], 1.5).is_err());
        assert!(Detection::person([0.0, 0.0, 1.0, 1.0], -0.1).is_err());
        assert!(Detection::person([0.0, 0.0, 1.0, 1.0], f64::NAN).is_err());
    }

    #[test]
    fn test_detection_rejects_bad_box() {
        assert!(Detection::person([0.0, 0.0, -1.0, 1.0], 0.9).is_err());
        assert!(Detection::person([f64::INFINITY, 0.0, 1.0, 1.0], 0.9).is_err());
        // Zero-area boxes are legal input
        assert!(Detection::person([0.0, 0.0, 0.0, 0.0], 0.9).is_ok());
    }

    #[test]
    fn test_filter_people() {
        let dets = vec![
            Detection::person([0.0, 0.0, 10.0, 10.0], 0.9).unwrap(),
            Detection::new(BoundingBox::new(0.0, 0.0, 5.0, 5.0), "dog", 0.99).unwrap(),
            Detection::person([20.0, 0.0, 10.0, 10.0], 0.6).unwrap(),
            Detection::person([40.0, 0.0, 10.0, 10.0], 0.61).unwrap(),
        ];

        let people = filter_people(dets);

        // 0.6 is not strictly above the threshold
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].bbox.x, 0.0);
        assert_eq!(people[1].bbox.x, 40.0);
    }

    #[test]
    fn test_filter_detections_custom_label() {
        let dets = vec![
            Detection::new(BoundingBox::new(0.0, 0.0, 5.0, 5.0), "car", 0.5).unwrap(),
            Detection::person([0.0, 0.0, 10.0, 10.0], 0.9).unwrap(),
        ];
        let cars = filter_detections(dets, "car", 0.3);
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].label, "car");
    }
}
