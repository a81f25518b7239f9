//! Scenario fixture tests.
//!
//! Each fixture is a timed sequence of frames with the expected tracker
//! output after every frame. Fixtures run against both matching strategies
//! unless they name one.

use serde::Deserialize;
use std::time::{Duration, Instant};

use people_counter::{Detection, MatchingStrategy, Tracker, TrackerConfig};

// ============================================================================
// Fixture JSON Schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    #[serde(default)]
    strategies: Option<Vec<MatchingStrategy>>,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    t_ms: u64,
    detections: Vec<[f64; 4]>,
    new_identities: usize,
    ids: Vec<u64>,
}

const FIXTURES: &str = r#"[
  {
    "name": "sequential_two_people_then_expiry",
    "steps": [
      { "t_ms": 0,    "detections": [[100, 100, 50, 120]],                      "new_identities": 1, "ids": [1] },
      { "t_ms": 50,   "detections": [[101, 101, 50, 120], [400, 90, 55, 130]],  "new_identities": 1, "ids": [1, 2] },
      { "t_ms": 3500, "detections": [],                                         "new_identities": 0, "ids": [] }
    ]
  },
  {
    "name": "expiry_then_reappearance_gets_new_id",
    "steps": [
      { "t_ms": 0,    "detections": [[0, 0, 40, 80]], "new_identities": 1, "ids": [1] },
      { "t_ms": 3001, "detections": [[0, 0, 40, 80]], "new_identities": 1, "ids": [2] },
      { "t_ms": 3100, "detections": [[1, 0, 40, 80]], "new_identities": 0, "ids": [2] }
    ]
  },
  {
    "name": "one_person_leaves_other_stays",
    "steps": [
      { "t_ms": 0,    "detections": [[0, 0, 40, 80], [200, 0, 40, 80]], "new_identities": 2, "ids": [1, 2] },
      { "t_ms": 2000, "detections": [[200, 0, 40, 80]],                 "new_identities": 0, "ids": [1, 2] },
      { "t_ms": 3000, "detections": [[202, 0, 40, 80]],                 "new_identities": 0, "ids": [2] },
      { "t_ms": 3200, "detections": [[0, 0, 40, 80], [204, 0, 40, 80]], "new_identities": 1, "ids": [2, 3] }
    ]
  },
  {
    "name": "first_match_merges_overlapping_pair",
    "strategies": ["first_match"],
    "steps": [
      { "t_ms": 0,   "detections": [[0, 0, 100, 100]],                   "new_identities": 1, "ids": [1] },
      { "t_ms": 100, "detections": [[0, 0, 100, 100], [10, 0, 100, 100]], "new_identities": 0, "ids": [1] }
    ]
  },
  {
    "name": "optimal_splits_overlapping_pair",
    "strategies": ["optimal"],
    "steps": [
      { "t_ms": 0,   "detections": [[0, 0, 100, 100]],                   "new_identities": 1, "ids": [1] },
      { "t_ms": 100, "detections": [[0, 0, 100, 100], [10, 0, 100, 100]], "new_identities": 1, "ids": [1, 2] }
    ]
  }
]"#;

fn load_fixtures() -> Vec<Fixture> {
    serde_json::from_str(FIXTURES).expect("fixtures parse")
}

fn run_fixture(fixture: &Fixture, strategy: MatchingStrategy) {
    let mut tracker = Tracker::new(TrackerConfig::default().with_matching(strategy)).unwrap();
    let t0 = Instant::now();

    for (i, step) in fixture.steps.iter().enumerate() {
        let detections: Vec<Detection> = step
            .detections
            .iter()
            .map(|b| Detection::person(*b, 0.9).unwrap())
            .collect();

        let created = tracker.update(&detections, t0 + Duration::from_millis(step.t_ms));
        let ids: Vec<u64> = tracker.identities().iter().map(|identity| identity.id()).collect();

        assert_eq!(
            created, step.new_identities,
            "{} [{}] step {}: new identities",
            fixture.name, strategy, i
        );
        assert_eq!(ids, step.ids, "{} [{}] step {}: ids", fixture.name, strategy, i);
    }
}

#[test]
fn fixture_scenarios() {
    let fixtures = load_fixtures();
    assert!(!fixtures.is_empty());

    for fixture in &fixtures {
        let strategies = fixture
            .strategies
            .clone()
            .unwrap_or_else(|| vec![MatchingStrategy::FirstMatch, MatchingStrategy::Optimal]);
        for strategy in strategies {
            run_fixture(fixture, strategy);
        }
    }
}
