// src/rules/mod.rs
//
// Rule evaluators. Each one is a predicate over the current detection and
// the shared per-session state, emitting at most one violation per call.
//
// Signal flow:
//   Detection batch → violation_engine ─┬→ person::check        (pass 1)
//                                       ├→ speeding::check      ─┐
//                                       ├→ parking::check        │ pass 2,
//                                       ├→ wrong_way::check      │ per vehicle,
//                                       ├→ red_light::check      │ fixed order
//                                       └→ helmet::HelmetRule ──┘
//
// A rule that fires registers itself with the dedup cache before returning.

pub mod helmet;
pub mod parking;
pub mod person;
pub mod red_light;
pub mod speeding;
pub mod wrong_way;

pub use helmet::HelmetRule;

use crate::dedup_cache::DedupCache;
use crate::track_store::TrackStore;
use crate::types::{DetectorConfig, ZoneConfig};

/// Classes the vehicle rules apply to.
pub const VEHICLE_CLASSES: [&str; 5] = ["car", "truck", "bus", "motorcycle", "bicycle"];

pub fn is_vehicle_class(class_name: &str) -> bool {
    VEHICLE_CLASSES.contains(&class_name)
}

/// Shared state handed to every evaluator for one detection.
pub struct RuleContext<'a> {
    pub tracks: &'a TrackStore,
    pub dedup: &'a mut DedupCache,
    pub zones: &'a ZoneConfig,
    pub detector: &'a DetectorConfig,
    /// Stream time of the current frame, seconds.
    pub now: f64,
}
