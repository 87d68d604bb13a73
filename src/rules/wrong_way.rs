// src/rules/wrong_way.rs

use tracing::info;

use super::RuleContext;
use crate::types::{Detection, Violation, ViolationKind};

const WRONG_WAY_CONFIDENCE: f32 = 0.85;

/// Fires when the track's dominant direction is the exact opposite of the
/// configured flow. Perpendicular travel (e.g. east through a south-bound
/// lane) is not wrong-way; that ambiguity belongs to a turning vehicle.
pub fn check(ctx: &mut RuleContext, track_id: i64, det: &Detection) -> Option<Violation> {
    let direction = ctx.tracks.direction(track_id)?;
    if direction != ctx.zones.expected_direction.opposite() {
        return None;
    }

    if !ctx
        .dedup
        .should_report(track_id, ViolationKind::WrongWay, ctx.now)
    {
        return None;
    }
    ctx.dedup
        .mark_reported(track_id, ViolationKind::WrongWay, ctx.now);

    info!(
        "🔄 WRONG WAY: {} (track {}) heading {} against expected {}",
        det.class_name, track_id, direction, ctx.zones.expected_direction
    );

    Some(Violation {
        kind: ViolationKind::WrongWay,
        track_id,
        class_name: det.class_name.clone(),
        timestamp: ctx.now,
        location: det.center(),
        confidence: WRONG_WAY_CONFIDENCE,
        detail: None,
        speed_kmh: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup_cache::DedupCache;
    use crate::track_store::TrackStore;
    use crate::types::{Compass, CooldownConfig, DetectorConfig, ZoneConfig};

    fn northbound_store() -> TrackStore {
        // (100, 900) at t=0 up to (100, 100) at t=1: pure north.
        let mut s = TrackStore::new(30.0);
        s.record(4, 0.0, 100, 900);
        s.record(4, 0.5, 100, 500);
        s.record(4, 1.0, 100, 100);
        s
    }

    fn car_det() -> Detection {
        Detection {
            track_id: Some(4),
            class_id: 2,
            class_name: "car".to_string(),
            bbox: [80, 80, 120, 120],
            confidence: 0.9,
        }
    }

    #[test]
    fn test_north_against_south_flow_fires() {
        let tracks = northbound_store();
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let zones = ZoneConfig {
            expected_direction: Compass::South,
            ..ZoneConfig::default()
        };
        let detector = DetectorConfig::default();

        let mut ctx = RuleContext {
            tracks: &tracks,
            dedup: &mut dedup,
            zones: &zones,
            detector: &detector,
            now: 1.0,
        };
        let v = check(&mut ctx, 4, &car_det()).expect("should fire");
        assert_eq!(v.kind, ViolationKind::WrongWay);
        assert_eq!(v.confidence, 0.85);
    }

    #[test]
    fn test_north_with_north_flow_silent() {
        let tracks = northbound_store();
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let zones = ZoneConfig {
            expected_direction: Compass::North,
            ..ZoneConfig::default()
        };
        let detector = DetectorConfig::default();

        let mut ctx = RuleContext {
            tracks: &tracks,
            dedup: &mut dedup,
            zones: &zones,
            detector: &detector,
            now: 1.0,
        };
        assert!(check(&mut ctx, 4, &car_det()).is_none());
    }

    #[test]
    fn test_perpendicular_travel_silent() {
        let tracks = northbound_store();
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let zones = ZoneConfig {
            expected_direction: Compass::East,
            ..ZoneConfig::default()
        };
        let detector = DetectorConfig::default();

        let mut ctx = RuleContext {
            tracks: &tracks,
            dedup: &mut dedup,
            zones: &zones,
            detector: &detector,
            now: 1.0,
        };
        assert!(check(&mut ctx, 4, &car_det()).is_none());
    }

    #[test]
    fn test_two_samples_no_direction() {
        let mut tracks = TrackStore::new(30.0);
        tracks.record(4, 0.0, 100, 900);
        tracks.record(4, 1.0, 100, 100);
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let zones = ZoneConfig {
            expected_direction: Compass::South,
            ..ZoneConfig::default()
        };
        let detector = DetectorConfig::default();

        let mut ctx = RuleContext {
            tracks: &tracks,
            dedup: &mut dedup,
            zones: &zones,
            detector: &detector,
            now: 1.0,
        };
        assert!(check(&mut ctx, 4, &car_det()).is_none());
    }
}
