// src/rules/person.rs

use tracing::info;

use super::RuleContext;
use crate::types::{Detection, Violation, ViolationKind};

const PERSON_CONFIDENCE: f32 = 0.95;

/// Any tracked person is a violation, anywhere in the frame — the monitored
/// polygon does not apply. The 1 s cooldown keeps this to one report per
/// (track, second) while the person stays in view.
pub fn check(ctx: &mut RuleContext, track_id: i64, det: &Detection) -> Option<Violation> {
    if !ctx
        .dedup
        .should_report(track_id, ViolationKind::UnauthorizedPerson, ctx.now)
    {
        return None;
    }

    ctx.dedup
        .mark_reported(track_id, ViolationKind::UnauthorizedPerson, ctx.now);

    info!(
        "🚷 UNAUTHORIZED PERSON: track {} at {:?}",
        track_id,
        det.center()
    );

    Some(Violation {
        kind: ViolationKind::UnauthorizedPerson,
        track_id,
        class_name: det.class_name.clone(),
        timestamp: ctx.now,
        location: det.center(),
        confidence: PERSON_CONFIDENCE,
        detail: Some("Unauthorized person in monitored area".to_string()),
        speed_kmh: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup_cache::DedupCache;
    use crate::track_store::TrackStore;
    use crate::types::{CooldownConfig, DetectorConfig, ZoneConfig};

    fn person_det() -> Detection {
        Detection {
            track_id: Some(5),
            class_id: 0,
            class_name: "person".to_string(),
            bbox: [10, 10, 50, 120],
            confidence: 0.88,
        }
    }

    #[test]
    fn test_fires_once_per_second() {
        let tracks = TrackStore::new(30.0);
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let zones = ZoneConfig::default();
        let detector = DetectorConfig::default();

        let det = person_det();

        let mut ctx = RuleContext {
            tracks: &tracks,
            dedup: &mut dedup,
            zones: &zones,
            detector: &detector,
            now: 100.2,
        };
        let first = check(&mut ctx, 5, &det);
        assert!(first.is_some());
        let v = first.unwrap();
        assert_eq!(v.kind, ViolationKind::UnauthorizedPerson);
        assert_eq!(v.confidence, 0.95);
        assert_eq!(v.location, (30, 65));

        // Same second: suppressed.
        let mut ctx = RuleContext {
            tracks: &tracks,
            dedup: &mut dedup,
            zones: &zones,
            detector: &detector,
            now: 100.8,
        };
        assert!(check(&mut ctx, 5, &det).is_none());

        // Next second: fires again.
        let mut ctx = RuleContext {
            tracks: &tracks,
            dedup: &mut dedup,
            zones: &zones,
            detector: &detector,
            now: 101.3,
        };
        assert!(check(&mut ctx, 5, &det).is_some());
    }
}
