// src/rules/parking.rs

use tracing::info;

use super::RuleContext;
use crate::geometry::point_in_polygon;
use crate::types::{Detection, Violation, ViolationKind};

const PARKING_CONFIDENCE: f32 = 0.9;

/// A vehicle that has stopped moving inside any restricted polygon is
/// illegally parked. Stationarity needs 5 samples of history, so a freshly
/// sighted vehicle can never trigger this.
pub fn check(ctx: &mut RuleContext, track_id: i64, det: &Detection) -> Option<Violation> {
    if !ctx.tracks.is_stationary(track_id) {
        return None;
    }

    let center = det.center();
    let in_restricted = ctx
        .zones
        .restricted
        .iter()
        .any(|area| point_in_polygon(center, area));
    if !in_restricted {
        return None;
    }

    if !ctx
        .dedup
        .should_report(track_id, ViolationKind::IllegalParking, ctx.now)
    {
        return None;
    }
    ctx.dedup
        .mark_reported(track_id, ViolationKind::IllegalParking, ctx.now);

    info!(
        "🅿️  ILLEGAL PARKING: {} (track {}) stationary at {:?}",
        det.class_name, track_id, center
    );

    Some(Violation {
        kind: ViolationKind::IllegalParking,
        track_id,
        class_name: det.class_name.clone(),
        timestamp: ctx.now,
        location: center,
        confidence: PARKING_CONFIDENCE,
        detail: None,
        speed_kmh: None,
    })
}
