// src/rules/red_light.rs

use tracing::info;

use super::RuleContext;
use crate::geometry::near_segment;
use crate::types::{Detection, Violation, ViolationKind};

const RED_LIGHT_CONFIDENCE: f32 = 0.9;

/// Movement below this between the last two samples counts as stopped at
/// the line.
const MIN_CROSSING_MOVEMENT_PX: i32 = 3;

/// Fires when a vehicle sits within the buffered stop-line box while the
/// light is red AND it is still moving. A vehicle properly stopped at the
/// line is exempt; with fewer than two history samples the exemption cannot
/// apply and proximity alone decides.
///
/// The engine only invokes this while its red-phase flag is set.
pub fn check(ctx: &mut RuleContext, track_id: i64, det: &Detection) -> Option<Violation> {
    let center = det.center();
    let (a, b) = ctx.zones.red_light_line;
    if !near_segment(center, a, b, ctx.zones.red_light_buffer_px) {
        return None;
    }

    if let Some((prev, last)) = ctx.tracks.last_two(track_id) {
        let dx = (last.x - prev.x).abs();
        let dy = (last.y - prev.y).abs();
        if dx < MIN_CROSSING_MOVEMENT_PX && dy < MIN_CROSSING_MOVEMENT_PX {
            return None; // stopped at the light
        }
    }

    if !ctx
        .dedup
        .should_report(track_id, ViolationKind::RedLight, ctx.now)
    {
        return None;
    }
    ctx.dedup
        .mark_reported(track_id, ViolationKind::RedLight, ctx.now);

    info!(
        "🚦 RED LIGHT: {} (track {}) crossing at {:?}",
        det.class_name, track_id, center
    );

    Some(Violation {
        kind: ViolationKind::RedLight,
        track_id,
        class_name: det.class_name.clone(),
        timestamp: ctx.now,
        location: center,
        confidence: RED_LIGHT_CONFIDENCE,
        detail: None,
        speed_kmh: None,
    })
}
