// src/rules/speeding.rs

use tracing::info;

use super::RuleContext;
use crate::types::{Detection, Violation, ViolationKind};

/// Compare the multiplier-adjusted speed against the configured limit. The
/// violation reports the unadjusted estimate; only the comparison uses the
/// adjusted value.
pub fn check(ctx: &mut RuleContext, track_id: i64, det: &Detection) -> Option<Violation> {
    let est = ctx.tracks.speed_estimate(
        track_id,
        ctx.detector.meters_per_pixel,
        ctx.detector.speed_multiplier,
    )?;

    let threshold = ctx.detector.speed_threshold_kmh;
    if est.adjusted_kmh <= threshold {
        return None;
    }

    if !ctx
        .dedup
        .should_report(track_id, ViolationKind::Speeding, ctx.now)
    {
        return None;
    }
    ctx.dedup
        .mark_reported(track_id, ViolationKind::Speeding, ctx.now);

    info!(
        "🚨 SPEEDING: {} (track {}) at {:.1} km/h, limit {:.0}",
        det.class_name, track_id, est.speed_kmh, threshold
    );

    Some(Violation {
        kind: ViolationKind::Speeding,
        track_id,
        class_name: det.class_name.clone(),
        timestamp: ctx.now,
        location: est.position,
        confidence: (est.adjusted_kmh / threshold).min(1.0) as f32,
        detail: None,
        speed_kmh: Some(est.speed_kmh),
    })
}
