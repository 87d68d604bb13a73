// src/dedup_cache.rs
//
// Time-windowed suppression of repeat reports. One entry per accepted
// violation; a (track, kind) pair inside its cooldown window stays quiet.

use tracing::debug;

use crate::types::{CooldownConfig, ViolationKind};

/// Entries older than this are dropped on every scan, whatever their kind's
/// cooldown. No cooldown exceeds it.
const PURGE_HORIZON_SECS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct DedupEntry {
    track_id: i64,
    kind: ViolationKind,
    /// Whole seconds. Floored at insert so 1 s cooldowns key per second.
    reported_at: i64,
}

pub struct DedupCache {
    entries: Vec<DedupEntry>,
    cooldowns: CooldownConfig,
}

impl DedupCache {
    pub fn new(cooldowns: CooldownConfig) -> Self {
        Self {
            entries: Vec::new(),
            cooldowns,
        }
    }

    /// True when no recent report exists for (track, kind). Purges expired
    /// entries as a side effect, so the cache stays bounded without a timer.
    pub fn should_report(&mut self, track_id: i64, kind: ViolationKind, now: f64) -> bool {
        self.entries
            .retain(|e| now - e.reported_at as f64 <= PURGE_HORIZON_SECS);

        let cooldown = self.cooldowns.for_kind(kind);
        let blocked = self.entries.iter().any(|e| {
            e.track_id == track_id && e.kind == kind && now - (e.reported_at as f64) < cooldown
        });

        if blocked {
            debug!(
                "Suppressed duplicate {} for track {} (within {:.0}s cooldown)",
                kind, track_id, cooldown
            );
        }

        !blocked
    }

    pub fn mark_reported(&mut self, track_id: i64, kind: ViolationKind, now: f64) {
        self.entries.push(DedupEntry {
            track_id,
            kind,
            reported_at: now.floor() as i64,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
