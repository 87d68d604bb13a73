// src/violation_engine.rs
//
// Per-frame orchestration. Owns every piece of per-session state (track
// histories, dedup cache, class counts) and runs the rule evaluators in a
// fixed order so violation output is deterministic for a given input order.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::dedup_cache::DedupCache;
use crate::geometry::{point_in_polygon, validate_polygon};
use crate::rules::{self, HelmetRule, RuleContext};
use crate::track_store::TrackStore;
use crate::types::{Config, Detection, DetectionRecord, Frame, Violation};

pub struct ViolationEngine {
    config: Config,
    tracks: TrackStore,
    dedup: DedupCache,
    helmet: HelmetRule,

    /// Track ids already counted this session.
    seen_tracks: HashSet<i64>,
    /// Running object counts by class name, first sighting only.
    class_counts: HashMap<String, u64>,
    /// First-sighting records queued for the caller's record store.
    pending_records: Vec<DetectionRecord>,

    /// Red-phase flag. The red-light rule only runs while this is set;
    /// a live traffic-light feed plugs in here.
    red_light_active: bool,

    // ── Session metrics ──
    pub frames_processed: u64,
    pub violations_emitted: u64,
}

impl ViolationEngine {
    pub fn new(config: Config) -> Result<Self> {
        let helmet = HelmetRule::new(config.helmet.clone());
        Self::build(config, helmet)
    }

    /// Engine with a seeded helmet-fallback RNG, for replayable sessions
    /// and tests.
    pub fn with_seeded_rng(config: Config, seed: u64) -> Result<Self> {
        let helmet = HelmetRule::with_seed(config.helmet.clone(), seed);
        Self::build(config, helmet)
    }

    fn build(config: Config, helmet: HelmetRule) -> Result<Self> {
        validate_polygon(&config.zones.monitored).context("monitored polygon")?;
        for (i, area) in config.zones.restricted.iter().enumerate() {
            validate_polygon(area).with_context(|| format!("restricted polygon {}", i))?;
        }

        let tracks = TrackStore::new(config.detector.track_ttl_seconds);
        let dedup = DedupCache::new(config.cooldowns.clone());

        Ok(Self {
            config,
            tracks,
            dedup,
            helmet,
            seen_tracks: HashSet::new(),
            class_counts: HashMap::new(),
            pending_records: Vec::new(),
            red_light_active: false,
            frames_processed: 0,
            violations_emitted: 0,
        })
    }

    /// Run all rules over one frame's detection batch.
    ///
    /// Violations come back in detection-encounter order: the person pass
    /// first, then per-vehicle rule order. A detection without a track id is
    /// skipped outright; nothing in here fails the batch.
    pub fn process_frame(
        &mut self,
        frame: Option<&Frame>,
        detections: &[Detection],
        now: f64,
    ) -> Vec<Violation> {
        self.frames_processed += 1;
        self.tracks.evict_stale(now);

        let mut violations = Vec::new();

        for det in detections {
            if let Some(track_id) = det.track_id {
                self.note_sighting(track_id, det, now);
            }
        }

        // Pass 1: every tracked person is flagged, no geometry test.
        for det in detections {
            let track_id = match det.track_id {
                Some(id) => id,
                None => continue,
            };
            if det.class_name != "person" {
                continue;
            }
            let mut ctx = self.rule_context(now);
            if let Some(v) = rules::person::check(&mut ctx, track_id, det) {
                violations.push(v);
            }
        }

        // Pass 2: vehicle rules, fixed order per object.
        for det in detections {
            let track_id = match det.track_id {
                Some(id) => id,
                None => continue,
            };
            if !rules::is_vehicle_class(&det.class_name) {
                continue;
            }

            let center = det.center();
            let inside = point_in_polygon(center, &self.config.zones.monitored);

            // History feeds speeding / parking / wrong-way, and those rules
            // only apply inside the monitored polygon.
            if inside {
                self.tracks.record(track_id, now, center.0, center.1);

                let mut ctx = self.rule_context(now);
                if let Some(v) = rules::speeding::check(&mut ctx, track_id, det) {
                    violations.push(v);
                }
                let mut ctx = self.rule_context(now);
                if let Some(v) = rules::parking::check(&mut ctx, track_id, det) {
                    violations.push(v);
                }
                let mut ctx = self.rule_context(now);
                if let Some(v) = rules::wrong_way::check(&mut ctx, track_id, det) {
                    violations.push(v);
                }
            }

            if self.red_light_active {
                let mut ctx = self.rule_context(now);
                if let Some(v) = rules::red_light::check(&mut ctx, track_id, det) {
                    violations.push(v);
                }
            }

            if det.class_name == "motorcycle" {
                if let Some(v) =
                    self.helmet
                        .check(&mut self.dedup, track_id, det, frame, now)
                {
                    violations.push(v);
                }
            }
        }

        if !violations.is_empty() {
            debug!(
                "Frame at t={:.2}: {} violation(s) from {} detection(s)",
                now,
                violations.len(),
                detections.len()
            );
        }
        self.violations_emitted += violations.len() as u64;

        violations
    }

    fn rule_context(&mut self, now: f64) -> RuleContext<'_> {
        RuleContext {
            tracks: &self.tracks,
            dedup: &mut self.dedup,
            zones: &self.config.zones,
            detector: &self.config.detector,
            now,
        }
    }

    fn note_sighting(&mut self, track_id: i64, det: &Detection, now: f64) {
        if !self.seen_tracks.insert(track_id) {
            return;
        }
        *self
            .class_counts
            .entry(det.class_name.clone())
            .or_insert(0) += 1;
        self.pending_records.push(DetectionRecord {
            track_id,
            class_id: det.class_id,
            class_name: det.class_name.clone(),
            confidence: det.confidence,
            timestamp: now,
            detection_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        });
    }

    /// Running per-class object counts (first sighting of each track id).
    pub fn class_counts(&self) -> &HashMap<String, u64> {
        &self.class_counts
    }

    /// Take the first-sighting records queued since the last drain.
    pub fn drain_new_records(&mut self) -> Vec<DetectionRecord> {
        std::mem::take(&mut self.pending_records)
    }

    pub fn set_red_light(&mut self, active: bool) {
        self.red_light_active = active;
    }

    pub fn tracked_count(&self) -> usize {
        self.tracks.len()
    }

    /// Clear all per-session state (e.g. when the stream changes).
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.dedup.clear();
        self.seen_tracks.clear();
        self.class_counts.clear();
        self.pending_records.clear();
        self.frames_processed = 0;
        self.violations_emitted = 0;
    }
}
