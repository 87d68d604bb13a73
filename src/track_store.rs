// src/track_store.rs
//
// Bounded per-track position history and the estimates derived from it.
// One store per processing session; the engine owns it.

use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::geometry::distance;
use crate::types::Compass;

/// Samples kept per track. Old samples fall off FIFO.
const HISTORY_CAPACITY: usize = 10;

/// Elapsed time below this between the two baseline samples makes the speed
/// estimate meaningless (division blow-up).
const MIN_SPEED_DT: f64 = 0.05;

/// Total movement over the last 5 samples below this counts as stationary.
const STATIONARY_MOVEMENT_PX: f64 = 15.0;

/// Displacement below this is noise; no direction is derived from it.
const MIN_DIRECTION_DISPLACEMENT_PX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    pub time: f64,
    pub x: i32,
    pub y: i32,
}

impl TrackSample {
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

#[derive(Debug, Clone)]
struct TrackHistory {
    samples: VecDeque<TrackSample>,
}

impl TrackHistory {
    fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    fn push(&mut self, sample: TrackSample) {
        self.samples.push_back(sample);
        if self.samples.len() > HISTORY_CAPACITY {
            self.samples.pop_front();
        }
    }

    fn newest(&self) -> Option<&TrackSample> {
        self.samples.back()
    }
}

/// Speed derived from a track's history baseline.
#[derive(Debug, Clone, Copy)]
pub struct SpeedEstimate {
    /// Unmultiplied estimate. This is what gets reported.
    pub speed_kmh: f64,
    /// `speed_kmh * multiplier`. Threshold comparisons only.
    pub adjusted_kmh: f64,
    /// Newest sample's position.
    pub position: (i32, i32),
}

pub struct TrackStore {
    tracks: HashMap<i64, TrackHistory>,
    /// Tracks silent for longer than this are evicted.
    ttl_seconds: f64,
}

impl TrackStore {
    pub fn new(ttl_seconds: f64) -> Self {
        Self {
            tracks: HashMap::new(),
            ttl_seconds,
        }
    }

    /// Append a sample, creating the history on first sighting.
    pub fn record(&mut self, track_id: i64, time: f64, x: i32, y: i32) {
        self.tracks
            .entry(track_id)
            .or_insert_with(TrackHistory::new)
            .push(TrackSample { time, x, y });
    }

    /// Read-only view of a track's samples, oldest first. Empty for
    /// unknown ids.
    pub fn history(&self, track_id: i64) -> impl Iterator<Item = &TrackSample> + '_ {
        self.tracks
            .get(&track_id)
            .into_iter()
            .flat_map(|h| h.samples.iter())
    }

    /// The two most recent samples, newest last.
    pub fn last_two(&self, track_id: i64) -> Option<(TrackSample, TrackSample)> {
        let history = self.tracks.get(&track_id)?;
        let n = history.samples.len();
        if n < 2 {
            return None;
        }
        Some((history.samples[n - 2], history.samples[n - 1]))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn sample_count(&self, track_id: i64) -> usize {
        self.tracks.get(&track_id).map_or(0, |h| h.samples.len())
    }

    /// Estimate speed over the history baseline.
    ///
    /// With 3+ samples the oldest and newest retained samples are used — a
    /// longer baseline is much more stable against per-frame jitter than the
    /// last two points. With exactly 2 samples those two are all there is.
    /// Returns `None` below 2 samples or when the baseline spans less than
    /// 0.05 s.
    pub fn speed_estimate(
        &self,
        track_id: i64,
        meters_per_pixel: f64,
        multiplier: f64,
    ) -> Option<SpeedEstimate> {
        let history = self.tracks.get(&track_id)?;
        let n = history.samples.len();
        if n < 2 {
            return None;
        }

        let (p1, p2) = if n >= 3 {
            (&history.samples[0], &history.samples[n - 1])
        } else {
            (&history.samples[n - 2], &history.samples[n - 1])
        };

        let dt = p2.time - p1.time;
        if dt < MIN_SPEED_DT {
            return None;
        }

        let dist_pixels = distance(p1.position(), p2.position());
        let speed_kmh = dist_pixels * meters_per_pixel / dt * 3.6;

        Some(SpeedEstimate {
            speed_kmh,
            adjusted_kmh: speed_kmh * multiplier,
            position: p2.position(),
        })
    }

    /// True when the last 5 samples moved less than 15 px in total.
    /// Requires at least 5 samples; fewer is never stationary.
    pub fn is_stationary(&self, track_id: i64) -> bool {
        let history = match self.tracks.get(&track_id) {
            Some(h) => h,
            None => return false,
        };
        let n = history.samples.len();
        if n < 5 {
            return false;
        }

        let mut total_movement = 0.0;
        for i in (n - 4)..n {
            total_movement += distance(
                history.samples[i - 1].position(),
                history.samples[i].position(),
            );
        }

        total_movement < STATIONARY_MOVEMENT_PX
    }

    /// Dominant travel direction from the first to the last retained sample.
    /// Requires 3+ samples and at least 10 px of displacement.
    pub fn direction(&self, track_id: i64) -> Option<Compass> {
        let history = self.tracks.get(&track_id)?;
        let n = history.samples.len();
        if n < 3 {
            return None;
        }

        let first = &history.samples[0];
        let last = &history.samples[n - 1];
        let dx = (last.x - first.x) as f64;
        let dy = (last.y - first.y) as f64;

        if (dx * dx + dy * dy).sqrt() < MIN_DIRECTION_DISPLACEMENT_PX {
            return None;
        }

        let dir = if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Compass::East
            } else {
                Compass::West
            }
        } else if dy > 0.0 {
            // +y grows downward in image coordinates
            Compass::South
        } else {
            Compass::North
        };

        Some(dir)
    }

    /// Drop tracks whose newest sample is older than the TTL. The tracker
    /// never reuses ids within a session, so a silent track is gone for good.
    pub fn evict_stale(&mut self, now: f64) {
        let ttl = self.ttl_seconds;
        let before = self.tracks.len();
        self.tracks
            .retain(|_, h| h.newest().map_or(false, |s| now - s.time <= ttl));
        let evicted = before - self.tracks.len();
        if evicted > 0 {
            debug!("Evicted {} stale track(s), {} remain", evicted, self.tracks.len());
        }
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}
