// src/rules/helmet.rs
//
// Color-distribution stand-in for a real helmet classifier. Samples the
// upper part of a motorcycle's bbox and asks whether enough pixels fall in
// a helmet-like band. On any pixel-level failure it degrades to a fixed
// random positive rate; the RNG is owned and seedable so tests can pin it.

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::dedup_cache::DedupCache;
use crate::types::{Detection, Frame, HelmetConfig, Violation, ViolationKind};

const NO_HELMET_CONFIDENCE: f32 = 0.8;

pub struct HelmetRule {
    config: HelmetConfig,
    rng: StdRng,
}

impl HelmetRule {
    pub fn new(config: HelmetConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic fallback path for tests and replayable sessions.
    pub fn with_seed(config: HelmetConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn check(
        &mut self,
        dedup: &mut DedupCache,
        track_id: i64,
        det: &Detection,
        frame: Option<&Frame>,
        now: f64,
    ) -> Option<Violation> {
        let no_helmet = match self.head_region_helmet_ratio(det, frame) {
            HeadRegionResult::Ratio(ratio) => ratio <= self.config.min_helmet_color_ratio,
            HeadRegionResult::Empty => return None,
            HeadRegionResult::Failed => {
                debug!(
                    "Helmet pixel analysis failed for track {}, using random fallback",
                    track_id
                );
                self.rng.gen::<f64>() < self.config.fallback_positive_rate
            }
        };

        if !no_helmet {
            return None;
        }

        if !dedup.should_report(track_id, ViolationKind::NoHelmet, now) {
            return None;
        }
        dedup.mark_reported(track_id, ViolationKind::NoHelmet, now);

        info!("⛑️  NO HELMET: motorcycle (track {})", track_id);

        Some(Violation {
            kind: ViolationKind::NoHelmet,
            track_id,
            class_name: det.class_name.clone(),
            timestamp: now,
            location: det.center(),
            confidence: NO_HELMET_CONFIDENCE,
            detail: Some("Rider without helmet".to_string()),
            speed_kmh: None,
        })
    }

    /// Fraction of head-region pixels in a helmet-like color band.
    ///
    /// Bands, in OpenCV-style HSV scales (S and V in 0..=255):
    ///   dark      S <= 100, V <= 100   (black / dark gray shells)
    ///   bright    S <= 60,  V >= 150   (white / light shells)
    ///   colorful  S >= 100, V >= 100   (saturated red, blue, ...)
    /// Hue is unconstrained in every band, so only saturation and value are
    /// computed.
    fn head_region_helmet_ratio(&self, det: &Detection, frame: Option<&Frame>) -> HeadRegionResult {
        let frame = match frame {
            Some(f) => f,
            None => return HeadRegionResult::Failed,
        };
        if frame.data.len() < frame.width * frame.height * 3 {
            return HeadRegionResult::Failed;
        }

        let [x1, y1, x2, y2] = det.bbox;
        let head_height = ((y2 - y1) as f32 * self.config.head_region_ratio) as i32;

        // Clamp to frame bounds; the box may hang off the image edge.
        let rx1 = x1.clamp(0, frame.width as i32) as usize;
        let rx2 = x2.clamp(0, frame.width as i32) as usize;
        let ry1 = y1.clamp(0, frame.height as i32) as usize;
        let ry2 = (y1 + head_height).clamp(0, frame.height as i32) as usize;

        if rx2 <= rx1 || ry2 <= ry1 {
            return HeadRegionResult::Empty;
        }

        let mut helmet_like: usize = 0;
        let total = (rx2 - rx1) * (ry2 - ry1);

        for y in ry1..ry2 {
            for x in rx1..rx2 {
                let idx = (y * frame.width + x) * 3;
                let (s, v) = saturation_value(
                    frame.data[idx],
                    frame.data[idx + 1],
                    frame.data[idx + 2],
                );

                let dark = s <= 100 && v <= 100;
                let bright = s <= 60 && v >= 150;
                let colorful = s >= 100 && v >= 100;
                if dark || bright || colorful {
                    helmet_like += 1;
                }
            }
        }

        HeadRegionResult::Ratio(helmet_like as f32 / total as f32)
    }
}

enum HeadRegionResult {
    Ratio(f32),
    Empty,
    Failed,
}

/// Saturation and value of an RGB pixel in OpenCV scales (0..=255).
fn saturation_value(r: u8, g: u8, b: u8) -> (u8, u8) {
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let s = if v == 0 {
        0
    } else {
        ((v - min) as u32 * 255 / v as u32) as u8
    };
    (s, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CooldownConfig;

    fn moto_det() -> Detection {
        Detection {
            track_id: Some(12),
            class_id: 3,
            class_name: "motorcycle".to_string(),
            bbox: [10, 10, 30, 50],
            confidence: 0.9,
        }
    }

    fn solid_frame(rgb: (u8, u8, u8)) -> Frame {
        let (w, h) = (64, 64);
        let mut data = Vec::with_capacity(w * h * 3);
        for _ in 0..(w * h) {
            data.extend_from_slice(&[rgb.0, rgb.1, rgb.2]);
        }
        Frame {
            data,
            width: w,
            height: h,
            timestamp: 0.0,
        }
    }

    fn rule() -> HelmetRule {
        HelmetRule::with_seed(HelmetConfig::default(), 7)
    }

    #[test]
    fn test_dark_region_reads_as_helmet() {
        let mut rule = rule();
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let frame = solid_frame((20, 20, 20));
        assert!(rule
            .check(&mut dedup, 12, &moto_det(), Some(&frame), 5.0)
            .is_none());
    }

    #[test]
    fn test_mid_gray_region_reads_as_no_helmet() {
        // (128,128,128) has S=0, V=128: outside all three bands.
        let mut rule = rule();
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let frame = solid_frame((128, 128, 128));
        let v = rule
            .check(&mut dedup, 12, &moto_det(), Some(&frame), 5.0)
            .expect("should fire");
        assert_eq!(v.kind, ViolationKind::NoHelmet);
        assert_eq!(v.detail.as_deref(), Some("Rider without helmet"));
    }

    #[test]
    fn test_bright_region_reads_as_helmet() {
        let mut rule = rule();
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let frame = solid_frame((240, 240, 240));
        assert!(rule
            .check(&mut dedup, 12, &moto_det(), Some(&frame), 5.0)
            .is_none());
    }

    #[test]
    fn test_head_region_off_frame_is_silent() {
        let mut rule = rule();
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let frame = solid_frame((128, 128, 128));
        let mut det = moto_det();
        det.bbox = [-60, -60, -10, -10]; // fully outside
        assert!(rule
            .check(&mut dedup, 12, &det, Some(&frame), 5.0)
            .is_none());
    }

    #[test]
    fn test_missing_frame_uses_fallback_rate() {
        // Pin the fallback by forcing its rate to the extremes.
        let mut always = HelmetRule::with_seed(
            HelmetConfig {
                fallback_positive_rate: 1.0,
                ..HelmetConfig::default()
            },
            7,
        );
        let mut dedup = DedupCache::new(CooldownConfig::default());
        assert!(always
            .check(&mut dedup, 12, &moto_det(), None, 5.0)
            .is_some());

        let mut never = HelmetRule::with_seed(
            HelmetConfig {
                fallback_positive_rate: 0.0,
                ..HelmetConfig::default()
            },
            7,
        );
        let mut dedup = DedupCache::new(CooldownConfig::default());
        assert!(never
            .check(&mut dedup, 12, &moto_det(), None, 5.0)
            .is_none());
    }

    #[test]
    fn test_cooldown_applies() {
        let mut rule = rule();
        let mut dedup = DedupCache::new(CooldownConfig::default());
        let frame = solid_frame((128, 128, 128));
        assert!(rule
            .check(&mut dedup, 12, &moto_det(), Some(&frame), 5.0)
            .is_some());
        assert!(rule
            .check(&mut dedup, 12, &moto_det(), Some(&frame), 5.4)
            .is_none());
        assert!(rule
            .check(&mut dedup, 12, &moto_det(), Some(&frame), 6.1)
            .is_some());
    }
}
