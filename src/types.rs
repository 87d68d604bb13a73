use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detector: DetectorConfig,
    pub zones: ZoneConfig,
    pub cooldowns: CooldownConfig,
    pub helmet: HelmetConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Speed limit used for the speeding rule, in km/h.
    pub speed_threshold_kmh: f64,
    /// Multiplier applied to the estimated speed before the threshold
    /// comparison. The reported speed is always the unmultiplied estimate.
    pub speed_multiplier: f64,
    /// Scene calibration constant. Pixel distances × this = meters.
    pub meters_per_pixel: f64,
    /// Tracks with no new sample for this long are evicted from the store.
    pub track_ttl_seconds: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            speed_threshold_kmh: 20.0,
            speed_multiplier: 1.5,
            meters_per_pixel: 0.15,
            track_ttl_seconds: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Polygon within which vehicle rules (speeding, parking, wrong-way) apply.
    pub monitored: Vec<(i32, i32)>,
    /// No-parking polygons. A vehicle must be inside one to trigger
    /// illegal parking.
    pub restricted: Vec<Vec<(i32, i32)>>,
    /// Stop-line segment for the red-light rule.
    pub red_light_line: ((i32, i32), (i32, i32)),
    /// Proximity buffer around the stop line, in pixels.
    pub red_light_buffer_px: i32,
    /// Legal travel direction in the monitored lanes.
    pub expected_direction: Compass,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        // Scene defaults for a 1920x1080 camera: a combined ROI covering both
        // lanes, a stop line at 70% height, and one no-parking zone per lane.
        let (w, h) = (1920, 1080);
        Self {
            monitored: vec![
                (w / 10, h),
                (w * 9 / 10, h),
                (w * 9 / 10, h * 2 / 5),
                (w / 10, h * 2 / 5),
            ],
            restricted: vec![
                vec![
                    (w * 15 / 100, h * 3 / 5),
                    (w * 35 / 100, h * 3 / 5),
                    (w * 35 / 100, h * 4 / 5),
                    (w * 15 / 100, h * 4 / 5),
                ],
                vec![
                    (w * 65 / 100, h * 3 / 5),
                    (w * 85 / 100, h * 3 / 5),
                    (w * 85 / 100, h * 4 / 5),
                    (w * 65 / 100, h * 4 / 5),
                ],
            ],
            red_light_line: ((w / 10, h * 7 / 10), (w * 9 / 10, h * 7 / 10)),
            red_light_buffer_px: 20,
            expected_direction: Compass::South,
        }
    }
}

/// Per-kind minimum seconds between two reports for the same track.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub speeding_secs: f64,
    pub red_light_secs: f64,
    pub wrong_way_secs: f64,
    pub illegal_parking_secs: f64,
    pub no_helmet_secs: f64,
    pub unauthorized_person_secs: f64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            speeding_secs: 3.0,
            red_light_secs: 5.0,
            wrong_way_secs: 5.0,
            illegal_parking_secs: 8.0,
            no_helmet_secs: 1.0,
            unauthorized_person_secs: 1.0,
        }
    }
}

impl CooldownConfig {
    pub fn for_kind(&self, kind: ViolationKind) -> f64 {
        match kind {
            ViolationKind::Speeding => self.speeding_secs,
            ViolationKind::RedLight => self.red_light_secs,
            ViolationKind::WrongWay => self.wrong_way_secs,
            ViolationKind::IllegalParking => self.illegal_parking_secs,
            ViolationKind::NoHelmet => self.no_helmet_secs,
            ViolationKind::UnauthorizedPerson => self.unauthorized_person_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelmetConfig {
    /// Fraction of the bbox height, from the top, sampled as the head region.
    pub head_region_ratio: f32,
    /// Helmet considered present when at least this fraction of head-region
    /// pixels falls in a helmet-like color band.
    pub min_helmet_color_ratio: f32,
    /// Positive rate of the random fallback when pixel analysis fails.
    pub fallback_positive_rate: f64,
}

impl Default for HelmetConfig {
    fn default() -> Self {
        Self {
            head_region_ratio: 0.3,
            min_helmet_color_ratio: 0.3,
            fallback_positive_rate: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// One tracked object in one frame, as produced by the external tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Stable per-session id. `None` (or an absent key in the dump) means
    /// the tracker has not locked onto the object yet; such detections are
    /// skipped for the frame.
    #[serde(default)]
    pub track_id: Option<i64>,
    pub class_id: i64,
    pub class_name: String,
    /// [x1, y1, x2, y2] in original image coordinates.
    pub bbox: [i32; 4],
    pub confidence: f32,
}

impl Detection {
    pub fn center(&self) -> (i32, i32) {
        let [x1, y1, x2, y2] = self.bbox;
        ((x1 + x2) / 2, (y1 + y2) / 2)
    }
}

/// One frame's worth of detections, as replayed from a tracker dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameBatch {
    pub frame_id: u64,
    pub timestamp: f64,
    pub detections: Vec<Detection>,
}

/// Raw RGB pixels for one frame. Only the no-helmet heuristic looks at these.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp: f64,
}

// ============================================================================
// VIOLATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Speeding,
    RedLight,
    WrongWay,
    IllegalParking,
    NoHelmet,
    UnauthorizedPerson,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Speeding => "speeding",
            ViolationKind::RedLight => "red_light",
            ViolationKind::WrongWay => "wrong_way",
            ViolationKind::IllegalParking => "illegal_parking",
            ViolationKind::NoHelmet => "no_helmet",
            ViolationKind::UnauthorizedPerson => "unauthorized_person",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A confirmed, deduplicated traffic violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Id of the offending object.
    pub track_id: i64,
    /// Class of the offending object (car, truck, person, ...).
    pub class_name: String,
    /// Stream time in seconds when the violation was confirmed.
    pub timestamp: f64,
    /// Object center at confirmation, in image pixels.
    pub location: (i32, i32),
    /// Rule confidence in [0, 1].
    pub confidence: f32,
    /// Human-readable context, where the rule has any.
    pub detail: Option<String>,
    /// Estimated (unmultiplied) speed, speeding rule only.
    pub speed_kmh: Option<f64>,
}

/// First sighting of a track id, queued for the detection record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub track_id: i64,
    pub class_id: i64,
    pub class_name: String,
    pub confidence: f32,
    pub timestamp: f64,
    /// Calendar date (YYYY-MM-DD) derived from the wall clock at insert time.
    pub detection_date: String,
}

// ============================================================================
// DIRECTIONS
// ============================================================================

/// Dominant travel direction in image coordinates (+y is south).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compass {
    North,
    South,
    East,
    West,
}

impl Compass {
    pub fn opposite(&self) -> Compass {
        match self {
            Compass::North => Compass::South,
            Compass::South => Compass::North,
            Compass::East => Compass::West,
            Compass::West => Compass::East,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compass::North => "north",
            Compass::South => "south",
            Compass::East => "east",
            Compass::West => "west",
        }
    }
}

impl std::fmt::Display for Compass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
