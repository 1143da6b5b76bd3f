// Gameplay tuning. Defaults are the shipped game; `story.json` may override any
// subset through an optional `"tuning"` object.
use serde::Deserialize;

/// All constants read by the update and render stages.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    /// Distance units per reference frame while cruising.
    pub base_speed: f64,
    /// Distance units per reference frame while accelerate is held.
    pub boost_speed: f64,
    /// Duration (ms) that one unit of speed is defined against (~60fps).
    pub frame_ref_ms: f64,
    /// Upper bound on a single frame's elapsed time.
    pub max_frame_ms: f64,
    /// Fraction of the viewport height where the road begins.
    pub road_top_ratio: f64,
    /// Vertical car speed (pixels per reference frame).
    pub vertical_speed: f64,
    /// Distance kept between the car's travel bounds and the road edges.
    pub vertical_margin: f64,
    /// Car position as a fraction of the viewport width.
    pub car_x_ratio: f64,
    pub heart_spawn_interval: f64,
    /// How far ahead of the anchor a new heart is placed.
    pub heart_spawn_ahead: f64,
    /// Fraction of the lane bounds used for random heart placement.
    pub heart_spawn_spread: f64,
    /// Hearts this far behind the car are dropped.
    pub heart_retire_behind: f64,
    pub heart_collision_x: f64,
    pub heart_collision_y: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_speed: 2.2,
            boost_speed: 5.0,
            frame_ref_ms: 16.0,
            max_frame_ms: 64.0,
            road_top_ratio: 0.52,
            vertical_speed: 3.2,
            vertical_margin: 28.0,
            car_x_ratio: 0.28,
            heart_spawn_interval: 400.0,
            heart_spawn_ahead: 380.0,
            heart_spawn_spread: 0.85,
            heart_retire_behind: 80.0,
            heart_collision_x: 58.0,
            heart_collision_y: 34.0,
        }
    }
}

/// Smallest spawn interval accepted from `story.json`.
pub const MIN_SPAWN_INTERVAL: f64 = 1.0;
/// Upper bound on hearts a single update may place.
pub const MAX_SPAWNS_PER_TICK: f64 = 1024.0;

impl Tuning {
    /// Anchor the spawner starts from, so the first heart is visible right away.
    pub fn initial_spawn_anchor(&self) -> f64 {
        -self.heart_spawn_ahead
    }

    /// Furthest a single update can move the car.
    pub fn max_step(&self) -> f64 {
        self.base_speed.max(self.boost_speed) * self.max_frame_ms / self.frame_ref_ms
    }

    /// Checks override values the update stage cannot run with. Returns the
    /// `story.json` name of the first offending field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let positive = [
            ("baseSpeed", self.base_speed),
            ("boostSpeed", self.boost_speed),
            ("frameRefMs", self.frame_ref_ms),
            ("maxFrameMs", self.max_frame_ms),
            ("heartSpawnInterval", self.heart_spawn_interval),
        ];
        let non_negative = [
            ("verticalSpeed", self.vertical_speed),
            ("verticalMargin", self.vertical_margin),
            ("heartSpawnAhead", self.heart_spawn_ahead),
            ("heartRetireBehind", self.heart_retire_behind),
            ("heartCollisionX", self.heart_collision_x),
            ("heartCollisionY", self.heart_collision_y),
        ];
        let unit = [
            ("roadTopRatio", self.road_top_ratio),
            ("carXRatio", self.car_x_ratio),
            ("heartSpawnSpread", self.heart_spawn_spread),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(name);
            }
        }
        for (name, v) in non_negative {
            if !(v.is_finite() && v >= 0.0) {
                return Err(name);
            }
        }
        for (name, v) in unit {
            if !(0.0..=1.0).contains(&v) {
                return Err(name);
            }
        }

        // the spawner walks one interval at a time; keep every walk short
        let interval = self.heart_spawn_interval;
        let longest_walk = self.max_step().max(self.heart_spawn_ahead);
        if interval < MIN_SPAWN_INTERVAL || longest_walk > interval * MAX_SPAWNS_PER_TICK {
            return Err("heartSpawnInterval");
        }
        Ok(())
    }
}
