//! Render layout, computed from the world without touching it.
//!
//! [`Scene::compose`] resolves every scroll-dependent number (parallax offsets,
//! lane marker positions, pickup and car screen coordinates) so the painter only
//! has to issue canvas calls. Layers are listed back to front.
use super::world::World;

/// Per-layer multipliers on distance; smaller reads as farther away.
pub const PARALLAX_CLOUDS: f64 = 0.05;
pub const PARALLAX_MOUNTAINS: f64 = 0.12;
pub const PARALLAX_HILLS: f64 = 0.35;
pub const PARALLAX_GROUND: f64 = 0.5;
/// The ground strip tiles scroll at half the ground ratio, so on screen they
/// move slower than the hills.
pub const GROUND_TILE_SCROLL: f64 = 0.5;

pub const MOUNTAIN_SEGMENT_W: f64 = 900.0;
pub const HILL_SEGMENT_W: f64 = 500.0;
pub const GROUND_TILE_W: f64 = 100.0;
pub const LANE_LINE_SPACING: f64 = 70.0;
pub const LANE_LINE_LENGTH: f64 = 32.0;
pub const LANE_LINE_WIDTH: f64 = 5.0;

/// Sprite art is authored for a 420px short side.
const REFERENCE_SIZE: f64 = 420.0;
/// Pickups this far past either screen edge are not drawn.
const HEART_CULL_MARGIN: f64 = 30.0;
const BOB_PERIOD_MS: f64 = 70.0;
const BOB_AMPLITUDE: f64 = 1.2;

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub road_top: f64,
    pub road_height: f64,
    /// Sprite scale for hearts and the car.
    pub scale: f64,
    pub cloud_offset: f64,
    /// Scroll offset already reduced modulo the layer's segment width.
    pub mountain_offset: f64,
    pub hill_offset: f64,
    pub ground_offset: f64,
    pub lane_lines: Vec<f64>,
    pub hearts: Vec<(f64, f64)>,
    pub car: (f64, f64),
    pub car_bob: f64,
}

impl Scene {
    /// `None` when there is nothing to draw into.
    pub fn compose(world: &World, now_ms: f64) -> Option<Scene> {
        let width = world.viewport.width;
        let height = world.viewport.height;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let distance = world.distance;
        let road_top = world.road_top();
        let road_height = world.road_height();
        let center_y = road_top + road_height / 2.0;
        let car_x = world.car_x();

        let lane_start = -(distance % LANE_LINE_SPACING);
        let mut lane_lines = Vec::new();
        let mut x = lane_start;
        while x < width + LANE_LINE_SPACING {
            lane_lines.push(x);
            x += LANE_LINE_SPACING;
        }

        let hearts = world
            .hearts
            .iter()
            .map(|h| (car_x + (h.distance - distance), center_y + h.offset_y))
            .filter(|(hx, _)| *hx >= -HEART_CULL_MARGIN && *hx <= width + HEART_CULL_MARGIN)
            .collect();

        let car_bob = if world.boosting {
            (now_ms / BOB_PERIOD_MS).sin() * BOB_AMPLITUDE
        } else {
            0.0
        };

        Some(Scene {
            width,
            height,
            road_top,
            road_height,
            scale: width.min(height) / REFERENCE_SIZE,
            cloud_offset: (distance * PARALLAX_CLOUDS) % (width + 200.0),
            mountain_offset: (distance * PARALLAX_MOUNTAINS) % MOUNTAIN_SEGMENT_W,
            hill_offset: (distance * PARALLAX_HILLS) % HILL_SEGMENT_W,
            ground_offset: (distance * PARALLAX_GROUND * GROUND_TILE_SCROLL) % GROUND_TILE_W,
            lane_lines,
            hearts,
            car: (car_x, center_y + world.car_offset_y),
            car_bob,
        })
    }

    pub fn lane_center_y(&self) -> f64 {
        self.road_top + self.road_height / 2.0
    }
}
