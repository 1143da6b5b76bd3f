//! Nuestra Carretera core crate.
//!
//! A side-scrolling drive down an endless road: story cards open at fixed
//! distances and hearts picked up along the way open a photo popup. Browser glue
//! and the frame loop live in [`road`]; the simulation itself (`road::world`)
//! is plain Rust and is tested natively.

use wasm_bindgen::prelude::*;

pub mod road;

pub use road::story::{Story, StoryEvent};
pub use road::tuning::Tuning;
pub use road::world::{Heart, InputFlags, Phase, Trigger, Viewport, World};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // A second init (e.g. hot reload) keeps the existing logger.
    console_log::init_with_level(log::Level::Info).ok();
}

// -----------------------------------------------------------------------------
// Pickup gallery: one of these opens at random whenever a heart is collected.
// -----------------------------------------------------------------------------

pub const HEART_IMAGES: &[&str] = &[
    "assets/images/heart1.jpg",
    "assets/images/heart2.jpg",
    "assets/images/heart3.jpg",
    "assets/images/heart4.jpg",
    "assets/images/heart5.jpg",
    "assets/images/heart6.jpg",
    "assets/images/heart7.jpg",
    "assets/images/heart8.jpg",
    "assets/images/heart9.jpg",
];

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

/// Loads the story and starts the frame loop. Resolves once the loop is running
/// (or immediately if the page has no game canvas).
#[wasm_bindgen]
pub async fn start_game() -> Result<(), JsValue> {
    road::start_road_mode().await
}

#[wasm_bindgen]
pub fn stop_game() {
    road::stop_road_mode();
}
