//! Road mode: the side-scrolling drive with distance-triggered story events.
//!
//! This module owns the browser glue. `start_road_mode()` looks up the canvas,
//! fetches `story.json`, wires keyboard / button listeners and starts a
//! `requestAnimationFrame` loop that runs update then render once per frame.
//! Simulation lives in [`world`], layout in [`scene`], canvas calls in [`paint`]
//! and the DOM overlays in [`overlay`].
use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::JsCast;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, EventTarget, HtmlCanvasElement, window};

pub mod clock;
pub mod overlay;
pub mod paint;
pub mod scene;
pub mod story;
pub mod tuning;
pub mod world;

use clock::FrameClock;
use overlay::{DomPresenter, present};
use scene::Scene;
use story::{STORY_URL, fetch_story};
use world::{InputFlags, Viewport, World};

const CANVAS_ID: &str = "game-canvas";
const MAX_DEVICE_PIXEL_RATIO: f64 = 2.0;

/// Runtime road state.
struct Game {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    world: World,
    clock: FrameClock,
    input: InputFlags,
    rng: Pcg32,
    presenter: DomPresenter,
}

thread_local! {
    static GAME: std::cell::RefCell<Option<Game>> = const { std::cell::RefCell::new(None) };
    /// Set while a start is waiting on the story fetch.
    static STARTING: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
    /// Bumped by every start and stop; a frame loop only runs for its own generation.
    static GENERATION: std::cell::Cell<u32> = const { std::cell::Cell::new(0) };
    static LISTENERS_INSTALLED: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Releases the start reservation on every exit path, errors included.
struct StartGuard;

impl StartGuard {
    fn acquire() -> Option<Self> {
        if STARTING.with(|s| s.replace(true)) {
            None
        } else {
            Some(StartGuard)
        }
    }
}

impl Drop for StartGuard {
    fn drop(&mut self) {
        STARTING.with(|s| s.set(false));
    }
}

fn next_generation() -> u32 {
    GENERATION.with(|g| {
        let next = g.get().wrapping_add(1);
        g.set(next);
        next
    })
}

/// Whether a game is installed and its frame loop is live.
pub fn is_road_running() -> bool {
    GAME.with(|g| g.borrow().is_some())
}

/// Run `f` against the live game, if there is one.
fn with_game(f: impl FnOnce(&mut Game)) {
    GAME.with(|cell| {
        if let Some(game) = cell.borrow_mut().as_mut() {
            f(game);
        }
    });
}

pub async fn start_road_mode() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    if is_road_running() {
        log::warn!("road mode already running");
        return Ok(());
    }

    // No surface, no game: nothing here can recover from a missing canvas.
    let Some(canvas) = doc
        .get_element_by_id(CANVAS_ID)
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
    else {
        log::warn!("#{} not found, road mode not started", CANVAS_ID);
        return Ok(());
    };
    let Some(ctx) = canvas
        .get_context("2d")?
        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
    else {
        log::warn!("2d context unavailable, road mode not started");
        return Ok(());
    };

    // Held across the fetch so an overlapping start bails out instead of
    // installing a second game.
    let Some(_reservation) = StartGuard::acquire() else {
        log::warn!("road mode already starting");
        return Ok(());
    };
    let generation = GENERATION.with(|g| g.get());

    let mut story = fetch_story(STORY_URL).await.inspect_err(|e| {
        log::error!("{}", e);
    })?;
    if GENERATION.with(|g| g.get()) != generation {
        log::info!("road mode stopped while loading, not starting");
        return Ok(());
    }
    let tuning = story.tuning.take().unwrap_or_default();
    log::info!("story loaded: {} events", story.len());

    let clock = FrameClock::new(tuning.max_frame_ms);
    let world = World::new(story, crate::HEART_IMAGES, tuning, Viewport::default());
    let mut game = Game {
        canvas: canvas.clone(),
        ctx,
        world,
        clock,
        input: InputFlags::default(),
        rng: Pcg32::from_entropy(),
        presenter: DomPresenter::new(&doc),
    };
    resize(&mut game);
    GAME.with(|g| g.replace(Some(game)));

    if !LISTENERS_INSTALLED.with(|l| l.replace(true)) {
        install_listeners(&win, &doc)?;
    }

    log::info!("road mode running");
    start_road_loop(next_generation());
    Ok(())
}

/// Listeners route through `with_game`, so one set serves every later start.
fn install_listeners(win: &web_sys::Window, doc: &web_sys::Document) -> Result<(), JsValue> {
    listen(win, "resize", |_: web_sys::Event| with_game(resize))?;
    listen(doc, "keydown", |evt: web_sys::KeyboardEvent| on_key(&evt, true))?;
    listen(doc, "keyup", |evt: web_sys::KeyboardEvent| on_key(&evt, false))?;

    if let Some(btn) = doc.get_element_by_id("story-continue") {
        listen(&btn, "click", |_: web_sys::MouseEvent| {
            with_game(|g| {
                g.presenter.hide_story();
                g.world.continue_story();
            })
        })?;
    }
    if let Some(btn) = doc.get_element_by_id("heart-popup-close") {
        listen(&btn, "click", |_: web_sys::MouseEvent| {
            with_game(|g| {
                g.presenter.hide_heart_popup();
                g.world.dismiss_popup();
            })
        })?;
    }
    if let Some(btn) = doc.get_element_by_id("story-video-play") {
        listen(&btn, "click", |_: web_sys::MouseEvent| {
            with_game(|g| g.presenter.play_video())
        })?;
    }
    if let Some(video) = doc.get_element_by_id("story-video") {
        listen(&video, "play", |_: web_sys::Event| {
            with_game(|g| g.presenter.on_video_play())
        })?;
        listen(&video, "pause", |_: web_sys::Event| {
            with_game(|g| g.presenter.on_video_pause())
        })?;
    }
    Ok(())
}

/// Drop the game; the frame loop stops rescheduling itself on the next frame.
/// A start still waiting on its fetch gives up when it resumes.
pub fn stop_road_mode() {
    next_generation();
    GAME.with(|g| g.replace(None));
}

fn listen<E>(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Space accelerates, W/Up and S/Down steer. Flags are level-triggered.
fn on_key(evt: &web_sys::KeyboardEvent, pressed: bool) {
    with_game(|g| {
        let flag = match evt.code().as_str() {
            "Space" => &mut g.input.accelerate,
            "KeyW" | "ArrowUp" => &mut g.input.up,
            "KeyS" | "ArrowDown" => &mut g.input.down,
            _ => return,
        };
        evt.prevent_default();
        *flag = pressed;
    });
}

fn resize(game: &mut Game) {
    let dpr = window()
        .map(|w| w.device_pixel_ratio())
        .filter(|d| *d > 0.0)
        .unwrap_or(1.0)
        .min(MAX_DEVICE_PIXEL_RATIO);
    let width = game.canvas.client_width() as f64;
    let height = game.canvas.client_height() as f64;
    game.canvas.set_width((width * dpr) as u32);
    game.canvas.set_height((height * dpr) as u32);
    // resizing resets the context, so the dpr scale is applied fresh each time
    game.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
    game.world.set_viewport(Viewport::new(width, height));
}

type FrameCallback = std::rc::Rc<std::cell::RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_road_loop(generation: u32) {
    let f: FrameCallback = std::rc::Rc::new(std::cell::RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        if GENERATION.with(|cur| cur.get()) != generation {
            return;
        }
        let running = GAME.with(|cell| match cell.borrow_mut().as_mut() {
            Some(game) => {
                road_tick(game, ts);
                true
            }
            None => false,
        });
        if !running {
            return;
        }
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

// --- Tick -------------------------------------------------------------------

fn road_tick(game: &mut Game, now: f64) {
    let dt = game.clock.tick(now);
    if let Some(trigger) = game.world.update(&game.input, dt, &mut game.rng) {
        present(&mut game.presenter, &game.world, trigger);
    }
    if let Some(scene) = Scene::compose(&game.world, now) {
        paint::paint(&game.ctx, &scene);
    }
}
