//! World state and the per-frame update stage.
//!
//! The world is a plain owned struct: the driver samples input flags, calls
//! [`World::update`] once per animation frame and forwards any [`Trigger`] to
//! the presentation layer. Nothing in here touches the DOM, so the whole state
//! machine runs under native `cargo test`.
use rand::Rng;

use super::story::{Story, StoryEvent};
use super::tuning::Tuning;

/// Which overlay (if any) currently freezes the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    /// Story card is up; `continue_story` advances to the next event.
    StoryDisplay,
    /// Pickup image is up; `dismiss_popup` just resumes.
    HeartPopup,
}

/// Level-triggered input flags sampled at the top of each update.
/// Handlers overwrite them directly; last writer wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputFlags {
    pub accelerate: bool,
    pub up: bool,
    pub down: bool,
}

/// Something the presentation layer must show before the world resumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Trigger {
    Story { index: usize, is_last: bool },
    HeartPopup { image: &'static str },
}

/// A collectible heart on the road.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Heart {
    pub distance: f64,
    /// Vertical offset from the road center, same space as the car's.
    pub offset_y: f64,
}

/// CSS-pixel viewport size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

pub struct World {
    pub tuning: Tuning,
    pub story: Story,
    gallery: &'static [&'static str],
    pub viewport: Viewport,
    pub distance: f64,
    pub speed: f64,
    pub car_offset_y: f64,
    /// Accelerate flag seen by the last running update (drives the car bob).
    pub boosting: bool,
    phase: Phase,
    next_event: usize,
    pub hearts: Vec<Heart>,
    last_spawn_anchor: f64,
}

impl World {
    pub fn new(
        story: Story,
        gallery: &'static [&'static str],
        tuning: Tuning,
        viewport: Viewport,
    ) -> Self {
        Self {
            speed: tuning.base_speed,
            last_spawn_anchor: tuning.initial_spawn_anchor(),
            tuning,
            story,
            gallery,
            viewport,
            distance: 0.0,
            car_offset_y: 0.0,
            boosting: false,
            phase: Phase::Running,
            next_event: 0,
            hearts: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.phase != Phase::Running
    }

    pub fn next_event_index(&self) -> usize {
        self.next_event
    }

    pub fn last_spawn_anchor(&self) -> f64 {
        self.last_spawn_anchor
    }

    /// The one story event currently being watched for, if any remain.
    pub fn pending_event(&self) -> Option<&StoryEvent> {
        self.story.get(self.next_event)
    }

    pub fn road_top(&self) -> f64 {
        self.viewport.height * self.tuning.road_top_ratio
    }

    pub fn road_height(&self) -> f64 {
        self.viewport.height - self.road_top()
    }

    /// Half-range of the car's vertical travel; never negative.
    pub fn max_offset(&self) -> f64 {
        (self.road_height() / 2.0 - self.tuning.vertical_margin).max(0.0)
    }

    pub fn car_x(&self) -> f64 {
        self.viewport.width * self.tuning.car_x_ratio
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let max = self.max_offset();
        self.car_offset_y = self.car_offset_y.clamp(-max, max);
    }

    /// Advance the simulation by `dt` ms (already clamped by the clock).
    pub fn update<R: Rng>(
        &mut self,
        input: &InputFlags,
        dt: f64,
        rng: &mut R,
    ) -> Option<Trigger> {
        if self.is_paused() {
            return None;
        }
        let frames = dt.max(0.0) / self.tuning.frame_ref_ms;

        self.boosting = input.accelerate;
        self.speed = if input.accelerate {
            self.tuning.boost_speed
        } else {
            self.tuning.base_speed
        };
        self.distance += self.speed * frames;

        let max_offset = self.max_offset();
        if input.up {
            self.car_offset_y -= self.tuning.vertical_speed * frames;
        }
        if input.down {
            self.car_offset_y += self.tuning.vertical_speed * frames;
        }
        self.car_offset_y = self.car_offset_y.clamp(-max_offset, max_offset);

        // Story events take priority over hearts within the same tick.
        if let Some(ev) = self.pending_event() {
            if self.distance >= ev.distance {
                log::info!(
                    "story event {} ({:?}) at distance {:.0}",
                    self.next_event,
                    ev.title,
                    self.distance
                );
                self.phase = Phase::StoryDisplay;
                return Some(Trigger::Story {
                    index: self.next_event,
                    is_last: self.next_event + 1 == self.story.len(),
                });
            }
        }

        self.spawn_hearts(max_offset, rng);
        self.retire_hearts();
        self.collect_heart(rng)
    }

    fn spawn_hearts<R: Rng>(&mut self, max_offset: f64, rng: &mut R) {
        let interval = self.tuning.heart_spawn_interval;
        if interval <= 0.0 {
            return;
        }
        while self.distance - self.last_spawn_anchor >= interval {
            let next = self.last_spawn_anchor + interval;
            if next <= self.last_spawn_anchor {
                log::warn!("spawn interval {} lost to rounding at {}", interval, next);
                break;
            }
            self.last_spawn_anchor = next;
            let spread = max_offset * self.tuning.heart_spawn_spread;
            self.hearts.push(Heart {
                distance: self.last_spawn_anchor + self.tuning.heart_spawn_ahead,
                offset_y: rng.gen_range(-1.0f64..=1.0) * spread,
            });
        }
    }

    fn retire_hearts(&mut self) {
        let cutoff = self.distance - self.tuning.heart_retire_behind;
        self.hearts.retain(|h| h.distance > cutoff);
    }

    /// Resolves at most one pickup per tick, newest heart first.
    fn collect_heart<R: Rng>(&mut self, rng: &mut R) -> Option<Trigger> {
        let hit = self.hearts.iter().rposition(|h| {
            (h.distance - self.distance).abs() < self.tuning.heart_collision_x
                && (h.offset_y - self.car_offset_y).abs() < self.tuning.heart_collision_y
        })?;
        self.hearts.remove(hit);
        if self.gallery.is_empty() {
            log::warn!("heart collected but the pickup gallery is empty");
            return None;
        }
        let image = self.gallery[rng.gen_range(0..self.gallery.len())];
        log::debug!("heart collected at distance {:.0}: {}", self.distance, image);
        self.phase = Phase::HeartPopup;
        Some(Trigger::HeartPopup { image })
    }

    /// Close the story card: resume and move on to the next event.
    pub fn continue_story(&mut self) {
        if self.phase == Phase::StoryDisplay {
            self.next_event += 1;
            self.phase = Phase::Running;
        }
    }

    /// Close the pickup popup.
    pub fn dismiss_popup(&mut self) {
        if self.phase == Phase::HeartPopup {
            self.phase = Phase::Running;
        }
    }

    /// Resume from whichever overlay is showing; no-op while running.
    pub fn resume(&mut self) {
        match self.phase {
            Phase::Running => {}
            Phase::StoryDisplay => self.continue_story(),
            Phase::HeartPopup => self.dismiss_popup(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const GALLERY: &[&str] = &["a.jpg", "b.jpg"];

    fn story(distances: &[f64]) -> Story {
        Story {
            events: distances
                .iter()
                .enumerate()
                .map(|(i, &d)| StoryEvent {
                    distance: d,
                    title: format!("event {i}"),
                    text: String::new(),
                    image: None,
                    video: None,
                })
                .collect(),
            tuning: None,
        }
    }

    fn world(distances: &[f64], gallery: &'static [&'static str]) -> World {
        World::new(
            story(distances),
            gallery,
            Tuning::default(),
            Viewport::new(800.0, 600.0),
        )
    }

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    // One reference frame advances by exactly one speed unit.
    #[test]
    fn distance_advances_by_speed_per_reference_frame() {
        let mut w = world(&[], GALLERY);
        w.update(&InputFlags::default(), 16.0, &mut rng());
        assert!((w.distance - 2.2).abs() < 1e-9);
        let boost = InputFlags {
            accelerate: true,
            ..Default::default()
        };
        w.update(&boost, 32.0, &mut rng());
        assert!((w.distance - 12.2).abs() < 1e-9);
        assert_eq!(w.speed, 5.0);
        assert!(w.boosting);
    }

    #[test]
    fn max_offset_from_viewport() {
        let w = world(&[], GALLERY);
        // road height = 600 * 0.48 = 288 -> 144 - 28
        assert!((w.max_offset() - 116.0).abs() < 1e-9);
        let mut tiny = world(&[], GALLERY);
        tiny.set_viewport(Viewport::new(100.0, 50.0));
        assert_eq!(tiny.max_offset(), 0.0);
    }

    #[test]
    fn vertical_movement_is_clamped() {
        let mut w = world(&[], &[]);
        let up = InputFlags {
            up: true,
            ..Default::default()
        };
        for _ in 0..200 {
            w.update(&up, 64.0, &mut rng());
        }
        assert_eq!(w.car_offset_y, -w.max_offset());
        let down = InputFlags {
            down: true,
            ..Default::default()
        };
        w.update(&down, 16.0, &mut rng());
        assert!((w.car_offset_y - (-w.max_offset() + 3.2)).abs() < 1e-9);
    }

    #[test]
    fn shrinking_viewport_reclamps_car() {
        let mut w = world(&[], GALLERY);
        w.car_offset_y = 100.0;
        w.set_viewport(Viewport::new(800.0, 300.0));
        assert_eq!(w.car_offset_y, w.max_offset());
    }

    #[test]
    fn story_event_pauses_and_skips_hearts() {
        let mut w = world(&[25.0], GALLERY);
        w.distance = 20.0;
        let trig = w.update(&InputFlags::default(), 64.0, &mut rng());
        assert_eq!(
            trig,
            Some(Trigger::Story {
                index: 0,
                is_last: true
            })
        );
        assert_eq!(w.phase(), Phase::StoryDisplay);
        // the first spawn anchor was crossed too, but hearts wait for the next running tick
        assert!(w.hearts.is_empty());
        let before = w.distance;
        assert_eq!(w.update(&InputFlags::default(), 64.0, &mut rng()), None);
        assert_eq!(w.distance, before);
    }

    #[test]
    fn continue_advances_index_and_resumes() {
        let mut w = world(&[5.0, 6.0], GALLERY);
        let trig = w.update(&InputFlags::default(), 64.0, &mut rng());
        assert_eq!(
            trig,
            Some(Trigger::Story {
                index: 0,
                is_last: false
            })
        );
        w.continue_story();
        assert_eq!(w.phase(), Phase::Running);
        assert_eq!(w.next_event_index(), 1);
        // second event was already passed; fires on the next tick, not the same one
        let trig = w.update(&InputFlags::default(), 0.0, &mut rng());
        assert_eq!(
            trig,
            Some(Trigger::Story {
                index: 1,
                is_last: true
            })
        );
        w.resume();
        assert_eq!(w.next_event_index(), 2);
        assert!(w.pending_event().is_none());
    }

    #[test]
    fn resume_while_running_is_noop() {
        let mut w = world(&[1000.0], GALLERY);
        w.resume();
        w.resume();
        assert_eq!(w.next_event_index(), 0);
        assert_eq!(w.phase(), Phase::Running);
    }

    #[test]
    fn mismatched_resume_actions_are_ignored() {
        let mut w = world(&[1.0], GALLERY);
        w.update(&InputFlags::default(), 16.0, &mut rng());
        assert_eq!(w.phase(), Phase::StoryDisplay);
        w.dismiss_popup();
        assert_eq!(w.phase(), Phase::StoryDisplay);
        assert_eq!(w.next_event_index(), 0);
    }

    #[test]
    fn empty_story_never_triggers() {
        let mut w = world(&[], &[]);
        for _ in 0..1000 {
            let trig = w.update(&InputFlags::default(), 64.0, &mut rng());
            assert!(!matches!(trig, Some(Trigger::Story { .. })));
        }
        assert_eq!(w.next_event_index(), 0);
    }

    #[test]
    fn first_heart_spawns_at_distance_twenty() {
        let mut w = world(&[], GALLERY);
        w.distance = 19.0;
        w.update(&InputFlags::default(), 0.0, &mut rng());
        assert!(w.hearts.is_empty());
        w.distance = 20.0;
        w.update(&InputFlags::default(), 0.0, &mut rng());
        assert_eq!(w.hearts.len(), 1);
        assert_eq!(w.hearts[0].distance, 400.0);
        assert_eq!(w.last_spawn_anchor(), 20.0);
    }

    // -380 -> 20 -> 420 -> 820: a gap of exactly one interval still spawns.
    #[test]
    fn reaching_an_anchor_exactly_spawns_its_heart_once() {
        let mut w = world(&[], &[]);
        w.distance = 820.0;
        let max = w.max_offset();
        w.spawn_hearts(max, &mut rng());
        let spawned: Vec<f64> = w.hearts.iter().map(|h| h.distance).collect();
        assert_eq!(spawned, [400.0, 800.0, 1200.0]);
        assert_eq!(w.last_spawn_anchor(), 820.0);
        w.spawn_hearts(max, &mut rng());
        assert_eq!(w.hearts.len(), 3);
    }

    #[test]
    fn just_short_of_an_anchor_spawns_nothing_for_it() {
        let mut w = world(&[], &[]);
        w.distance = 819.9;
        let max = w.max_offset();
        w.spawn_hearts(max, &mut rng());
        let spawned: Vec<f64> = w.hearts.iter().map(|h| h.distance).collect();
        assert_eq!(spawned, [400.0, 800.0]);
        assert_eq!(w.last_spawn_anchor(), 420.0);
    }

    #[test]
    fn spawner_stops_when_the_anchor_cannot_advance() {
        let tuning = Tuning {
            heart_spawn_interval: 1e-300,
            ..Tuning::default()
        };
        let mut w = World::new(story(&[]), &[], tuning, Viewport::new(800.0, 600.0));
        w.distance = 1.0;
        let max = w.max_offset();
        w.spawn_hearts(max, &mut rng());
        // -380 + 1e-300 rounds back to -380, so nothing is ever placed
        assert!(w.hearts.is_empty());
        assert_eq!(w.last_spawn_anchor(), -380.0);
    }

    #[test]
    fn heart_offsets_stay_within_spread() {
        let mut w = world(&[], &[]);
        w.distance = 40_000.0;
        let max = w.max_offset();
        w.spawn_hearts(max, &mut rng());
        let limit = max * 0.85;
        assert_eq!(w.hearts.len(), 100);
        for h in &w.hearts {
            assert!(h.offset_y.abs() <= limit + 1e-9);
        }
    }

    #[test]
    fn old_hearts_are_retired() {
        let mut w = world(&[], &[]);
        w.hearts.push(Heart {
            distance: 100.0,
            offset_y: 0.0,
        });
        w.hearts.push(Heart {
            distance: 121.0,
            offset_y: 0.0,
        });
        w.distance = 200.0;
        w.last_spawn_anchor = 200.0;
        w.car_offset_y = w.max_offset(); // keep away from the hearts
        w.update(&InputFlags::default(), 0.0, &mut rng());
        assert_eq!(w.hearts.len(), 1);
        assert_eq!(w.hearts[0].distance, 121.0);
    }

    #[test]
    fn collision_opens_popup_with_gallery_image() {
        let mut w = world(&[], GALLERY);
        w.last_spawn_anchor = 1_000.0;
        w.hearts.push(Heart {
            distance: 50.0,
            offset_y: 20.0,
        });
        let trig = w.update(&InputFlags::default(), 0.0, &mut rng());
        match trig {
            Some(Trigger::HeartPopup { image }) => assert!(GALLERY.contains(&image)),
            other => panic!("expected popup, got {other:?}"),
        }
        assert!(w.hearts.is_empty());
        assert_eq!(w.phase(), Phase::HeartPopup);
        w.resume();
        assert_eq!(w.phase(), Phase::Running);
        assert_eq!(w.next_event_index(), 0);
    }

    #[test]
    fn just_outside_window_is_not_a_hit() {
        let mut w = world(&[], GALLERY);
        w.last_spawn_anchor = 1_000.0;
        w.hearts.push(Heart {
            distance: 58.0,
            offset_y: 0.0,
        });
        w.hearts.push(Heart {
            distance: 0.0,
            offset_y: 34.0,
        });
        assert_eq!(w.update(&InputFlags::default(), 0.0, &mut rng()), None);
        assert_eq!(w.hearts.len(), 2);
        assert_eq!(w.phase(), Phase::Running);
    }

    #[test]
    fn one_hit_per_tick_newest_first() {
        let mut w = world(&[], GALLERY);
        w.last_spawn_anchor = 1_000.0;
        w.hearts.push(Heart {
            distance: 10.0,
            offset_y: 0.0,
        });
        w.hearts.push(Heart {
            distance: 20.0,
            offset_y: 0.0,
        });
        assert!(w.update(&InputFlags::default(), 0.0, &mut rng()).is_some());
        assert_eq!(w.hearts, vec![Heart {
            distance: 10.0,
            offset_y: 0.0
        }]);
        w.dismiss_popup();
        assert!(w.update(&InputFlags::default(), 0.0, &mut rng()).is_some());
        assert!(w.hearts.is_empty());
    }

    #[test]
    fn empty_gallery_removes_heart_without_pausing() {
        let mut w = world(&[], &[]);
        w.last_spawn_anchor = 1_000.0;
        w.hearts.push(Heart {
            distance: 0.0,
            offset_y: 0.0,
        });
        w.hearts.push(Heart {
            distance: 5.0,
            offset_y: 0.0,
        });
        assert_eq!(w.update(&InputFlags::default(), 0.0, &mut rng()), None);
        assert_eq!(w.phase(), Phase::Running);
        // still only one removal per tick
        assert_eq!(w.hearts.len(), 1);
    }
}
