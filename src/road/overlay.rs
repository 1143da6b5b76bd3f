//! Story card and heart popup overlays.
//!
//! The world only emits [`Trigger`](super::world::Trigger)s; whatever shows them
//! implements [`Presenter`]. The DOM version toggles the page's prebuilt overlay
//! markup and, for story videos, schedules a delayed autoplay with a play-button
//! fallback for browsers that refuse it.
use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlImageElement, HtmlVideoElement, window};

use super::story::StoryEvent;
use super::world::{Trigger, World};

const AUTOPLAY_DELAY_MS: i32 = 2000;

/// Shows what the world triggered. Each call must eventually lead to the
/// matching resume call on the world (`continue_story` / `dismiss_popup`).
pub trait Presenter {
    fn show_story_event(&mut self, event: &StoryEvent, is_last: bool);
    fn show_heart_popup(&mut self, image: &str);
}

/// Hand a trigger from `world.update` to the presenter.
pub fn present<P: Presenter + ?Sized>(presenter: &mut P, world: &World, trigger: Trigger) {
    match trigger {
        Trigger::Story { index, is_last } => match world.story.get(index) {
            Some(event) => presenter.show_story_event(event, is_last),
            None => log::error!("story trigger for missing event {}", index),
        },
        Trigger::HeartPopup { image } => presenter.show_heart_popup(image),
    }
}

pub struct DomPresenter {
    doc: Document,
    overlay: Option<Element>,
    card: Option<Element>,
    title: Option<Element>,
    text: Option<Element>,
    media_wrap: Option<Element>,
    image: Option<HtmlImageElement>,
    video: Option<HtmlVideoElement>,
    play_btn: Option<Element>,
    heart_overlay: Option<Element>,
    heart_image: Option<HtmlImageElement>,
    autoplay: Rc<Cell<Option<i32>>>, // pending setTimeout handle
}

fn add_class(el: &Option<Element>, class: &str) {
    if let Some(el) = el {
        el.class_list().add_1(class).ok();
    }
}

fn remove_class(el: &Option<Element>, class: &str) {
    if let Some(el) = el {
        el.class_list().remove_1(class).ok();
    }
}

impl DomPresenter {
    /// Looks up the overlay markup once; missing elements are skipped later.
    pub fn new(doc: &Document) -> Self {
        let el = |id: &str| doc.get_element_by_id(id);
        Self {
            doc: doc.clone(),
            overlay: el("story-overlay"),
            card: el("story-card"),
            title: el("story-title"),
            text: el("story-text"),
            media_wrap: el("story-media-wrap"),
            image: el("story-image").and_then(|e| e.dyn_into().ok()),
            video: el("story-video").and_then(|e| e.dyn_into().ok()),
            play_btn: el("story-video-play"),
            heart_overlay: el("heart-popup-overlay"),
            heart_image: el("heart-popup-image").and_then(|e| e.dyn_into().ok()),
            autoplay: Rc::new(Cell::new(None)),
        }
    }

    fn set_body_overlay(&self, visible: bool) {
        if let Some(body) = self.doc.body() {
            let list = body.class_list();
            if visible {
                list.add_1("overlay-visible").ok();
            } else {
                list.remove_1("overlay-visible").ok();
            }
        }
    }

    fn cancel_autoplay(&self) {
        if let Some(handle) = self.autoplay.take() {
            if let Some(win) = window() {
                win.clear_timeout_with_handle(handle);
            }
        }
    }

    fn reset_video(&self) {
        if let Some(video) = &self.video {
            video.pause().ok();
            video.remove_attribute("src").ok();
            video.load();
        }
        add_class(&self.play_btn, "hidden");
    }

    fn schedule_autoplay(&self) {
        self.cancel_autoplay();
        let Some(win) = window() else { return };
        let video = self.video.clone();
        let media_wrap = self.media_wrap.clone();
        let play_btn = self.play_btn.clone();
        let handle_cell = self.autoplay.clone();
        let cb = Closure::once_into_js(move || {
            handle_cell.set(None);
            let (Some(video), Some(wrap)) = (video, media_wrap) else {
                return;
            };
            if wrap.class_list().contains("hidden") {
                return;
            }
            try_play(video, play_btn);
        });
        match win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.unchecked_ref(),
            AUTOPLAY_DELAY_MS,
        ) {
            Ok(handle) => self.autoplay.set(Some(handle)),
            Err(e) => log::warn!("could not schedule video autoplay: {:?}", e),
        }
    }

    /// Continue button: tear down media and hide the story card.
    pub fn hide_story(&self) {
        self.cancel_autoplay();
        self.reset_video();
        remove_class(&self.overlay, "visible");
        remove_class(&self.overlay, "final-event");
        add_class(&self.overlay, "hidden");
        self.set_body_overlay(false);
    }

    pub fn hide_heart_popup(&self) {
        remove_class(&self.heart_overlay, "visible");
        add_class(&self.heart_overlay, "hidden");
        self.set_body_overlay(false);
    }

    /// Play button clicked by hand after a refused autoplay.
    pub fn play_video(&self) {
        if let Some(video) = &self.video {
            try_play(video.clone(), None);
        }
        add_class(&self.play_btn, "hidden");
    }

    pub fn on_video_play(&self) {
        add_class(&self.play_btn, "hidden");
    }

    /// Offer the play button again if the video paused while the card is still up.
    pub fn on_video_pause(&self) {
        let card_up = self
            .overlay
            .as_ref()
            .is_some_and(|o| o.class_list().contains("visible"));
        let ended = self.video.as_ref().is_none_or(|v| v.ended());
        if card_up && !ended {
            remove_class(&self.play_btn, "hidden");
        }
    }
}

/// Starts playback; on rejection reveals `play_btn` (if given).
fn try_play(video: HtmlVideoElement, play_btn: Option<Element>) {
    let promise = match video.play() {
        Ok(p) => p,
        Err(_) => {
            remove_class(&play_btn, "hidden");
            return;
        }
    };
    wasm_bindgen_futures::spawn_local(async move {
        if JsFuture::from(promise).await.is_err() {
            log::debug!("video autoplay refused");
            remove_class(&play_btn, "hidden");
        }
    });
}

impl Presenter for DomPresenter {
    fn show_story_event(&mut self, event: &StoryEvent, is_last: bool) {
        self.cancel_autoplay();

        if let Some(t) = &self.title {
            t.set_text_content(Some(&event.title));
        }
        if let Some(t) = &self.text {
            t.set_text_content(Some(&event.text));
        }

        if let Some(img) = &self.image {
            img.class_list().remove_1("active").ok();
        }
        if let Some(video) = &self.video {
            video.class_list().remove_1("active").ok();
        }
        self.reset_video();

        match (&event.video, &event.image) {
            (Some(src), _) => {
                remove_class(&self.media_wrap, "hidden");
                if let Some(video) = &self.video {
                    video.class_list().add_1("active").ok();
                    video.set_src(src);
                    video.set_muted(false);
                    video.set_attribute("playsinline", "").ok();
                }
                add_class(&self.card, "has-image");
                self.schedule_autoplay();
            }
            (None, Some(src)) => {
                remove_class(&self.media_wrap, "hidden");
                if let Some(img) = &self.image {
                    img.class_list().add_1("active").ok();
                    img.set_src(src);
                    img.set_alt(&event.title);
                }
                add_class(&self.card, "has-image");
            }
            (None, None) => {
                add_class(&self.media_wrap, "hidden");
                if let Some(img) = &self.image {
                    img.set_src("");
                }
                remove_class(&self.card, "has-image");
            }
        }

        if is_last {
            add_class(&self.overlay, "final-event");
        } else {
            remove_class(&self.overlay, "final-event");
        }
        remove_class(&self.overlay, "hidden");
        add_class(&self.overlay, "visible");
        self.set_body_overlay(true);
    }

    fn show_heart_popup(&mut self, image: &str) {
        if let Some(img) = &self.heart_image {
            img.set_src(image);
        }
        remove_class(&self.heart_overlay, "hidden");
        add_class(&self.heart_overlay, "visible");
        self.set_body_overlay(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::road::story::Story;
    use crate::road::tuning::Tuning;
    use crate::road::world::{InputFlags, Viewport};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[derive(Default)]
    struct Recorder {
        shown: Vec<String>,
    }

    impl Presenter for Recorder {
        fn show_story_event(&mut self, event: &StoryEvent, is_last: bool) {
            self.shown.push(format!("story:{}:{}", event.title, is_last));
        }
        fn show_heart_popup(&mut self, image: &str) {
            self.shown.push(format!("heart:{}", image));
        }
    }

    #[test]
    fn triggers_reach_the_presenter() {
        let story = Story::from_json(
            r#"{ "events": [ { "distance": 1, "title": "hola", "text": "" } ] }"#,
        )
        .unwrap();
        let mut world = World::new(story, &["h.jpg"], Tuning::default(), Viewport::new(800.0, 600.0));
        let mut rng = Pcg32::seed_from_u64(1);
        let mut rec = Recorder::default();

        let trig = world.update(&InputFlags::default(), 16.0, &mut rng).unwrap();
        present(&mut rec, &world, trig);
        world.continue_story();

        world.distance = 400.0;
        world.hearts.push(crate::road::world::Heart {
            distance: world.distance,
            offset_y: world.car_offset_y,
        });
        let trig = world.update(&InputFlags::default(), 0.0, &mut rng).unwrap();
        present(&mut rec, &world, trig);

        assert_eq!(rec.shown, ["story:hola:true", "heart:h.jpg"]);
    }
}
