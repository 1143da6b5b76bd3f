//! Story data: the ordered list of distance-triggered narrative events.
//!
//! Loaded once from `story.json` before the loop starts and sorted by trigger
//! distance. The world only ever reads it by index afterwards.
use serde::Deserialize;
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, window};

use super::tuning::Tuning;

pub const STORY_URL: &str = "story.json";

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StoryEvent {
    /// Trigger distance.
    pub distance: f64,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Story {
    #[serde(default)]
    pub events: Vec<StoryEvent>,
    /// Optional gameplay overrides shipped alongside the story.
    #[serde(default)]
    pub tuning: Option<Tuning>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no window available")]
    NoWindow,
    #[error("fetching story failed: {0}")]
    Fetch(String),
    #[error("story.json is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("story.json tuning has an unusable {field}")]
    BadTuning { field: &'static str },
}

impl From<LoadError> for JsValue {
    fn from(err: LoadError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl Story {
    /// Parse and sort a story document.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        // JSON has no NaN or infinity, and out-of-range numbers fail to parse,
        // so every distance here is finite.
        let mut story: Story = serde_json::from_str(json)?;
        if let Some(tuning) = &story.tuning {
            tuning
                .validate()
                .map_err(|field| LoadError::BadTuning { field })?;
        }
        story.sort_events();
        Ok(story)
    }

    /// Stable ascending sort by trigger distance; equal distances keep file order.
    pub fn sort_events(&mut self) {
        self.events.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StoryEvent> {
        self.events.get(index)
    }
}

/// One-shot fetch of the story document.
pub async fn fetch_story(url: &str) -> Result<Story, LoadError> {
    let win = window().ok_or(LoadError::NoWindow)?;
    let resp = JsFuture::from(win.fetch_with_str(url))
        .await
        .map_err(js_err)?;
    let resp: Response = resp.dyn_into().map_err(js_err)?;
    if !resp.ok() {
        return Err(LoadError::Fetch(format!("{} returned {}", url, resp.status())));
    }
    let text = JsFuture::from(resp.text().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    let text = text
        .as_string()
        .ok_or_else(|| LoadError::Fetch("response body is not text".into()))?;
    Story::from_json(&text)
}

fn js_err(v: JsValue) -> LoadError {
    LoadError::Fetch(v.as_string().unwrap_or_else(|| format!("{:?}", v)))
}
