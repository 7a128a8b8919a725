// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track and action definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an action
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Wrap an existing id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random action ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a track
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Wrap an existing id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random track ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A schedulable unit of playback work (clip, animation, effect).
///
/// `end > start` is assumed, not checked. Windows are half-open: an
/// action is live for `start <= t < end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique action ID
    pub id: ActionId,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Controller key; falls back to the owning track's key
    #[serde(default)]
    pub effect_id: Option<String>,
    /// Excluded from scheduling entirely
    #[serde(default)]
    pub disable: bool,
    /// Selection flag owned by the view layer
    #[serde(default)]
    pub selected: bool,
    /// Payload consumed only by controllers
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl Action {
    /// Create an action spanning `[start, end)`
    pub fn new(id: impl Into<ActionId>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            start,
            end,
            effect_id: None,
            disable: false,
            selected: false,
            data: None,
        }
    }

    /// Set the controller key
    pub fn with_effect(mut self, effect_id: impl Into<String>) -> Self {
        self.effect_id = Some(effect_id.into());
        self
    }

    /// Attach controller payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the action disabled
    pub fn disabled(mut self) -> Self {
        self.disable = true;
        self
    }

    /// Length of the window
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` falls inside `[start, end)`
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }
}

/// An ordered container of actions sharing a media source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Media source reference
    #[serde(default)]
    pub source: Option<String>,
    /// Default controller key for the track's actions
    #[serde(default)]
    pub controller: Option<String>,
    /// Hidden tracks never contribute active actions
    #[serde(default)]
    pub hidden: bool,
    /// Whether the track is locked for editing
    #[serde(default)]
    pub lock: bool,
    /// Actions on this track
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Track {
    /// Create a new track with a random id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TrackId::generate(),
            name: name.into(),
            source: None,
            controller: None,
            hidden: false,
            lock: false,
            actions: Vec::new(),
        }
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<TrackId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the default controller key
    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Set the media source reference
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Append an action
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Append an action
    pub fn push_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// End of the last-finishing action
    pub fn duration(&self) -> f64 {
        self.actions.iter().map(|a| a.end).fold(0.0, f64::max)
    }

    /// Resolve the controller key for one of this track's actions
    pub fn effect_for<'a>(&'a self, action: &'a Action) -> Option<&'a str> {
        action
            .effect_id
            .as_deref()
            .or(self.controller.as_deref())
    }
}
