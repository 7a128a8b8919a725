// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flat lookups over a track set.

use crate::model::{Action, ActionId, Track, TrackId};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Derived lookups over a set of tracks.
///
/// The index owns its own copies of every action; the caller's tracks are
/// never touched again. Track entries keep their metadata only, with the
/// action list held in the action table.
#[derive(Debug, Clone, Default)]
pub struct ActionIndex {
    actions: IndexMap<ActionId, Action>,
    tracks: IndexMap<TrackId, Track>,
    members: IndexMap<TrackId, Vec<ActionId>>,
    track_of: HashMap<ActionId, TrackId>,
    sorted: Vec<ActionId>,
}

impl ActionIndex {
    /// Index a track set
    pub fn build(tracks: &[Track]) -> Self {
        let mut index = Self::default();

        for track in tracks {
            if index.tracks.contains_key(&track.id) {
                tracing::warn!(
                    "Duplicate track id {}; skipping it and its {} actions",
                    track.id,
                    track.actions.len()
                );
                continue;
            }
            let mut meta = track.clone();
            meta.actions = Vec::new();
            let members = index.members.entry(track.id.clone()).or_default();

            for action in &track.actions {
                if index.actions.contains_key(&action.id) {
                    tracing::warn!(
                        "Duplicate action id {} on track {}; keeping the first definition",
                        action.id,
                        track.id
                    );
                    continue;
                }
                index.actions.insert(action.id.clone(), action.clone());
                index.track_of.insert(action.id.clone(), track.id.clone());
                members.push(action.id.clone());
            }
            index.tracks.insert(track.id.clone(), meta);
        }

        index.resort();
        tracing::debug!(
            tracks = index.tracks.len(),
            actions = index.actions.len(),
            "Indexed tracks"
        );
        index
    }

    /// Rebuild the start-ordered schedule.
    ///
    /// Stable: equal starts keep encounter order.
    pub(crate) fn resort(&mut self) {
        let mut sorted: Vec<ActionId> = self.actions.keys().cloned().collect();
        sorted.sort_by(|a, b| self.actions[a].start.total_cmp(&self.actions[b].start));
        self.sorted = sorted;
    }

    /// Look up an action
    pub fn action(&self, id: &ActionId) -> Option<&Action> {
        self.actions.get(id)
    }

    pub(crate) fn action_mut(&mut self, id: &ActionId) -> Option<&mut Action> {
        self.actions.get_mut(id)
    }

    /// Track owning an action
    pub fn track_of(&self, id: &ActionId) -> Option<&Track> {
        self.track_of.get(id).and_then(|track_id| self.tracks.get(track_id))
    }

    /// Look up a track
    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// Action ids ordered by start time
    pub fn sorted_ids(&self) -> &[ActionId] {
        &self.sorted
    }

    /// All actions in encounter order
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    /// All tracks (metadata only) in supplied order
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Actions of one track in their original order
    pub fn track_actions(&self, id: &TrackId) -> impl Iterator<Item = &Action> {
        self.members
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|action_id| self.actions.get(action_id))
    }

    /// Number of indexed actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no actions are indexed
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// End of the last-finishing action
    pub fn duration(&self) -> f64 {
        self.actions.values().map(|a| a.end).fold(0.0, f64::max)
    }
}
