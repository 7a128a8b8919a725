// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in demo timeline.

use serde_json::json;
use timeline_engine::{Action, Track};

/// Effect keys the player registers controllers for
pub const EFFECT_KINDS: [&str; 3] = ["video", "audio", "image"];

/// A short timeline touching every controller, including an overlap,
/// a per-action effect override and a disabled clip
pub fn timeline() -> Vec<Track> {
    vec![
        Track::new("Video")
            .with_id("video-track")
            .with_controller("video")
            .with_action(
                Action::new("intro", 0.0, 2.0)
                    .with_name("Intro")
                    .with_data(json!({ "src": "intro.mp4" })),
            )
            .with_action(
                Action::new("main", 1.5, 4.0)
                    .with_name("Main")
                    .with_data(json!({ "src": "main.mp4" })),
            )
            .with_action(
                Action::new("title", 0.5, 1.5)
                    .with_name("Title card")
                    .with_effect("image")
                    .with_data(json!({ "src": "title.png" })),
            ),
        Track::new("Music")
            .with_id("music-track")
            .with_controller("audio")
            .with_source("soundtrack.ogg")
            .with_action(Action::new("bed", 0.0, 4.5).with_data(json!({ "volume": 0.8 }))),
        Track::new("Overlays")
            .with_id("overlay-track")
            .with_controller("image")
            .with_action(
                Action::new("logo", 3.0, 4.5)
                    .with_name("Logo")
                    .with_data(json!({ "src": "logo.png" })),
            )
            .with_action(
                Action::new("watermark", 0.0, 4.5)
                    .with_data(json!({ "src": "draft.png" }))
                    .disabled(),
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_engine::ActionIndex;

    #[test]
    fn test_demo_uses_every_effect_kind() {
        let tracks = timeline();
        let index = ActionIndex::build(&tracks);
        for action in index.actions() {
            let key = index.track_of(&action.id).and_then(|track| track.effect_for(action));
            assert!(key.is_some_and(|key| EFFECT_KINDS.contains(&key)));
        }
        assert!((index.duration() - 4.5).abs() < f64::EPSILON);
    }
}
