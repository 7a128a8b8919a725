// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tracing-backed stand-ins for media controllers.

use timeline_engine::{Controller, EngineView, HookContext};

/// Per-controller dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookStats {
    /// `enter` calls
    pub entered: u32,
    /// `leave` calls
    pub left: u32,
    /// `update` calls
    pub updates: u64,
    /// `start` calls
    pub started: u32,
    /// `stop` calls
    pub stopped: u32,
}

/// Controller that logs every hook for one effect type
#[derive(Debug)]
pub struct TraceController {
    kind: String,
    stats: HookStats,
    surface: Option<(u32, u32)>,
    destroyed: bool,
}

impl TraceController {
    /// Create a controller for `kind`
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            stats: HookStats::default(),
            surface: None,
            destroyed: false,
        }
    }

    /// Effect type this controller stands in for
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Counters so far
    pub fn stats(&self) -> HookStats {
        self.stats
    }

    /// Render size reported by the last viewer attachment
    pub fn surface(&self) -> Option<(u32, u32)> {
        self.surface
    }

    /// Whether `destroy` ran
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn source<'a>(ctx: &'a HookContext<'_>) -> &'a str {
        ctx.action
            .data
            .as_ref()
            .and_then(|data| data.get("src"))
            .and_then(serde_json::Value::as_str)
            .or(ctx.track.source.as_deref())
            .unwrap_or("-")
    }
}

impl Controller for TraceController {
    fn start(&mut self, ctx: &HookContext<'_>) {
        self.stats.started += 1;
        tracing::debug!(controller = %self.kind, action = %ctx.action.id, time = ctx.time, "start");
    }

    fn stop(&mut self, ctx: &HookContext<'_>) {
        self.stats.stopped += 1;
        tracing::debug!(controller = %self.kind, action = %ctx.action.id, time = ctx.time, "stop");
    }

    fn enter(&mut self, ctx: &HookContext<'_>) {
        self.stats.entered += 1;
        tracing::info!(
            controller = %self.kind,
            action = %ctx.action.id,
            track = %ctx.track.name,
            src = Self::source(ctx),
            time = ctx.time,
            "enter"
        );
    }

    fn update(&mut self, ctx: &HookContext<'_>) {
        self.stats.updates += 1;
        let local = ctx.time - ctx.action.start;
        tracing::trace!(controller = %self.kind, action = %ctx.action.id, local, "update");
    }

    fn leave(&mut self, ctx: &HookContext<'_>) {
        self.stats.left += 1;
        tracing::info!(controller = %self.kind, action = %ctx.action.id, time = ctx.time, "leave");
    }

    fn viewer_update(&mut self, engine: EngineView<'_>) {
        let (width, height) = engine.render_size();
        self.surface = Some((width, height));
        tracing::debug!(controller = %self.kind, width, height, "Viewer attached");
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        tracing::debug!(controller = %self.kind, stats = ?self.stats, "Controller destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use timeline_engine::{
        shared, Action, ControllerRegistry, Engine, EngineConfig, HeadlessViewer, PlayOptions,
        Track,
    };

    #[test]
    fn test_counts_every_hook() {
        let video = shared(TraceController::new("video"));
        let controllers = ControllerRegistry::new().with("video", video.clone());
        let mut engine = Engine::new(EngineConfig::default(), controllers);
        engine.attach_viewer(HeadlessViewer::new(800, 600)).unwrap();
        engine.set_render_view(800, 600);
        engine.set_tracks(&[Track::new("V")
            .with_controller("video")
            .with_action(Action::new("clip", 0.0, 1.0).with_data(json!({ "src": "a.mp4" })))]);

        engine.play(PlayOptions::default());
        engine.re_render();
        engine.pause();
        engine.re_render();
        engine.destroy();

        let controller = video.lock();
        assert_eq!(
            controller.stats(),
            HookStats {
                entered: 1,
                left: 1,
                updates: 1,
                started: 1,
                stopped: 1,
            }
        );
        assert_eq!(controller.surface(), Some((1920, 1080)));
        assert!(controller.is_destroyed());
        assert_eq!(controller.kind(), "video");
    }
}
