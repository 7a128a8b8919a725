// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewer port.
//!
//! The viewer is the host container the engine renders into. It must expose
//! a renderer surface under a known role; screener and stage surfaces are
//! optional.

use crate::config::EngineConfig;
use crate::error::EngineError;
use indexmap::IndexMap;
use std::fmt;

/// A drawable element located inside a viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    /// Element id
    pub id: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Surface {
    /// Create a surface
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }

    fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Host container queried by role when attached
pub trait Viewer {
    /// Find the element carrying `role`
    fn locate(&self, role: &str) -> Option<Surface>;
}

/// In-memory viewer for hosts without a display
#[derive(Debug, Clone, Default)]
pub struct HeadlessViewer {
    surfaces: IndexMap<String, Surface>,
}

impl HeadlessViewer {
    /// Viewer with a `renderer` surface of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self::empty().with_surface("renderer", Surface::new("renderer", width, height))
    }

    /// Viewer without any surfaces
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace the surface for `role`
    pub fn with_surface(mut self, role: impl Into<String>, surface: Surface) -> Self {
        self.surfaces.insert(role.into(), surface);
        self
    }
}

impl Viewer for HeadlessViewer {
    fn locate(&self, role: &str) -> Option<Surface> {
        self.surfaces.get(role).cloned()
    }
}

/// A successfully wired viewer
pub(crate) struct Attachment {
    viewer: Box<dyn Viewer>,
    pub(crate) renderer: Surface,
    pub(crate) screener: Option<Surface>,
    pub(crate) stage: Option<Surface>,
}

impl Attachment {
    pub(crate) fn viewer(&self) -> &dyn Viewer {
        self.viewer.as_ref()
    }

    /// Locate the elements the engine needs.
    ///
    /// Fails when the renderer is missing or cannot be drawn into.
    pub(crate) fn locate(
        viewer: Box<dyn Viewer>,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let renderer = viewer
            .locate(&config.renderer_role)
            .ok_or_else(|| EngineError::ViewerMisconfigured {
                role: config.renderer_role.clone(),
            })?;
        if !renderer.is_drawable() {
            return Err(EngineError::EmptyRenderer {
                id: renderer.id,
                width: renderer.width,
                height: renderer.height,
            });
        }

        let screener = viewer.locate(&config.screener_role);
        let stage = viewer.locate(&config.stage_role);
        Ok(Self {
            viewer,
            renderer,
            screener,
            stage,
        })
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("renderer", &self.renderer)
            .field("screener", &self.screener)
            .field("stage", &self.stage)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_viewer_attaches() {
        let viewer =
            HeadlessViewer::new(640, 360).with_surface("stage", Surface::new("stage", 640, 360));
        let attachment = Attachment::locate(Box::new(viewer), &EngineConfig::default()).unwrap();
        assert_eq!(attachment.renderer.width, 640);
        assert!(attachment.stage.is_some());
        assert!(attachment.screener.is_none());
    }

    #[test]
    fn test_missing_renderer_is_an_error() {
        let err = Attachment::locate(Box::new(HeadlessViewer::empty()), &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::ViewerMisconfigured { ref role } if role == "renderer"));
    }

    #[test]
    fn test_zero_sized_renderer_is_an_error() {
        let viewer =
            HeadlessViewer::empty().with_surface("renderer", Surface::new("canvas", 0, 1080));
        let err = Attachment::locate(Box::new(viewer), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyRenderer { width: 0, .. }));
    }

    #[test]
    fn test_renderer_role_is_configurable() {
        let config = EngineConfig {
            renderer_role: "canvas".to_string(),
            ..EngineConfig::default()
        };
        let viewer = HeadlessViewer::empty().with_surface("canvas", Surface::new("c", 10, 10));
        assert!(Attachment::locate(Box::new(viewer), &config).is_ok());
    }
}
