//! Renderer trait abstraction.

use glassesmaker_core::{SceneGraph, StageViewport};
use kurbo::Size;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Konva's default transformer blue.
pub(crate) const TRANSFORMER_BLUE: Color = Color::from_rgba8(0, 161, 255, 255);

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The projected stage to draw.
    pub scene: &'a SceneGraph,
    /// Where the stage sits in the window.
    pub viewport: StageViewport,
    /// Window size in physical pixels.
    pub viewport_size: Size,
    /// Page color around the stage.
    pub background_color: Color,
    /// Stage color where no photo covers it.
    pub stage_color: Color,
    /// Transformer border and anchor stroke color.
    pub selection_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(scene: &'a SceneGraph, viewport_size: Size) -> Self {
        Self {
            scene,
            viewport: StageViewport::default(),
            viewport_size,
            background_color: Color::from_rgba8(219, 39, 119, 255),
            stage_color: Color::from_rgba8(244, 114, 182, 255),
            selection_color: TRANSFORMER_BLUE,
        }
    }

    /// Set the stage placement.
    pub fn with_viewport(mut self, viewport: StageViewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set the page color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the empty stage color.
    pub fn with_stage_color(mut self, color: Color) -> Self {
        self.stage_color = color;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Build the scene/command buffer for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);
}
