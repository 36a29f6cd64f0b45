//! Glasses Maker Render Library
//!
//! Renderer abstraction and implementations for the Custom Glasses Maker.
//! The default implementation uses Vello for GPU-accelerated rendering.

mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::{EMOJI_FONT_STACK, PngRenderResult, VelloRenderer};
