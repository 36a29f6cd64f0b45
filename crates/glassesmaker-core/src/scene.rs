//! Projection of the state onto a layered scene.

use crate::photo::{CoverFit, Photo};
use crate::selection::{Handle, transformer_handles};
use crate::sticker::{GlyphExtent, StickerNode};
use crate::transform::BoundBox;
use crate::viewport::STAGE_SIZE;
use kurbo::{Affine, Rect, Size};

/// Background photo stretched over the stage with cover-fit.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoLayer {
    pub photo: Photo,
    pub fit: CoverFit,
}

/// The sticker glyph as styled text.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphLayer {
    pub node: StickerNode,
    /// Unscaled layout box of the glyph in node-local coordinates.
    pub local_bounds: Rect,
}

impl GlyphLayer {
    pub fn transform(&self) -> Affine {
        self.node.transform()
    }
}

/// The transform-handle overlay bound to the sticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformerLayer {
    pub bounds: BoundBox,
    pub handles: Vec<Handle>,
}

/// One drawable layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    Photo(PhotoLayer),
    Glyph(GlyphLayer),
    Transformer(TransformerLayer),
}

/// Layers in back-to-front order over a fixed-size stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    pub size: Size,
    pub layers: Vec<SceneNode>,
}

impl SceneGraph {
    /// Build the scene for a photo, the live sticker node and the selection.
    ///
    /// The transformer layer is present only when the sticker is selected and
    /// the overlay is visible.
    pub fn project(
        photo: Option<&Photo>,
        node: &StickerNode,
        extent: GlyphExtent,
        selected: bool,
        overlay_visible: bool,
    ) -> Self {
        let stage = Rect::from_origin_size(kurbo::Point::ZERO, STAGE_SIZE);
        let mut layers = Vec::with_capacity(3);
        if let Some(photo) = photo {
            layers.push(SceneNode::Photo(PhotoLayer {
                photo: photo.clone(),
                fit: CoverFit::compute(photo.size(), stage),
            }));
        }
        layers.push(SceneNode::Glyph(GlyphLayer {
            node: node.clone(),
            local_bounds: node.local_bounds(extent),
        }));
        if selected && overlay_visible {
            let bounds = BoundBox::from_node(node, extent);
            layers.push(SceneNode::Transformer(TransformerLayer {
                handles: transformer_handles(&bounds),
                bounds,
            }));
        }
        Self {
            size: STAGE_SIZE,
            layers,
        }
    }

    pub fn photo(&self) -> Option<&PhotoLayer> {
        self.layers.iter().find_map(|l| match l {
            SceneNode::Photo(p) => Some(p),
            _ => None,
        })
    }

    pub fn glyph(&self) -> Option<&GlyphLayer> {
        self.layers.iter().find_map(|l| match l {
            SceneNode::Glyph(g) => Some(g),
            _ => None,
        })
    }

    pub fn transformer(&self) -> Option<&TransformerLayer> {
        self.layers.iter().find_map(|l| match l {
            SceneNode::Transformer(t) => Some(t),
            _ => None,
        })
    }
}
