//! Vello-based renderer implementation.

use crate::renderer::{RenderContext, Renderer, TRANSFORMER_BLUE};
use glassesmaker_core::selection::{HANDLE_SIZE, Handle, HandleKind};
use glassesmaker_core::{
    GlyphExtent, GlyphLayer, PhotoId, PhotoLayer, SceneGraph, SceneNode, TransformerLayer,
};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Stroke};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, Layout, LayoutContext, StyleProperty};
use peniko::{Brush, Color, Fill};
use std::collections::HashMap;
use std::sync::Arc;
use vello::Scene;

/// Result of PNG rendering - contains the raw RGBA pixel data and dimensions.
#[derive(Debug)]
pub struct PngRenderResult {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba_data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

/// Font families tried for the sticker glyph, in order.
pub const EMOJI_FONT_STACK: &str =
    "\"Noto Color Emoji\", \"Apple Color Emoji\", \"Segoe UI Emoji\", \"Twemoji Mozilla\", emoji, sans-serif";

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Transformer border and anchor stroke color.
    selection_color: Color,
    /// Font context for text rendering (cached to avoid re-scanning fonts).
    font_cx: FontContext,
    /// Layout context for text rendering.
    layout_cx: LayoutContext<Brush>,
    /// Current zoom level (for zoom-independent overlay strokes).
    zoom: f64,
    /// Cover-fit crop of the current photo, keyed by photo id.
    photo_cache: HashMap<PhotoId, peniko::ImageData>,
    /// Glyph box per em measured by the last glyph layout.
    glyph_extent: Option<GlyphExtent>,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    /// Create a new Vello renderer.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            selection_color: TRANSFORMER_BLUE,
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            zoom: 1.0,
            photo_cache: HashMap::new(),
            glyph_extent: None,
        }
    }

    /// Register extra font data, e.g. an emoji font the system lacks.
    /// Returns the number of faces registered.
    pub fn register_font(&mut self, data: Vec<u8>) -> usize {
        let families = self
            .font_cx
            .collection
            .register_fonts(vello::peniko::Blob::new(Arc::new(data)), None);
        let faces = families.iter().map(|(_, fonts)| fonts.len()).sum();
        log::info!("Registered {} font face(s) in {} family(ies)", faces, families.len());
        faces
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Glyph box per em measured by the last glyph layout, if any.
    pub fn glyph_extent(&self) -> Option<GlyphExtent> {
        self.glyph_extent
    }

    /// Build a scene for export: the stage at 1:1 pixels, overlay layers
    /// skipped. Returns the scene and its pixel size.
    pub fn build_export_scene(&mut self, graph: &SceneGraph) -> (Scene, u32, u32) {
        self.scene.reset();
        self.zoom = 1.0;
        for layer in &graph.layers {
            match layer {
                SceneNode::Photo(photo) => self.render_photo(photo, Affine::IDENTITY),
                SceneNode::Glyph(glyph) => self.render_glyph(glyph, Affine::IDENTITY),
                SceneNode::Transformer(_) => {}
            }
        }
        let width = graph.size.width.round().max(1.0) as u32;
        let height = graph.size.height.round().max(1.0) as u32;
        (std::mem::take(&mut self.scene), width, height)
    }

    /// Drop cached photos other than `keep`.
    fn evict_photos(&mut self, keep: Option<PhotoId>) {
        self.photo_cache.retain(|id, _| Some(*id) == keep);
    }

    /// Render the background photo, cropped to its cover-fit region.
    fn render_photo(&mut self, layer: &PhotoLayer, transform: Affine) {
        let id = layer.photo.id();
        let image_data = match self.photo_cache.get(&id) {
            Some(cached) => cached.clone(),
            None => {
                let (x, y, w, h) = layer.fit.pixel_crop();
                let cropped = image::imageops::crop_imm(layer.photo.pixels(), x, y, w, h).to_image();
                let (width, height) = cropped.dimensions();
                let img_data = peniko::ImageData {
                    data: peniko::Blob::new(Arc::new(cropped.into_raw())),
                    format: peniko::ImageFormat::Rgba8,
                    width,
                    height,
                    alpha_type: peniko::ImageAlphaType::Alpha,
                };
                log::debug!("Cached photo {} crop {}x{} at ({}, {})", id, width, height, x, y);
                self.evict_photos(Some(id));
                self.photo_cache.insert(id, img_data.clone());
                img_data
            }
        };

        let target = layer.fit.target;
        let scale_x = target.width() / image_data.width as f64;
        let scale_y = target.height() / image_data.height as f64;
        let image_transform = transform
            * Affine::translate((target.x0, target.y0))
            * Affine::scale_non_uniform(scale_x, scale_y);

        self.scene.draw_image(&peniko::ImageBrush::from(image_data), image_transform);
    }

    fn layout_glyph(&mut self, text: &str, font_size: f32, brush: &Brush) -> Layout<Brush> {
        let mut builder = self.layout_cx.ranged_builder(&mut self.font_cx, text, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font_size));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontFamily(parley::FontFamily::Source(
            EMOJI_FONT_STACK.into(),
        )));
        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());
        layout
    }

    /// Render the sticker glyph in node-local space.
    fn render_glyph(&mut self, layer: &GlyphLayer, transform: Affine) {
        let node = &layer.node;
        if node.glyph.is_empty() || node.font_size <= 0.0 {
            return;
        }
        let brush = Brush::Solid(Color::BLACK);
        let layout = self.layout_glyph(&node.glyph, node.font_size as f32, &brush);

        let font_size = node.font_size;
        self.glyph_extent = Some(GlyphExtent::new(
            layout.width() as f64 / font_size,
            layout.height() as f64 / font_size,
        ));

        let glyph_transform = transform * layer.transform();
        let mut glyph_count = 0;

        // Adapted from Parley's vello example
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let run_font_size = run.font_size();
                let synthesis = run.synthesis();
                let glyph_xform = synthesis
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        glyph_count += 1;
                        vello::Glyph { id: glyph.id, x: gx, y: gy }
                    })
                    .collect();

                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(font)
                        .brush(&brush)
                        .hint(false)
                        .transform(glyph_transform)
                        .glyph_transform(glyph_xform)
                        .font_size(run_font_size)
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }

        // No font could shape the glyph: show where it is anyway.
        if glyph_count == 0 {
            self.scene.fill(
                Fill::NonZero,
                glyph_transform,
                Color::from_rgba8(255, 100, 100, 100),
                None,
                &layer.local_bounds,
            );
        }
    }

    /// Render the transformer: rotated border plus anchors.
    /// Stroke widths are scaled inversely with zoom to keep a constant screen size.
    fn render_transformer(&mut self, layer: &TransformerLayer, transform: Affine) {
        let stroke_width = 1.0 / self.zoom;
        let corners = layer.bounds.corners();
        let mut border = BezPath::new();
        border.move_to(corners[0]);
        for corner in &corners[1..] {
            border.line_to(*corner);
        }
        border.close_path();
        self.scene.stroke(&Stroke::new(stroke_width), transform, self.selection_color, None, &border);

        let size = HANDLE_SIZE / self.zoom;
        for handle in &layer.handles {
            self.render_handle(handle, layer.bounds.rotation, transform, size);
        }
    }

    /// Render a single anchor, turned with the box.
    fn render_handle(&mut self, handle: &Handle, rotation: f64, transform: Affine, size: f64) {
        let stroke = Stroke::new(1.0 / self.zoom);
        let half = size / 2.0;
        let anchor_transform = transform * Affine::translate(handle.position.to_vec2()) * Affine::rotate(rotation);
        let path = match handle.kind {
            HandleKind::Rotate => kurbo::Circle::new(Point::ZERO, half).to_path(0.1),
            HandleKind::Corner(_) | HandleKind::Edge(_) => Rect::new(-half, -half, half, half).to_path(0.1),
        };
        self.scene.fill(Fill::NonZero, anchor_transform, Color::WHITE, None, &path);
        self.scene.stroke(&stroke, anchor_transform, self.selection_color, None, &path);
    }

    /// Paint the page color over everything outside the stage, so layers
    /// that overhang the stage edge are cut off as on a canvas element.
    fn render_stage_mask(&mut self, ctx: &RenderContext) {
        let stage = ctx.viewport.screen_rect();
        let view = Rect::new(0.0, 0.0, ctx.viewport_size.width, ctx.viewport_size.height);
        let bands = [
            Rect::new(view.x0, view.y0, view.x1, stage.y0),
            Rect::new(view.x0, stage.y1, view.x1, view.y1),
            Rect::new(view.x0, stage.y0, stage.x0, stage.y1),
            Rect::new(stage.x1, stage.y0, view.x1, stage.y1),
        ];
        for band in bands {
            if band.width() > 0.0 && band.height() > 0.0 {
                self.scene.fill(Fill::NonZero, Affine::IDENTITY, ctx.background_color, None, &band);
            }
        }
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();
        self.selection_color = ctx.selection_color;
        self.zoom = ctx.viewport.zoom;

        let stage_transform = ctx.viewport.transform();
        let stage_rect = Rect::from_origin_size(Point::ZERO, ctx.scene.size);
        self.scene.fill(Fill::NonZero, stage_transform, ctx.stage_color, None, &stage_rect);

        if ctx.scene.photo().is_none() {
            self.evict_photos(None);
        }

        for layer in &ctx.scene.layers {
            match layer {
                SceneNode::Photo(photo) => self.render_photo(photo, stage_transform),
                SceneNode::Glyph(glyph) => self.render_glyph(glyph, stage_transform),
                SceneNode::Transformer(overlay) => self.render_transformer(overlay, stage_transform),
            }
        }

        self.render_stage_mask(ctx);
    }
}
