//! Glasses Maker Core Library
//!
//! Platform-agnostic state, pointer gestures and scene projection for the
//! Custom Glasses Maker: upload a photo, place an emoji sticker over it and
//! export the result as a PNG.

pub mod controls;
pub mod export;
pub mod input;
pub mod loader;
pub mod photo;
pub mod scene;
pub mod selection;
pub mod stage;
pub mod state;
pub mod sticker;
pub mod transform;
pub mod viewport;

pub use controls::{GLYPH_CHOICES, ROTATION_SLIDER, SIZE_SLIDER, SliderRange, caption};
pub use export::{DownloadTrigger, EXPORT_FILE_NAME, ExportError, ExportedImage, Snapshot, capture, export};
pub use input::Modifiers;
pub use loader::{IMAGE_EXTENSIONS, ImageLoader, LoadError, LoadTicket, decode_file, decode_photo, is_image_mime};
pub use photo::{CoverFit, Photo, PhotoId};
pub use scene::{GlyphLayer, PhotoLayer, SceneGraph, SceneNode, TransformerLayer};
pub use selection::{Handle, HandleKind, NodeId, PointerTarget, Selection};
pub use stage::Stage;
pub use state::{AppState, StageEvent};
pub use sticker::{GlyphExtent, Sticker, StickerNode};
pub use transform::{BoundBox, MIN_BOX_SIZE, TransformEnd, limit_bound_box};
pub use viewport::{STAGE_SIZE, StageViewport};
