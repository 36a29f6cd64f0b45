//! Export of the composed stage as a downloadable PNG.
//!
//! The pixel work is platform specific and sits behind [`Snapshot`]; handing
//! the file to the user sits behind [`DownloadTrigger`]. This module owns the
//! contract around them: the transformer overlay never reaches the pixels and
//! its visibility is restored afterwards.

use crate::scene::SceneGraph;
use crate::stage::Stage;
use base64::Engine;
use thiserror::Error;

/// Name of the downloaded file.
pub const EXPORT_FILE_NAME: &str = "custom-glasses-photo.png";

/// Export failures. All of them degrade to a silent no-op at the UI.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no photo loaded")]
    NoPhoto,
    #[error("no render surface available")]
    NoSurface,
    #[error("snapshot failed: {0}")]
    Snapshot(String),
    #[error("download failed: {0}")]
    Download(String),
}

/// Encoded PNG bytes of a composed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub png: Vec<u8>,
}

impl ExportedImage {
    pub fn new(png: Vec<u8>) -> Self {
        Self { png }
    }

    /// `data:image/png;base64,...` URI of the image.
    pub fn data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Renders a scene to PNG bytes.
pub trait Snapshot {
    fn snapshot(&mut self, scene: &SceneGraph) -> Result<ExportedImage, ExportError>;
}

/// Hands a finished image to the platform under a file name.
pub trait DownloadTrigger {
    fn trigger(&mut self, file_name: &str, image: &ExportedImage) -> Result<(), ExportError>;
}

/// Project the stage for export: overlay hidden, then restored to whatever
/// it was before.
pub fn capture(stage: &mut Stage) -> Result<SceneGraph, ExportError> {
    if !stage.state().can_export() {
        return Err(ExportError::NoPhoto);
    }
    let was_visible = stage.set_overlay_visible(false);
    let scene = stage.scene();
    stage.set_overlay_visible(was_visible);
    Ok(scene)
}

/// Capture, snapshot and download in one step.
///
/// `surface` is `None` when no render target exists yet.
pub fn export(
    stage: &mut Stage,
    surface: Option<&mut dyn Snapshot>,
    download: &mut dyn DownloadTrigger,
) -> Result<(), ExportError> {
    let scene = capture(stage)?;
    let surface = surface.ok_or(ExportError::NoSurface)?;
    let image = surface.snapshot(&scene)?;
    download.trigger(EXPORT_FILE_NAME, &image)?;
    log::info!("Exported {} ({} bytes)", EXPORT_FILE_NAME, image.png.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::Photo;
    use crate::state::StageEvent;
    use image::RgbaImage;
    use kurbo::Point;

    #[derive(Default)]
    struct RecordingSnapshot {
        scenes: Vec<SceneGraph>,
    }

    impl Snapshot for RecordingSnapshot {
        fn snapshot(&mut self, scene: &SceneGraph) -> Result<ExportedImage, ExportError> {
            self.scenes.push(scene.clone());
            Ok(ExportedImage::new(vec![0x89, b'P', b'N', b'G']))
        }
    }

    #[derive(Default)]
    struct RecordingDownload {
        files: Vec<(String, String)>,
    }

    impl DownloadTrigger for RecordingDownload {
        fn trigger(&mut self, file_name: &str, image: &ExportedImage) -> Result<(), ExportError> {
            self.files.push((file_name.to_string(), image.data_uri()));
            Ok(())
        }
    }

    fn selected_stage_with_photo() -> Stage {
        let mut stage = Stage::new();
        stage.dispatch(StageEvent::PhotoLoaded(Photo::from_rgba(RgbaImage::new(32, 32))));
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();
        stage
    }

    #[test]
    fn test_data_uri() {
        let image = ExportedImage::new(b"abc".to_vec());
        assert_eq!(image.data_uri(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_capture_hides_overlay_and_restores() {
        let mut stage = selected_stage_with_photo();
        assert!(stage.scene().transformer().is_some());

        let scene = capture(&mut stage).unwrap();
        assert!(scene.transformer().is_none());
        assert!(scene.glyph().is_some());
        assert!(stage.is_overlay_visible());
        assert!(stage.scene().transformer().is_some());
    }

    #[test]
    fn test_capture_keeps_hidden_overlay_hidden() {
        let mut stage = selected_stage_with_photo();
        stage.set_overlay_visible(false);
        capture(&mut stage).unwrap();
        assert!(!stage.is_overlay_visible());
    }

    #[test]
    fn test_export_without_photo_is_inert() {
        let mut stage = Stage::new();
        let mut surface = RecordingSnapshot::default();
        let mut download = RecordingDownload::default();
        let result = export(&mut stage, Some(&mut surface as &mut dyn Snapshot), &mut download);
        assert!(matches!(result, Err(ExportError::NoPhoto)));
        assert!(surface.scenes.is_empty());
        assert!(download.files.is_empty());
    }

    #[test]
    fn test_export_without_surface_is_inert() {
        let mut stage = selected_stage_with_photo();
        let mut download = RecordingDownload::default();
        let result = export(&mut stage, None, &mut download);
        assert!(matches!(result, Err(ExportError::NoSurface)));
        assert!(download.files.is_empty());
        assert!(stage.is_overlay_visible());
    }

    #[test]
    fn test_export_downloads_named_file() {
        let mut stage = selected_stage_with_photo();
        let mut surface = RecordingSnapshot::default();
        let mut download = RecordingDownload::default();
        export(&mut stage, Some(&mut surface as &mut dyn Snapshot), &mut download).unwrap();

        assert_eq!(surface.scenes.len(), 1);
        assert!(surface.scenes[0].transformer().is_none());
        assert_eq!(download.files.len(), 1);
        assert_eq!(download.files[0].0, "custom-glasses-photo.png");
        assert!(download.files[0].1.starts_with("data:image/png;base64,"));
    }
}
