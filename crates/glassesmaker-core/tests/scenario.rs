//! Upload, restyle, move, resize, rotate and export in one session.

use glassesmaker_core::{
    DownloadTrigger, ExportError, ExportedImage, Modifiers, SIZE_SLIDER, ROTATION_SLIDER, SceneGraph,
    Snapshot, Stage, StageEvent, decode_file, export,
};
use image::{ImageFormat, Rgba, RgbaImage};
use kurbo::Point;
use std::io::Cursor;

struct SceneCapture(Option<SceneGraph>);

impl Snapshot for SceneCapture {
    fn snapshot(&mut self, scene: &SceneGraph) -> Result<ExportedImage, ExportError> {
        self.0 = Some(scene.clone());
        let mut png = Cursor::new(Vec::new());
        RgbaImage::new(scene.size.width as u32, scene.size.height as u32)
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| ExportError::Snapshot(e.to_string()))?;
        Ok(ExportedImage::new(png.into_inner()))
    }
}

struct Downloads(Vec<(String, Vec<u8>)>);

impl DownloadTrigger for Downloads {
    fn trigger(&mut self, file_name: &str, image: &ExportedImage) -> Result<(), ExportError> {
        self.0.push((file_name.to_string(), image.png.clone()));
        Ok(())
    }
}

fn photo_file() -> Vec<u8> {
    let img = RgbaImage::from_pixel(480, 360, Rgba([30, 120, 200, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn glasses_session_exports_without_handles() {
    let mut stage = Stage::new();
    assert_eq!(stage.state().caption(), "Upload a photo to get started");

    let ticket = stage.begin_load();
    assert!(stage.complete_load(ticket, decode_file("image/png", &photo_file())));
    assert_eq!(stage.state().caption(), "Drag the glasses to position them on your photo");

    stage.dispatch(StageEvent::GlyphSelected("👓".to_string()));

    // Grab the sticker 10 units in from its anchor and drop it with the anchor at (50, 50).
    stage.pointer_down(Point::new(170.0, 130.0));
    stage.pointer_move(Point::new(100.0, 90.0), Modifiers::default());
    stage.pointer_move(Point::new(60.0, 60.0), Modifiers::default());
    stage.pointer_up();
    assert!(stage.state().selection.is_sticker_selected());

    stage.dispatch(StageEvent::SizeChanged(SIZE_SLIDER.clamp(80.0)));
    stage.dispatch(StageEvent::RotationChanged(ROTATION_SLIDER.clamp(45.0)));
    assert!(stage.scene().transformer().is_some());

    let mut capture = SceneCapture(None);
    let mut downloads = Downloads(Vec::new());
    export(&mut stage, Some(&mut capture as &mut dyn Snapshot), &mut downloads).unwrap();

    let scene = capture.0.expect("snapshot was taken");
    assert!(scene.transformer().is_none());
    assert!(scene.photo().is_some());
    let glyph = scene.glyph().expect("glyph layer");
    assert_eq!(glyph.node.glyph, "👓");
    assert_eq!(glyph.node.position, Point::new(50.0, 50.0));
    assert_eq!(glyph.node.font_size, 80.0);
    assert_eq!(glyph.node.rotation_degrees, 45.0);
    assert!(glyph.node.is_unit_scale());

    assert_eq!(downloads.0.len(), 1);
    let (name, png) = &downloads.0[0];
    assert_eq!(name, "custom-glasses-photo.png");
    let decoded = image::load_from_memory(png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 320));

    // The overlay comes back for the still-selected sticker.
    assert!(stage.scene().transformer().is_some());
}
