//! Core application state and lifecycle.

use glassesmaker_core::selection::HANDLE_HIT_TOLERANCE;
use glassesmaker_core::{ExportError, STAGE_SIZE, Stage, StageEvent, StageViewport};
#[cfg(not(target_arch = "wasm32"))]
use glassesmaker_render::PngRenderResult;
use glassesmaker_render::{RenderContext, Renderer, VelloRenderer};
use glassesmaker_widgets::theme;
use kurbo::{Point, Size};
use peniko::Color;
use std::path::PathBuf;
use std::sync::Arc;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions, Scene};
use winit::application::ApplicationHandler;
#[cfg(not(target_arch = "wasm32"))]
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::event_handler::{EventHandler, TouchPhase};
use crate::ui::{UiAction, UiState, render_ui};

/// Native file operations.
#[cfg(not(target_arch = "wasm32"))]
mod file_ops {
    use glassesmaker_core::{
        DownloadTrigger, ExportError, ExportedImage, IMAGE_EXTENSIONS, LoadError, LoadTicket,
        Photo, decode_photo,
    };
    use std::path::PathBuf;
    use std::sync::mpsc::Sender;

    /// A finished decode, tagged with the upload it belongs to.
    pub type Completion = (LoadTicket, Result<Photo, LoadError>);

    /// Ask the user for an image file. `None` when the dialog was cancelled.
    pub fn pick_photo() -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Upload Photo")
            .add_filter("Image", IMAGE_EXTENSIONS)
            .pick_file()
    }

    /// Read and decode a file on a worker thread.
    pub fn spawn_decode(path: PathBuf, ticket: LoadTicket, tx: Sender<Completion>) {
        std::thread::spawn(move || {
            log::info!("Decoding photo: {:?}", path);
            let result = std::fs::read(&path)
                .map_err(|e| LoadError::Read(e.to_string()))
                .and_then(|bytes| decode_photo(&bytes));
            if tx.send((ticket, result)).is_err() {
                log::debug!("Photo decode finished after the app closed");
            }
        });
    }

    /// Saves exported images through a native save dialog.
    pub struct SaveDialog;

    impl DownloadTrigger for SaveDialog {
        fn trigger(&mut self, file_name: &str, image: &ExportedImage) -> Result<(), ExportError> {
            let dialog = rfd::FileDialog::new()
                .set_title("Download Image")
                .set_file_name(file_name)
                .add_filter("PNG Image", &["png"]);

            let Some(path) = dialog.save_file() else {
                log::info!("Download cancelled");
                return Ok(());
            };
            std::fs::write(&path, &image.png).map_err(|e| ExportError::Download(e.to_string()))?;
            log::info!("Saved PNG to: {:?}", path);
            Ok(())
        }
    }
}

/// Browser file operations.
#[cfg(target_arch = "wasm32")]
mod file_ops {
    use glassesmaker_core::{
        DownloadTrigger, ExportError, ExportedImage, LoadError, Photo, decode_file,
    };
    use std::cell::{Cell, RefCell};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::prelude::*;

    /// Upload progress reported by browser callbacks, in callback order.
    pub enum UploadEvent {
        /// A file was chosen and its read started.
        Chosen(u64),
        /// The read for a chosen file finished.
        Decoded(u64, Result<Photo, LoadError>),
    }

    thread_local! {
        static NEXT_UPLOAD: Cell<u64> = const { Cell::new(0) };
        static PENDING_UPLOADS: RefCell<Vec<UploadEvent>> = const { RefCell::new(Vec::new()) };
    }

    fn push_upload(event: UploadEvent) {
        PENDING_UPLOADS.with(|cell| cell.borrow_mut().push(event));
    }

    /// Take upload events queued since the last call.
    pub fn take_pending_uploads() -> Vec<UploadEvent> {
        PENDING_UPLOADS.with(|cell| std::mem::take(&mut *cell.borrow_mut()))
    }

    /// Open the browser file picker for images.
    pub fn trigger_file_input() {
        if let Err(e) = trigger_file_input_inner() {
            log::error!("Failed to open file picker: {:?}", e);
        }
    }

    fn trigger_file_input_inner() -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;

        let input = document
            .create_element("input")?
            .dyn_into::<web_sys::HtmlInputElement>()?;
        input.set_type("file");
        input.set_accept("image/*");
        input.style().set_property("display", "none")?;

        let input_clone = input.clone();
        let onchange = Closure::once(Box::new(move |_event: web_sys::Event| {
            // No file means the picker was dismissed.
            if let Some(file) = input_clone.files().and_then(|files| files.get(0)) {
                if let Err(e) = read_file(file) {
                    log::error!("Failed to read file: {:?}", e);
                }
            }
        }) as Box<dyn FnOnce(_)>);
        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        document.body().ok_or("No body")?.append_child(&input)?;
        input.click();
        // The picker holds its own reference; a dismissed picker fires no change event.
        input.remove();
        Ok(())
    }

    fn read_file(file: web_sys::File) -> Result<(), JsValue> {
        let id = NEXT_UPLOAD.with(|next| {
            let id = next.get() + 1;
            next.set(id);
            id
        });
        let mime = file.type_();
        log::info!("Reading {} ({}, {} bytes)", file.name(), mime, file.size());

        let reader = web_sys::FileReader::new()?;
        let reader_clone = reader.clone();
        let onload = Closure::once(Box::new(move |_event: web_sys::Event| {
            let result = match reader_clone.result() {
                Ok(buffer) => decode_file(&mime, &js_sys::Uint8Array::new(&buffer).to_vec()),
                Err(e) => Err(LoadError::Read(format!("{:?}", e))),
            };
            push_upload(UploadEvent::Decoded(id, result));
        }) as Box<dyn FnOnce(_)>);
        let onerror = Closure::once(Box::new(move |_event: web_sys::Event| {
            push_upload(UploadEvent::Decoded(
                id,
                Err(LoadError::Read("FileReader error".to_string())),
            ));
        }) as Box<dyn FnOnce(_)>);

        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onload.forget();
        onerror.forget();

        reader.read_as_array_buffer(&file)?;
        push_upload(UploadEvent::Chosen(id));
        Ok(())
    }

    /// Downloads exported images through a synthetic `<a download>` link.
    pub struct AnchorDownload;

    impl DownloadTrigger for AnchorDownload {
        fn trigger(&mut self, file_name: &str, image: &ExportedImage) -> Result<(), ExportError> {
            download_data_uri(file_name, &image.data_uri())
                .map_err(|e| ExportError::Download(format!("{:?}", e)))
        }
    }

    fn download_data_uri(filename: &str, uri: &str) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;

        let a = document
            .create_element("a")?
            .dyn_into::<web_sys::HtmlAnchorElement>()?;
        a.set_href(uri);
        a.set_download(filename);
        a.click();
        Ok(())
    }
}

/// Create an Rgba8Unorm texture Vello can render into.
///
/// Vello needs StorageBinding, which WebGPU only supports for Rgba8Unorm;
/// frames are blitted to the surface format and exports are copied out.
fn create_vello_target(
    device: &vello::wgpu::Device,
    label: &'static str,
    width: u32,
    height: u32,
) -> vello::wgpu::Texture {
    device.create_texture(&vello::wgpu::TextureDescriptor {
        label: Some(label),
        size: vello::wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: vello::wgpu::TextureDimension::D2,
        format: vello::wgpu::TextureFormat::Rgba8Unorm,
        usage: vello::wgpu::TextureUsages::STORAGE_BINDING
            | vello::wgpu::TextureUsages::COPY_SRC
            | vello::wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

/// Render `scene` into a fresh texture and queue a copy into a mappable
/// buffer. Returns the buffer and its padded row stride.
fn render_for_readback(
    device: &vello::wgpu::Device,
    queue: &vello::wgpu::Queue,
    vello_renderer: &mut vello::Renderer,
    scene: &Scene,
    width: u32,
    height: u32,
) -> Result<(vello::wgpu::Buffer, u32), ExportError> {
    let texture = create_vello_target(device, "png export texture", width, height);
    let texture_view = texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

    // Uncovered pixels stay transparent in the PNG.
    let params = RenderParams {
        base_color: Color::TRANSPARENT,
        width,
        height,
        antialiasing_method: AaConfig::Area,
    };
    vello_renderer
        .render_to_texture(device, queue, scene, &texture_view, &params)
        .map_err(|e| ExportError::Snapshot(format!("{:?}", e)))?;

    let bytes_per_row = (width * 4).next_multiple_of(256); // wgpu alignment requirement
    let readback_buffer = device.create_buffer(&vello::wgpu::BufferDescriptor {
        label: Some("png readback buffer"),
        size: (bytes_per_row * height) as u64,
        usage: vello::wgpu::BufferUsages::COPY_DST | vello::wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
        label: Some("png copy encoder"),
    });
    encoder.copy_texture_to_buffer(
        vello::wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: vello::wgpu::Origin3d::ZERO,
            aspect: vello::wgpu::TextureAspect::All,
        },
        vello::wgpu::TexelCopyBufferInfo {
            buffer: &readback_buffer,
            layout: vello::wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        vello::wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    Ok((readback_buffer, bytes_per_row))
}

/// Strip wgpu row padding from mapped readback data.
fn unpad_rows(data: &[u8], width: u32, height: u32, bytes_per_row: u32) -> Vec<u8> {
    let mut rgba_data = Vec::with_capacity((width * height * 4) as usize);
    for row in 0..height {
        let row_start = (row * bytes_per_row) as usize;
        let row_end = row_start + (width * 4) as usize;
        rgba_data.extend_from_slice(&data[row_start..row_end]);
    }
    rgba_data
}

/// Render a Vello scene to RGBA pixels (native version - blocking).
#[cfg(not(target_arch = "wasm32"))]
fn render_scene_to_png(
    device: &vello::wgpu::Device,
    queue: &vello::wgpu::Queue,
    vello_renderer: &mut vello::Renderer,
    scene: &Scene,
    width: u32,
    height: u32,
) -> Result<PngRenderResult, ExportError> {
    if width == 0 || height == 0 {
        return Err(ExportError::NoSurface);
    }

    let (readback_buffer, bytes_per_row) =
        render_for_readback(device, queue, vello_renderer, scene, width, height)?;

    let buffer_slice = readback_buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(vello::wgpu::MapMode::Read, move |result| {
        tx.send(result).ok();
    });

    // Wait for GPU to finish (blocking - native only)
    let _ = device.poll(vello::wgpu::PollType::wait_indefinitely());

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(ExportError::Snapshot(format!("buffer map failed: {:?}", e))),
        Err(_) => return Err(ExportError::Snapshot("buffer map callback dropped".to_string())),
    }

    let data = buffer_slice.get_mapped_range();
    let rgba_data = unpad_rows(&data, width, height, bytes_per_row);
    drop(data);
    readback_buffer.unmap();

    Ok(PngRenderResult {
        rgba_data,
        width,
        height,
    })
}

/// Snapshots the stage through the window's GPU device.
#[cfg(not(target_arch = "wasm32"))]
struct OffscreenSnapshot<'a> {
    device: &'a vello::wgpu::Device,
    queue: &'a vello::wgpu::Queue,
    vello_renderer: &'a mut vello::Renderer,
    stage_renderer: &'a mut VelloRenderer,
}

#[cfg(not(target_arch = "wasm32"))]
impl glassesmaker_core::Snapshot for OffscreenSnapshot<'_> {
    fn snapshot(
        &mut self,
        graph: &glassesmaker_core::SceneGraph,
    ) -> Result<glassesmaker_core::ExportedImage, ExportError> {
        let (scene, width, height) = self.stage_renderer.build_export_scene(graph);
        let result =
            render_scene_to_png(self.device, self.queue, self.vello_renderer, &scene, width, height)?;
        let png = encode_png(&result.rgba_data, result.width, result.height)?;
        Ok(glassesmaker_core::ExportedImage::new(png))
    }
}

/// Async PNG export for WASM - renders the scene and triggers the download
/// once the readback completes.
#[cfg(target_arch = "wasm32")]
fn spawn_png_export_async(
    device: &vello::wgpu::Device,
    queue: &vello::wgpu::Queue,
    scene: Scene,
    width: u32,
    height: u32,
) {
    use glassesmaker_core::{DownloadTrigger, EXPORT_FILE_NAME, ExportedImage};
    use std::sync::atomic::{AtomicBool, Ordering};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    if width == 0 || height == 0 {
        log::warn!("Cannot export an empty stage");
        return;
    }

    log::info!("Starting async PNG export: {}x{}", width, height);

    // A separate Vello renderer keeps the frame renderer free while we wait.
    let mut vello_renderer = match vello::Renderer::new(device, RendererOptions::default()) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Failed to create Vello renderer for export: {:?}", e);
            return;
        }
    };

    let (readback_buffer, bytes_per_row) =
        match render_for_readback(device, queue, &mut vello_renderer, &scene, width, height) {
            Ok(readback) => readback,
            Err(e) => {
                log::error!("Failed to render stage for export: {}", e);
                return;
            }
        };

    let mapped = Arc::new(AtomicBool::new(false));
    let mapped_clone = mapped.clone();
    readback_buffer
        .slice(..)
        .map_async(vello::wgpu::MapMode::Read, move |result| {
            if result.is_ok() {
                mapped_clone.store(true, Ordering::SeqCst);
            } else {
                log::error!("Buffer mapping failed: {:?}", result);
            }
        });

    wasm_bindgen_futures::spawn_local(async move {
        const MAX_ATTEMPTS: u32 = 600; // ~10 seconds at 60fps
        let mut attempts = 0u32;

        while !mapped.load(Ordering::SeqCst) {
            attempts += 1;
            if attempts >= MAX_ATTEMPTS {
                log::error!("Timeout waiting for buffer mapping after {} frames", attempts);
                return;
            }

            // WebGPU callbacks run on the browser task queue, so yield a
            // whole animation frame rather than a microtask.
            let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                let Some(window) = web_sys::window() else {
                    return;
                };
                let closure = wasm_bindgen::closure::Closure::once_into_js(move || {
                    let _ = resolve.call0(&JsValue::NULL);
                });
                let _ = window.request_animation_frame(closure.unchecked_ref());
            });
            let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
        }

        let buffer_slice = readback_buffer.slice(..);
        let data = buffer_slice.get_mapped_range();
        let rgba_data = unpad_rows(&data, width, height, bytes_per_row);
        drop(data);
        readback_buffer.unmap();

        let png = match encode_png(&rgba_data, width, height) {
            Ok(png) => png,
            Err(e) => {
                log::error!("{}", e);
                return;
            }
        };
        let image = ExportedImage::new(png);
        match file_ops::AnchorDownload.trigger(EXPORT_FILE_NAME, &image) {
            Ok(()) => log::info!("Exported {} ({} bytes)", EXPORT_FILE_NAME, image.png.len()),
            Err(e) => log::error!("{}", e),
        }
    });
}

/// Encode RGBA pixel data to PNG bytes.
fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Snapshot(format!("failed to write PNG header: {}", e)))?;
        writer
            .write_image_data(rgba_data)
            .map_err(|e| ExportError::Snapshot(format!("failed to write PNG data: {}", e)))?;
    }

    Ok(png_data)
}

/// Place the stage inside `area` (physical pixels) at the window's scale
/// factor, shrinking it when the area is too small to hold it.
fn stage_viewport(area: kurbo::Rect, scale_factor: f64) -> StageViewport {
    let fit = (area.width() / STAGE_SIZE.width).min(area.height() / STAGE_SIZE.height);
    let zoom = if fit > 0.0 {
        scale_factor.min(fit)
    } else {
        scale_factor
    };
    StageViewport::centered_in(area, zoom)
}

fn to_physical(rect: egui::Rect, pixels_per_point: f64) -> kurbo::Rect {
    kurbo::Rect::new(
        rect.min.x as f64 * pixels_per_point,
        rect.min.y as f64 * pixels_per_point,
        rect.max.x as f64 * pixels_per_point,
        rect.max.y as f64 * pixels_per_point,
    )
}

fn to_points(rect: kurbo::Rect, pixels_per_point: f64) -> egui::Rect {
    egui::Rect::from_min_max(
        egui::pos2((rect.x0 / pixels_per_point) as f32, (rect.y0 / pixels_per_point) as f32),
        egui::pos2((rect.x1 / pixels_per_point) as f32, (rect.y1 / pixels_per_point) as f32),
    )
}

fn to_color(color: egui::Color32) -> Color {
    let [r, g, b, a] = color.to_array();
    Color::from_rgba8(r, g, b, a)
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Page color around the stage.
    pub background_color: Color,
    /// Stage color before a photo is loaded.
    pub stage_color: Color,
    /// Font file registered for the sticker glyph, for systems without a
    /// color emoji font.
    pub emoji_font: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Custom Glasses Maker".to_string(),
            width: 1024,
            height: 720,
            background_color: to_color(theme::PAGE_BG),
            stage_color: to_color(theme::STAGE_BG),
            emoji_font: None,
        }
    }
}

impl AppConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_stage_color(mut self, color: Color) -> Self {
        self.stage_color = color;
        self
    }

    pub fn with_emoji_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.emoji_font = Some(path.into());
        self
    }
}

/// Runtime state for the application.
struct AppRuntime {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    stage_renderer: VelloRenderer,
    /// Texture blitter for RGBA->surface format conversion (needed for WebGPU/WASM)
    texture_blitter: vello::wgpu::util::TextureBlitter,

    // egui
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    ui_state: UiState,

    // State
    stage: Stage,
    viewport: StageViewport,
    config: AppConfig,
    event_handler: EventHandler,

    // Uploads
    #[cfg(not(target_arch = "wasm32"))]
    upload_tx: std::sync::mpsc::Sender<file_ops::Completion>,
    #[cfg(not(target_arch = "wasm32"))]
    upload_rx: std::sync::mpsc::Receiver<file_ops::Completion>,
    /// Browser upload ids mapped to their stage tickets.
    #[cfg(target_arch = "wasm32")]
    upload_tickets: std::collections::HashMap<u64, glassesmaker_core::LoadTicket>,
}

impl AppRuntime {
    /// Apply finished photo decodes.
    fn poll_uploads(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        while let Ok((ticket, result)) = self.upload_rx.try_recv() {
            self.stage.complete_load(ticket, result);
        }

        #[cfg(target_arch = "wasm32")]
        for event in file_ops::take_pending_uploads() {
            match event {
                file_ops::UploadEvent::Chosen(id) => {
                    let ticket = self.stage.begin_load();
                    self.upload_tickets.insert(id, ticket);
                }
                file_ops::UploadEvent::Decoded(id, result) => {
                    if let Some(ticket) = self.upload_tickets.remove(&id) {
                        self.stage.complete_load(ticket, result);
                    }
                }
            }
        }
    }

    fn upload_photo(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(path) = file_ops::pick_photo() {
            let ticket = self.stage.begin_load();
            file_ops::spawn_decode(path, ticket, self.upload_tx.clone());
        }

        #[cfg(target_arch = "wasm32")]
        file_ops::trigger_file_input();
    }

    /// Export the stage as `custom-glasses-photo.png`. Failures are logged only.
    #[cfg(not(target_arch = "wasm32"))]
    fn download(&mut self, device: &vello::wgpu::Device, queue: &vello::wgpu::Queue) {
        let mut snapshot = OffscreenSnapshot {
            device,
            queue,
            vello_renderer: &mut self.vello_renderer,
            stage_renderer: &mut self.stage_renderer,
        };

        let result = glassesmaker_core::export(
            &mut self.stage,
            Some(&mut snapshot as &mut dyn glassesmaker_core::Snapshot),
            &mut file_ops::SaveDialog,
        );
        if let Err(e) = result {
            log::warn!("Download skipped: {}", e);
        }
    }

    /// Export the stage as `custom-glasses-photo.png`. Failures are logged only.
    #[cfg(target_arch = "wasm32")]
    fn download(&mut self, device: &vello::wgpu::Device, queue: &vello::wgpu::Queue) {
        match glassesmaker_core::capture(&mut self.stage) {
            Ok(graph) => {
                let (scene, width, height) = self.stage_renderer.build_export_scene(&graph);
                spawn_png_export_async(device, queue, scene, width, height);
            }
            Err(e) => log::warn!("Download skipped: {}", e),
        }
    }

    fn apply_action(&mut self, action: UiAction, device_handle: Option<&vello::util::DeviceHandle>) {
        log::debug!("UI action: {:?}", action);
        match action {
            UiAction::UploadPhoto => self.upload_photo(),
            UiAction::SelectGlyph(glyph) => self.stage.dispatch(StageEvent::GlyphSelected(glyph)),
            UiAction::SetSize(size) => self.stage.dispatch(StageEvent::SizeChanged(size)),
            UiAction::SetRotation(degrees) => {
                self.stage.dispatch(StageEvent::RotationChanged(degrees))
            }
            UiAction::Download => match device_handle {
                Some(handle) => self.download(&handle.device, &handle.queue),
                None => log::warn!("Download skipped: {}", ExportError::NoSurface),
            },
        }
    }

    /// Recompute where the stage sits, from this frame's panel layout.
    fn update_viewport(&mut self) {
        let pixels_per_point = self.egui_ctx.pixels_per_point() as f64;
        let screen = egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(
                (self.surface.config.width as f64 / pixels_per_point) as f32,
                (self.surface.config.height as f64 / pixels_per_point) as f32,
            ),
        );
        let area = to_physical(self.ui_state.stage_area(screen), pixels_per_point);
        self.viewport = stage_viewport(area, self.window.scale_factor());
        self.ui_state.stage_rect = Some(to_points(self.viewport.screen_rect(), pixels_per_point));
        self.stage.set_handle_tolerance(
            self.viewport
                .screen_to_stage_distance(HANDLE_HIT_TOLERANCE * self.window.scale_factor()),
        );
    }
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    state: Option<AppRuntime>,
    render_cx: Option<vello::util::RenderContext>,
    /// Window waiting for async surface creation (WASM only)
    pending_window: Option<Arc<Window>>,
    /// Flag to indicate async init is in progress
    #[cfg(target_arch = "wasm32")]
    init_in_progress: std::cell::Cell<bool>,
}

impl App {
    /// Create a new application with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a new application with custom configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            render_cx: None,
            pending_window: None,
            #[cfg(target_arch = "wasm32")]
            init_in_progress: std::cell::Cell::new(false),
        }
    }

    /// Run the application with the default configuration.
    pub async fn run() {
        Self::run_with_config(AppConfig::default()).await;
    }

    /// Run the application.
    pub async fn run_with_config(config: AppConfig) {
        let event_loop = match EventLoop::new() {
            Ok(event_loop) => event_loop,
            Err(e) => {
                log::error!("Failed to create event loop: {}", e);
                return;
            }
        };
        let app = App::with_config(config);

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::EventLoopExtWebSys;
            event_loop.spawn_app(app);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut app = app;
            if let Err(e) = event_loop.run_app(&mut app) {
                log::error!("Event loop error: {}", e);
            }
        }
    }

    /// Finish initialization after surface is created.
    fn finish_init(&mut self, window: Arc<Window>, surface: RenderSurface<'static>) {
        let Some(render_cx) = self.render_cx.as_ref() else {
            log::error!("Render context missing after surface creation");
            return;
        };
        let device = &render_cx.devices[surface.dev_id].device;

        let vello_renderer = match vello::Renderer::new(device, RendererOptions::default()) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Failed to create Vello renderer: {:?}", e);
                return;
            }
        };

        // Vello renders to Rgba8Unorm (for compute shader compatibility) but
        // the surface format on WebGPU is typically Bgra8Unorm.
        let texture_blitter = vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface.config.format,
            egui_wgpu::RendererOptions::default(),
        );

        #[allow(unused_mut)]
        let mut stage_renderer = VelloRenderer::new();
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(path) = &self.config.emoji_font {
            match std::fs::read(path) {
                Ok(data) => {
                    stage_renderer.register_font(data);
                }
                Err(e) => log::warn!("Failed to read emoji font {:?}: {}", path, e),
            }
        }

        log::info!(
            "Custom Glasses Maker initialized - {}x{}",
            surface.config.width,
            surface.config.height
        );

        #[cfg(not(target_arch = "wasm32"))]
        let (upload_tx, upload_rx) = std::sync::mpsc::channel();

        self.state = Some(AppRuntime {
            window: window.clone(),
            surface,
            vello_renderer,
            stage_renderer,
            texture_blitter,
            egui_ctx,
            egui_state,
            egui_renderer,
            ui_state: UiState::default(),
            stage: Stage::new(),
            viewport: StageViewport::default(),
            config: self.config.clone(),
            event_handler: EventHandler::new(),
            #[cfg(not(target_arch = "wasm32"))]
            upload_tx,
            #[cfg(not(target_arch = "wasm32"))]
            upload_rx,
            #[cfg(target_arch = "wasm32")]
            upload_tickets: std::collections::HashMap::new(),
        });

        self.pending_window = None;
        window.request_redraw();
    }

    /// Window attributes for the browser: bind to the page canvas and fill
    /// the viewport.
    #[cfg(target_arch = "wasm32")]
    fn web_window_attributes(&self) -> Option<winit::window::WindowAttributes> {
        use wasm_bindgen::JsCast;
        use winit::platform::web::WindowAttributesExtWebSys;

        let web_window = web_sys::window()?;
        let document = web_window.document()?;

        let viewport_width = web_window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(self.config.width as f64);
        let viewport_height = web_window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(self.config.height as f64);

        if let Some(loading) = document.get_element_by_id("loading") {
            loading.remove();
        }

        let canvas = document
            .get_element_by_id("glassesmaker-canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
            .or_else(|| {
                let parent = document
                    .get_element_by_id("app")
                    .or_else(|| document.body().map(Into::into))?;
                let canvas = document.create_element("canvas").ok()?;
                canvas.set_id("glassesmaker-canvas");
                parent.append_child(&canvas).ok()?;
                canvas.dyn_into::<web_sys::HtmlCanvasElement>().ok()
            })?;

        // Account for device pixel ratio for sharp rendering
        let dpr = web_window.device_pixel_ratio();
        let physical_width = (viewport_width * dpr) as u32;
        let physical_height = (viewport_height * dpr) as u32;

        canvas.set_width(physical_width);
        canvas.set_height(physical_height);
        let style = canvas.style();
        let _ = style.set_property("width", "100%");
        let _ = style.set_property("height", "100%");
        let _ = style.set_property("display", "block");
        let _ = style.set_property("position", "fixed");
        let _ = style.set_property("top", "0");
        let _ = style.set_property("left", "0");

        log::info!(
            "Canvas created: {}x{} (physical: {}x{}, dpr: {})",
            viewport_width,
            viewport_height,
            physical_width,
            physical_height,
            dpr
        );

        Some(
            Window::default_attributes()
                .with_title(&self.config.title)
                .with_canvas(Some(canvas)),
        )
    }

    /// Start async surface creation for the pending window (WASM only).
    #[cfg(target_arch = "wasm32")]
    fn start_async_init(&mut self, window: Arc<Window>) {
        if self.init_in_progress.get() {
            return;
        }
        self.init_in_progress.set(true);

        let Some(web_window) = web_sys::window() else {
            return;
        };
        let dpr = web_window.device_pixel_ratio();
        let viewport_width = web_window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(self.config.width as f64);
        let viewport_height = web_window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(self.config.height as f64);
        let width = (viewport_width * dpr) as u32;
        let height = (viewport_height * dpr) as u32;

        let self_ptr = self as *mut Self;

        wasm_bindgen_futures::spawn_local(async move {
            log::info!("Creating surface asynchronously...");
            let mut render_cx = vello::util::RenderContext::new();

            match render_cx
                .create_surface(window.clone(), width, height, PresentMode::AutoVsync)
                .await
            {
                Ok(surface) => {
                    log::info!("Surface created successfully");
                    let surface: RenderSurface<'static> = unsafe { std::mem::transmute(surface) };

                    // SAFETY: WASM is single-threaded and the event loop keeps the App alive.
                    let app = unsafe { &mut *self_ptr };
                    app.render_cx = Some(render_cx);
                    app.finish_init(window, surface);
                }
                Err(e) => {
                    log::error!("Failed to create surface: {:?}", e);
                    let app = unsafe { &mut *self_ptr };
                    app.init_in_progress.set(false);
                }
            }
        });
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.pending_window.is_some() {
            return;
        }

        log::info!("Creating window...");

        #[cfg(not(target_arch = "wasm32"))]
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        #[cfg(target_arch = "wasm32")]
        let Some(window_attrs) = self.web_window_attributes() else {
            log::error!("Failed to attach a canvas to the page");
            return;
        };

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let (width, height) = if size.width == 0 || size.height == 0 {
            (self.config.width, self.config.height)
        } else {
            (size.width, size.height)
        };
        log::info!("Surface size: {}x{}", width, height);

        // On native, block on async surface creation
        #[cfg(not(target_arch = "wasm32"))]
        {
            let render_cx = self
                .render_cx
                .get_or_insert_with(vello::util::RenderContext::new);

            let surface = match pollster::block_on(render_cx.create_surface(
                window.clone(),
                width,
                height,
                PresentMode::AutoVsync,
            )) {
                Ok(surface) => surface,
                Err(e) => {
                    log::error!("Failed to create surface: {:?}", e);
                    event_loop.exit();
                    return;
                }
            };

            // SAFETY: the surface borrows the window, which the App keeps alive.
            let surface: RenderSurface<'static> = unsafe { std::mem::transmute(surface) };
            self.finish_init(window, surface);
        }

        // On WASM, store window for later async initialization
        #[cfg(target_arch = "wasm32")]
        {
            self.pending_window = Some(window);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        #[cfg(target_arch = "wasm32")]
        if self.state.is_none() {
            if let Some(window) = self.pending_window.clone() {
                self.start_async_init(window.clone());
                // Keep the event loop running until the surface exists.
                window.request_redraw();
            }
            return;
        }

        let Some(state) = &mut self.state else {
            return;
        };

        // Let egui process the event first
        let egui_response = state.egui_state.on_window_event(&state.window, &event);
        let egui_wants_input = egui_response.consumed
            || state.egui_ctx.is_pointer_over_area()
            || state.egui_ctx.wants_pointer_input();

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(render_cx) = self.render_cx.as_mut() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                state.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                state.poll_uploads();
                state.ui_state.loading = state.stage.is_loading();

                let egui_input = state.egui_state.take_egui_input(&state.window);
                let mut action = None;
                let egui_output = state.egui_ctx.run(egui_input, |ctx| {
                    action = render_ui(ctx, &mut state.ui_state, state.stage.state());
                });
                state
                    .egui_state
                    .handle_platform_output(&state.window, egui_output.platform_output);
                let egui_primitives = state
                    .egui_ctx
                    .tessellate(egui_output.shapes, egui_output.pixels_per_point);

                state.update_viewport();

                let device_handle = self
                    .render_cx
                    .as_ref()
                    .map(|render_cx| &render_cx.devices[state.surface.dev_id]);
                if let Some(action) = action {
                    state.apply_action(action, device_handle);
                }

                // Build Vello scene
                let width = state.surface.config.width;
                let height = state.surface.config.height;
                let graph = state.stage.scene();
                let render_ctx =
                    RenderContext::new(&graph, Size::new(width as f64, height as f64))
                        .with_viewport(state.viewport)
                        .with_background(state.config.background_color)
                        .with_stage_color(state.config.stage_color);
                state.stage_renderer.build_scene(&render_ctx);
                if let Some(extent) = state.stage_renderer.glyph_extent() {
                    state.stage.set_glyph_extent(extent);
                }
                let scene = state.stage_renderer.take_scene();

                // Render
                let Some(device_handle) = device_handle else {
                    return;
                };
                let device = &device_handle.device;
                let queue = &device_handle.queue;

                let surface_texture = match state.surface.surface.get_current_texture() {
                    Ok(t) => t,
                    Err(e) => {
                        log::warn!("Failed to get surface texture: {:?}", e);
                        return;
                    }
                };

                let params = RenderParams {
                    base_color: state.config.background_color,
                    width,
                    height,
                    antialiasing_method: AaConfig::Area,
                };

                let render_texture =
                    create_vello_target(device, "vello render texture", width, height);
                let render_texture_view =
                    render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

                if let Err(e) = state.vello_renderer.render_to_texture(
                    device,
                    queue,
                    &scene,
                    &render_texture_view,
                    &params,
                ) {
                    log::error!("Failed to render: {:?}", e);
                    return;
                }

                let surface_view = surface_texture
                    .texture
                    .create_view(&vello::wgpu::TextureViewDescriptor::default());

                {
                    let mut blit_encoder =
                        device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                            label: Some("blit encoder"),
                        });
                    state.texture_blitter.copy(
                        device,
                        &mut blit_encoder,
                        &render_texture_view,
                        &surface_view,
                    );
                    queue.submit(std::iter::once(blit_encoder.finish()));
                }

                for (id, image_delta) in &egui_output.textures_delta.set {
                    state.egui_renderer.update_texture(device, queue, *id, image_delta);
                }

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [width, height],
                    pixels_per_point: egui_output.pixels_per_point,
                };

                {
                    let mut egui_encoder =
                        device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                            label: Some("egui encoder"),
                        });
                    state.egui_renderer.update_buffers(
                        device,
                        queue,
                        &mut egui_encoder,
                        &egui_primitives,
                        &screen_descriptor,
                    );

                    let render_pass =
                        egui_encoder.begin_render_pass(&vello::wgpu::RenderPassDescriptor {
                            label: Some("egui render pass"),
                            color_attachments: &[Some(vello::wgpu::RenderPassColorAttachment {
                                view: &surface_view,
                                resolve_target: None,
                                ops: vello::wgpu::Operations {
                                    load: vello::wgpu::LoadOp::Load, // Keep Vello content
                                    store: vello::wgpu::StoreOp::Store,
                                },
                                depth_slice: None,
                            })],
                            depth_stencil_attachment: None,
                            timestamp_writes: None,
                            occlusion_query_set: None,
                        });

                    // egui-wgpu wants a 'static render pass
                    let mut render_pass = render_pass.forget_lifetime();
                    state
                        .egui_renderer
                        .render(&mut render_pass, &egui_primitives, &screen_descriptor);
                    drop(render_pass);

                    queue.submit(std::iter::once(egui_encoder.finish()));
                }

                for id in &egui_output.textures_delta.free {
                    state.egui_renderer.free_texture(id);
                }
                surface_texture.present();
                state.window.request_redraw();
            }

            WindowEvent::CursorMoved { position, .. } => {
                let point = Point::new(position.x, position.y);
                // Keep tracking over egui so presses land where the cursor is,
                // but only a gesture started on the stage moves the sticker.
                if state
                    .event_handler
                    .cursor_moved(&mut state.stage, &state.viewport, point)
                {
                    state.window.request_redraw();
                }
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if egui_wants_input {
                    return;
                }
                if state
                    .event_handler
                    .press(&mut state.stage, &state.viewport)
                    .is_some()
                {
                    state.window.request_redraw();
                }
            }

            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(event) = state.event_handler.release(&mut state.stage) {
                    log::debug!("Gesture finished: {:?}", event);
                    state.window.request_redraw();
                }
            }

            WindowEvent::Touch(touch) => {
                let phase = match touch.phase {
                    winit::event::TouchPhase::Started => TouchPhase::Started,
                    winit::event::TouchPhase::Moved => TouchPhase::Moved,
                    winit::event::TouchPhase::Ended => TouchPhase::Ended,
                    winit::event::TouchPhase::Cancelled => TouchPhase::Cancelled,
                };
                if phase == TouchPhase::Started && egui_wants_input {
                    return;
                }
                let point = Point::new(touch.location.x, touch.location.y);
                if state.event_handler.touch(
                    &mut state.stage,
                    &state.viewport,
                    touch.id,
                    phase,
                    point,
                ) {
                    state.window.request_redraw();
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                state.event_handler.set_shift(modifiers.state().shift_key());
            }

            WindowEvent::Focused(false) => {
                // The release may never arrive once focus is gone.
                if state.event_handler.is_pressed() {
                    state.event_handler.cancel(&mut state.stage);
                    state.window.request_redraw();
                }
            }

            _ => {}
        }
    }
}
