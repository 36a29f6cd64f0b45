//! Photo decoding with request tagging.
//!
//! Every upload takes a [`LoadTicket`]. Decodes may finish in any order; only
//! the completion matching the most recent ticket is applied, earlier ones
//! are dropped.

use crate::photo::Photo;
use thiserror::Error;

/// File extensions offered by native file pickers.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

/// Reasons a chosen file did not become a photo.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file is empty")]
    Empty,
    #[error("failed to read file: {0}")]
    Read(String),
    #[error("not an image file: {0}")]
    NotAnImage(String),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Tag for one decode request. Ordered by issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// Issues tickets and filters completions down to the latest request.
#[derive(Debug, Default)]
pub struct ImageLoader {
    next_id: u64,
    latest: Option<LoadTicket>,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request. Any earlier outstanding request becomes stale.
    pub fn begin(&mut self) -> LoadTicket {
        self.next_id += 1;
        let ticket = LoadTicket(self.next_id);
        self.latest = Some(ticket);
        log::debug!("Photo load #{} started", ticket.0);
        ticket
    }

    /// Whether `ticket` is still the most recent outstanding request.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.latest == Some(ticket)
    }

    /// Whether a request is still waiting for its decode.
    pub fn is_pending(&self) -> bool {
        self.latest.is_some()
    }

    /// Settle a request. Returns the photo only when the ticket is current and
    /// the decode succeeded; everything else is logged and discarded.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<Photo, LoadError>) -> Option<Photo> {
        if !self.is_current(ticket) {
            log::debug!("Discarding stale photo load #{}", ticket.0);
            return None;
        }
        self.latest = None;
        match result {
            Ok(photo) => {
                log::info!(
                    "Photo load #{} decoded ({}x{})",
                    ticket.0,
                    photo.width(),
                    photo.height()
                );
                Some(photo)
            }
            Err(e) => {
                log::warn!("Photo load #{} failed: {}", ticket.0, e);
                None
            }
        }
    }
}

/// Decode an encoded image file into a photo.
pub fn decode_photo(bytes: &[u8]) -> Result<Photo, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }
    let decoded = image::load_from_memory(bytes)?;
    Ok(Photo::from_rgba(decoded.into_rgba8()))
}

/// Whether a MIME type is accepted by the upload control (`image/*`).
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim()
        .split('/')
        .next()
        .is_some_and(|kind| kind.eq_ignore_ascii_case("image"))
        && mime.contains('/')
}

/// Check the MIME type, then decode.
pub fn decode_file(mime: &str, bytes: &[u8]) -> Result<Photo, LoadError> {
    if !mime.is_empty() && !is_image_mime(mime) {
        return Err(LoadError::NotAnImage(mime.to_string()));
    }
    decode_photo(bytes)
}
