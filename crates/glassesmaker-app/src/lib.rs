//! Custom Glasses Maker Application
//!
//! The application shell: windowing, pointer input, the control panel and
//! platform file handling around the stage.

mod app;
mod event_handler;
mod ui;

pub use app::{App, AppConfig};
pub use ui::{UiAction, UiState, render_ui};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::run_wasm;
