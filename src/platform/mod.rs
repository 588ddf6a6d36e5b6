//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logger setup
//! - Viewport measurement
//! - JS bindings (web only)

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Install the logger for this platform. Later calls are ignored.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already installed");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    if env_logger::try_init().is_err() {
        log::debug!("Logger already installed");
    }
}

/// Width the responsive breakpoints are measured against, in CSS px
#[cfg(target_arch = "wasm32")]
pub fn viewport_width() -> Option<f32> {
    let window = web_sys::window()?;
    let inner = window.inner_width().ok().and_then(|w| w.as_f64());
    let screen = window.screen().ok().and_then(|s| s.width().ok());
    // A rotated phone can report a wide window on a narrow screen
    match (inner, screen) {
        (Some(w), Some(s)) => Some(w.min(f64::from(s)) as f32),
        (Some(w), None) => Some(w as f32),
        (None, Some(s)) => Some(s as f32),
        (None, None) => None,
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn viewport_width() -> Option<f32> {
    None
}
