//! Stickerpack WASM - WebAssembly bindings for sticker pack export
//!
//! This crate provides WASM bindings to expose the stickerpack-core functionality
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for frames and encoded images
//! - `frames` - Animation detection and GIF frame extraction
//! - `transcode` - Resize/transcode, animated re-encode, name helpers
//! - `store` - Collection state and export (`JsStickerStore`)
//! - `preview` - Object-URL preview resources
//! - `sink` - Download callback plumbing
//! - `logging` - `tracing` events forwarded to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsStickerStore } from '@stickerpack/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const store = new JsStickerStore();
//! store.select_format('qq');
//! ```

use wasm_bindgen::prelude::*;

mod frames;
mod logging;
mod preview;
mod sink;
mod store;
mod transcode;
mod types;

// Re-export public types
pub use frames::{
    count_frames, extract_frame, extract_frame_as_cover, extract_frames, is_animated,
    is_animated_image,
};
pub use store::JsStickerStore;
pub use transcode::{
    display_length, generate_file_name, resize_animated, resize_frame, resize_image,
    validate_image_name,
};
pub use types::{JsFrame, JsProcessedImage};

/// Initialize the WASM module (called automatically on load)
///
/// Installs the console logger at `INFO`.
#[wasm_bindgen(start)]
pub fn init() {
    logging::init(tracing::Level::INFO);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Ids of the built-in export formats
#[wasm_bindgen]
pub fn builtin_formats() -> Vec<String> {
    stickerpack_core::FormatCatalog::builtin()
        .ids()
        .map(str::to_string)
        .collect()
}
