//! Stickerpack Core - Sticker pack export library
//!
//! This crate provides the core functionality for assembling sticker packs,
//! including GIF frame extraction, resize/transcode, animated re-encode, the
//! export format catalog, ZIP export, and collection state.

pub mod catalog;
pub mod collection;
pub mod decode;
pub mod encode;
pub mod export;
pub mod naming;
pub mod preview;
pub mod surface;
pub mod transcode;

pub use catalog::{
    CatalogError, CoverDefinition, ExportFormat, FormatCatalog, FormatValidation,
    OutputDefinition, Requirements,
};
pub use collection::{CollectionError, CoverItem, CoverSource, ImageItem, ItemId, StickerCollection};
pub use decode::{DecodeError, FilterType, Frame, RasterImage};
pub use encode::{ContainerFormat, EncodeError};
pub use export::{ExportError, ExportOrchestrator, ExportProgress, ExportStage, ExportSummary};
pub use naming::{generate_file_name, validate_image_name, NameValidationRule};
pub use preview::{MemoryPreviewStore, PreviewHandle, PreviewStore};
pub use surface::{ImageSurface, RasterSurface};
pub use transcode::{ProcessedImage, TranscodeError, DEFAULT_QUALITY};

/// Export-wide encoder settings
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Encoder quality (0.0 to 1.0)
    pub quality: f32,
    /// Resampling filter used when scaling
    pub filter: FilterType,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            filter: FilterType::default(),
        }
    }
}

impl ExportSettings {
    /// Create settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Quality clamped into 0.0 to 1.0
    pub fn clamped_quality(&self) -> f32 {
        if self.quality.is_finite() {
            self.quality.clamp(0.0, 1.0)
        } else {
            DEFAULT_QUALITY
        }
    }
}
