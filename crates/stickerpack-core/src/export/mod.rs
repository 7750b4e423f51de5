//! Sticker pack export.
//!
//! This module provides functionality for:
//! - Validating a collection against an export format (count, cover, names)
//! - Transcoding every image once per output definition
//! - Packing each output into its own ZIP archive
//! - Delivering archives and the standalone cover to a download sink
//!
//! # Architecture
//!
//! An export run moves through `Validating`, then `Processing` and `Archiving`
//! for each output definition, then `CoverProcessing` and `Done`. Any error
//! moves it to `Failed`. Progress runs 0 to 100 and is reported through a
//! plain callback; each output gets an equal share of the 10-80 band.
//!
//! # Examples
//!
//! ```ignore
//! use std::sync::Arc;
//! use stickerpack_core::export::{CollectingSink, ExportOrchestrator};
//! use stickerpack_core::{ExportSettings, FormatCatalog};
//!
//! let orchestrator =
//!     ExportOrchestrator::with_settings(Arc::new(FormatCatalog::builtin()), ExportSettings::default());
//! let mut sink = CollectingSink::new();
//! let summary = orchestrator.export_collection("qq", &collection, &mut sink, &mut |p| {
//!     println!("{:>5.1}% {}", p.percent, p.status);
//! })?;
//! ```

mod archive;
mod orchestrator;
mod progress;
mod sink;
mod types;
mod validate;

pub use archive::{ArchiveBuilder, ArchiveError, ZIP_MIME};
pub use orchestrator::ExportOrchestrator;
pub use sink::{CollectingSink, DeliveryError, Download, DownloadSink};
pub use types::{ExportError, ExportProgress, ExportStage, ExportSummary, ValidationError};
pub use validate::validate_export;
