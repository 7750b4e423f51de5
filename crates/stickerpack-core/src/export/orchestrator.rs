//! Export run: validate, transcode per output, archive, deliver.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::archive::{ArchiveBuilder, ZIP_MIME};
use super::progress::{
    item_percent, output_band, ProgressReporter, DONE_PERCENT, OUTPUTS_END_PERCENT,
    VALIDATED_PERCENT,
};
use super::sink::{Download, DownloadSink};
use super::types::{ExportError, ExportProgress, ExportStage, ExportSummary};
use super::validate::validate_export;
use crate::catalog::{CoverDefinition, ExportFormat, FormatCatalog, OutputDefinition};
use crate::collection::{CoverItem, ImageItem, StickerCollection};
use crate::decode::{extract_frames, is_animated_image, Frame};
use crate::preview::PreviewStore;
use crate::surface::{ImageSurface, RasterSurface};
use crate::transcode::{
    self, AnimatedOptions, ProcessedImage, ResizeOptions, ResizeSource, TranscodeError,
};
use crate::ExportSettings;

/// How one image is turned into one output member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemStrategy {
    /// Every frame, re-encoded as an animation.
    Animated,
    /// One frame of an animated source, for a still container.
    SelectedFrame,
    /// The source bytes, decoded as a still.
    Static,
}

impl ItemStrategy {
    fn choose(item: &ImageItem, output: &OutputDefinition) -> Self {
        if !is_animated_image(&item.bytes, &item.mime_type) {
            ItemStrategy::Static
        } else if output.preserve_animation && output.format.supports_animation() {
            ItemStrategy::Animated
        } else {
            ItemStrategy::SelectedFrame
        }
    }
}

/// Runs exports against an injected catalog and raster surface.
///
/// Runs are sequential: outputs in catalog order, images in collection order.
/// Archives are handed to the sink as soon as each one is complete and are
/// not recalled if a later step fails.
#[derive(Debug, Clone)]
pub struct ExportOrchestrator<S> {
    catalog: Arc<FormatCatalog>,
    surface: S,
    settings: ExportSettings,
}

impl ExportOrchestrator<ImageSurface> {
    /// Orchestrator on the default surface, scaling with `settings.filter`.
    pub fn with_settings(catalog: Arc<FormatCatalog>, settings: ExportSettings) -> Self {
        Self {
            catalog,
            surface: ImageSurface::new(settings.filter),
            settings,
        }
    }
}

impl<S: RasterSurface> ExportOrchestrator<S> {
    pub fn new(catalog: Arc<FormatCatalog>, surface: S) -> Self {
        Self {
            catalog,
            surface,
            settings: ExportSettings::default(),
        }
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.settings.quality = quality;
        self
    }

    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Export a collection's images and cover.
    pub fn export_collection<P: PreviewStore>(
        &self,
        format_id: &str,
        collection: &StickerCollection<P>,
        sink: &mut dyn DownloadSink,
        on_progress: &mut dyn FnMut(&ExportProgress),
    ) -> Result<ExportSummary, ExportError> {
        self.export(
            format_id,
            collection.images(),
            collection.cover(),
            sink,
            on_progress,
        )
    }

    /// Export `images` (in slice order) and `cover` in format `format_id`.
    ///
    /// # Errors
    ///
    /// Unknown formats and validation failures are returned before any image
    /// is decoded. The first item, cover, archive or delivery failure aborts
    /// the run; a `Failed` progress event is emitted for every error.
    pub fn export(
        &self,
        format_id: &str,
        images: &[ImageItem],
        cover: Option<&CoverItem>,
        sink: &mut dyn DownloadSink,
        on_progress: &mut dyn FnMut(&ExportProgress),
    ) -> Result<ExportSummary, ExportError> {
        let mut reporter = ProgressReporter::new(on_progress);
        reporter.report(ExportStage::Validating, 0.0, "Starting export...");

        let result = self
            .catalog
            .get(format_id)
            .ok_or_else(|| ExportError::FormatUnavailable(format_id.to_string()))
            .and_then(|format| self.run(format, images, cover, sink, &mut reporter));

        if let Err(e) = &result {
            warn!(format_id, stage = ?reporter.stage(), error = %e, "export failed");
            reporter.fail(e.to_string());
        }
        result
    }

    fn run(
        &self,
        format: &ExportFormat,
        images: &[ImageItem],
        cover: Option<&CoverItem>,
        sink: &mut dyn DownloadSink,
        reporter: &mut ProgressReporter<'_>,
    ) -> Result<ExportSummary, ExportError> {
        validate_export(format, images, cover.is_some())?;
        reporter.report(ExportStage::Validating, VALIDATED_PERCENT, "Validated");

        let mut summary = ExportSummary {
            format_id: format.id.clone(),
            image_count: images.len(),
            ..ExportSummary::default()
        };

        let output_count = format.outputs.len();
        for (index, output) in format.outputs.iter().enumerate() {
            let band = output_band(index, output_count);
            reporter.report(
                ExportStage::Processing,
                band.0,
                format!("Processing {}...", output.name),
            );

            let mut archive = ArchiveBuilder::new();
            for (position, item) in images.iter().enumerate() {
                reporter.report(
                    ExportStage::Processing,
                    item_percent(band, position, images.len()),
                    format!("Processing {} {}/{}", output.name, position + 1, images.len()),
                );

                let processed = self.process_item(item, output).map_err(|source| ExportError::Item {
                    position: position + 1,
                    output: output.name.clone(),
                    source,
                })?;
                archive.add(&output.member_name(&item.name, position + 1), &processed.bytes)?;
            }

            reporter.report(
                ExportStage::Archiving,
                band.0 + band.1,
                format!("Packing {}...", output.name),
            );
            let filename = output.archive_name(images.first().map(|item| item.name.as_str()));
            let members = archive.len();
            let bytes = archive.finish()?;
            info!(archive = %filename, members, size = bytes.len(), "archive ready");
            sink.deliver(Download {
                filename: filename.clone(),
                mime_type: ZIP_MIME.to_string(),
                bytes,
            })?;
            summary.archives.push(filename);
        }

        if let (Some(cover), Some(definition)) = (cover, format.cover.as_ref()) {
            reporter.report(
                ExportStage::CoverProcessing,
                OUTPUTS_END_PERCENT,
                "Processing cover...",
            );
            let processed = self
                .process_cover(cover, definition)
                .map_err(ExportError::Cover)?;
            info!(cover = %definition.filename, size = processed.bytes.len(), "cover ready");
            sink.deliver(Download {
                filename: definition.filename.clone(),
                mime_type: processed.mime_type.to_string(),
                bytes: processed.bytes,
            })?;
            summary.cover = Some(definition.filename.clone());
        }

        reporter.report(ExportStage::Done, DONE_PERCENT, "Export complete");
        Ok(summary)
    }

    fn process_item(
        &self,
        item: &ImageItem,
        output: &OutputDefinition,
    ) -> Result<ProcessedImage, TranscodeError> {
        let strategy = ItemStrategy::choose(item, output);
        debug!(id = %item.id, output = %output.id, ?strategy, "processing item");

        let quality = self.settings.clamped_quality();
        match strategy {
            ItemStrategy::Animated => {
                let frames = extract_frames(&item.bytes, &item.mime_type)?;
                transcode::reencode_animated(
                    &self.surface,
                    &frames,
                    &AnimatedOptions::new(output.width, output.height).with_quality(quality),
                )
            }
            ItemStrategy::SelectedFrame => {
                let frames = extract_frames(&item.bytes, &item.mime_type)?;
                let frame = select_frame(&frames, item.selected_frame)?;
                transcode::resize(
                    &self.surface,
                    ResizeSource::Frame(frame),
                    &ResizeOptions::new(output.width, output.height, output.format)
                        .with_quality(quality),
                )
            }
            ItemStrategy::Static => transcode::resize(
                &self.surface,
                ResizeSource::Bytes(&item.bytes),
                &ResizeOptions::new(output.width, output.height, output.format)
                    .with_quality(quality),
            ),
        }
    }

    fn process_cover(
        &self,
        cover: &CoverItem,
        definition: &CoverDefinition,
    ) -> Result<ProcessedImage, TranscodeError> {
        transcode::resize(
            &self.surface,
            ResizeSource::Bytes(&cover.bytes),
            &ResizeOptions::new(definition.width, definition.height, definition.format)
                .with_quality(self.settings.clamped_quality()),
        )
    }
}

/// Frame at `index`, or frame 0 when `index` is out of range.
fn select_frame(frames: &[Frame], index: usize) -> Result<&Frame, TranscodeError> {
    let clamped = clamp_frame_index(index, frames.len());
    if clamped != index {
        warn!(index, frame_count = frames.len(), "selected frame out of range, using frame 0");
    }
    frames.get(clamped).ok_or(TranscodeError::NoFrames)
}

pub(crate) fn clamp_frame_index(index: usize, frame_count: usize) -> usize {
    if index < frame_count {
        index
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::catalog::{ExportFormat, Requirements};
    use crate::decode::{is_animated, test_gifs, RasterImage, GIF_MIME};
    use crate::encode::ContainerFormat;
    use crate::export::CollectingSink;
    use crate::preview::MemoryPreviewStore;
    use crate::surface::testing::CountingSurface;

    fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let image = RasterImage::new(width, height, vec![shade; (width * height * 4) as usize]);
        crate::encode::encode_raster(&image, ContainerFormat::Png, 0.9).unwrap()
    }

    fn qq_collection(n: usize) -> StickerCollection<MemoryPreviewStore> {
        let mut collection = StickerCollection::new(MemoryPreviewStore::new());
        for i in 0..n {
            collection
                .add_image(&format!("s{i}.png"), "image/png", png(12, 8, i as u8 * 10))
                .unwrap();
        }
        collection
    }

    fn builtin() -> Arc<FormatCatalog> {
        Arc::new(FormatCatalog::builtin())
    }

    fn members(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    fn read_member(bytes: &[u8], name: &str) -> Vec<u8> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut out = Vec::new();
        archive.by_name(name).unwrap().read_to_end(&mut out).unwrap();
        out
    }

    /// Single-output format around `output`, for strategy tests.
    fn single_output(output: OutputDefinition) -> Arc<FormatCatalog> {
        let format = ExportFormat {
            id: "one".to_string(),
            name: "One".to_string(),
            description: String::new(),
            requirements: Requirements::variable(None, None),
            outputs: vec![output],
            cover: None,
            validation: Default::default(),
        };
        Arc::new(FormatCatalog::empty().with_format(format).unwrap())
    }

    #[test]
    fn test_qq_export_end_to_end() {
        let mut collection = qq_collection(16);
        collection.set_cover("image/png", png(40, 40, 200)).unwrap();

        let orchestrator = ExportOrchestrator::with_settings(builtin(), ExportSettings::default());
        let mut sink = CollectingSink::new();
        let mut events = Vec::new();
        let summary = orchestrator
            .export_collection("qq", &collection, &mut sink, &mut |p| events.push(p.clone()))
            .unwrap();

        assert_eq!(sink.filenames(), vec!["stickers.zip", "preview.zip", "cover.png"]);
        assert_eq!(summary.files().collect::<Vec<_>>(), sink.filenames());
        assert_eq!(summary.image_count, 16);

        let stickers = &sink.get("stickers.zip").unwrap().bytes;
        let names = members(stickers);
        assert_eq!(names.len(), 16);
        assert_eq!(names[0], "s0_01.gif");
        assert_eq!(names[15], "s9_10.gif");

        let member = read_member(stickers, "s3_04.gif");
        let decoded = image::load_from_memory(&member).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 300));

        let preview = &sink.get("preview.zip").unwrap();
        assert_eq!(preview.mime_type, "application/zip");
        assert_eq!(members(&preview.bytes).len(), 16);

        let cover = sink.get("cover.png").unwrap();
        assert_eq!(cover.mime_type, "image/png");
        let decoded = image::load_from_memory(&cover.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 200));

        assert_eq!(events.first().map(|e| e.percent), Some(0.0));
        assert_eq!(events.last().map(|e| e.percent), Some(100.0));
        assert_eq!(events.last().map(|e| e.stage), Some(ExportStage::Done));
        assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert!(events
            .iter()
            .any(|e| e.stage == ExportStage::CoverProcessing && e.percent == 80.0));
    }

    #[test]
    fn test_wrong_count_touches_nothing() {
        let mut collection = qq_collection(15);
        collection.set_cover("image/png", png(4, 4, 1)).unwrap();

        let surface = CountingSurface::default();
        let orchestrator = ExportOrchestrator::new(builtin(), &surface);
        let mut sink = CollectingSink::new();
        let mut events = Vec::new();

        let err = orchestrator
            .export_collection("qq", &collection, &mut sink, &mut |p| events.push(p.clone()))
            .unwrap_err();

        assert!(matches!(err, ExportError::Validation(_)));
        assert!(err.to_string().contains("16 required, 15 provided"));
        assert_eq!(surface.total_calls(), 0);
        assert!(sink.downloads.is_empty());
        assert_eq!(events.last().map(|e| e.stage), Some(ExportStage::Failed));
    }

    #[test]
    fn test_missing_cover_and_bad_name() {
        let surface = CountingSurface::default();
        let orchestrator = ExportOrchestrator::new(builtin(), &surface);
        let mut sink = CollectingSink::new();

        let mut collection = qq_collection(16);
        let err = orchestrator
            .export_collection("qq", &collection, &mut sink, &mut |_| {})
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::Validation(crate::export::ValidationError::MissingCover)
        ));

        collection.set_cover("image/png", png(4, 4, 1)).unwrap();
        let id = collection.images()[2].id;
        collection.rename_image(id, "no spaces allowed").unwrap();
        let err = orchestrator
            .export_collection("qq", &collection, &mut sink, &mut |_| {})
            .unwrap_err();
        assert!(err.to_string().contains("no spaces allowed"));
        assert_eq!(surface.total_calls(), 0);
    }

    #[test]
    fn test_unknown_format() {
        let orchestrator = ExportOrchestrator::new(builtin(), ImageSurface::default());
        let mut sink = CollectingSink::new();
        let err = orchestrator
            .export("line", &[], None, &mut sink, &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, ExportError::FormatUnavailable(id) if id == "line"));
    }

    #[test]
    fn test_item_failure_names_position_and_output() {
        let mut collection = qq_collection(16);
        collection.set_cover("image/png", png(4, 4, 1)).unwrap();

        // First output decodes items 1-16; the 20th decode is item 4 of the second output.
        let surface = CountingSurface::failing_on_decode(20);
        let orchestrator = ExportOrchestrator::new(builtin(), &surface);
        let mut sink = CollectingSink::new();

        let err = orchestrator
            .export_collection("qq", &collection, &mut sink, &mut |_| {})
            .unwrap_err();

        match err {
            ExportError::Item {
                position, output, ..
            } => {
                assert_eq!(position, 4);
                assert_eq!(output, "Preview");
            }
            other => panic!("unexpected error: {other}"),
        }
        // The first archive was already delivered and stays delivered.
        assert_eq!(sink.filenames(), vec!["stickers.zip"]);
    }

    #[test]
    fn test_animated_source_to_gif_keeps_animation() {
        let catalog = single_output(OutputDefinition::new(
            "anim",
            "Anim",
            (16, 16),
            ContainerFormat::Gif,
            "{index}.gif",
        ));
        let mut collection = StickerCollection::new(MemoryPreviewStore::new());
        collection
            .add_image("wave.gif", GIF_MIME, test_gifs::animated(8, 8, 3))
            .unwrap();

        let surface = CountingSurface::default();
        let mut sink = CollectingSink::new();
        ExportOrchestrator::new(catalog, &surface)
            .export_collection("one", &collection, &mut sink, &mut |_| {})
            .unwrap();

        let archive = &sink.get("anim.zip").unwrap().bytes;
        let gif = read_member(archive, "1.gif");
        assert!(is_animated(&gif));
        assert_eq!(surface.animations.get(), 1);
        assert_eq!(surface.scales.get(), 3);
        assert_eq!(surface.decodes.get(), 0);
    }

    #[test]
    fn test_preserve_animation_off_uses_selected_frame() {
        let catalog = single_output(
            OutputDefinition::new("still", "Still", (8, 8), ContainerFormat::Gif, "{index}.gif")
                .with_preserve_animation(false),
        );
        let source = test_gifs::encode(
            4,
            4,
            &[
                test_gifs::TestRecord::full(4, 4, 0, 10),
                test_gifs::TestRecord::full(4, 4, 2, 10),
            ],
        );
        let mut collection = StickerCollection::new(MemoryPreviewStore::new());
        let id = collection.add_image("two.gif", GIF_MIME, source).unwrap();
        collection.set_selected_frame(id, 1).unwrap();

        let mut sink = CollectingSink::new();
        ExportOrchestrator::new(catalog, ImageSurface::default())
            .export_collection("one", &collection, &mut sink, &mut |_| {})
            .unwrap();

        let gif = read_member(&sink.get("still.zip").unwrap().bytes, "1.gif");
        assert!(!is_animated(&gif));
        let pixel = image::load_from_memory(&gif).unwrap().into_rgba8().get_pixel(4, 4).0;
        assert_eq!(pixel, test_gifs::rgba_of(2));
    }

    #[test]
    fn test_animated_source_to_png_clamps_selected_frame() {
        let catalog = single_output(OutputDefinition::new(
            "png",
            "Png",
            (8, 8),
            ContainerFormat::Png,
            "{name}.png",
        ));
        let source = test_gifs::encode(
            4,
            4,
            &[
                test_gifs::TestRecord::full(4, 4, 1, 10),
                test_gifs::TestRecord::full(4, 4, 2, 10),
            ],
        );
        let mut collection = StickerCollection::new(MemoryPreviewStore::new());
        let id = collection.add_image("two.gif", GIF_MIME, source).unwrap();
        collection.set_selected_frame(id, 9).unwrap();

        let mut sink = CollectingSink::new();
        ExportOrchestrator::new(catalog, ImageSurface::default())
            .export_collection("one", &collection, &mut sink, &mut |_| {})
            .unwrap();

        let png = read_member(&sink.get("png.zip").unwrap().bytes, "two.png");
        let pixel = image::load_from_memory(&png).unwrap().into_rgba8().get_pixel(2, 2).0;
        assert_eq!(pixel, test_gifs::rgba_of(1));
    }

    #[test]
    fn test_empty_collection_variable_format_fails_validation() {
        let catalog = single_output(OutputDefinition::new(
            "png",
            "Png",
            (8, 8),
            ContainerFormat::Png,
            "{name}.png",
        ));
        let mut sink = CollectingSink::new();
        let err = ExportOrchestrator::new(catalog, ImageSurface::default())
            .export("one", &[], None, &mut sink, &mut |_| {})
            .unwrap_err();
        assert!(err.to_string().contains("1-999 required, 0 provided"));
    }

    #[test]
    fn test_clamp_frame_index() {
        assert_eq!(clamp_frame_index(2, 3), 2);
        assert_eq!(clamp_frame_index(3, 3), 0);
        assert_eq!(clamp_frame_index(0, 0), 0);
    }

    #[test]
    fn test_strategy_choice() {
        let mut collection = StickerCollection::new(MemoryPreviewStore::new());
        let anim = collection
            .add_image("a.gif", GIF_MIME, test_gifs::animated(4, 4, 2))
            .unwrap();
        let still = collection.add_image("b.png", "image/png", png(4, 4, 9)).unwrap();

        let gif_out = OutputDefinition::new("g", "G", (4, 4), ContainerFormat::Gif, "{index}.gif");
        let webp_out = OutputDefinition::new("w", "W", (4, 4), ContainerFormat::Webp, "{index}.webp");

        let anim = collection.image(anim).unwrap();
        let still = collection.image(still).unwrap();
        assert_eq!(ItemStrategy::choose(anim, &gif_out), ItemStrategy::Animated);
        assert_eq!(ItemStrategy::choose(anim, &webp_out), ItemStrategy::SelectedFrame);
        assert_eq!(ItemStrategy::choose(still, &gif_out), ItemStrategy::Static);
    }
}
