//! Sticker collection and export bindings.
//!
//! `JsStickerStore` holds the collection, the format catalog and the selected
//! format for a page session. Previews are object URLs that the store revokes
//! when items are removed, replaced, cleared, or when the store is freed.
//!
//! # Example
//!
//! ```typescript
//! import { JsStickerStore } from '@stickerpack/wasm';
//!
//! const store = new JsStickerStore();
//! store.select_format('qq');
//! for (const file of files) {
//!   store.add_image(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//! }
//! store.export(
//!   (percent, status) => progressBar.update(percent, status),
//!   (filename, bytes, mime) => saveAs(new Blob([bytes], { type: mime }), filename),
//! );
//! ```

use std::sync::Arc;

use js_sys::Function;
use serde::Serialize;
use stickerpack_core::collection::{CoverSource, ItemId, StickerCollection};
use stickerpack_core::export::{ExportOrchestrator, ExportProgress};
use stickerpack_core::preview::PreviewHandle;
use stickerpack_core::surface::ImageSurface;
use stickerpack_core::{ExportFormat, ExportSettings, FormatCatalog};
use tracing::{error, warn};
use wasm_bindgen::prelude::*;

use crate::frames::DEFAULT_COVER_SIZE;
use crate::preview::ObjectUrlPreviews;
use crate::sink::CallbackSink;

/// Format selected when a store is created, if the catalog has it.
const DEFAULT_FORMAT_ID: &str = "qq";

/// Image fields exposed to the UI.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageView<'a> {
    id: ItemId,
    name: &'a str,
    mime_type: &'a str,
    order: usize,
    frame_count: usize,
    selected_frame: usize,
    preview: &'a PreviewHandle,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CoverView<'a> {
    mime_type: &'a str,
    preview: &'a PreviewHandle,
    source: Option<CoverSource>,
}

#[wasm_bindgen]
pub struct JsStickerStore {
    collection: StickerCollection<ObjectUrlPreviews>,
    catalog: Arc<FormatCatalog>,
    current_format: Option<String>,
    settings: ExportSettings,
}

#[wasm_bindgen]
impl JsStickerStore {
    /// Create a store with the built-in catalog.
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsStickerStore {
        Self::from_catalog(FormatCatalog::builtin())
    }

    /// Create a store from an array of export format objects (camelCase keys).
    pub fn with_formats(formats: JsValue) -> Result<JsStickerStore, JsValue> {
        let formats: Vec<ExportFormat> = serde_wasm_bindgen::from_value(formats)
            .map_err(|e| JsValue::from_str(&format!("Invalid formats: {}", e)))?;
        let catalog =
            FormatCatalog::from_formats(formats).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::from_catalog(catalog))
    }

    pub fn format_ids(&self) -> Vec<String> {
        self.catalog.ids().map(str::to_string).collect()
    }

    /// Select the export format. Unknown ids clear the selection and return false.
    pub fn select_format(&mut self, id: &str) -> bool {
        let known = self.catalog.get(id).is_some();
        self.current_format = known.then(|| id.to_string());
        known
    }

    #[wasm_bindgen(getter)]
    pub fn current_format(&self) -> Option<String> {
        self.current_format.clone()
    }

    /// The selected format as a plain object, or `undefined`.
    pub fn format(&self) -> Result<JsValue, JsValue> {
        match self.format_def() {
            Some(format) => serde_wasm_bindgen::to_value(format)
                .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Replace export settings with `{ quality?, filter? }`.
    pub fn set_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        self.settings = serde_wasm_bindgen::from_value(settings)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?;
        Ok(())
    }

    /// Add an image and return its id.
    pub fn add_image(&mut self, file_name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<u32, JsValue> {
        self.collection
            .add_image(file_name, mime_type, bytes)
            .map(|id| id.0)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn remove_image(&mut self, id: u32) -> Result<(), JsValue> {
        self.collection
            .remove_image(ItemId(id))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn rename_image(&mut self, id: u32, name: &str) -> Result<(), JsValue> {
        self.collection
            .rename_image(ItemId(id), name)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_selected_frame(&mut self, id: u32, frame: usize) -> Result<(), JsValue> {
        self.collection
            .set_selected_frame(ItemId(id), frame)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Apply a new ordering given as the full list of ids.
    pub fn reorder(&mut self, ids: Vec<u32>) -> Result<(), JsValue> {
        let ids: Vec<ItemId> = ids.into_iter().map(ItemId).collect();
        self.collection
            .reorder(&ids)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_cover(&mut self, mime_type: &str, bytes: Vec<u8>) -> Result<(), JsValue> {
        self.collection
            .set_cover(mime_type, bytes)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Use one frame of a collection image as the cover, sized for the
    /// selected format (200x200 when it declares no cover).
    pub fn set_cover_from_image(&mut self, id: u32, frame: usize) -> Result<(), JsValue> {
        let size = self
            .format_def()
            .and_then(|f| f.cover.as_ref())
            .map_or((DEFAULT_COVER_SIZE, DEFAULT_COVER_SIZE), |c| (c.width, c.height));
        let surface = ImageSurface::new(self.settings.filter);
        self.collection
            .set_cover_from_image(&surface, ItemId(id), frame, size)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn remove_cover(&mut self) {
        self.collection.remove_cover();
    }

    pub fn clear_all(&mut self) {
        self.collection.clear_all();
    }

    /// Images in order as `{ id, name, mimeType, order, frameCount, selectedFrame, preview }`.
    pub fn images(&self) -> Result<JsValue, JsValue> {
        let views: Vec<ImageView<'_>> = self
            .collection
            .images()
            .iter()
            .map(|img| ImageView {
                id: img.id,
                name: &img.name,
                mime_type: &img.mime_type,
                order: img.order,
                frame_count: img.frame_count,
                selected_frame: img.selected_frame,
                preview: &img.preview,
            })
            .collect();
        serde_wasm_bindgen::to_value(&views).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The cover as `{ mimeType, preview, source }`, or `undefined`.
    pub fn cover(&self) -> Result<JsValue, JsValue> {
        match self.collection.cover() {
            Some(cover) => serde_wasm_bindgen::to_value(&CoverView {
                mime_type: &cover.mime_type,
                preview: &cover.preview,
                source: cover.source,
            })
            .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn image_count(&self) -> usize {
        self.collection.len()
    }

    pub fn is_valid_image_count(&self) -> bool {
        self.collection.is_valid_image_count(self.format_def())
    }

    pub fn can_export(&self) -> bool {
        self.collection.can_export(self.format_def())
    }

    /// Export the collection in the selected format.
    ///
    /// `on_progress(percent, status, stage)` is called as the run advances;
    /// `on_download(filename, bytes, mimeType)` receives each archive and the
    /// cover. Resolves to the export summary.
    pub fn export(&self, on_progress: &Function, on_download: &Function) -> Result<JsValue, JsValue> {
        let format_id = self.current_format.as_deref().unwrap_or_default();
        let orchestrator = ExportOrchestrator::with_settings(Arc::clone(&self.catalog), self.settings);
        let mut sink = CallbackSink::new(on_download);
        let mut progress = |p: &ExportProgress| {
            let stage = serde_wasm_bindgen::to_value(&p.stage).unwrap_or(JsValue::UNDEFINED);
            if let Err(e) = on_progress.call3(
                &JsValue::NULL,
                &JsValue::from_f64(f64::from(p.percent)),
                &JsValue::from_str(&p.status),
                &stage,
            ) {
                warn!(percent = p.percent, error = ?e, "progress callback threw");
            }
        };

        match orchestrator.export_collection(format_id, &self.collection, &mut sink, &mut progress) {
            Ok(summary) => {
                serde_wasm_bindgen::to_value(&summary).map_err(|e| JsValue::from_str(&e.to_string()))
            }
            Err(e) => {
                error!(format_id, error = %e, "Export failed");
                Err(JsValue::from_str(&e.to_string()))
            }
        }
    }
}

impl JsStickerStore {
    /// Starts on `qq` when the catalog has it, else on the first format id.
    fn from_catalog(catalog: FormatCatalog) -> Self {
        let current_format = catalog
            .get(DEFAULT_FORMAT_ID)
            .map(|format| format.id.clone())
            .or_else(|| catalog.ids().next().map(str::to_string));
        Self {
            collection: StickerCollection::new(ObjectUrlPreviews::new()),
            catalog: Arc::new(catalog),
            current_format,
            settings: ExportSettings::default(),
        }
    }

    fn format_def(&self) -> Option<&ExportFormat> {
        self.current_format
            .as_deref()
            .and_then(|id| self.catalog.get(id))
    }
}

impl Default for JsStickerStore {
    fn default() -> Self {
        Self::new()
    }
}


/// WASM-specific tests that require a browser.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::frames::fixtures;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn filled_store(count: usize) -> JsStickerStore {
        let mut store = JsStickerStore::new();
        store.select_format("qq");
        for i in 0..count {
            store
                .add_image(&format!("s{}.gif", i), "image/gif", fixtures::animated_gif(8, 8, 2))
                .unwrap();
        }
        store
    }

    #[wasm_bindgen_test]
    fn test_collection_operations() {
        let mut store = filled_store(3);
        assert_eq!(store.image_count(), 3);

        let views = js_sys::Array::from(&store.images().unwrap());
        let first = views.get(0);
        let frame_count = js_sys::Reflect::get(&first, &"frameCount".into()).unwrap();
        assert_eq!(frame_count.as_f64(), Some(2.0));

        store.reorder(vec![3, 1, 2]).unwrap();
        assert!(store.reorder(vec![1, 2]).is_err());
        store.remove_image(1).unwrap();
        assert_eq!(store.image_count(), 2);
        assert!(store.remove_image(1).is_err());

        store.set_cover_from_image(2, 1).unwrap();
        assert!(!store.cover().unwrap().is_undefined());
        store.clear_all();
        assert_eq!(store.image_count(), 0);
        assert!(store.cover().unwrap().is_undefined());
        assert_eq!(store.collection.previews().live_count(), 0);
    }

    #[wasm_bindgen_test]
    fn test_export_qq() {
        let mut store = filled_store(16);
        store.set_cover_from_image(1, 0).unwrap();
        assert!(store.can_export());

        let downloads = js_sys::Array::new();
        let on_download = Function::new_with_args("name", "this.push(name);");
        let on_download = on_download.bind(&downloads);
        let on_progress = Function::new_no_args("");

        store.export(&on_progress, &on_download).unwrap();
        let names: Vec<String> = downloads.iter().filter_map(|v| v.as_string()).collect();
        assert_eq!(names, vec!["stickers.zip", "preview.zip", "cover.png"]);
    }

    #[wasm_bindgen_test]
    fn test_export_without_format_fails() {
        let mut store = JsStickerStore::new();
        store.select_format("line");
        let noop = Function::new_no_args("");
        assert!(store.export(&noop, &noop).is_err());
    }

    #[wasm_bindgen_test]
    fn test_throwing_progress_callback_does_not_abort_export() {
        let mut store = filled_store(16);
        store.set_cover_from_image(1, 0).unwrap();

        let downloads = js_sys::Array::new();
        let on_download = Function::new_with_args("name", "this.push(name);").bind(&downloads);
        let on_progress = Function::new_no_args("throw new Error('progress bar gone');");

        assert!(store.export(&on_progress, &on_download).is_ok());
        assert_eq!(downloads.length(), 3);
    }

    #[wasm_bindgen_test]
    fn test_with_formats() {
        let formats = js_sys::JSON::parse(
            r#"[{"id": "mini", "name": "Mini", "requirements": {"count": 1},
                "outputs": [{"id": "main", "name": "Main", "width": 32, "height": 32,
                             "format": "png", "filename": "{index}.png"}]}]"#,
        )
        .unwrap();
        let mut store = JsStickerStore::with_formats(formats).unwrap();
        assert_eq!(store.current_format().as_deref(), Some("mini"));
        assert!(store.select_format("mini"));
        assert!(JsStickerStore::with_formats(JsValue::from_str("nope")).is_err());
    }
}
