//! Object-URL preview store.
//!
//! Each preview is a `blob:` URL over a copy of the item's bytes, revoked when
//! the collection releases it.

use js_sys::{Array, Uint8Array};
use stickerpack_core::preview::{PreviewError, PreviewHandle, PreviewStore};
use wasm_bindgen::JsValue;
use web_sys::{Blob, BlobPropertyBag, Url};

#[derive(Debug, Default)]
pub struct ObjectUrlPreviews {
    live: usize,
}

impl ObjectUrlPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of URLs created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live
    }
}

impl PreviewStore for ObjectUrlPreviews {
    fn create(&mut self, bytes: &[u8], mime_type: &str) -> Result<PreviewHandle, PreviewError> {
        let parts = Array::of1(&Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(mime_type);

        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_error)?;
        let url = Url::create_object_url_with_blob(&blob).map_err(js_error)?;
        self.live += 1;
        Ok(PreviewHandle::new(url))
    }

    fn release(&mut self, handle: &PreviewHandle) {
        if Url::revoke_object_url(handle.as_str()).is_ok() {
            self.live = self.live.saturating_sub(1);
        }
    }
}

fn js_error(value: JsValue) -> PreviewError {
    PreviewError(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

/// WASM-specific tests that require a browser.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_create_and_release() {
        let mut store = ObjectUrlPreviews::new();
        let handle = store.create(&[1, 2, 3], "image/png").unwrap();
        assert!(handle.as_str().starts_with("blob:"));
        assert_eq!(store.live_count(), 1);

        store.release(&handle);
        assert_eq!(store.live_count(), 0);
    }
}
