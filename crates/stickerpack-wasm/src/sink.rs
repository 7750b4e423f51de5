//! Download sink forwarding finished files to a JavaScript callback.

use js_sys::{Function, Uint8Array};
use stickerpack_core::export::{DeliveryError, Download, DownloadSink};
use wasm_bindgen::JsValue;

/// Calls `callback(filename, bytes: Uint8Array, mimeType)` once per file.
pub struct CallbackSink<'a> {
    callback: &'a Function,
}

impl<'a> CallbackSink<'a> {
    pub fn new(callback: &'a Function) -> Self {
        Self { callback }
    }
}

impl DownloadSink for CallbackSink<'_> {
    fn deliver(&mut self, download: Download) -> Result<(), DeliveryError> {
        let bytes = Uint8Array::from(download.bytes.as_slice());
        self.callback
            .call3(
                &JsValue::NULL,
                &JsValue::from_str(&download.filename),
                &bytes.into(),
                &JsValue::from_str(&download.mime_type),
            )
            .map(|_| ())
            .map_err(|e| DeliveryError {
                filename: download.filename,
                message: e.as_string().unwrap_or_else(|| "download callback threw".to_string()),
            })
    }
}

/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_callback_receives_file() {
        let callback = Function::new_with_args(
            "name, bytes, mime",
            "globalThis.__lastDownload = [name, bytes.length, mime];",
        );
        let mut sink = CallbackSink::new(&callback);
        sink.deliver(Download {
            filename: "cover.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![1, 2, 3, 4],
        })
        .unwrap();

        let last = js_sys::Reflect::get(&js_sys::global(), &"__lastDownload".into()).unwrap();
        let last = js_sys::Array::from(&last);
        assert_eq!(last.get(0).as_string().as_deref(), Some("cover.png"));
        assert_eq!(last.get(1).as_f64(), Some(4.0));
        assert_eq!(last.get(2).as_string().as_deref(), Some("image/png"));
    }

    #[wasm_bindgen_test]
    fn test_callback_error_becomes_delivery_error() {
        let callback = Function::new_with_args("", "throw 'disk full';");
        let mut sink = CallbackSink::new(&callback);
        let err = sink
            .deliver(Download {
                filename: "stickers.zip".to_string(),
                mime_type: "application/zip".to_string(),
                bytes: vec![],
            })
            .unwrap_err();
        assert_eq!(err.filename, "stickers.zip");
        assert_eq!(err.message, "disk full");
    }
}
