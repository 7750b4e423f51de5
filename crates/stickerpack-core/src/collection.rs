//! Collection state: the ordered images and the cover being assembled into a pack.
//!
//! # Architecture
//!
//! The collection exclusively owns its items. Every mutation keeps the items'
//! `order` fields equal to their vector positions, and every preview handle is
//! released through the injected [`PreviewStore`] exactly once: on removal, on
//! replacement of the cover, on [`StickerCollection::clear_all`], or when the
//! collection is dropped.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::ExportFormat;
use crate::decode::{extract_frame, extract_frames, is_animated_image};
use crate::encode::ContainerFormat;
use crate::naming::file_stem;
use crate::preview::{PreviewError, PreviewHandle, PreviewStore};
use crate::surface::RasterSurface;
use crate::transcode::{self, ProcessedImage, ResizeOptions, ResizeSource, TranscodeError};

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("No image with id {0}")]
    UnknownImage(ItemId),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Transcode failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Preview(#[from] PreviewError),
}

/// Session-stable image identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    pub id: ItemId,
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub name: String,
    pub order: usize,
    /// 1 for still images.
    pub frame_count: usize,
    pub selected_frame: usize,
    pub preview: PreviewHandle,
}

impl ImageItem {
    pub fn is_animated(&self) -> bool {
        self.frame_count > 1
    }
}

/// Where a cover was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverSource {
    pub image: ItemId,
    pub frame: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverItem {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub preview: PreviewHandle,
    pub source: Option<CoverSource>,
}

/// Ordered images plus an optional cover.
pub struct StickerCollection<P: PreviewStore> {
    images: Vec<ImageItem>,
    cover: Option<CoverItem>,
    previews: P,
    next_id: u32,
}

impl<P: PreviewStore> StickerCollection<P> {
    pub fn new(previews: P) -> Self {
        Self {
            images: Vec::new(),
            cover: None,
            previews,
            next_id: 1,
        }
    }

    pub fn images(&self) -> &[ImageItem] {
        &self.images
    }

    pub fn image(&self, id: ItemId) -> Option<&ImageItem> {
        self.images.iter().find(|img| img.id == id)
    }

    pub fn cover(&self) -> Option<&CoverItem> {
        self.cover.as_ref()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn previews(&self) -> &P {
        &self.previews
    }

    /// Append an image. The display name is `file_name` without its extension.
    ///
    /// Animated GIFs are fully extracted once to learn their frame count; if
    /// that fails the image is kept as a single-frame item.
    pub fn add_image(
        &mut self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ItemId, CollectionError> {
        let frame_count = probe_frame_count(&bytes, mime_type, file_name);
        let preview = self.previews.create(&bytes, mime_type)?;

        let id = ItemId(self.next_id);
        self.next_id += 1;

        debug!(%id, file_name, frame_count, "added image");
        self.images.push(ImageItem {
            id,
            bytes,
            mime_type: mime_type.to_string(),
            name: file_stem(file_name).to_string(),
            order: self.images.len(),
            frame_count,
            selected_frame: 0,
            preview,
        });
        Ok(id)
    }

    pub fn remove_image(&mut self, id: ItemId) -> Result<(), CollectionError> {
        let index = self.position(id)?;
        let removed = self.images.remove(index);
        self.previews.release(&removed.preview);
        self.renumber();
        Ok(())
    }

    pub fn rename_image(&mut self, id: ItemId, name: impl Into<String>) -> Result<(), CollectionError> {
        let index = self.position(id)?;
        self.images[index].name = name.into();
        Ok(())
    }

    /// Record which frame stands in for an animated image in still outputs.
    ///
    /// The index is stored as given; export falls back to frame 0 when it is
    /// out of range.
    pub fn set_selected_frame(&mut self, id: ItemId, frame: usize) -> Result<(), CollectionError> {
        let index = self.position(id)?;
        self.images[index].selected_frame = frame;
        Ok(())
    }

    /// Replace the ordering. `ids` must name every current image exactly once.
    pub fn reorder(&mut self, ids: &[ItemId]) -> Result<(), CollectionError> {
        if ids.len() != self.images.len() {
            return Err(CollectionError::InvalidOrder(format!(
                "expected {} ids, got {}",
                self.images.len(),
                ids.len()
            )));
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(*id) {
                return Err(CollectionError::InvalidOrder(format!("id {id} listed twice")));
            }
            if self.image(*id).is_none() {
                return Err(CollectionError::UnknownImage(*id));
            }
        }

        let mut remaining = std::mem::take(&mut self.images);
        for id in ids {
            if let Some(pos) = remaining.iter().position(|img| img.id == *id) {
                self.images.push(remaining.swap_remove(pos));
            }
        }
        self.renumber();
        Ok(())
    }

    /// Set the cover from a file, releasing the previous cover's preview first.
    pub fn set_cover(&mut self, mime_type: &str, bytes: Vec<u8>) -> Result<(), CollectionError> {
        self.replace_cover(mime_type, bytes, None)
    }

    /// Extract one frame of a collection image, resize it to `size` as PNG and
    /// make it the cover.
    pub fn set_cover_from_image<S: RasterSurface + ?Sized>(
        &mut self,
        surface: &S,
        id: ItemId,
        frame: usize,
        (width, height): (u32, u32),
    ) -> Result<(), CollectionError> {
        let item = &self.images[self.position(id)?];
        let extracted = extract_frame(&item.bytes, &item.mime_type, frame)
            .map_err(TranscodeError::from)?;

        let ProcessedImage {
            bytes, mime_type, ..
        } = transcode::resize(
            surface,
            ResizeSource::Frame(&extracted),
            &ResizeOptions::new(width, height, ContainerFormat::Png),
        )?;

        let source = CoverSource {
            image: id,
            frame: frame.min(item.frame_count.saturating_sub(1)),
        };
        self.replace_cover(mime_type, bytes, Some(source))
    }

    pub fn remove_cover(&mut self) {
        if let Some(old) = self.cover.take() {
            self.previews.release(&old.preview);
        }
    }

    /// Remove every image and the cover, releasing all previews.
    pub fn clear_all(&mut self) {
        for item in self.images.drain(..) {
            self.previews.release(&item.preview);
        }
        self.remove_cover();
    }

    /// Whether the image count satisfies `format`. No format means no.
    pub fn is_valid_image_count(&self, format: Option<&ExportFormat>) -> bool {
        format.is_some_and(|f| f.requirements.accepts(self.images.len()))
    }

    /// Count is valid and a cover is present when the format needs one.
    pub fn can_export(&self, format: Option<&ExportFormat>) -> bool {
        let needs_cover = format.is_some_and(|f| f.requirements.cover_required);
        self.is_valid_image_count(format) && (!needs_cover || self.cover.is_some())
    }

    fn replace_cover(
        &mut self,
        mime_type: &str,
        bytes: Vec<u8>,
        source: Option<CoverSource>,
    ) -> Result<(), CollectionError> {
        // a failed create leaves the current cover in place
        let preview = self.previews.create(&bytes, mime_type)?;
        self.remove_cover();
        self.cover = Some(CoverItem {
            bytes,
            mime_type: mime_type.to_string(),
            preview,
            source,
        });
        Ok(())
    }

    fn position(&self, id: ItemId) -> Result<usize, CollectionError> {
        self.images
            .iter()
            .position(|img| img.id == id)
            .ok_or(CollectionError::UnknownImage(id))
    }

    fn renumber(&mut self) {
        for (order, item) in self.images.iter_mut().enumerate() {
            item.order = order;
        }
    }
}

impl<P: PreviewStore> Drop for StickerCollection<P> {
    fn drop(&mut self) {
        self.clear_all();
    }
}

impl<P: PreviewStore> fmt::Debug for StickerCollection<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StickerCollection")
            .field("images", &self.images.len())
            .field("cover", &self.cover.is_some())
            .finish()
    }
}

fn probe_frame_count(bytes: &[u8], mime_type: &str, file_name: &str) -> usize {
    if !is_animated_image(bytes, mime_type) {
        return 1;
    }
    match extract_frames(bytes, mime_type) {
        Ok(frames) => frames.len().max(1),
        Err(e) => {
            warn!(file_name, error = %e, "frame count probe failed, treating as still image");
            1
        }
    }
}
