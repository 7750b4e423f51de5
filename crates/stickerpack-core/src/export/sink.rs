//! Where finished files go.

use thiserror::Error;

/// A finished file ready for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
#[error("Delivering {filename} failed: {message}")]
pub struct DeliveryError {
    pub filename: String,
    pub message: String,
}

/// Receives each archive and the cover as soon as they are ready.
pub trait DownloadSink {
    fn deliver(&mut self, download: Download) -> Result<(), DeliveryError>;
}

impl<T: DownloadSink + ?Sized> DownloadSink for &mut T {
    fn deliver(&mut self, download: Download) -> Result<(), DeliveryError> {
        (**self).deliver(download)
    }
}

/// Keeps every delivered file in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub downloads: Vec<Download>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.downloads.iter().map(|d| d.filename.as_str()).collect()
    }

    pub fn get(&self, filename: &str) -> Option<&Download> {
        self.downloads.iter().find(|d| d.filename == filename)
    }
}

impl DownloadSink for CollectingSink {
    fn deliver(&mut self, download: Download) -> Result<(), DeliveryError> {
        self.downloads.push(download);
        Ok(())
    }
}
