//! Export progress, summary, and error types.

use serde::Serialize;
use thiserror::Error;

use super::archive::ArchiveError;
use super::sink::DeliveryError;
use crate::naming::NameViolation;
use crate::transcode::TranscodeError;

/// Where an export run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportStage {
    Idle,
    Validating,
    Processing,
    Archiving,
    CoverProcessing,
    Done,
    Failed,
}

/// One progress event. `percent` never decreases within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportProgress {
    pub percent: f32,
    pub status: String,
    pub stage: ExportStage,
}

/// What a successful run delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub format_id: String,
    pub image_count: usize,
    /// Archive file names in delivery order.
    pub archives: Vec<String>,
    pub cover: Option<String>,
}

impl ExportSummary {
    /// Every delivered file name, archives first.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.archives
            .iter()
            .chain(self.cover.iter())
            .map(String::as_str)
    }
}

/// Pre-flight failures. Nothing has been processed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Image count does not match: {required} required, {actual} provided")]
    CountMismatch { required: String, actual: usize },

    #[error("A cover image is required")]
    MissingCover,

    #[error("Image name {name:?} is invalid: {violation} (allowed: {rule})")]
    InvalidName {
        name: String,
        violation: NameViolation,
        rule: String,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export format {0:?} is not available")]
    FormatUnavailable(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to process {output} image {position}: {source}")]
    Item {
        /// 1-based position in the collection.
        position: usize,
        output: String,
        #[source]
        source: TranscodeError,
    },

    #[error("Failed to process cover: {0}")]
    Cover(#[source] TranscodeError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_files() {
        let summary = ExportSummary {
            format_id: "qq".to_string(),
            image_count: 16,
            archives: vec!["stickers.zip".to_string(), "preview.zip".to_string()],
            cover: Some("cover.png".to_string()),
        };
        assert_eq!(
            summary.files().collect::<Vec<_>>(),
            vec!["stickers.zip", "preview.zip", "cover.png"]
        );
    }

    #[test]
    fn test_validation_messages_carry_rule_and_value() {
        let count = ValidationError::CountMismatch {
            required: "16".to_string(),
            actual: 15,
        };
        assert_eq!(
            count.to_string(),
            "Image count does not match: 16 required, 15 provided"
        );

        let name = ValidationError::InvalidName {
            name: "hi there".to_string(),
            violation: NameViolation::DisallowedChar(' '),
            rule: "at most 8".to_string(),
        };
        let message = name.to_string();
        assert!(message.contains("\"hi there\""));
        assert!(message.contains("' '"));
        assert!(message.contains("at most 8"));
    }

    #[test]
    fn test_item_error_names_position_and_output() {
        let err = ExportError::Item {
            position: 3,
            output: "Preview".to_string(),
            source: TranscodeError::NoFrames,
        };
        assert_eq!(err.to_string(), "Failed to process Preview image 3: Source has no frames");
    }

    #[test]
    fn test_stage_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&ExportStage::CoverProcessing).unwrap(),
            "\"coverProcessing\""
        );
    }
}
