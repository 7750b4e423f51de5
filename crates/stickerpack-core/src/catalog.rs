//! Export format catalog.
//!
//! A format describes what a sticker platform expects: how many images, which
//! outputs (size, container, member naming) are produced from them, the cover,
//! and the name rule. The catalog is a read-only value handed to the export
//! orchestrator and to collection checks.
//!
//! # Examples
//!
//! ```ignore
//! let catalog = FormatCatalog::builtin();
//! let qq = catalog.get("qq").unwrap();
//! assert_eq!(qq.outputs.len(), 2);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::ContainerFormat;
use crate::naming::{generate_file_name, CharClass, NameValidationRule};

/// Lower bound applied when a variable-count format omits `minCount`.
pub const DEFAULT_MIN_COUNT: usize = 1;
/// Upper bound applied when a variable-count format omits `maxCount`.
pub const DEFAULT_MAX_COUNT: usize = 999;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate format id: {0}")]
    DuplicateId(String),

    #[error("Format {id}: {reason}")]
    Invalid { id: String, reason: String },
}

/// How many images a format takes and whether it needs a cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub count: usize,
    #[serde(default)]
    pub min_count: Option<usize>,
    #[serde(default)]
    pub max_count: Option<usize>,
    #[serde(default)]
    pub allow_variable: bool,
    #[serde(default)]
    pub cover_required: bool,
}

impl Requirements {
    pub fn exact(count: usize) -> Self {
        Self {
            count,
            min_count: None,
            max_count: None,
            allow_variable: false,
            cover_required: false,
        }
    }

    pub fn variable(min: Option<usize>, max: Option<usize>) -> Self {
        Self {
            count: min.unwrap_or(DEFAULT_MIN_COUNT),
            min_count: min,
            max_count: max,
            allow_variable: true,
            cover_required: false,
        }
    }

    pub fn with_cover(mut self) -> Self {
        self.cover_required = true;
        self
    }

    /// Inclusive count bounds.
    pub fn bounds(&self) -> (usize, usize) {
        if self.allow_variable {
            (
                self.min_count.unwrap_or(DEFAULT_MIN_COUNT),
                self.max_count.unwrap_or(DEFAULT_MAX_COUNT),
            )
        } else {
            (self.count, self.count)
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&count)
    }

    /// `"16"` for exact counts, `"1-999"` for ranges.
    pub fn describe(&self) -> String {
        match self.bounds() {
            (min, max) if min == max => min.to_string(),
            (min, max) => format!("{min}-{max}"),
        }
    }
}

/// One produced artifact group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDefinition {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: ContainerFormat,
    /// Member name template, e.g. `{name}_{index:02d}.gif`.
    pub filename: String,
    #[serde(default)]
    pub zip_filename: Option<String>,
    #[serde(default = "default_preserve_animation")]
    pub preserve_animation: bool,
}

fn default_preserve_animation() -> bool {
    true
}

impl OutputDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        (width, height): (u32, u32),
        format: ContainerFormat,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width,
            height,
            format,
            filename: filename.into(),
            zip_filename: None,
            preserve_animation: true,
        }
    }

    pub fn with_zip_filename(mut self, template: impl Into<String>) -> Self {
        self.zip_filename = Some(template.into());
        self
    }

    pub fn with_preserve_animation(mut self, preserve: bool) -> Self {
        self.preserve_animation = preserve;
        self
    }

    /// Member file name for the image at 1-based `index`.
    pub fn member_name(&self, name: &str, index: usize) -> String {
        generate_file_name(&self.filename, name, index)
    }

    /// Archive name, expanded with the first image's name at index 1.
    pub fn archive_name(&self, first_name: Option<&str>) -> String {
        match &self.zip_filename {
            Some(template) => generate_file_name(template, first_name.unwrap_or("stickers"), 1),
            None => format!("{}.zip", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverDefinition {
    pub width: u32,
    pub height: u32,
    pub format: ContainerFormat,
    pub filename: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatValidation {
    #[serde(default)]
    pub name_validation: Option<NameValidationRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFormat {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub requirements: Requirements,
    pub outputs: Vec<OutputDefinition>,
    #[serde(default)]
    pub cover: Option<CoverDefinition>,
    #[serde(default)]
    pub validation: FormatValidation,
}

impl ExportFormat {
    pub fn name_rule(&self) -> Option<&NameValidationRule> {
        self.validation.name_validation.as_ref()
    }

    fn check(&self) -> Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::Invalid {
            id: self.id.clone(),
            reason,
        };

        if self.id.is_empty() {
            return Err(invalid("empty id".to_string()));
        }
        let (min, max) = self.requirements.bounds();
        if min > max {
            return Err(invalid(format!("minCount {min} exceeds maxCount {max}")));
        }
        if self.requirements.cover_required && self.cover.is_none() {
            return Err(invalid("cover required but no cover definition".to_string()));
        }
        for output in &self.outputs {
            if output.width == 0 || output.height == 0 {
                return Err(invalid(format!(
                    "output {} has size {}x{}",
                    output.id, output.width, output.height
                )));
            }
        }
        if let Some(cover) = &self.cover {
            if cover.width == 0 || cover.height == 0 {
                return Err(invalid(format!("cover has size {}x{}", cover.width, cover.height)));
            }
        }
        Ok(())
    }
}

/// Immutable id-to-format map.
#[derive(Debug, Clone, Default)]
pub struct FormatCatalog {
    formats: BTreeMap<String, ExportFormat>,
}

impl FormatCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog with the built-in `qq` format.
    pub fn builtin() -> Self {
        let qq = qq_format();
        Self {
            formats: BTreeMap::from([(qq.id.clone(), qq)]),
        }
    }

    /// Parse a JSON array of formats.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, duplicate ids, or a format whose sizes or
    /// count bounds are unusable.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let formats: Vec<ExportFormat> = serde_json::from_str(json)?;
        Self::from_formats(formats)
    }

    pub fn from_formats(formats: Vec<ExportFormat>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for format in formats {
            format.check()?;
            if map.contains_key(&format.id) {
                return Err(CatalogError::DuplicateId(format.id));
            }
            map.insert(format.id.clone(), format);
        }
        Ok(Self { formats: map })
    }

    /// Add or replace a format.
    ///
    /// # Errors
    ///
    /// Fails with `CatalogError::Invalid` on the same checks as [`Self::from_json`].
    pub fn with_format(mut self, format: ExportFormat) -> Result<Self, CatalogError> {
        format.check()?;
        self.formats.insert(format.id.clone(), format);
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&ExportFormat> {
        self.formats.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    pub fn formats(&self) -> impl Iterator<Item = &ExportFormat> {
        self.formats.values()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

fn qq_format() -> ExportFormat {
    ExportFormat {
        id: "qq".to_string(),
        name: "QQ".to_string(),
        description: "QQ sticker pack: 16 stickers with a cover".to_string(),
        requirements: Requirements::exact(16).with_cover(),
        outputs: vec![
            OutputDefinition::new(
                "stickers",
                "Stickers",
                (300, 300),
                ContainerFormat::Gif,
                "{name}_{index:02d}.gif",
            )
            .with_zip_filename("stickers.zip"),
            OutputDefinition::new(
                "preview",
                "Preview",
                (300, 300),
                ContainerFormat::Png,
                "{name}_{index:02d}.png",
            )
            .with_zip_filename("preview.zip"),
        ],
        cover: Some(CoverDefinition {
            width: 200,
            height: 200,
            format: ContainerFormat::Png,
            filename: "cover.png".to_string(),
        }),
        validation: FormatValidation {
            name_validation: Some(
                NameValidationRule::default()
                    .with_max_length(8)
                    .with_allowed_chars([
                        CharClass::CjkIdeograph,
                        CharClass::AsciiLetter,
                        CharClass::AsciiDigit,
                    ]),
            ),
        },
    }
}
