//! Pre-flight checks run before any image is touched.

use super::types::ValidationError;
use crate::catalog::ExportFormat;
use crate::collection::ImageItem;

/// Check count, cover presence, and every name against `format`.
///
/// Checks run in that order and the first failure is returned.
pub fn validate_export(
    format: &ExportFormat,
    images: &[ImageItem],
    has_cover: bool,
) -> Result<(), ValidationError> {
    let requirements = &format.requirements;
    if !requirements.accepts(images.len()) {
        return Err(ValidationError::CountMismatch {
            required: requirements.describe(),
            actual: images.len(),
        });
    }

    if requirements.cover_required && !has_cover {
        return Err(ValidationError::MissingCover);
    }

    if let Some(rule) = format.name_rule() {
        for image in images {
            if let Err(violation) = rule.check(&image.name) {
                return Err(ValidationError::InvalidName {
                    name: image.name.clone(),
                    violation,
                    rule: rule.describe(),
                });
            }
        }
    }

    Ok(())
}
