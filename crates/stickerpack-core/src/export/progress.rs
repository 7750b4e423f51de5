//! Progress reporting for an export run.

use tracing::debug;

use super::types::{ExportProgress, ExportStage};

pub(crate) const VALIDATED_PERCENT: f32 = 10.0;
pub(crate) const OUTPUTS_END_PERCENT: f32 = 80.0;
pub(crate) const DONE_PERCENT: f32 = 100.0;

/// Forwards progress events to a callback, never letting the percentage go
/// backwards or past 100.
pub(crate) struct ProgressReporter<'a> {
    callback: &'a mut dyn FnMut(&ExportProgress),
    last: f32,
    stage: ExportStage,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(callback: &'a mut dyn FnMut(&ExportProgress)) -> Self {
        Self {
            callback,
            last: 0.0,
            stage: ExportStage::Idle,
        }
    }

    pub fn report(&mut self, stage: ExportStage, percent: f32, status: impl Into<String>) {
        let percent = if percent.is_finite() {
            percent.clamp(self.last, DONE_PERCENT)
        } else {
            self.last
        };
        if stage != self.stage {
            debug!(?stage, percent, "export stage");
        }
        self.last = percent;
        self.stage = stage;
        (self.callback)(&ExportProgress {
            percent,
            status: status.into(),
            stage,
        });
    }

    /// Report a failure at the current percentage.
    pub fn fail(&mut self, status: impl Into<String>) {
        self.report(ExportStage::Failed, self.last, status);
    }

    pub fn stage(&self) -> ExportStage {
        self.stage
    }
}

/// Span of the 10-80 band given to output `index` of `count`.
pub(crate) fn output_band(index: usize, count: usize) -> (f32, f32) {
    let share = (OUTPUTS_END_PERCENT - VALIDATED_PERCENT) / count.max(1) as f32;
    (VALIDATED_PERCENT + index as f32 * share, share)
}

/// Percentage just before item `item` of `total` within a band.
pub(crate) fn item_percent((base, share): (f32, f32), item: usize, total: usize) -> f32 {
    if total == 0 {
        base
    } else {
        base + (item as f32 / total as f32) * share
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Whatever is reported, delivered percentages are non-decreasing and within 0-100.
        #[test]
        fn prop_reported_percent_monotonic(values in prop::collection::vec(-50.0f32..200.0, 1..40)) {
            let mut seen = Vec::new();
            {
                let mut callback = |p: &ExportProgress| seen.push(p.percent);
                let mut reporter = ProgressReporter::new(&mut callback);
                for v in &values {
                    reporter.report(ExportStage::Processing, *v, "");
                }
            }
            prop_assert!(seen.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(seen.iter().all(|p| (0.0..=100.0).contains(p)));
        }

        /// Property: Item percentages stay inside their output's band and rise with the item index.
        #[test]
        fn prop_item_percent_within_band(
            count in 1usize..=6,
            index_seed in 0usize..6,
            total in 1usize..=50,
        ) {
            let index = index_seed % count;
            let band = output_band(index, count);
            let mut prev = band.0;
            for item in 0..total {
                let p = item_percent(band, item, total);
                prop_assert!(p >= prev);
                prop_assert!(p < band.0 + band.1 + 1e-3);
                prev = p;
            }
            prop_assert!(band.0 + band.1 <= OUTPUTS_END_PERCENT + 1e-3);
        }
    }
}
