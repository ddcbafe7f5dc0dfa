//! Zoom-level classification and the level → (bucket size, strategy) table.
//!
//! Bucket sizes come from a fixed table rather than from the window width,
//! so bucket boundaries stay put while the user zooms in small steps.

use timelane_protocol::{RenderStrategy, ViewportState, ZoomLevel};

use crate::config::{LodTable, ZoomThresholds};

/// Classify a window width against the configured breakpoints.
pub fn classify(width: f64, thresholds: &ZoomThresholds) -> ZoomLevel {
    if width < thresholds.fine_max {
        ZoomLevel::Fine
    } else if width < thresholds.medium_max {
        ZoomLevel::Medium
    } else if width < thresholds.coarse_max {
        ZoomLevel::Coarse
    } else {
        ZoomLevel::Aggregate
    }
}

/// The level of detail chosen for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodSelection {
    pub level: ZoomLevel,
    pub bucket_size: f64,
    pub strategy: RenderStrategy,
}

impl LodSelection {
    pub fn for_viewport(viewport: ViewportState, thresholds: &ZoomThresholds, table: &LodTable) -> Self {
        let level = classify(viewport.width(), thresholds);
        let entry = table.entry(level);
        Self {
            level,
            bucket_size: entry.bucket_size,
            strategy: entry.strategy,
        }
    }
}
