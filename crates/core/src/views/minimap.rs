use timelane_protocol::{BrushRect, Rect, TimeBounds, ViewportState};

use crate::scale::TimeScale;
use crate::viewport::{ViewportController, ViewportError};

/// Where the current window sits on the full-extent minimap.
pub fn brush_rect(bounds: TimeBounds, view: ViewportState, width: f64) -> BrushRect {
    let full = TimeScale::full_extent(bounds, width);
    let x = full.time_to_x(view.start);
    BrushRect {
        x,
        width: full.time_to_x(view.end) - x,
    }
}

/// Event counts over the whole extent, in equal-width time buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct DensitySummary {
    pub counts: Vec<usize>,
    /// Largest count, floored at 1.
    pub max_count: usize,
}

/// Bucket `timestamps` over `bounds`. Timestamps outside the bounds are
/// ignored; one exactly at `bounds.max` counts toward the last bucket.
pub fn density_summary(timestamps: &[f64], bounds: TimeBounds, bucket_count: usize) -> DensitySummary {
    let mut counts = vec![0usize; bucket_count];
    let extent = bounds.extent();
    if bucket_count > 0 && extent > 0.0 {
        for &t in timestamps {
            if !bounds.contains(t) {
                continue;
            }
            let index = ((t - bounds.min) / extent * bucket_count as f64).floor() as usize;
            counts[index.min(bucket_count - 1)] += 1;
        }
    }
    let max_count = counts.iter().copied().max().unwrap_or(0).max(1);
    DensitySummary { counts, max_count }
}

impl DensitySummary {
    /// One bar per non-empty bucket, bottom-aligned in `max_height`.
    pub fn bars(&self, width: f64, max_height: f64) -> Vec<Rect> {
        if self.counts.is_empty() {
            return Vec::new();
        }
        let bar_width = width / self.counts.len() as f64;
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(i, &count)| {
                let h = count as f64 / self.max_count as f64 * max_height;
                Rect::new(i as f64 * bar_width, max_height - h, bar_width, h)
            })
            .collect()
    }
}

/// Move the window so it is centered on minimap position `x`, keeping
/// its width.
pub fn recenter(
    controller: &mut ViewportController,
    x: f64,
    minimap_width: f64,
) -> Result<ViewportState, ViewportError> {
    if !x.is_finite() {
        return Err(ViewportError::NonFinite("minimap x"));
    }
    let bounds = controller.bounds();
    let full = TimeScale::full_extent(bounds, minimap_width);
    let t = bounds.clamp(full.x_to_time(x));
    let width = controller.state().width();
    let latest_start = (bounds.max - width).max(bounds.min);
    let start = (t - width / 2.0).clamp(bounds.min, latest_start);
    controller.zoom_to_range(start, start + width)
}

/// Click-and-drag on the minimap brush.
///
/// While dragging, every move recenters the window, even when the pointer
/// has left the minimap. Up and cancel always end the drag.
#[derive(Debug, Clone, Default)]
pub struct BrushDrag {
    dragging: bool,
}

impl BrushDrag {
    pub fn pointer_down(
        &mut self,
        x: f64,
        controller: &mut ViewportController,
        minimap_width: f64,
    ) -> Result<ViewportState, ViewportError> {
        self.dragging = true;
        recenter(controller, x, minimap_width)
    }

    pub fn pointer_move(
        &mut self,
        x: f64,
        controller: &mut ViewportController,
        minimap_width: f64,
    ) -> Option<Result<ViewportState, ViewportError>> {
        self.dragging
            .then(|| recenter(controller, x, minimap_width))
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    pub fn pointer_cancel(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}
