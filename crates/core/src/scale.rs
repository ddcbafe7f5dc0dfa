//! Linear mappings between time/value space and pixel space.

use timelane_protocol::{ScaleParams, TimeBounds, ViewportState};

/// Maps times in `[start, end]` onto `[0, inner_width]` pixels.
///
/// Results are not clamped: shapes that start offscreen get negative
/// coordinates and the caller clips them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    start: f64,
    end: f64,
    inner_width: f64,
}

impl TimeScale {
    pub fn new(viewport: ViewportState, inner_width: f64) -> Self {
        Self {
            start: viewport.start,
            end: viewport.end,
            inner_width: inner_width.max(0.0),
        }
    }

    /// A scale spanning the whole dataset, independent of the viewport.
    pub fn full_extent(bounds: TimeBounds, inner_width: f64) -> Self {
        Self::new(ViewportState::from(bounds), inner_width)
    }

    pub fn time_to_x(&self, t: f64) -> f64 {
        let width = self.end - self.start;
        if width <= 0.0 {
            return 0.0;
        }
        (t - self.start) / width * self.inner_width
    }

    pub fn x_to_time(&self, x: f64) -> f64 {
        if self.inner_width <= 0.0 {
            return self.start;
        }
        self.start + x / self.inner_width * (self.end - self.start)
    }

    /// Pixel width of `[t0, t1]`.
    pub fn span_width(&self, t0: f64, t1: f64) -> f64 {
        self.time_to_x(t1) - self.time_to_x(t0)
    }

    pub fn inner_width(&self) -> f64 {
        self.inner_width
    }

    pub fn params(&self) -> ScaleParams {
        ScaleParams {
            start: self.start,
            end: self.end,
            inner_width: self.inner_width,
        }
    }
}

/// Maps values in `[0, max_value]` onto `[height - margin, margin]`;
/// larger values draw higher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScale {
    max_value: f64,
    height: f64,
    margin: f64,
    min_offset: f64,
}

impl ValueScale {
    /// `max_value` is floored at 1 so an all-zero series still maps.
    pub fn new(max_value: f64, height: f64, margin: f64, min_offset: f64) -> Self {
        let max_value = if max_value.is_finite() {
            max_value.max(1.0)
        } else {
            1.0
        };
        Self {
            max_value,
            height: height.max(0.0),
            margin: margin.max(0.0),
            min_offset: min_offset.max(0.0),
        }
    }

    /// The baseline (y of a zero value before the marker offset).
    pub fn baseline(&self) -> f64 {
        self.height - self.margin
    }

    fn usable(&self) -> f64 {
        (self.height - 2.0 * self.margin).max(0.0)
    }

    pub fn value_to_y(&self, v: f64) -> f64 {
        let lifted = v.max(0.0) / self.max_value * self.usable();
        self.baseline() - lifted.max(self.min_offset)
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }
}

/// The coordinate functions of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    pub time: TimeScale,
    pub damage: ValueScale,
    pub resource: ValueScale,
}
