use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Extent used when a dataset has no events or no duration.
pub const EMPTY_EXTENT: f64 = 1.0;

/// The full time extent of a dataset, in time units (seconds since the
/// encounter started).
///
/// Always satisfies `min < max`: a zero-width extent is widened by
/// [`EMPTY_EXTENT`] so scales built on it never divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min: f64,
    pub max: f64,
}

impl TimeBounds {
    pub fn new(min: f64, max: f64) -> Self {
        let min = if min.is_finite() { min } else { 0.0 };
        let max = if max.is_finite() && max > min {
            max
        } else {
            min + EMPTY_EXTENT
        };
        Self { min, max }
    }

    /// Total width of the extent.
    pub fn extent(&self) -> f64 {
        self.max - self.min
    }

    /// Clamp a time into the extent.
    pub fn clamp(&self, t: f64) -> f64 {
        t.clamp(self.min, self.max)
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.min && t <= self.max
    }
}

/// The currently visible time sub-range.
///
/// Plain data: the invariant `start < end` inside the dataset bounds is
/// enforced by the viewport controller that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub start: f64,
    pub end: f64,
}

impl ViewportState {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Window width; the zoom level is implied by it.
    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Whether `[start, end]` touches the window (inclusive on both sides).
    pub fn intersects(&self, start: f64, end: f64) -> bool {
        end >= self.start && start <= self.end
    }

    /// Expand both sides by `padding` time units.
    pub fn padded(&self, padding: f64) -> Self {
        Self {
            start: self.start - padding,
            end: self.end + padding,
        }
    }

    /// Whether the range is usable: finite and strictly increasing.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end
    }
}

impl From<TimeBounds> for ViewportState {
    fn from(bounds: TimeBounds) -> Self {
        Self::new(bounds.min, bounds.max)
    }
}
