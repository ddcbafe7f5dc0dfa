use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::types::{Rect, TimeBounds, ViewportState};

/// Discrete level-of-detail classification of the visible window width.
///
/// Ordered from the narrowest window to the widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomLevel {
    Fine,
    Medium,
    Coarse,
    Aggregate,
}

impl ZoomLevel {
    pub const ALL: [ZoomLevel; 4] = [Self::Fine, Self::Medium, Self::Coarse, Self::Aggregate];
}

/// How a track draws its events at a given zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    /// One marker per event.
    Individual,
    /// Discrete bars per bucket.
    Histogram,
    /// Continuous area built from per-bucket rates.
    Density,
}

/// Vertically stacked tracks, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackId {
    Phases,
    Casts,
    Buffs,
    Debuffs,
    Damage,
    Resources,
}

/// Where a track sits in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackLayout {
    pub track_id: TrackId,
    pub y: f64,
    pub height: f64,
    pub visible: bool,
}

/// Lane placement for one point event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneAssignment {
    pub event_id: u64,
    pub lane: usize,
    /// Could not be placed; only counted in an [`OverflowBadge`].
    pub is_overflow: bool,
}

/// "+N" badge for overflow events that share a time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverflowBadge {
    /// Left edge of the grouping window.
    pub window_timestamp: f64,
    /// Timestamp of the first overflow event in the window.
    pub timestamp: f64,
    pub count: usize,
    pub x: f64,
}

/// Per-category slice of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub amount: f64,
    pub count: usize,
    pub flag_count: usize,
}

/// Aggregate over every event with a timestamp in
/// `[timestamp, timestamp + bucket_size)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub timestamp: f64,
    pub total_value: f64,
    pub max_value: f64,
    pub count: usize,
    pub has_flag: bool,
    pub breakdown: BTreeMap<u32, BreakdownEntry>,
}

impl Bucket {
    pub fn empty(timestamp: f64) -> Self {
        Self {
            timestamp,
            total_value: 0.0,
            max_value: 0.0,
            count: 0,
            has_flag: false,
            breakdown: BTreeMap::new(),
        }
    }
}

/// One vertex of a density ribbon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    /// Bucket center.
    pub timestamp: f64,
    /// Bucket total divided by bucket width.
    pub rate: f64,
    /// `rate / max_rate`, in `[0, 1]`.
    pub normalized: f64,
}

/// A single point event drawn individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    pub event_id: u64,
    pub category_id: u32,
    pub timestamp: f64,
    pub value: f64,
    pub flagged: bool,
    pub x: f64,
    pub y: f64,
}

/// Level-of-detail output for a value track (damage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LodFrame {
    Individual {
        bucket_size: f64,
        markers: Vec<PointMarker>,
    },
    Histogram {
        bucket_size: f64,
        buckets: Vec<Bucket>,
        max_total: f64,
        max_value: f64,
    },
    Density {
        bucket_size: f64,
        buckets: Vec<Bucket>,
        rates: Vec<RatePoint>,
        max_rate: f64,
    },
}

impl LodFrame {
    pub fn strategy(&self) -> RenderStrategy {
        match self {
            Self::Individual { .. } => RenderStrategy::Individual,
            Self::Histogram { .. } => RenderStrategy::Histogram,
            Self::Density { .. } => RenderStrategy::Density,
        }
    }
}

/// A cast capsule placed in a lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMarker {
    pub event_id: u64,
    pub category_id: u32,
    pub timestamp: f64,
    pub duration: f64,
    pub lane: usize,
    pub x: f64,
    pub width: f64,
}

/// Casts track output: lane markers and badges, or count buckets when the
/// window is too wide for individual capsules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastTrackFrame {
    pub strategy: RenderStrategy,
    pub lane_count: usize,
    pub markers: Vec<CastMarker>,
    pub badges: Vec<OverflowBadge>,
    pub buckets: Vec<Bucket>,
    pub max_count: usize,
}

/// A merged buff/debuff bar ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarPrimitive {
    pub event_id: u64,
    pub category_id: u32,
    pub category: SharedStr,
    /// Position of the category in the track's fixed category order.
    pub category_index: usize,
    pub lane: usize,
    pub start: f64,
    pub end: f64,
    pub stacks: u32,
    pub target: Option<SharedStr>,
    /// Start times of applications folded into this bar.
    pub refresh_marks: Vec<f64>,
    pub x: f64,
    pub width: f64,
    pub y: f64,
    /// Share of the visible window covered by this bar.
    pub uptime: f64,
}

/// Lane count and vertical offset of one category block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLanes {
    pub category: SharedStr,
    pub lanes: usize,
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalTrackFrame {
    pub categories: Vec<CategoryLanes>,
    pub height: f64,
    pub bars: Vec<BarPrimitive>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourcePoint {
    pub timestamp: f64,
    pub value: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFrame {
    pub points: Vec<ResourcePoint>,
    /// Ranges where the resource sits below the critical threshold.
    pub critical_zones: Vec<TimeSpan>,
    pub downsampled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpan {
    pub id: SharedStr,
    pub label: Option<SharedStr>,
    pub start: f64,
    pub end: f64,
    pub x: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTick {
    pub time: f64,
    pub x: f64,
    pub major: bool,
    pub label: Option<String>,
}

/// Minimap brush position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushRect {
    pub x: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimapFrame {
    pub brush: BrushRect,
    pub density: Vec<Rect>,
    pub max_count: usize,
}

/// Parameters of the time-to-pixel mapping used for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    pub start: f64,
    pub end: f64,
    pub inner_width: f64,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    pub bounds: TimeBounds,
    pub viewport: ViewportState,
    pub zoom_level: ZoomLevel,
    pub strategy: RenderStrategy,
    pub bucket_size: f64,
    pub scale: ScaleParams,
    pub tracks: Vec<TrackLayout>,
    pub total_height: f64,
    pub axis: Vec<AxisTick>,
    pub phases: Vec<PhaseSpan>,
    pub casts: CastTrackFrame,
    pub buffs: IntervalTrackFrame,
    pub debuffs: IntervalTrackFrame,
    pub damage: LodFrame,
    pub resources: ResourceFrame,
    pub minimap: MinimapFrame,
}
