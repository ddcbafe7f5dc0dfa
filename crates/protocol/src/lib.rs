pub mod events;
pub mod frame;
pub mod shared_str;
pub mod types;

pub use events::{Event, IntervalEvent, Phase, PointEvent, ResourceSample, TimelineData};
pub use frame::{
    AxisTick, BarPrimitive, BreakdownEntry, BrushRect, Bucket, CastMarker, CastTrackFrame,
    CategoryLanes, FrameOutput, IntervalTrackFrame, LaneAssignment, LodFrame, MinimapFrame,
    OverflowBadge, PhaseSpan, PointMarker, RatePoint, RenderStrategy, ResourceFrame,
    ResourcePoint, ScaleParams, TimeSpan, TrackId, TrackLayout, ZoomLevel,
};
pub use shared_str::SharedStr;
pub use types::{Rect, TimeBounds, ViewportState};
