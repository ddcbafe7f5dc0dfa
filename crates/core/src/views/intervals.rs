//! Buff/debuff lane packing.
//!
//! Intervals are partitioned into categories stacked in a fixed order.
//! Inside a category, intervals are packed into swimlanes: each one goes
//! to the first lane whose last bar ended early enough, or opens a new
//! lane. Optionally, back-to-back applications of the same ability are
//! merged into one bar with refresh marks.

use timelane_protocol::{
    BarPrimitive, CategoryLanes, IntervalEvent, IntervalTrackFrame, SharedStr, ViewportState,
};

use crate::classify::LaneCategory;
use crate::config::{IntervalPackingConfig, RowMetrics};
use crate::scale::TimeScale;

/// A bar after packing, before it is positioned for a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedBar {
    pub event_id: u64,
    pub category_id: u32,
    pub category_index: usize,
    pub lane: usize,
    pub start: f64,
    pub end: f64,
    pub stacks: u32,
    pub target: Option<SharedStr>,
    pub refresh_marks: Vec<f64>,
}

/// Packing result for one interval track. Depends only on the event set
/// and the packing config, never on the viewport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedIntervals {
    /// Category names in stacking order.
    pub categories: Vec<&'static str>,
    /// Lanes used per category, index-aligned with `categories`.
    pub lanes: Vec<usize>,
    /// Grouped by category, each group sorted by start.
    pub bars: Vec<PackedBar>,
}

struct LaneState {
    end: f64,
    bar: usize,
}

/// Pack `events` into per-category swimlanes.
pub fn pack_intervals<C: LaneCategory>(
    events: &[IntervalEvent],
    classify: impl Fn(&IntervalEvent) -> C,
    config: &IntervalPackingConfig,
) -> PackedIntervals {
    let mut groups: Vec<Vec<&IntervalEvent>> = vec![Vec::new(); C::ORDER.len()];
    for event in events {
        groups[classify(event).index()].push(event);
    }

    let mut packed = PackedIntervals {
        categories: C::ORDER.iter().map(|c| c.name()).collect(),
        lanes: vec![0; C::ORDER.len()],
        bars: Vec::with_capacity(events.len()),
    };

    for (category_index, mut group) in groups.into_iter().enumerate() {
        group.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut lanes: Vec<LaneState> = Vec::new();
        for event in group {
            let start = event.start;
            let end = event.normalized_end();
            let stacks = event.stacks.unwrap_or(1);

            if let Some(tolerance) = config.merge_tolerance {
                let mergeable = lanes.iter_mut().find(|lane| {
                    let bar = &packed.bars[lane.bar];
                    bar.category_id == event.category_id && start <= bar.end + tolerance
                });
                if let Some(lane) = mergeable {
                    let bar = &mut packed.bars[lane.bar];
                    bar.end = bar.end.max(end);
                    bar.stacks = bar.stacks.max(stacks);
                    bar.refresh_marks.push(start);
                    lane.end = bar.end;
                    continue;
                }
            }

            let free = lanes
                .iter()
                .position(|lane| lane.end + config.lane_gap < start);
            let lane_index = free.unwrap_or(lanes.len());
            let bar = packed.bars.len();
            packed.bars.push(PackedBar {
                event_id: event.id,
                category_id: event.category_id,
                category_index,
                lane: lane_index,
                start,
                end,
                stacks,
                target: event.target.clone(),
                refresh_marks: Vec::new(),
            });
            match lanes.get_mut(lane_index) {
                Some(lane) => *lane = LaneState { end, bar },
                None => lanes.push(LaneState { end, bar }),
            }
        }
        packed.lanes[category_index] = lanes.len();
    }
    packed
}

impl PackedIntervals {
    /// Vertical offset of each category block and the total track height.
    ///
    /// Empty categories take no space. The trailing category gap is not
    /// counted, and the height never drops below one row.
    pub fn offsets(&self, rows: RowMetrics) -> (Vec<f64>, f64) {
        let row = rows.row_height + rows.row_gap;
        let mut offsets = Vec::with_capacity(self.lanes.len());
        let mut y = 0.0;
        for &lanes in &self.lanes {
            offsets.push(y);
            if lanes > 0 {
                y += lanes as f64 * row + rows.category_gap;
            }
        }
        let height = (y - rows.category_gap).max(rows.row_height);
        (offsets, height)
    }

    /// Bars touching the window, positioned for the frame.
    pub fn frame(&self, view: ViewportState, rows: RowMetrics, time: &TimeScale) -> IntervalTrackFrame {
        let (offsets, height) = self.offsets(rows);
        let row = rows.row_height + rows.row_gap;
        let width = view.width();

        let bars = (0..self.categories.len())
            .flat_map(|category| self.visible_in(category, view))
            .map(|bar| {
                let overlap = bar.end.min(view.end) - bar.start.max(view.start);
                BarPrimitive {
                    event_id: bar.event_id,
                    category_id: bar.category_id,
                    category: SharedStr::from(self.categories[bar.category_index]),
                    category_index: bar.category_index,
                    lane: bar.lane,
                    start: bar.start,
                    end: bar.end,
                    stacks: bar.stacks,
                    target: bar.target.clone(),
                    refresh_marks: bar.refresh_marks.clone(),
                    x: time.time_to_x(bar.start),
                    width: time.span_width(bar.start, bar.end),
                    y: offsets[bar.category_index] + bar.lane as f64 * row,
                    uptime: if width > 0.0 { overlap.max(0.0) / width } else { 0.0 },
                }
            })
            .collect();

        let categories = self
            .categories
            .iter()
            .zip(&self.lanes)
            .zip(&offsets)
            .map(|((name, &lanes), &offset)| CategoryLanes {
                category: SharedStr::from(*name),
                lanes,
                offset,
            })
            .collect();

        IntervalTrackFrame {
            categories,
            height,
            bars,
        }
    }

    /// Bars of one category touching the window. A category's bars are
    /// contiguous and sorted by start, so both cuts are binary searches.
    fn visible_in(&self, category: usize, view: ViewportState) -> impl Iterator<Item = &PackedBar> {
        let lo = self.bars.partition_point(|bar| bar.category_index < category);
        let group = &self.bars[lo..];
        let group = &group[..group.partition_point(|bar| bar.category_index == category)];
        let hi = group.partition_point(|bar| bar.start <= view.end);
        group[..hi].iter().filter(move |bar| bar.end >= view.start)
    }
}
