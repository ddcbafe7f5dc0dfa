//! Cast lane packing and the casts track frame.
//!
//! Casts are packed into a fixed number of lanes with a greedy,
//! preferred-lane strategy: rotational abilities rotate over the upper
//! lanes, cooldowns and utility go to the bottom lane. Casts that fit
//! nowhere are marked as overflow and summarized by "+N" badges.

use std::collections::{BTreeMap, HashMap};

use timelane_protocol::{
    CastMarker, CastTrackFrame, LaneAssignment, OverflowBadge, PointEvent, RenderStrategy,
    ViewportState, ZoomLevel,
};

use crate::classify::{CastCategory, Classifier};
use crate::config::{CastLaneConfig, TrackMetrics};
use crate::scale::TimeScale;
use crate::views::buckets::aggregate;

/// Assign every cast a lane. The result is index-aligned with `events`.
///
/// Events are visited in time order; ties keep their input order.
pub fn pack_casts(
    events: &[PointEvent],
    classifier: &Classifier<'_>,
    config: &CastLaneConfig,
) -> Vec<LaneAssignment> {
    let lane_count = config.lane_count.max(1);
    let rotational_lanes = (lane_count - 1).max(1);

    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| events[a].timestamp.total_cmp(&events[b].timestamp));

    let mut rotation: HashMap<u32, usize> = HashMap::new();
    let mut lane_end = vec![f64::NEG_INFINITY; lane_count];
    let mut assignments = vec![
        LaneAssignment {
            event_id: 0,
            lane: 0,
            is_overflow: false,
        };
        events.len()
    ];

    for idx in order {
        let event = &events[idx];
        let t = event.timestamp;
        let preferred = match classifier.cast(event.category_id) {
            CastCategory::Cooldown | CastCategory::Utility => lane_count - 1,
            CastCategory::Rotational => {
                let next = rotation.len();
                let index = *rotation.entry(event.category_id).or_insert(next);
                index % rotational_lanes
            }
        };

        let fits = |lane: usize| lane_end[lane] + config.min_gap < t;
        let lane = if fits(preferred) {
            Some(preferred)
        } else {
            (0..lane_count).find(|&l| l != preferred && fits(l))
        };

        assignments[idx] = match lane {
            Some(lane) => {
                lane_end[lane] = t + event.duration.max(config.min_duration);
                LaneAssignment {
                    event_id: event.id,
                    lane,
                    is_overflow: false,
                }
            }
            None => LaneAssignment {
                event_id: event.id,
                lane: 0,
                is_overflow: true,
            },
        };
    }

    let overflow = assignments.iter().filter(|a| a.is_overflow).count();
    if overflow > 0 {
        log::debug!("{overflow} of {} casts overflowed {lane_count} lanes", events.len());
    }
    assignments
}

/// Group overflow casts in `[start, end]` into fixed windows.
///
/// `events` must be sorted by timestamp and `assignments` index-aligned
/// with it. Badges come out sorted by window.
pub fn overflow_badges(
    events: &[PointEvent],
    assignments: &[LaneAssignment],
    start: f64,
    end: f64,
    window: f64,
    time: &TimeScale,
) -> Vec<OverflowBadge> {
    if window.is_nan() || window <= 0.0 {
        return Vec::new();
    }
    let lo = events.partition_point(|e| e.timestamp < start);
    let hi = events.partition_point(|e| e.timestamp <= end);

    let mut windows: BTreeMap<i64, OverflowBadge> = BTreeMap::new();
    for (event, assignment) in events.iter().zip(assignments).take(hi).skip(lo) {
        if !assignment.is_overflow {
            continue;
        }
        let index = (event.timestamp / window).floor() as i64;
        windows
            .entry(index)
            .and_modify(|badge| badge.count += 1)
            .or_insert_with(|| OverflowBadge {
                window_timestamp: index as f64 * window,
                timestamp: event.timestamp,
                count: 1,
                x: time.time_to_x(event.timestamp),
            });
    }
    windows.into_values().collect()
}

/// Placed casts inside the window, padded by `config.cull_padding`.
pub fn visible_casts(
    events: &[PointEvent],
    assignments: &[LaneAssignment],
    view: ViewportState,
    config: &CastLaneConfig,
    metrics: &TrackMetrics,
    time: &TimeScale,
) -> Vec<CastMarker> {
    let padded = view.padded(config.cull_padding);
    let lo = events.partition_point(|e| e.timestamp < padded.start);
    let hi = events.partition_point(|e| e.timestamp <= padded.end);

    events
        .iter()
        .zip(assignments)
        .take(hi)
        .skip(lo)
        .filter(|(_, a)| !a.is_overflow)
        .map(|(e, a)| CastMarker {
            event_id: e.id,
            category_id: e.category_id,
            timestamp: e.timestamp,
            duration: e.duration,
            lane: a.lane,
            x: time.time_to_x(e.timestamp),
            width: time
                .span_width(e.timestamp, e.end())
                .max(metrics.cast_min_width),
        })
        .collect()
}

/// Build the casts track for one frame.
///
/// At aggregate zoom individual capsules are replaced by count buckets
/// scaled against the fullest bucket in the window.
pub fn cast_frame(
    events: &[PointEvent],
    assignments: &[LaneAssignment],
    view: ViewportState,
    level: ZoomLevel,
    config: &CastLaneConfig,
    metrics: &TrackMetrics,
    time: &TimeScale,
) -> CastTrackFrame {
    let lane_count = config.lane_count.max(1);

    if level == ZoomLevel::Aggregate {
        let size = config.density_bucket;
        let buckets = aggregate(events, view.start, view.end, size);
        let max_count = buckets
            .iter()
            .map(|b| b.count)
            .max()
            .unwrap_or(0)
            .max(1);
        return CastTrackFrame {
            strategy: RenderStrategy::Histogram,
            lane_count,
            markers: Vec::new(),
            badges: Vec::new(),
            buckets,
            max_count,
        };
    }

    CastTrackFrame {
        strategy: RenderStrategy::Individual,
        lane_count,
        markers: visible_casts(events, assignments, view, config, metrics, time),
        badges: overflow_badges(
            events,
            assignments,
            view.start,
            view.end,
            config.overflow_window,
            time,
        ),
        buckets: Vec::new(),
        max_count: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;

    const COOLDOWN: u32 = 19574;

    fn packed(events: &[PointEvent]) -> Vec<LaneAssignment> {
        let classify = ClassifierConfig::default();
        pack_casts(events, &Classifier::new(&classify), &CastLaneConfig::default())
    }

    #[test]
    fn cooldowns_prefer_the_last_lane() {
        let events = vec![PointEvent::at(1, 1.0, COOLDOWN)];
        let lanes = packed(&events);
        assert_eq!(lanes[0].lane, 2);
        assert!(!lanes[0].is_overflow);
    }

    #[test]
    fn rotational_abilities_rotate_over_upper_lanes() {
        let events = vec![
            PointEvent::at(1, 0.0, 100),
            PointEvent::at(2, 5.0, 200),
            PointEvent::at(3, 10.0, 300),
            PointEvent::at(4, 15.0, 100),
        ];
        let lanes: Vec<usize> = packed(&events).iter().map(|a| a.lane).collect();
        assert_eq!(lanes, vec![0, 1, 0, 0]);
    }

    #[test]
    fn busy_preferred_lane_falls_back_to_the_next_free_one() {
        let events = vec![PointEvent::at(1, 0.0, 100), PointEvent::at(2, 0.1, 100)];
        let lanes = packed(&events);
        assert_eq!(lanes[0].lane, 0);
        assert_eq!(lanes[1].lane, 1);
    }

    #[test]
    fn simultaneous_casts_overflow_into_one_badge() {
        let n = 7;
        let events: Vec<PointEvent> = (0..n).map(|i| PointEvent::at(i, 4.2, 100)).collect();
        let lanes = packed(&events);
        let overflow = lanes.iter().filter(|a| a.is_overflow).count();
        assert_eq!(overflow, n as usize - 3);
        assert!(lanes.iter().filter(|a| a.is_overflow).all(|a| a.lane == 0));

        let time = TimeScale::new(ViewportState::new(0.0, 10.0), 1000.0);
        let badges = overflow_badges(&events, &lanes, 0.0, 10.0, 0.5, &time);
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].count, n as usize - 3);
        assert_eq!(badges[0].window_timestamp, 4.0);
        assert_eq!(badges[0].timestamp, 4.2);
    }

    #[test]
    fn placed_casts_never_overlap_within_a_lane() {
        let events: Vec<PointEvent> = (0..200)
            .map(|i| {
                let category = if i % 9 == 0 { COOLDOWN } else { 10 + (i % 4) as u32 };
                PointEvent {
                    duration: if i % 5 == 0 { 1.5 } else { 0.0 },
                    ..PointEvent::at(i, i as f64 * 0.17, category)
                }
            })
            .collect();
        let lanes = packed(&events);
        let config = CastLaneConfig::default();
        let mut last_end = vec![f64::NEG_INFINITY; config.lane_count];
        for (event, a) in events.iter().zip(&lanes) {
            if a.is_overflow {
                continue;
            }
            assert!(last_end[a.lane] + config.min_gap < event.timestamp);
            last_end[a.lane] = event.timestamp + event.duration.max(config.min_duration);
        }
    }

    #[test]
    fn visible_casts_are_culled_with_padding() {
        let events: Vec<PointEvent> = (0..20).map(|i| PointEvent::at(i, i as f64, 100)).collect();
        let lanes = packed(&events);
        let view = ViewportState::new(5.0, 10.0);
        let time = TimeScale::new(view, 500.0);
        let markers = visible_casts(
            &events,
            &lanes,
            view,
            &CastLaneConfig::default(),
            &TrackMetrics::default(),
            &time,
        );
        let ids: Vec<u64> = markers.iter().map(|m| m.event_id).collect();
        assert_eq!(ids, (4..=11).collect::<Vec<u64>>());
        assert!(markers.iter().all(|m| m.width >= 24.0));
    }

    #[test]
    fn aggregate_zoom_switches_to_count_buckets() {
        let events: Vec<PointEvent> = (0..50).map(|i| PointEvent::at(i, i as f64 * 0.5, (i % 3) as u32)).collect();
        let lanes = packed(&events);
        let view = ViewportState::new(0.0, 400.0);
        let time = TimeScale::new(view, 800.0);
        let frame = cast_frame(
            &events,
            &lanes,
            view,
            ZoomLevel::Aggregate,
            &CastLaneConfig::default(),
            &TrackMetrics::default(),
            &time,
        );
        assert_eq!(frame.strategy, RenderStrategy::Histogram);
        assert!(frame.markers.is_empty());
        assert_eq!(frame.buckets.iter().map(|b| b.count).sum::<usize>(), 50);
        assert_eq!(frame.max_count, 2);
    }

    #[test]
    fn aggregate_height_follows_the_fullest_bucket() {
        let events: Vec<PointEvent> = (0..2000).map(|i| PointEvent::at(i, i as f64 * 0.2, 100)).collect();
        let lanes = packed(&events);
        let view = ViewportState::new(0.0, 400.0);
        let time = TimeScale::new(view, 800.0);
        let frame = cast_frame(
            &events,
            &lanes,
            view,
            ZoomLevel::Aggregate,
            &CastLaneConfig::default(),
            &TrackMetrics::default(),
            &time,
        );
        let fullest = frame.buckets.iter().map(|b| b.count).max().unwrap();
        assert!(fullest >= 5);
        assert_eq!(frame.max_count, fullest);
        assert!(frame.buckets.iter().all(|b| b.timestamp >= 0.0 && b.timestamp <= 400.0));
    }

    #[test]
    fn badges_only_count_overflow_inside_the_window() {
        let mut events: Vec<PointEvent> = (0..6).map(|i| PointEvent::at(i, 9.2, 100)).collect();
        events.extend((6..12).map(|i| PointEvent::at(i, 10.6, 100)));
        let lanes = packed(&events);
        let view = ViewportState::new(0.0, 10.0);
        let time = TimeScale::new(view, 1000.0);
        let frame = cast_frame(
            &events,
            &lanes,
            view,
            ZoomLevel::Fine,
            &CastLaneConfig::default(),
            &TrackMetrics::default(),
            &time,
        );
        assert_eq!(frame.badges.len(), 1);
        assert_eq!(frame.badges[0].window_timestamp, 9.0);
        assert_eq!(frame.badges[0].count, 3);
    }
}
