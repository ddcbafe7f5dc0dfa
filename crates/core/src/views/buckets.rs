//! Time-bucket aggregation of point events and the damage track frame.
//!
//! Every function here expects events sorted by timestamp (the dataset
//! guarantees it) and slices them with binary search, so the per-frame
//! cost is `O(log n + visible)` regardless of dataset size.

use timelane_protocol::{Bucket, LodFrame, PointEvent, PointMarker, RatePoint, RenderStrategy};

use crate::config::TrackMetrics;
use crate::lod::LodSelection;
use crate::scale::{TimeScale, ValueScale};

/// Left edge of the bucket containing `t`.
pub fn bucket_key(t: f64, size: f64) -> f64 {
    (t / size).floor() * size
}

/// Events with `start <= timestamp <= end`.
pub fn slice_range(events: &[PointEvent], start: f64, end: f64) -> &[PointEvent] {
    let lo = events.partition_point(|e| e.timestamp < start);
    let hi = events.partition_point(|e| e.timestamp <= end);
    if lo >= hi { &[] } else { &events[lo..hi] }
}

/// Aggregate the events inside `[start, end]` into buckets of `size`.
///
/// Only non-empty buckets are produced, in time order. Each event lands in
/// exactly one bucket.
pub fn aggregate(events: &[PointEvent], start: f64, end: f64, size: f64) -> Vec<Bucket> {
    if size.is_nan() || size <= 0.0 {
        return Vec::new();
    }
    let mut buckets: Vec<Bucket> = Vec::new();
    for event in slice_range(events, start, end) {
        let key = bucket_key(event.timestamp, size);
        if buckets.last().is_none_or(|b| b.timestamp != key) {
            buckets.push(Bucket::empty(key));
        }
        if let Some(bucket) = buckets.last_mut() {
            add_event(bucket, event);
        }
    }
    buckets
}

fn add_event(bucket: &mut Bucket, event: &PointEvent) {
    bucket.total_value += event.value;
    bucket.max_value = bucket.max_value.max(event.value);
    bucket.count += 1;
    bucket.has_flag |= event.flagged;
    let entry = bucket
        .breakdown
        .entry(event.category_id)
        .or_default();
    entry.amount += event.value;
    entry.count += 1;
    if event.flagged {
        entry.flag_count += 1;
    }
}

/// Largest bucket total and largest single value, each floored at 1.
pub fn bucket_maxima(buckets: &[Bucket]) -> (f64, f64) {
    buckets.iter().fold((1.0_f64, 1.0_f64), |(total, value), b| {
        (total.max(b.total_value), value.max(b.max_value))
    })
}

/// Per-bucket rates (total per time unit) at bucket centers.
pub fn density_rates(buckets: &[Bucket], size: f64) -> (Vec<RatePoint>, f64) {
    let rate_of = |b: &Bucket| if size > 0.0 { b.total_value / size } else { 0.0 };
    let max_rate = buckets.iter().map(rate_of).fold(1.0_f64, f64::max);
    let points = buckets
        .iter()
        .map(|b| {
            let rate = rate_of(b);
            RatePoint {
                timestamp: b.timestamp + size / 2.0,
                rate,
                normalized: rate / max_rate,
            }
        })
        .collect();
    (points, max_rate)
}

/// Build the damage track for the selected level of detail.
///
/// Returns the frame together with the value scale its `y` coordinates
/// were computed with.
pub fn damage_frame(
    events: &[PointEvent],
    selection: LodSelection,
    time: &TimeScale,
    height: f64,
    metrics: &TrackMetrics,
) -> (LodFrame, ValueScale) {
    let size = selection.bucket_size;
    let params = time.params();
    let (start, end) = (params.start - size, params.end + size);

    match selection.strategy {
        RenderStrategy::Individual => {
            let visible = slice_range(events, start, end);
            let max = visible.iter().map(|e| e.value).fold(1.0_f64, f64::max);
            let values = value_scale(max, height, metrics);
            let markers = visible
                .iter()
                .map(|e| PointMarker {
                    event_id: e.id,
                    category_id: e.category_id,
                    timestamp: e.timestamp,
                    value: e.value,
                    flagged: e.flagged,
                    x: time.time_to_x(e.timestamp),
                    y: values.value_to_y(e.value),
                })
                .collect();
            (
                LodFrame::Individual {
                    bucket_size: size,
                    markers,
                },
                values,
            )
        }
        RenderStrategy::Histogram => {
            let buckets = aggregate(events, start, end, size);
            let (max_total, max_value) = bucket_maxima(&buckets);
            (
                LodFrame::Histogram {
                    bucket_size: size,
                    buckets,
                    max_total,
                    max_value,
                },
                value_scale(max_total, height, metrics),
            )
        }
        RenderStrategy::Density => {
            let buckets = aggregate(events, start, end, size);
            let (rates, max_rate) = density_rates(&buckets, size);
            (
                LodFrame::Density {
                    bucket_size: size,
                    buckets,
                    rates,
                    max_rate,
                },
                value_scale(max_rate, height, metrics),
            )
        }
    }
}

fn value_scale(max: f64, height: f64, metrics: &TrackMetrics) -> ValueScale {
    ValueScale::new(
        max,
        height,
        metrics.value_margin,
        metrics.min_marker_offset,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use timelane_protocol::{ViewportState, ZoomLevel};

    fn hit(id: u64, t: f64, cat: u32, value: f64, flagged: bool) -> PointEvent {
        PointEvent {
            value,
            flagged,
            ..PointEvent::at(id, t, cat)
        }
    }

    fn sample() -> Vec<PointEvent> {
        vec![
            hit(1, 0.1, 7, 100.0, false),
            hit(2, 0.4, 7, 50.0, true),
            hit(3, 0.4, 9, 25.0, false),
            hit(4, 1.2, 7, 10.0, false),
            hit(5, 3.9, 9, 5.0, false),
            hit(6, 9.0, 7, 1.0, false),
        ]
    }

    #[test]
    fn keys_are_floored_multiples() {
        assert_eq!(bucket_key(0.49, 0.5), 0.0);
        assert_eq!(bucket_key(0.5, 0.5), 0.5);
        assert_eq!(bucket_key(7.3, 2.0), 6.0);
        assert_eq!(bucket_key(-0.1, 1.0), -1.0);
    }

    #[test]
    fn slices_inclusively() {
        let events = sample();
        let ids: Vec<u64> = slice_range(&events, 0.4, 3.9).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 5]);
        assert!(slice_range(&events, 20.0, 30.0).is_empty());
        assert!(slice_range(&events, 5.0, 1.0).is_empty());
    }

    #[test]
    fn every_event_lands_in_exactly_one_bucket() {
        let events = sample();
        let buckets = aggregate(&events, 0.0, 4.0, 1.0);
        let count: usize = buckets.iter().map(|b| b.count).sum();
        let total: f64 = buckets.iter().map(|b| b.total_value).sum();
        assert_eq!(count, 5);
        assert!((total - 190.0).abs() < 1e-9);

        let keys: Vec<f64> = buckets.iter().map(|b| b.timestamp).collect();
        assert_eq!(keys, vec![0.0, 1.0, 3.0]);
        for b in &buckets {
            for e in slice_range(&events, b.timestamp, b.timestamp + 1.0 - 1e-9) {
                assert_eq!(bucket_key(e.timestamp, 1.0), b.timestamp);
            }
        }
    }

    #[test]
    fn breakdown_tracks_categories_and_flags() {
        let buckets = aggregate(&sample(), 0.0, 1.0, 1.0);
        let first = &buckets[0];
        assert_eq!(first.count, 3);
        assert_eq!(first.max_value, 100.0);
        assert!(first.has_flag);
        assert_eq!(first.breakdown[&7].count, 2);
        assert_eq!(first.breakdown[&7].flag_count, 1);
        assert_eq!(first.breakdown[&9].amount, 25.0);
    }

    #[test]
    fn rates_divide_by_bucket_size() {
        let buckets = aggregate(&sample(), 0.0, 10.0, 5.0);
        let (rates, max_rate) = density_rates(&buckets, 5.0);
        assert_eq!(rates.len(), 2);
        assert!((rates[0].rate - 38.0).abs() < 1e-9);
        assert_eq!(rates[0].timestamp, 2.5);
        assert_eq!(max_rate, 38.0);
        assert!((rates[0].normalized - 1.0).abs() < 1e-9);
    }

    #[test]
    fn maxima_are_floored_at_one() {
        assert_eq!(bucket_maxima(&[]), (1.0, 1.0));
        let (rates, max) = density_rates(&[], 1.0);
        assert!(rates.is_empty());
        assert_eq!(max, 1.0);
    }

    #[test]
    fn damage_frame_follows_strategy() {
        let events = sample();
        let time = TimeScale::new(ViewportState::new(0.0, 4.0), 400.0);
        let metrics = TrackMetrics::default();

        let fine = LodSelection {
            level: ZoomLevel::Fine,
            bucket_size: 0.5,
            strategy: RenderStrategy::Individual,
        };
        let (frame, values) = damage_frame(&events, fine, &time, 100.0, &metrics);
        let LodFrame::Individual { markers, .. } = &frame else {
            panic!("expected individual markers, got {frame:?}");
        };
        assert_eq!(markers.len(), 5);
        assert_eq!(values.max_value(), 100.0);
        assert!((markers[0].x - 10.0).abs() < 1e-9);

        let coarse = LodSelection {
            level: ZoomLevel::Coarse,
            bucket_size: 2.0,
            strategy: RenderStrategy::Histogram,
        };
        let (frame, _) = damage_frame(&events, coarse, &time, 100.0, &metrics);
        assert_eq!(frame.strategy(), RenderStrategy::Histogram);

        let aggregate = LodSelection {
            level: ZoomLevel::Aggregate,
            bucket_size: 5.0,
            strategy: RenderStrategy::Density,
        };
        let (frame, _) = damage_frame(&events, aggregate, &time, 100.0, &metrics);
        let LodFrame::Density { rates, .. } = frame else {
            panic!("expected density");
        };
        assert!(!rates.is_empty());
    }
}
