use timelane_protocol::{ResourceFrame, ResourcePoint, ResourceSample, TimeSpan, ViewportState, ZoomLevel};

use crate::config::ResourceConfig;
use crate::scale::{TimeScale, ValueScale};

/// Resource line for the visible window.
///
/// Samples are culled to the window plus `padding_ratio` of its width on
/// each side so the line runs off both edges. At aggregate zoom a long line
/// keeps only every n-th sample. Critical zones are computed on the points
/// actually emitted.
pub fn resource_frame(
    samples: &[ResourceSample],
    view: ViewportState,
    level: ZoomLevel,
    config: &ResourceConfig,
    time: &TimeScale,
    values: &ValueScale,
) -> ResourceFrame {
    let padded = view.padded(view.width() * config.padding_ratio);
    let lo = samples.partition_point(|s| s.timestamp < padded.start);
    let hi = samples.partition_point(|s| s.timestamp <= padded.end);
    let visible = if lo < hi { &samples[lo..hi] } else { &[] };

    let max_points = config.max_points.max(1);
    let downsampled = level == ZoomLevel::Aggregate && visible.len() > max_points;
    let step = if downsampled {
        visible.len().div_ceil(max_points)
    } else {
        1
    };

    let points: Vec<ResourcePoint> = visible
        .iter()
        .step_by(step)
        .map(|s| ResourcePoint {
            timestamp: s.timestamp,
            value: s.value,
            x: time.time_to_x(s.timestamp),
            y: values.value_to_y(s.value),
        })
        .collect();

    ResourceFrame {
        critical_zones: critical_zones(&points, config.critical_threshold),
        points,
        downsampled,
    }
}

/// Runs of points below `threshold`. A run ends at the first point back at
/// or above it, or at the last point.
fn critical_zones(points: &[ResourcePoint], threshold: f64) -> Vec<TimeSpan> {
    let mut zones = Vec::new();
    let mut open: Option<f64> = None;
    for p in points {
        match (open, p.value < threshold) {
            (None, true) => open = Some(p.timestamp),
            (Some(start), false) => {
                zones.push(TimeSpan {
                    start,
                    end: p.timestamp,
                });
                open = None;
            }
            _ => {}
        }
    }
    if let (Some(start), Some(last)) = (open, points.last()) {
        zones.push(TimeSpan {
            start,
            end: last.timestamp,
        });
    }
    zones
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(values: &[f64]) -> Vec<ResourceSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| ResourceSample {
                timestamp: i as f64,
                value,
            })
            .collect()
    }

    fn frame(samples: &[ResourceSample], view: ViewportState, level: ZoomLevel) -> ResourceFrame {
        let time = TimeScale::new(view, 100.0);
        let values = ValueScale::new(100.0, 60.0, 5.0, 0.0);
        resource_frame(samples, view, level, &ResourceConfig::default(), &time, &values)
    }

    #[test]
    fn culls_with_ten_percent_padding() {
        let samples = line(&[50.0; 100]);
        let out = frame(&samples, ViewportState::new(40.0, 60.0), ZoomLevel::Fine);
        let first = out.points.first().map(|p| p.timestamp);
        let last = out.points.last().map(|p| p.timestamp);
        assert_eq!(first, Some(38.0));
        assert_eq!(last, Some(62.0));
        assert!(!out.downsampled);
    }

    #[test]
    fn aggregate_zoom_downsamples_long_lines() {
        let samples = line(&vec![50.0; 1000]);
        let view = ViewportState::new(0.0, 999.0);
        let out = frame(&samples, view, ZoomLevel::Aggregate);
        assert!(out.downsampled);
        assert!(out.points.len() <= 100);
        assert!(out.points.len() >= 90);

        let fine = frame(&samples, view, ZoomLevel::Coarse);
        assert_eq!(fine.points.len(), 1000);
    }

    #[test]
    fn critical_zones_follow_the_threshold() {
        let samples = line(&[80.0, 20.0, 10.0, 60.0, 25.0, 29.0]);
        let out = frame(&samples, ViewportState::new(0.0, 5.0), ZoomLevel::Fine);
        assert_eq!(
            out.critical_zones,
            vec![
                TimeSpan { start: 1.0, end: 3.0 },
                TimeSpan { start: 4.0, end: 5.0 },
            ]
        );
    }

    #[test]
    fn y_is_inverted() {
        let samples = line(&[0.0, 100.0]);
        let out = frame(&samples, ViewportState::new(0.0, 1.0), ZoomLevel::Fine);
        assert!(out.points[0].y > out.points[1].y);
        assert!((out.points[1].y - 5.0).abs() < 1e-9);
    }
}
