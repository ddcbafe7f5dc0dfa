use timelane_protocol::AxisTick;

use crate::scale::TimeScale;

const MIN_MAJOR_SPACING_PX: f64 = 80.0;
const MAX_TICKS: f64 = 2_000.0;

/// Major ticks with labels and unlabeled minor ticks for the visible window.
///
/// Times are seconds; labels read `m:ss`, or `m:ss.s` when majors are
/// closer than a second apart.
pub fn axis_ticks(time: &TimeScale) -> Vec<AxisTick> {
    let params = time.params();
    let duration = params.end - params.start;
    if !duration.is_finite() || duration <= 0.0 || params.inner_width <= 0.0 {
        return Vec::new();
    }

    let (major, subdivisions) = nice_interval(duration, params.inner_width);
    let minor = major / subdivisions as f64;
    if duration / minor > MAX_TICKS {
        return Vec::new();
    }

    let first = (params.start / minor).ceil() as i64;
    let last = (params.end / minor).floor() as i64;
    (first..=last)
        .map(|k| {
            let t = k as f64 * minor;
            let is_major = k.rem_euclid(i64::from(subdivisions)) == 0;
            AxisTick {
                time: t,
                x: time.time_to_x(t),
                major: is_major,
                label: is_major.then(|| format_time_label(t, major)),
            }
        })
        .collect()
}

/// Choose a "nice" major tick interval in seconds for the visible duration
/// and pixel width. Returns (major_interval, subdivisions).
fn nice_interval(duration: f64, width_px: f64) -> (f64, u32) {
    let target_count = (width_px / MIN_MAJOR_SPACING_PX).max(2.0);
    let raw_interval = duration / target_count;

    let nice_values: &[(f64, u32)] = &[
        (0.1, 2),
        (0.2, 2),
        (0.5, 5),
        (1.0, 2),
        (2.0, 2),
        (5.0, 5),
        (10.0, 2),
        (15.0, 3),
        (30.0, 3),
        (60.0, 2),  // 1min
        (120.0, 2),
        (300.0, 5),
        (600.0, 2), // 10min
    ];

    for &(interval, subs) in nice_values {
        if interval >= raw_interval {
            return (interval, subs);
        }
    }

    let magnitude = 10.0_f64.powf(raw_interval.log10().ceil());
    (magnitude, 2)
}

fn format_time_label(t: f64, interval: f64) -> String {
    let sign = if t < 0.0 { "-" } else { "" };
    if interval < 1.0 {
        let tenths = (t.abs() * 10.0).round() as u64;
        let mins = tenths / 600;
        let secs = (tenths % 600) as f64 / 10.0;
        format!("{sign}{mins}:{secs:04.1}")
    } else {
        let total = t.abs().round() as u64;
        format!("{sign}{}:{:02}", total / 60, total % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timelane_protocol::ViewportState;

    #[test]
    fn nice_interval_selects_reasonable_value() {
        // 60 seconds in 800px → ~10 majors → 10s intervals
        let (interval, subs) = nice_interval(60.0, 800.0);
        assert_eq!(interval, 10.0);
        assert_eq!(subs, 2);

        let (interval, _) = nice_interval(2.0, 800.0);
        assert!(interval <= 0.5, "interval={interval}");
    }

    #[test]
    fn ticks_cover_the_window() {
        let time = TimeScale::new(ViewportState::new(0.0, 60.0), 800.0);
        let ticks = axis_ticks(&time);
        let majors: Vec<&AxisTick> = ticks.iter().filter(|t| t.major).collect();
        assert_eq!(majors.len(), 7);
        assert_eq!(majors[1].label.as_deref(), Some("0:10"));
        assert!(ticks.iter().filter(|t| !t.major).all(|t| t.label.is_none()));
        assert!(ticks.iter().all(|t| t.x >= 0.0 && t.x <= 800.0));
    }

    #[test]
    fn degenerate_windows_have_no_ticks() {
        let time = TimeScale::new(ViewportState::new(5.0, 5.0), 800.0);
        assert!(axis_ticks(&time).is_empty());
        let time = TimeScale::new(ViewportState::new(0.0, 10.0), 0.0);
        assert!(axis_ticks(&time).is_empty());
    }

    #[test]
    fn format_labels() {
        assert_eq!(format_time_label(75.0, 5.0), "1:15");
        assert_eq!(format_time_label(5.5, 0.5), "0:05.5");
        assert_eq!(format_time_label(-30.0, 10.0), "-0:30");
        assert_eq!(format_time_label(600.0, 60.0), "10:00");
    }
}
