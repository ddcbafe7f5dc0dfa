use timelane_protocol::{Phase, PhaseSpan, ViewportState};

use crate::scale::TimeScale;

/// Phases touching the window. `phases` must be sorted by start.
pub fn visible_phases(phases: &[Phase], view: ViewportState, time: &TimeScale) -> Vec<PhaseSpan> {
    let hi = phases.partition_point(|p| p.start <= view.end);
    phases[..hi]
        .iter()
        .filter(|p| p.end >= view.start)
        .map(|p| {
            let end = p.end.max(p.start);
            PhaseSpan {
                id: p.id.clone(),
                label: p.label.clone(),
                start: p.start,
                end,
                x: time.time_to_x(p.start),
                width: time.span_width(p.start, end),
            }
        })
        .collect()
}
