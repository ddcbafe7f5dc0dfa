use std::sync::atomic::{AtomicU64, Ordering};

use timelane_protocol::{IntervalEvent, Phase, PointEvent, ResourceSample, TimeBounds, TimelineData};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// The loaded event set, sorted by time and stamped with a version.
///
/// Every collection is sorted once on load (stable, so events sharing a
/// timestamp keep their input order) and events with non-finite times are
/// dropped. Inverted intervals are collapsed to zero duration. The version
/// is unique per load across the process and keys every per-dataset cache.
#[derive(Debug, Clone)]
pub struct Dataset {
    data: TimelineData,
    bounds: TimeBounds,
    version: u64,
}

impl Dataset {
    pub fn new(data: TimelineData) -> Self {
        let data = normalize(data);
        let bounds = derive_bounds(&data);
        Self {
            data,
            bounds,
            version: next_version(),
        }
    }

    /// Swap in a new event set. Bumps the version.
    pub fn replace(&mut self, data: TimelineData) {
        *self = Self::new(data);
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn bounds(&self) -> TimeBounds {
        self.bounds
    }

    pub fn casts(&self) -> &[PointEvent] {
        &self.data.casts
    }

    pub fn buffs(&self) -> &[IntervalEvent] {
        &self.data.buffs
    }

    pub fn debuffs(&self) -> &[IntervalEvent] {
        &self.data.debuffs
    }

    pub fn damage(&self) -> &[PointEvent] {
        &self.data.damage
    }

    pub fn resources(&self) -> &[ResourceSample] {
        &self.data.resources
    }

    pub fn phases(&self) -> &[Phase] {
        &self.data.phases
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Timestamps of every cast and damage event, for overview density.
    pub fn overview_timestamps(&self) -> Vec<f64> {
        self.data
            .casts
            .iter()
            .chain(&self.data.damage)
            .map(|e| e.timestamp)
            .collect()
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new(TimelineData::default())
    }
}

/// `min = min(0, earliest)`, `max = latest`; widened when empty or zero-width.
pub fn derive_bounds(data: &TimelineData) -> TimeBounds {
    let min = data.earliest().map_or(0.0, |t| t.min(0.0));
    let max = data.latest().unwrap_or(min);
    TimeBounds::new(min, max)
}

fn normalize(mut data: TimelineData) -> TimelineData {
    let before = event_count(&data);

    data.casts.retain(|e| e.timestamp.is_finite() && e.duration.is_finite());
    data.damage.retain(|e| e.timestamp.is_finite() && e.value.is_finite());
    for intervals in [&mut data.buffs, &mut data.debuffs] {
        intervals.retain(|e| e.start.is_finite() && e.end.is_finite());
        for e in intervals.iter_mut() {
            e.end = e.normalized_end();
        }
        intervals.sort_by(|a, b| a.start.total_cmp(&b.start));
    }
    data.resources
        .retain(|s| s.timestamp.is_finite() && s.value.is_finite());
    data.phases.retain(|p| p.start.is_finite() && p.end.is_finite());

    data.casts.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    data.damage.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    data.resources
        .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    data.phases.sort_by(|a, b| a.start.total_cmp(&b.start));

    let dropped = before - event_count(&data);
    if dropped > 0 {
        log::debug!("dropped {dropped} events with non-finite times");
    }
    data
}

fn event_count(data: &TimelineData) -> usize {
    data.casts.len()
        + data.damage.len()
        + data.buffs.len()
        + data.debuffs.len()
        + data.resources.len()
        + data.phases.len()
}
