use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;

/// The event collections a host hands to the layout engine.
///
/// ```text
///   combat log ─▶ TimelineData ──▶ lane packing / LOD buckets ──▶ FrameOutput ──▶ renderer
///                   (this)          (timelane-core)                (per frame)
/// ```
///
/// Times are in seconds since the encounter started. Collections do not
/// need to be sorted; the core sorts them once when the dataset is loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineData {
    pub casts: Vec<PointEvent>,
    pub buffs: Vec<IntervalEvent>,
    pub debuffs: Vec<IntervalEvent>,
    pub damage: Vec<PointEvent>,
    pub resources: Vec<ResourceSample>,
    pub phases: Vec<Phase>,
}

impl TimelineData {
    /// Earliest start/timestamp over every collection, if any.
    pub fn earliest(&self) -> Option<f64> {
        self.time_points().map(|(start, _)| start).reduce(f64::min)
    }

    /// Latest end/timestamp over every collection, if any.
    pub fn latest(&self) -> Option<f64> {
        self.time_points().map(|(_, end)| end).reduce(f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.time_points().next().is_none()
    }

    fn time_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let points = self
            .casts
            .iter()
            .chain(&self.damage)
            .map(|e| (e.timestamp, e.end()));
        let intervals = self
            .buffs
            .iter()
            .chain(&self.debuffs)
            .map(|e| (e.start, e.normalized_end()));
        let resources = self.resources.iter().map(|r| (r.timestamp, r.timestamp));
        let phases = self.phases.iter().map(|p| (p.start, p.end.max(p.start)));
        points
            .chain(intervals)
            .chain(resources)
            .chain(phases)
            .filter(|(s, e)| s.is_finite() && e.is_finite())
    }
}

/// A discrete event: an ability cast or a damage instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEvent {
    pub id: u64,
    pub timestamp: f64,
    /// Ability/spell id. Drives classification and per-category breakdowns.
    pub category_id: u32,
    /// Cast time; 0 for instant casts and damage instances.
    #[serde(default)]
    pub duration: f64,
    /// Damage amount (0 for casts).
    #[serde(default)]
    pub value: f64,
    /// Notable instance, e.g. a critical hit.
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub target: Option<SharedStr>,
}

impl PointEvent {
    /// Convenience constructor for a bare instant event.
    pub fn at(id: u64, timestamp: f64, category_id: u32) -> Self {
        Self {
            id,
            timestamp,
            category_id,
            duration: 0.0,
            value: 0.0,
            flagged: false,
            target: None,
        }
    }

    pub fn end(&self) -> f64 {
        self.timestamp + self.duration.max(0.0)
    }
}

/// A buff or debuff application spanning `[start, end]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalEvent {
    pub id: u64,
    pub start: f64,
    pub end: f64,
    pub category_id: u32,
    #[serde(default)]
    pub stacks: Option<u32>,
    #[serde(default)]
    pub target: Option<SharedStr>,
}

impl IntervalEvent {
    pub fn new(id: u64, start: f64, end: f64, category_id: u32) -> Self {
        Self {
            id,
            start,
            end,
            category_id,
            stacks: None,
            target: None,
        }
    }

    /// End time with inverted intervals collapsed to zero duration.
    pub fn normalized_end(&self) -> f64 {
        self.end.max(self.start)
    }

    pub fn duration(&self) -> f64 {
        self.normalized_end() - self.start
    }
}

/// Either event shape, discriminated by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Point(PointEvent),
    Interval(IntervalEvent),
}

impl Event {
    pub fn id(&self) -> u64 {
        match self {
            Self::Point(e) => e.id,
            Self::Interval(e) => e.id,
        }
    }

    pub fn start(&self) -> f64 {
        match self {
            Self::Point(e) => e.timestamp,
            Self::Interval(e) => e.start,
        }
    }

    pub fn end(&self) -> f64 {
        match self {
            Self::Point(e) => e.end(),
            Self::Interval(e) => e.normalized_end(),
        }
    }
}

/// One sample of a resource line (focus, mana, energy...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub timestamp: f64,
    pub value: f64,
}

/// A named encounter phase drawn as a strip above the tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: SharedStr,
    #[serde(default)]
    pub label: Option<SharedStr>,
    pub start: f64,
    pub end: f64,
}
