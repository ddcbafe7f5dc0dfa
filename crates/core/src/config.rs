//! Tunable constants of the layout engine.
//!
//! Every field has a default, so a host can deserialize a partial JSON
//! document and override only what it cares about.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use timelane_protocol::{RenderStrategy, TrackId, ZoomLevel};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("zoom thresholds must be positive and strictly increasing (got {0:?})")]
    Thresholds([f64; 3]),
    #[error("bucket size for {level:?} must be positive (got {size})")]
    BucketSize { level: ZoomLevel, size: f64 },
    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: f64 },
    #[error("cast lane count must be at least 1")]
    NoLanes,
    #[error("minimap needs at least one density bucket")]
    NoDensityBuckets,
    #[error("track {0:?} is defined more than once")]
    DuplicateTrack(TrackId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub viewport: ViewportConfig,
    pub zoom: ZoomThresholds,
    pub lod: LodTable,
    pub casts: CastLaneConfig,
    pub buffs: IntervalPackingConfig,
    pub debuffs: IntervalPackingConfig,
    pub classify: ClassifierConfig,
    pub metrics: TrackMetrics,
    pub minimap: MinimapConfig,
    pub resources: ResourceConfig,
    pub tracks: Vec<TrackDefinition>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            zoom: ZoomThresholds::default(),
            lod: LodTable::default(),
            casts: CastLaneConfig::default(),
            buffs: IntervalPackingConfig::buffs(),
            debuffs: IntervalPackingConfig::debuffs(),
            classify: ClassifierConfig::default(),
            metrics: TrackMetrics::default(),
            minimap: MinimapConfig::default(),
            resources: ResourceConfig::default(),
            tracks: Vec::new(),
        }
    }
}

impl TimelineConfig {
    /// Reject values that would make the engine divide by zero or loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let z = &self.zoom;
        let thresholds = [z.fine_max, z.medium_max, z.coarse_max];
        if !(thresholds[0] > 0.0 && thresholds[0] < thresholds[1] && thresholds[1] < thresholds[2])
        {
            return Err(ConfigError::Thresholds(thresholds));
        }
        for level in ZoomLevel::ALL {
            let size = self.lod.entry(level).bucket_size;
            if !(size.is_finite() && size > 0.0) {
                return Err(ConfigError::BucketSize { level, size });
            }
        }
        positive("viewport.min_window", self.viewport.min_window)?;
        positive("viewport.default_window", self.viewport.default_window)?;
        positive("viewport.zoom_step", self.viewport.zoom_step)?;
        positive("viewport.wheel_step", self.viewport.wheel_step)?;
        positive("casts.overflow_window", self.casts.overflow_window)?;
        positive("casts.density_bucket", self.casts.density_bucket)?;
        if self.casts.lane_count == 0 {
            return Err(ConfigError::NoLanes);
        }
        if self.minimap.density_buckets == 0 {
            return Err(ConfigError::NoDensityBuckets);
        }
        for (i, track) in self.tracks.iter().enumerate() {
            if self.tracks[..i].iter().any(|t| t.id == track.id) {
                return Err(ConfigError::DuplicateTrack(track.id));
            }
        }
        Ok(())
    }

    /// Track definitions, falling back to the built-in stack when the
    /// config leaves the list empty.
    pub fn track_definitions(&self) -> Vec<TrackDefinition> {
        if self.tracks.is_empty() {
            TrackDefinition::defaults(&self.metrics, self.casts.lane_count)
        } else {
            self.tracks.clone()
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Narrowest window the user can zoom into.
    pub min_window: f64,
    /// Window shown initially and after a reset.
    pub default_window: f64,
    /// Factor applied by the zoom in/out buttons.
    pub zoom_step: f64,
    /// Factor applied per wheel notch.
    pub wheel_step: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_window: 1.0,
            default_window: 60.0,
            zoom_step: 2.0,
            wheel_step: 1.05,
        }
    }
}

/// Window-width breakpoints between zoom levels: a window narrower than
/// `fine_max` is fine, narrower than `medium_max` medium, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomThresholds {
    pub fine_max: f64,
    pub medium_max: f64,
    pub coarse_max: f64,
}

impl Default for ZoomThresholds {
    fn default() -> Self {
        Self {
            fine_max: 30.0,
            medium_max: 120.0,
            coarse_max: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodEntry {
    pub bucket_size: f64,
    pub strategy: RenderStrategy,
}

/// Bucket size and render strategy per zoom level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodTable {
    pub fine: LodEntry,
    pub medium: LodEntry,
    pub coarse: LodEntry,
    pub aggregate: LodEntry,
}

impl LodTable {
    pub fn entry(&self, level: ZoomLevel) -> LodEntry {
        match level {
            ZoomLevel::Fine => self.fine,
            ZoomLevel::Medium => self.medium,
            ZoomLevel::Coarse => self.coarse,
            ZoomLevel::Aggregate => self.aggregate,
        }
    }
}

impl Default for LodTable {
    fn default() -> Self {
        Self {
            fine: LodEntry {
                bucket_size: 0.5,
                strategy: RenderStrategy::Individual,
            },
            medium: LodEntry {
                bucket_size: 1.0,
                strategy: RenderStrategy::Individual,
            },
            coarse: LodEntry {
                bucket_size: 2.0,
                strategy: RenderStrategy::Histogram,
            },
            aggregate: LodEntry {
                bucket_size: 5.0,
                strategy: RenderStrategy::Density,
            },
        }
    }
}

/// Greedy lane packing for casts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastLaneConfig {
    pub lane_count: usize,
    /// Minimum time between the end of one cast and the next in a lane.
    pub min_gap: f64,
    /// Instant casts still occupy their lane for this long.
    pub min_duration: f64,
    /// Width of the windows overflow badges are grouped into.
    pub overflow_window: f64,
    /// Extra time kept on each side of the window when culling.
    pub cull_padding: f64,
    /// Bucket width for the count heatmap drawn at aggregate zoom.
    pub density_bucket: f64,
}

impl Default for CastLaneConfig {
    fn default() -> Self {
        Self {
            lane_count: 3,
            min_gap: 0.3,
            min_duration: 0.3,
            overflow_window: 0.5,
            cull_padding: 1.0,
            density_bucket: 1.0,
        }
    }
}

/// Category packing for buffs and debuffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalPackingConfig {
    /// Same-ability applications starting within this distance of the
    /// current bar's end are folded into it. `None` disables merging.
    pub merge_tolerance: Option<f64>,
    /// A lane is free once its end plus this gap lies before the next start.
    pub lane_gap: f64,
}

impl IntervalPackingConfig {
    pub fn buffs() -> Self {
        Self {
            merge_tolerance: Some(0.5),
            lane_gap: 0.0,
        }
    }

    pub fn debuffs() -> Self {
        Self {
            merge_tolerance: None,
            lane_gap: 0.2,
        }
    }
}

// A partially specified section falls back to the buff constants.
impl Default for IntervalPackingConfig {
    fn default() -> Self {
        Self::buffs()
    }
}

/// Id sets and label patterns used by the category classifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub cooldown_ids: Vec<u32>,
    pub utility_ids: Vec<u32>,
    pub pet_buff_ids: Vec<u32>,
    pub self_buff_ids: Vec<u32>,
    pub pet_label: String,
    pub player_label: String,
    /// Lower-case substrings marking a debuff target as an add.
    pub add_patterns: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cooldown_ids: vec![19574, 359844, 321530],
            utility_ids: vec![186265, 147362],
            pet_buff_ids: vec![272790],
            self_buff_ids: vec![19574, 359844, 186265, 393777, 281036],
            pet_label: "Pet".into(),
            player_label: "Player".into(),
            add_patterns: ["add", "wave", "slam", "elemental", "minion"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Pixel metrics of the tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackMetrics {
    pub cast_height: f64,
    pub cast_lane_gap: f64,
    pub cast_min_width: f64,
    pub buff_height: f64,
    pub buff_gap: f64,
    pub buff_category_gap: f64,
    pub debuff_height: f64,
    pub debuff_gap: f64,
    pub debuff_category_gap: f64,
    /// Margin above and below value plots.
    pub value_margin: f64,
    /// Minimum drawn height of a value marker above the baseline.
    pub min_marker_offset: f64,
    /// Upper end of the resource axis.
    pub max_resource: f64,
}

/// Row geometry of one interval track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub row_height: f64,
    pub row_gap: f64,
    pub category_gap: f64,
}

impl TrackMetrics {
    pub fn buff_rows(&self) -> RowMetrics {
        RowMetrics {
            row_height: self.buff_height,
            row_gap: self.buff_gap,
            category_gap: self.buff_category_gap,
        }
    }

    pub fn debuff_rows(&self) -> RowMetrics {
        RowMetrics {
            row_height: self.debuff_height,
            row_gap: self.debuff_gap,
            category_gap: self.debuff_category_gap,
        }
    }
}

impl Default for TrackMetrics {
    fn default() -> Self {
        Self {
            cast_height: 28.0,
            cast_lane_gap: 4.0,
            cast_min_width: 24.0,
            buff_height: 18.0,
            buff_gap: 3.0,
            buff_category_gap: 8.0,
            debuff_height: 16.0,
            debuff_gap: 3.0,
            debuff_category_gap: 0.0,
            value_margin: 5.0,
            min_marker_offset: 2.0,
            max_resource: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    pub density_buckets: usize,
    pub density_max_height: f64,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            density_buckets: 100,
            density_max_height: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Values below this mark a critical zone.
    pub critical_threshold: f64,
    /// Target point count when downsampling at aggregate zoom.
    pub max_points: usize,
    /// Culling padding as a fraction of the window width.
    pub padding_ratio: f64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            critical_threshold: 30.0,
            max_points: 100,
            padding_ratio: 0.1,
        }
    }
}

/// One entry of the vertical track stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDefinition {
    pub id: TrackId,
    pub label: String,
    pub base_height: f64,
    pub collapsible: bool,
    /// Height while collapsed; the track is hidden when this is 0.
    #[serde(default)]
    pub collapsed_height: f64,
    /// Keeps `base_height` when available height is redistributed.
    #[serde(default)]
    pub fixed: bool,
}

impl TrackDefinition {
    pub fn defaults(metrics: &TrackMetrics, cast_lanes: usize) -> Vec<TrackDefinition> {
        let lanes = cast_lanes.max(1) as f64;
        let casts_height = lanes * metrics.cast_height + (lanes - 1.0) * metrics.cast_lane_gap;
        vec![
            TrackDefinition {
                id: TrackId::Phases,
                label: "Phases".into(),
                base_height: 24.0,
                collapsible: false,
                collapsed_height: 0.0,
                fixed: true,
            },
            TrackDefinition {
                id: TrackId::Casts,
                label: "Casts".into(),
                base_height: casts_height,
                collapsible: true,
                collapsed_height: 0.0,
                fixed: false,
            },
            TrackDefinition {
                id: TrackId::Buffs,
                label: "Buffs".into(),
                base_height: 120.0,
                collapsible: true,
                collapsed_height: 0.0,
                fixed: false,
            },
            TrackDefinition {
                id: TrackId::Debuffs,
                label: "Debuffs".into(),
                base_height: 80.0,
                collapsible: true,
                collapsed_height: 0.0,
                fixed: false,
            },
            TrackDefinition {
                id: TrackId::Damage,
                label: "Damage".into(),
                base_height: 100.0,
                collapsible: true,
                collapsed_height: 0.0,
                fixed: false,
            },
            TrackDefinition {
                id: TrackId::Resources,
                label: "Resources".into(),
                base_height: 60.0,
                collapsible: true,
                collapsed_height: 0.0,
                fixed: false,
            },
        ]
    }
}
