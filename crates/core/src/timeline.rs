//! The per-frame facade a host drives.
//!
//! ```text
//!   host input ──▶ Timeline ──▶ ViewportController ──▶ ViewportState
//!                     │
//!                     ├── Memo<(version, revision)>  lanes, minimap density
//!                     │
//!   frame() ◀─────────┴── scales ─▶ culling / buckets / layout ─▶ FrameOutput
//! ```
//!
//! Per-dataset work (lane packing, minimap density) is memoized on the
//! dataset version and the config revision, so panning and zooming only
//! pay for what is visible.

use timelane_protocol::{
    FrameOutput, LaneAssignment, MinimapFrame, TimeBounds, TimelineData, TrackId, ViewportState,
    ZoomLevel,
};

use crate::cache::Memo;
use crate::classify::Classifier;
use crate::config::{ConfigError, TimelineConfig};
use crate::lod::LodSelection;
use crate::model::Dataset;
use crate::scale::{Scales, TimeScale, ValueScale};
use crate::viewport::{DragPan, ViewportController, ViewportError};
use crate::views::buckets::damage_frame;
use crate::views::casts::{cast_frame, pack_casts};
use crate::views::intervals::{PackedIntervals, pack_intervals};
use crate::views::minimap::{BrushDrag, DensitySummary, brush_rect, density_summary};
use crate::views::phases::visible_phases;
use crate::views::resources::resource_frame;
use crate::views::time_axis::axis_ticks;
use crate::views::tracks::TrackStack;

const DEFAULT_WIDTH: f64 = 1000.0;
const DEFAULT_HEIGHT: f64 = 600.0;

/// `(dataset version, config revision)`.
type CacheKey = (u64, u64);

pub struct Timeline {
    dataset: Dataset,
    config: TimelineConfig,
    revision: u64,
    viewport: ViewportController,
    tracks: TrackStack,
    width: f64,
    height: f64,
    fullscreen: bool,
    drag: DragPan,
    brush: BrushDrag,
    cast_lanes: Memo<CacheKey, Vec<LaneAssignment>>,
    buff_lanes: Memo<CacheKey, PackedIntervals>,
    debuff_lanes: Memo<CacheKey, PackedIntervals>,
    density: Memo<CacheKey, DensitySummary>,
}

impl Timeline {
    pub fn new(data: TimelineData, config: TimelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let dataset = Dataset::new(data);
        let viewport = ViewportController::new(dataset.bounds(), config.viewport.clone());
        let tracks = TrackStack::new(config.track_definitions());
        Ok(Self {
            dataset,
            config,
            revision: 0,
            viewport,
            tracks,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fullscreen: false,
            drag: DragPan::default(),
            brush: BrushDrag::default(),
            cast_lanes: Memo::new("cast lanes"),
            buff_lanes: Memo::new("buff lanes"),
            debuff_lanes: Memo::new("debuff lanes"),
            density: Memo::new("minimap density"),
        })
    }

    /// Replace the event set and go back to the initial window.
    pub fn set_data(&mut self, data: TimelineData) {
        self.dataset.replace(data);
        self.viewport.set_bounds(self.dataset.bounds());
        self.drag.pointer_cancel();
        self.brush.pointer_cancel();
        log::debug!(
            "dataset v{} loaded, bounds {:?}",
            self.dataset.version(),
            self.dataset.bounds()
        );
    }

    /// Swap the configuration. An invalid config is rejected and the
    /// current one kept.
    pub fn set_config(&mut self, config: TimelineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.viewport.set_config(config.viewport.clone());
        self.tracks.set_definitions(config.track_definitions());
        self.config = config;
        self.revision += 1;
        Ok(())
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Container size in pixels. Non-finite or negative sizes become 0.
    pub fn resize(&mut self, width: f64, height: f64) {
        let sane = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.width = sane(width);
        self.height = sane(height);
    }

    /// In fullscreen the track stack stretches to the container height.
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Expand or collapse a track. Returns whether it is now expanded.
    pub fn toggle_track(&mut self, id: TrackId) -> bool {
        self.tracks.toggle(id)
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport.state()
    }

    pub fn bounds(&self) -> TimeBounds {
        self.viewport.bounds()
    }

    pub fn zoom_level(&self) -> ZoomLevel {
        self.lod().level
    }

    pub fn time_scale(&self) -> TimeScale {
        TimeScale::new(self.viewport.state(), self.width)
    }

    pub fn zoom(&mut self, factor: f64, pivot: Option<f64>) -> Result<ViewportState, ViewportError> {
        self.viewport.zoom(factor, pivot)
    }

    pub fn zoom_in(&mut self) -> Result<ViewportState, ViewportError> {
        self.viewport.zoom_in()
    }

    pub fn zoom_out(&mut self) -> Result<ViewportState, ViewportError> {
        self.viewport.zoom_out()
    }

    /// Wheel zoom around the pointer at pixel `x`.
    pub fn wheel(&mut self, delta_y: f64, x: f64) -> Result<ViewportState, ViewportError> {
        let pivot = self.time_scale().x_to_time(x);
        self.viewport.wheel(delta_y, pivot)
    }

    pub fn pan(&mut self, delta: f64) -> Result<ViewportState, ViewportError> {
        self.viewport.pan(delta)
    }

    pub fn zoom_to_range(&mut self, start: f64, end: f64) -> Result<ViewportState, ViewportError> {
        self.viewport.zoom_to_range(start, end)
    }

    pub fn reset_zoom(&mut self) -> Result<ViewportState, ViewportError> {
        self.viewport.reset_zoom()
    }

    pub fn fit_all(&mut self) -> Result<ViewportState, ViewportError> {
        self.viewport.fit_all()
    }

    pub fn drag_start(&mut self, x: f64) {
        self.drag.pointer_down(x);
    }

    pub fn drag_move(&mut self, x: f64) -> Option<Result<ViewportState, ViewportError>> {
        self.drag.pointer_move(x, &mut self.viewport, self.width)
    }

    pub fn drag_end(&mut self) {
        self.drag.pointer_up();
    }

    pub fn drag_cancel(&mut self) {
        self.drag.pointer_cancel();
    }

    pub fn minimap_pointer_down(&mut self, x: f64) -> Result<ViewportState, ViewportError> {
        self.brush.pointer_down(x, &mut self.viewport, self.width)
    }

    pub fn minimap_pointer_move(&mut self, x: f64) -> Option<Result<ViewportState, ViewportError>> {
        self.brush.pointer_move(x, &mut self.viewport, self.width)
    }

    pub fn minimap_pointer_up(&mut self) {
        self.brush.pointer_up();
    }

    pub fn minimap_pointer_cancel(&mut self) {
        self.brush.pointer_cancel();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging() || self.brush.is_dragging()
    }

    /// Lane placement of every cast, index-aligned with the sorted casts.
    pub fn cast_lanes(&mut self) -> &[LaneAssignment] {
        let key = self.cache_key();
        let Self {
            dataset,
            config,
            cast_lanes,
            ..
        } = self;
        let classifier = Classifier::new(&config.classify);
        cast_lanes.get_or_compute(key, || {
            pack_casts(dataset.casts(), &classifier, &config.casts)
        })
    }

    /// Everything the renderer needs for the current viewport.
    pub fn frame(&mut self) -> FrameOutput {
        let key = self.cache_key();
        let view = self.viewport.state();
        let bounds = self.viewport.bounds();
        let selection = self.lod();
        let layout = self.tracks.layout(self.fullscreen.then_some(self.height));
        let width = self.width;

        let Self {
            dataset,
            config,
            cast_lanes,
            buff_lanes,
            debuff_lanes,
            density,
            ..
        } = self;
        let metrics = &config.metrics;
        let classifier = Classifier::new(&config.classify);

        let time = TimeScale::new(view, width);
        let (damage, damage_scale) = damage_frame(
            dataset.damage(),
            selection,
            &time,
            layout.height_of(TrackId::Damage),
            metrics,
        );
        let scales = Scales {
            time,
            damage: damage_scale,
            resource: ValueScale::new(
                metrics.max_resource,
                layout.height_of(TrackId::Resources),
                metrics.value_margin,
                0.0,
            ),
        };

        let lanes = cast_lanes.get_or_compute(key, || {
            pack_casts(dataset.casts(), &classifier, &config.casts)
        });
        let casts = cast_frame(
            dataset.casts(),
            lanes,
            view,
            selection.level,
            &config.casts,
            metrics,
            &scales.time,
        );

        let buffs = buff_lanes
            .get_or_compute(key, || {
                pack_intervals(dataset.buffs(), |e| classifier.buff(e), &config.buffs)
            })
            .frame(view, metrics.buff_rows(), &scales.time);
        let debuffs = debuff_lanes
            .get_or_compute(key, || {
                pack_intervals(dataset.debuffs(), |e| classifier.debuff(e), &config.debuffs)
            })
            .frame(view, metrics.debuff_rows(), &scales.time);

        let summary = density.get_or_compute(key, || {
            density_summary(
                &dataset.overview_timestamps(),
                bounds,
                config.minimap.density_buckets,
            )
        });
        let minimap = MinimapFrame {
            brush: brush_rect(bounds, view, width),
            density: summary.bars(width, config.minimap.density_max_height),
            max_count: summary.max_count,
        };

        log::trace!(
            "frame [{:.3}, {:.3}] {:?}/{:?}, {} casts, {} buff bars",
            view.start,
            view.end,
            selection.level,
            selection.strategy,
            casts.markers.len(),
            buffs.bars.len()
        );

        FrameOutput {
            bounds,
            viewport: view,
            zoom_level: selection.level,
            strategy: selection.strategy,
            bucket_size: selection.bucket_size,
            scale: scales.time.params(),
            tracks: layout.tracks,
            total_height: layout.total_height,
            axis: axis_ticks(&scales.time),
            phases: visible_phases(dataset.phases(), view, &scales.time),
            casts,
            buffs,
            debuffs,
            damage,
            resources: resource_frame(
                dataset.resources(),
                view,
                selection.level,
                &config.resources,
                &scales.time,
                &scales.resource,
            ),
            minimap,
        }
    }

    fn lod(&self) -> LodSelection {
        LodSelection::for_viewport(self.viewport.state(), &self.config.zoom, &self.config.lod)
    }

    fn cache_key(&self) -> CacheKey {
        (self.dataset.version(), self.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timelane_protocol::{IntervalEvent, PointEvent, RenderStrategy};

    fn data() -> TimelineData {
        TimelineData {
            casts: (0..400)
                .map(|i| PointEvent::at(i, i as f64 * 0.75, (i % 4) as u32 + 1))
                .collect(),
            damage: (0..400)
                .map(|i| PointEvent {
                    value: 100.0 + (i % 7) as f64,
                    ..PointEvent::at(1_000 + i, i as f64 * 0.75 + 0.1, 1)
                })
                .collect(),
            buffs: vec![
                IntervalEvent::new(1, 0.0, 5.0, 42),
                IntervalEvent::new(2, 4.0, 9.0, 42),
                IntervalEvent::new(3, 8.0, 12.0, 42),
            ],
            ..TimelineData::default()
        }
    }

    fn timeline() -> Timeline {
        let mut t = Timeline::new(data(), TimelineConfig::default()).unwrap();
        t.resize(1000.0, 600.0);
        t
    }

    #[test]
    fn starts_on_the_default_window() {
        let t = timeline();
        assert_eq!(t.viewport(), ViewportState::new(0.0, 60.0));
        assert_eq!(t.zoom_level(), ZoomLevel::Medium);
    }

    #[test]
    fn frame_reflects_the_zoom_level() {
        let mut t = timeline();
        let frame = t.frame();
        assert_eq!(frame.zoom_level, ZoomLevel::Medium);
        assert_eq!(frame.strategy, RenderStrategy::Individual);
        assert!(!frame.casts.markers.is_empty());
        assert_eq!(frame.buffs.bars.len(), 1);
        assert_eq!(frame.buffs.bars[0].refresh_marks, vec![4.0, 8.0]);

        t.fit_all().unwrap();
        let frame = t.frame();
        assert_eq!(frame.zoom_level, ZoomLevel::Coarse);
        assert_eq!(frame.damage.strategy(), RenderStrategy::Histogram);
    }

    #[test]
    fn lanes_survive_viewport_changes() {
        let mut t = timeline();
        let before = t.cast_lanes().to_vec();
        t.zoom_in().unwrap();
        t.pan(13.0).unwrap();
        t.frame();
        assert_eq!(t.cast_lanes(), before.as_slice());
    }

    #[test]
    fn set_data_resets_the_window_and_caches() {
        let mut t = timeline();
        t.zoom_to_range(100.0, 110.0).unwrap();
        let lanes = t.cast_lanes().len();
        assert_eq!(lanes, 400);

        t.set_data(TimelineData {
            casts: vec![PointEvent::at(1, 2.0, 1)],
            ..TimelineData::default()
        });
        assert_eq!(t.viewport(), ViewportState::new(0.0, 2.0));
        assert_eq!(t.cast_lanes().len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected_and_kept() {
        let mut t = timeline();
        let mut bad = TimelineConfig::default();
        bad.casts.lane_count = 0;
        assert!(t.set_config(bad).is_err());
        assert_eq!(t.config().casts.lane_count, 3);

        let mut four = TimelineConfig::default();
        four.casts.lane_count = 4;
        t.set_config(four).unwrap();
        assert_eq!(t.frame().casts.lane_count, 4);
    }

    #[test]
    fn minimap_drag_moves_the_window() {
        let mut t = timeline();
        t.zoom_to_range(0.0, 10.0).unwrap();
        let extent = t.bounds().extent();
        let state = t.minimap_pointer_down(500.0).unwrap();
        assert!((state.center() - extent / 2.0).abs() < 1e-9);
        assert!((state.width() - 10.0).abs() < 1e-9);
        assert!(t.is_dragging());
        t.minimap_pointer_up();
        assert!(t.minimap_pointer_move(0.0).is_none());
    }

    #[test]
    fn drag_pan_moves_against_the_pointer() {
        let mut t = timeline();
        t.zoom_to_range(100.0, 200.0).unwrap();
        t.drag_start(500.0);
        let state = t.drag_move(400.0).unwrap().unwrap();
        assert!((state.start - 110.0).abs() < 1e-9);
        t.drag_end();
        assert!(!t.is_dragging());
    }

    #[test]
    fn fullscreen_fills_the_container() {
        let mut t = timeline();
        t.set_fullscreen(true);
        t.resize(1200.0, 900.0);
        let frame = t.frame();
        assert!((frame.total_height - 900.0).abs() < 1e-9);

        t.set_fullscreen(false);
        assert!(t.frame().total_height < 900.0);
    }

    #[test]
    fn collapsed_tracks_drop_out_of_the_layout() {
        let mut t = timeline();
        assert!(!t.toggle_track(TrackId::Damage));
        let frame = t.frame();
        let damage = frame.tracks.iter().find(|l| l.track_id == TrackId::Damage).unwrap();
        assert!(!damage.visible);
    }
}
