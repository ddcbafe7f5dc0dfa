//! The single owner of the visible time window.
//!
//! Every mutation is synchronous, produces a fresh [`ViewportState`], and
//! keeps `bounds.min <= start < end <= bounds.max`. A mutation that would
//! leave the window degenerate is rejected and the previous state is kept.

use log::debug;
use thiserror::Error;
use timelane_protocol::{TimeBounds, ViewportState};

use crate::config::ViewportConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ViewportError {
    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
    #[error("zoom factor must be positive and finite (got {0})")]
    InvalidFactor(f64),
    #[error("window [{start}, {end}] is empty or inverted")]
    Degenerate { start: f64, end: f64 },
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    bounds: TimeBounds,
    state: ViewportState,
    config: ViewportConfig,
}

impl ViewportController {
    /// Start at the default window anchored to the beginning of the data.
    pub fn new(bounds: TimeBounds, config: ViewportConfig) -> Self {
        let mut controller = Self {
            bounds,
            state: ViewportState::from(bounds),
            config,
        };
        controller.state = controller.initial_window();
        controller
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn bounds(&self) -> TimeBounds {
        self.bounds
    }

    /// Replace the data extent (new dataset) and go back to the initial window.
    pub fn set_bounds(&mut self, bounds: TimeBounds) {
        self.bounds = bounds;
        self.state = self.initial_window();
    }

    pub fn set_config(&mut self, config: ViewportConfig) {
        self.config = config;
        self.state = self.clamp_window(self.state.start, self.state.width());
    }

    /// Zoom-in limit; never wider than the data itself.
    pub fn min_window(&self) -> f64 {
        self.config.min_window.min(self.bounds.extent())
    }

    /// Scale the window width by `factor` (< 1 zooms in), keeping `pivot`
    /// (default: window center) at the same screen position.
    pub fn zoom(&mut self, factor: f64, pivot: Option<f64>) -> Result<ViewportState, ViewportError> {
        if !factor.is_finite() || factor <= 0.0 {
            return self.reject(ViewportError::InvalidFactor(factor));
        }
        let pivot = pivot.unwrap_or(self.state.center());
        if !pivot.is_finite() {
            return self.reject(ViewportError::NonFinite("zoom pivot"));
        }

        let old = self.state;
        let width = (old.width() * factor).clamp(self.min_window(), self.bounds.extent());
        let ratio = (pivot - old.start) / old.width();
        let start = pivot - ratio * width;
        let next = self.clamp_window(start, width);
        self.commit(next)
    }

    pub fn zoom_in(&mut self) -> Result<ViewportState, ViewportError> {
        self.zoom(1.0 / self.config.zoom_step, None)
    }

    pub fn zoom_out(&mut self) -> Result<ViewportState, ViewportError> {
        self.zoom(self.config.zoom_step, None)
    }

    /// Wheel zoom around `pivot`: scrolling down (positive delta) zooms out
    /// by one step, scrolling up zooms in.
    pub fn wheel(&mut self, delta_y: f64, pivot: f64) -> Result<ViewportState, ViewportError> {
        if !delta_y.is_finite() {
            return self.reject(ViewportError::NonFinite("wheel delta"));
        }
        if delta_y == 0.0 {
            return Ok(self.state);
        }
        let step = self.config.wheel_step;
        let factor = if delta_y > 0.0 { step } else { 1.0 / step };
        self.zoom(factor, Some(pivot))
    }

    /// Shift both edges by `delta` time units, stopping at the data edges.
    pub fn pan(&mut self, delta: f64) -> Result<ViewportState, ViewportError> {
        if !delta.is_finite() {
            return self.reject(ViewportError::NonFinite("pan delta"));
        }
        let next = self.clamp_window(self.state.start + delta, self.state.width());
        self.commit(next)
    }

    /// Pan by a pointer drag of `dx` pixels; dragging right reveals
    /// earlier times.
    pub fn pan_pixels(&mut self, dx: f64, inner_width: f64) -> Result<ViewportState, ViewportError> {
        if inner_width <= 0.0 {
            return Ok(self.state);
        }
        self.pan(-dx / inner_width * self.state.width())
    }

    /// Show `[start, end]`, clamped to the data and widened to the
    /// minimum window around its center.
    pub fn zoom_to_range(&mut self, start: f64, end: f64) -> Result<ViewportState, ViewportError> {
        if !start.is_finite() || !end.is_finite() {
            return self.reject(ViewportError::NonFinite("range edge"));
        }
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let start = start.max(self.bounds.min);
        let end = end.min(self.bounds.max);
        if end < start {
            return self.reject(ViewportError::Degenerate { start, end });
        }

        let min_window = self.min_window();
        let next = if end - start < min_window {
            let center = (start + end) / 2.0;
            self.clamp_window(center - min_window / 2.0, min_window)
        } else {
            self.clamp_window(start, end - start)
        };
        self.commit(next)
    }

    /// Default-width window centered on the current center.
    pub fn reset_zoom(&mut self) -> Result<ViewportState, ViewportError> {
        let width = self.config.default_window;
        let next = self.clamp_window(self.state.center() - width / 2.0, width);
        self.commit(next)
    }

    /// Show the whole dataset.
    pub fn fit_all(&mut self) -> Result<ViewportState, ViewportError> {
        self.commit(ViewportState::from(self.bounds))
    }

    fn initial_window(&self) -> ViewportState {
        self.clamp_window(self.bounds.min, self.config.default_window)
    }

    /// Clamp width into `[min_window, extent]`, then shift the window back
    /// inside the bounds so the far edge absorbs any overshoot.
    fn clamp_window(&self, start: f64, width: f64) -> ViewportState {
        let width = width.clamp(self.min_window(), self.bounds.extent());
        let latest_start = (self.bounds.max - width).max(self.bounds.min);
        let start = start.clamp(self.bounds.min, latest_start);
        let end = (start + width).min(self.bounds.max);
        ViewportState::new(start, end)
    }

    fn commit(&mut self, next: ViewportState) -> Result<ViewportState, ViewportError> {
        if !next.is_valid() {
            return self.reject(ViewportError::Degenerate {
                start: next.start,
                end: next.end,
            });
        }
        self.state = next;
        Ok(next)
    }

    fn reject(&self, err: ViewportError) -> Result<ViewportState, ViewportError> {
        debug!("viewport mutation rejected, keeping {:?}: {err}", self.state);
        Err(err)
    }
}

/// Pointer-drag panning over the main plot area.
///
/// Moves are only honored between `pointer_down` and `pointer_up` /
/// `pointer_cancel`, wherever the pointer currently is.
#[derive(Debug, Clone, Default)]
pub struct DragPan {
    last_x: Option<f64>,
}

impl DragPan {
    pub fn pointer_down(&mut self, x: f64) {
        self.last_x = Some(x);
    }

    pub fn pointer_move(
        &mut self,
        x: f64,
        controller: &mut ViewportController,
        inner_width: f64,
    ) -> Option<Result<ViewportState, ViewportError>> {
        let last = self.last_x?;
        self.last_x = Some(x);
        Some(controller.pan_pixels(x - last, inner_width))
    }

    pub fn pointer_up(&mut self) {
        self.last_x = None;
    }

    pub fn pointer_cancel(&mut self) {
        self.last_x = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.last_x.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn controller(min: f64, max: f64) -> ViewportController {
        ViewportController::new(TimeBounds::new(min, max), ViewportConfig::default())
    }

    fn assert_inside(vp: ViewportState, bounds: TimeBounds) {
        assert!(vp.start >= bounds.min - EPS, "{vp:?}");
        assert!(vp.end <= bounds.max + EPS, "{vp:?}");
        assert!(vp.start < vp.end, "{vp:?}");
    }

    #[test]
    fn starts_with_default_window() {
        let c = controller(0.0, 300.0);
        assert_eq!(c.state(), ViewportState::new(0.0, 60.0));

        let short = controller(0.0, 20.0);
        assert_eq!(short.state(), ViewportState::new(0.0, 20.0));
    }

    #[test]
    fn zoom_keeps_pivot_fixed() {
        let mut c = controller(0.0, 300.0);
        c.zoom_to_range(100.0, 200.0).ok();
        let before = c.state();
        let pivot = 125.0;
        let frac_before = (pivot - before.start) / before.width();
        let after = c.zoom(0.5, Some(pivot)).unwrap_or(before);
        let frac_after = (pivot - after.start) / after.width();
        assert!((after.width() - 50.0).abs() < EPS);
        assert!((frac_before - frac_after).abs() < EPS);
    }

    #[test]
    fn zoom_in_is_pinned_at_min_window() {
        let mut c = controller(0.0, 300.0);
        for _ in 0..200 {
            let vp = c.zoom(0.5, Some(37.0)).unwrap_or(c.state());
            assert!(!vp.start.is_nan() && !vp.end.is_nan());
            assert!(vp.width() >= 1.0 - EPS);
        }
        assert!((c.state().width() - 1.0).abs() < EPS);

        let vp = c.zoom(f64::MIN_POSITIVE, None).unwrap_or(c.state());
        assert!((vp.width() - 1.0).abs() < EPS);
    }

    #[test]
    fn zoom_out_stops_at_full_extent() {
        let mut c = controller(0.0, 300.0);
        for _ in 0..20 {
            c.zoom_out().ok();
        }
        assert_eq!(c.state(), ViewportState::new(0.0, 300.0));
    }

    #[test]
    fn zoom_near_edge_shifts_instead_of_shrinking() {
        let mut c = controller(0.0, 300.0);
        c.zoom_to_range(250.0, 300.0).ok();
        let vp = c.zoom(2.0, Some(299.0)).unwrap_or(c.state());
        assert!((vp.width() - 100.0).abs() < EPS);
        assert!((vp.end - 300.0).abs() < EPS);
    }

    #[test]
    fn rejects_bad_factor_and_keeps_state() {
        let mut c = controller(0.0, 300.0);
        let before = c.state();
        assert_eq!(c.zoom(0.0, None), Err(ViewportError::InvalidFactor(0.0)));
        assert!(c.zoom(f64::NAN, None).is_err());
        assert!(c.zoom(-2.0, None).is_err());
        assert!(c.pan(f64::INFINITY).is_err());
        assert_eq!(c.state(), before);
    }

    #[test]
    fn pan_is_clamped_to_bounds() {
        let mut c = controller(0.0, 300.0);
        let vp = c.pan(-50.0).unwrap_or(c.state());
        assert_eq!(vp, ViewportState::new(0.0, 60.0));
        let vp = c.pan(1_000.0).unwrap_or(c.state());
        assert!((vp.end - 300.0).abs() < EPS);
        assert!((vp.width() - 60.0).abs() < EPS);
    }

    #[test]
    fn pan_pixels_moves_against_the_drag() {
        let mut c = controller(0.0, 300.0);
        c.zoom_to_range(100.0, 160.0).ok();
        let vp = c.pan_pixels(100.0, 600.0).unwrap_or(c.state());
        assert!((vp.start - 90.0).abs() < EPS);
    }

    #[test]
    fn zoom_to_range_clamps_and_widens() {
        let mut c = controller(0.0, 100.0);
        let vp = c.zoom_to_range(-20.0, 30.0).unwrap_or(c.state());
        assert_eq!(vp, ViewportState::new(0.0, 30.0));

        let vp = c.zoom_to_range(50.0, 50.2).unwrap_or(c.state());
        assert!((vp.width() - 1.0).abs() < EPS);
        assert!((vp.center() - 50.1).abs() < EPS);

        let vp = c.zoom_to_range(99.9, 99.95).unwrap_or(c.state());
        assert!((vp.end - 100.0).abs() < EPS);
        assert!((vp.width() - 1.0).abs() < EPS);
    }

    #[test]
    fn zoom_to_range_outside_bounds_is_rejected() {
        let mut c = controller(0.0, 100.0);
        let before = c.state();
        assert!(c.zoom_to_range(150.0, 200.0).is_err());
        assert_eq!(c.state(), before);
    }

    #[test]
    fn reset_zoom_centers_default_window() {
        let mut c = controller(0.0, 300.0);
        c.zoom_to_range(140.0, 160.0).ok();
        let vp = c.reset_zoom().unwrap_or(c.state());
        assert_eq!(vp, ViewportState::new(120.0, 180.0));
        assert_inside(vp, c.bounds());
    }

    #[test]
    fn fit_all_is_idempotent() {
        let mut c = controller(-5.0, 300.0);
        let once = c.fit_all().unwrap_or(c.state());
        let twice = c.fit_all().unwrap_or(c.state());
        assert_eq!(once, twice);
        assert_eq!(once, ViewportState::new(-5.0, 300.0));
    }

    #[test]
    fn wheel_direction() {
        let mut c = controller(0.0, 300.0);
        c.zoom_to_range(100.0, 200.0).ok();
        let out = c.wheel(1.0, 150.0).unwrap_or(c.state());
        assert!((out.width() - 105.0).abs() < 1e-6);
        let back = c.wheel(-1.0, 150.0).unwrap_or(c.state());
        assert!((back.width() - 100.0).abs() < 1e-6);
        let same = c.wheel(0.0, 150.0).unwrap_or(c.state());
        assert_eq!(same, back);
    }

    #[test]
    fn drag_pan_only_while_pressed() {
        let mut c = controller(0.0, 300.0);
        c.zoom_to_range(100.0, 160.0).ok();
        let mut drag = DragPan::default();
        assert!(drag.pointer_move(50.0, &mut c, 600.0).is_none());

        drag.pointer_down(200.0);
        let vp = drag.pointer_move(260.0, &mut c, 600.0);
        assert!(matches!(vp, Some(Ok(v)) if (v.start - 94.0).abs() < EPS));

        drag.pointer_cancel();
        assert!(!drag.is_dragging());
        assert!(drag.pointer_move(500.0, &mut c, 600.0).is_none());
    }

    #[test]
    fn tiny_dataset_limits_min_window() {
        let c = controller(0.0, 0.5);
        assert!((c.min_window() - 0.5).abs() < EPS);
        assert_eq!(c.state(), ViewportState::new(0.0, 0.5));
    }
}
