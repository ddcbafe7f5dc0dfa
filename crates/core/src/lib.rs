//! Layout engine for dense event timelines.
//!
//! Given a set of casts, buffs, debuffs, damage instances and resource
//! samples, [`Timeline`] computes everything a renderer needs to draw the
//! current window: which events are visible, which lane each one sits in,
//! and how dense clusters are aggregated at the current zoom level.

pub mod cache;
pub mod classify;
pub mod config;
pub mod lod;
pub mod model;
pub mod scale;
pub mod timeline;
pub mod viewport;
pub mod views;

pub use config::{ConfigError, TimelineConfig};
pub use model::Dataset;
pub use timeline::Timeline;
pub use viewport::{DragPan, ViewportController, ViewportError};
