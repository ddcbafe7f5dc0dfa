//! Vertical stacking of the tracks.

use std::collections::BTreeSet;

use timelane_protocol::{TrackId, TrackLayout};

use crate::config::TrackDefinition;

/// Track definitions plus which collapsible tracks are expanded.
#[derive(Debug, Clone)]
pub struct TrackStack {
    definitions: Vec<TrackDefinition>,
    expanded: BTreeSet<TrackId>,
}

/// Result of laying out a [`TrackStack`].
#[derive(Debug, Clone, PartialEq)]
pub struct StackLayout {
    pub tracks: Vec<TrackLayout>,
    pub total_height: f64,
}

impl StackLayout {
    pub fn get(&self, id: TrackId) -> Option<&TrackLayout> {
        self.tracks.iter().find(|t| t.track_id == id)
    }

    /// Height of a track, 0 when it is hidden or unknown.
    pub fn height_of(&self, id: TrackId) -> f64 {
        self.get(id).filter(|t| t.visible).map_or(0.0, |t| t.height)
    }
}

impl TrackStack {
    /// Every track starts expanded.
    pub fn new(definitions: Vec<TrackDefinition>) -> Self {
        let expanded = definitions.iter().map(|d| d.id).collect();
        Self {
            definitions,
            expanded,
        }
    }

    /// Replace the definitions, keeping the expand state of tracks that
    /// still exist. New tracks start expanded.
    pub fn set_definitions(&mut self, definitions: Vec<TrackDefinition>) {
        let known: BTreeSet<TrackId> = self.definitions.iter().map(|d| d.id).collect();
        self.expanded = definitions
            .iter()
            .map(|d| d.id)
            .filter(|id| !known.contains(id) || self.expanded.contains(id))
            .collect();
        self.definitions = definitions;
    }

    pub fn definitions(&self) -> &[TrackDefinition] {
        &self.definitions
    }

    pub fn is_expanded(&self, id: TrackId) -> bool {
        self.expanded.contains(&id)
    }

    /// Flip a collapsible track. Returns the new expanded state; tracks
    /// that cannot collapse stay expanded.
    pub fn toggle(&mut self, id: TrackId) -> bool {
        let collapsible = self
            .definitions
            .iter()
            .find(|d| d.id == id)
            .is_some_and(|d| d.collapsible);
        if !collapsible {
            return true;
        }
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
        self.expanded.contains(&id)
    }

    /// Stack the tracks top to bottom.
    ///
    /// With `available_height`, expanded non-fixed tracks share whatever
    /// the fixed and collapsed tracks leave, in proportion to their base
    /// heights, so the stack fills it exactly.
    pub fn layout(&self, available_height: Option<f64>) -> StackLayout {
        let expanded = |d: &TrackDefinition| !d.collapsible || self.expanded.contains(&d.id);
        let flexible = |d: &TrackDefinition| expanded(d) && !d.fixed && d.base_height > 0.0;

        let mut heights: Vec<f64> = self
            .definitions
            .iter()
            .map(|d| {
                if expanded(d) {
                    d.base_height.max(0.0)
                } else {
                    d.collapsed_height.max(0.0)
                }
            })
            .collect();

        if let Some(available) = available_height.filter(|h| h.is_finite() && *h >= 0.0) {
            let (flex_total, rigid_total) = self.definitions.iter().zip(&heights).fold(
                (0.0, 0.0),
                |(flex, rigid), (d, &h)| {
                    if flexible(d) { (flex + h, rigid) } else { (flex, rigid + h) }
                },
            );
            if flex_total > 0.0 {
                let ratio = ((available - rigid_total) / flex_total).max(0.0);
                for (d, h) in self.definitions.iter().zip(heights.iter_mut()) {
                    if flexible(d) {
                        *h *= ratio;
                    }
                }
            }
        }

        let mut y = 0.0;
        let tracks = self
            .definitions
            .iter()
            .zip(heights)
            .map(|(d, height)| {
                let layout = TrackLayout {
                    track_id: d.id,
                    y,
                    height,
                    visible: height > 0.0,
                };
                y += height;
                layout
            })
            .collect();

        StackLayout {
            tracks,
            total_height: y,
        }
    }
}
