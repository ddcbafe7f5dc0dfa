//! Pure category functions that decide lane grouping priority.
//!
//! Classification never affects visibility, only which block of lanes an
//! event is packed into and in what order the blocks are stacked.

use serde::{Deserialize, Serialize};
use timelane_protocol::IntervalEvent;

use crate::config::ClassifierConfig;

/// A small closed set of categories with a fixed stacking order.
pub trait LaneCategory: Copy + Eq + std::fmt::Debug + 'static {
    /// Stacking order, top to bottom.
    const ORDER: &'static [Self];

    fn name(self) -> &'static str;

    fn index(self) -> usize {
        Self::ORDER.iter().position(|c| *c == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastCategory {
    Rotational,
    Cooldown,
    Utility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffCategory {
    /// Buffs on the player.
    #[serde(rename = "self")]
    Own,
    Pet,
    External,
}

impl LaneCategory for BuffCategory {
    const ORDER: &'static [Self] = &[Self::Own, Self::Pet, Self::External];

    fn name(self) -> &'static str {
        match self {
            Self::Own => "self",
            Self::Pet => "pet",
            Self::External => "external",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebuffCategory {
    Boss,
    Adds,
}

impl LaneCategory for DebuffCategory {
    const ORDER: &'static [Self] = &[Self::Boss, Self::Adds];

    fn name(self) -> &'static str {
        match self {
            Self::Boss => "boss",
            Self::Adds => "adds",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    config: &'a ClassifierConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn cast(&self, category_id: u32) -> CastCategory {
        if self.config.cooldown_ids.contains(&category_id) {
            CastCategory::Cooldown
        } else if self.config.utility_ids.contains(&category_id) {
            CastCategory::Utility
        } else {
            CastCategory::Rotational
        }
    }

    /// Pet membership wins over self membership; anything else is external.
    pub fn buff(&self, event: &IntervalEvent) -> BuffCategory {
        let target = event.target.as_deref();
        if self.config.pet_buff_ids.contains(&event.category_id)
            || target == Some(self.config.pet_label.as_str())
        {
            BuffCategory::Pet
        } else if self.config.self_buff_ids.contains(&event.category_id)
            || target == Some(self.config.player_label.as_str())
        {
            BuffCategory::Own
        } else {
            BuffCategory::External
        }
    }

    /// Debuffs without a target are assumed to sit on the boss.
    pub fn debuff(&self, event: &IntervalEvent) -> DebuffCategory {
        let Some(target) = event.target.as_deref() else {
            return DebuffCategory::Boss;
        };
        let target = target.to_lowercase();
        if self
            .config
            .add_patterns
            .iter()
            .any(|p| target.contains(p.as_str()))
        {
            DebuffCategory::Adds
        } else {
            DebuffCategory::Boss
        }
    }
}
