//! Sharpness gauges. Hit counts are stored per tier from red (index 0) to purple (index 6).

use std::fmt;

use serde::Serialize;

pub const SHARPNESS_TIERS: usize = 7;

/// Hits removed from the maximum gauge per missing handicraft level.
pub const HANDICRAFT_HITS_PER_LEVEL: u16 = 10;
pub const MAX_HANDICRAFT_LEVEL: u8 = 5;

const RAW_MODIFIERS: [f64; SHARPNESS_TIERS] = [0.50, 0.75, 1.00, 1.05, 1.20, 1.32, 1.39];
const ELEMENTAL_MODIFIERS: [f64; SHARPNESS_TIERS] = [0.25, 0.50, 0.75, 1.00, 1.0625, 1.15, 1.25];
const TIER_NAMES: [&str; SHARPNESS_TIERS] = ["red", "orange", "yellow", "green", "blue", "white", "purple"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SharpnessGauge([u16; SHARPNESS_TIERS]);

impl SharpnessGauge {
    pub fn from_hits(hits: [u16; SHARPNESS_TIERS]) -> Self {
        Self(hits)
    }

    pub fn hits(&self) -> [u16; SHARPNESS_TIERS] {
        self.0
    }

    pub fn total_hits(&self) -> u32 {
        self.0.iter().map(|hits| u32::from(*hits)).sum()
    }

    /// Highest tier with any hits left; red for an empty gauge.
    pub fn top_tier(&self) -> usize {
        self.0.iter().rposition(|hits| *hits > 0).unwrap_or(0)
    }

    pub fn top_tier_name(&self) -> &'static str {
        TIER_NAMES[self.top_tier()]
    }

    pub fn raw_modifier(&self) -> f64 {
        RAW_MODIFIERS[self.top_tier()]
    }

    pub fn elemental_modifier(&self) -> f64 {
        ELEMENTAL_MODIFIERS[self.top_tier()]
    }

    /// Remove hits from the top down until at most `total` remain.
    pub fn truncated(&self, total: u32) -> Self {
        let mut excess = self.total_hits().saturating_sub(total);
        let mut hits = self.0;
        for tier in hits.iter_mut().rev() {
            if excess == 0 {
                break;
            }
            let removed = u32::from(*tier).min(excess);
            *tier -= removed as u16;
            excess -= removed;
        }
        Self(hits)
    }

    /// Gauge at a given handicraft level, treating `self` as the level-5 gauge.
    pub fn with_handicraft(&self, level: u8) -> Self {
        let missing = MAX_HANDICRAFT_LEVEL.saturating_sub(level.min(MAX_HANDICRAFT_LEVEL));
        let removed = u32::from(missing) * u32::from(HANDICRAFT_HITS_PER_LEVEL);
        self.truncated(self.total_hits().saturating_sub(removed))
    }

    pub fn with_added_top_hits(&self, extra: u16) -> Self {
        let mut hits = self.0;
        let top = self.top_tier();
        hits[top] = hits[top].saturating_add(extra);
        Self(hits)
    }

    /// True if, for every tier, `self` has at least as many hits at that tier or above.
    pub fn dominates(&self, other: &Self) -> bool {
        let mut ours = 0u32;
        let mut theirs = 0u32;
        for tier in (0..SHARPNESS_TIERS).rev() {
            ours += u32::from(self.0[tier]);
            theirs += u32::from(other.0[tier]);
            if ours < theirs {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for SharpnessGauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u16::to_string).collect();
        write!(f, "{} ({})", parts.join(" "), self.top_tier_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFI: [u16; SHARPNESS_TIERS] = [50, 50, 60, 60, 80, 60, 40];

    #[test]
    fn handicraft_zero_drops_fifty_hits_from_the_top() {
        let gauge = SharpnessGauge::from_hits(SAFI).with_handicraft(0);
        assert_eq!(gauge.hits(), [50, 50, 60, 60, 80, 50, 0]);
        assert_eq!(gauge.top_tier_name(), "white");
        assert!((gauge.raw_modifier() - 1.32).abs() < 1e-12);
    }

    #[test]
    fn full_handicraft_keeps_the_maximum_gauge() {
        let gauge = SharpnessGauge::from_hits(SAFI);
        assert_eq!(gauge.with_handicraft(5), gauge);
        assert!((gauge.elemental_modifier() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn truncation_can_cross_several_tiers() {
        let gauge = SharpnessGauge::from_hits([10, 10, 10, 0, 0, 0, 0]).truncated(15);
        assert_eq!(gauge.hits(), [10, 5, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn added_hits_land_on_the_highest_remaining_tier() {
        let gauge = SharpnessGauge::from_hits([50, 50, 60, 60, 80, 50, 0]).with_added_top_hits(50);
        assert_eq!(gauge.hits()[5], 100);
        assert_eq!(gauge.hits()[6], 0);
    }

    #[test]
    fn dominance_compares_cumulative_hits_from_the_top() {
        let long_white = SharpnessGauge::from_hits([0, 0, 0, 0, 0, 60, 0]);
        let short_purple = SharpnessGauge::from_hits([0, 0, 0, 0, 0, 0, 10]);
        assert!(!long_white.dominates(&short_purple));
        assert!(!short_purple.dominates(&long_white));
        let both = SharpnessGauge::from_hits([0, 0, 0, 0, 0, 60, 10]);
        assert!(both.dominates(&long_white));
        assert!(both.dominates(&short_purple));
        assert!(both.dominates(&both));
    }
}
