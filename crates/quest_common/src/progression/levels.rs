//! Level System v0.1.0
//!
//! Total-XP <-> level conversion shared by the player and every attribute.
//!
//! ## XP Curve
//!
//! XP required for level L: XP_REQUIRED_COEF * L^1.5, rounded up
//! - Level 1: 500 XP
//! - Level 5: 5,591 XP
//! - Level 10: 15,812 XP
//!
//! Thresholds are rounded up so floating point error never grants a level early.

use serde::{Deserialize, Serialize};

/// Coefficient of the level curve
pub const XP_REQUIRED_COEF: f64 = 500.0;

/// Exponent of the level curve
const GROWTH_FACTOR: f64 = 1.5;

/// Upper bound for the exponential search in `level_for_total_xp`
const SEARCH_CEILING: u32 = 1_000_000;

/// Total XP threshold required to be at `level`. Level 0 requires 0 XP.
pub fn xp_required_for_level(level: u32) -> u64 {
    if level == 0 {
        return 0;
    }
    let required = XP_REQUIRED_COEF * (level as f64).powf(GROWTH_FACTOR);
    required.ceil() as u64
}

/// Highest level L such that `total_xp >= xp_required_for_level(L)`.
///
/// Doubles an upper bound until it overshoots, then binary searches between
/// the last bound that fit and the first that didn't.
pub fn level_for_total_xp(total_xp: u64) -> u32 {
    if total_xp == 0 {
        return 0;
    }

    let mut low = 0u32;
    let mut high = 1u32;
    while xp_required_for_level(high) <= total_xp {
        low = high;
        high *= 2;
        if high > SEARCH_CEILING {
            break;
        }
    }

    while low + 1 < high {
        let mid = low + (high - low) / 2;
        if xp_required_for_level(mid) <= total_xp {
            low = mid;
        } else {
            high = mid;
        }
    }
    low
}

/// Same curve as the global level, applied to one attribute's XP pool
pub fn attribute_level_for_xp(attribute_xp: u64) -> u32 {
    level_for_total_xp(attribute_xp)
}

/// Where a total XP figure sits on the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub total_xp: u64,
    /// Threshold of the next level
    pub next_level_xp: u64,
    /// XP still needed to reach the next level
    pub xp_to_next: u64,
}

impl LevelProgress {
    pub fn from_xp(total_xp: u64) -> Self {
        let level = level_for_total_xp(total_xp);
        let next_level_xp = xp_required_for_level(level + 1);
        Self {
            level,
            total_xp,
            next_level_xp,
            xp_to_next: next_level_xp.saturating_sub(total_xp),
        }
    }

    /// Progress through the current level (0-100)
    pub fn percent(&self) -> u8 {
        let floor = xp_required_for_level(self.level);
        let span = self.next_level_xp.saturating_sub(floor);
        if span == 0 {
            return 100;
        }
        let done = self.total_xp.saturating_sub(floor) as f64 / span as f64;
        (done.clamp(0.0, 1.0) * 100.0) as u8
    }
}
