//! Day classification - calendar shading and differentiation stages
//!
//! Both tables are fixed properties of the protocol, not per-batch settings.

use serde::Serialize;

/// Days on which the medium is exchanged
pub const MEDIA_CHANGE_DAYS: &[i64] = &[1, 2, 4, 6, 8, 9, 10, 12, 14, 16, 18, 20];

/// Replating and harvest milestones
pub const MILESTONE_DAYS: &[i64] = &[15, 21];

/// Last day of the protocol; batches past this offset are no longer ongoing
pub const FINAL_DAY: i64 = 21;

/// Calendar shading bucket for a day offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayShade {
    MediaChange,
    Milestone,
    Unclassified,
}

impl DayShade {
    pub fn classify(offset: i64) -> Self {
        if MEDIA_CHANGE_DAYS.contains(&offset) {
            DayShade::MediaChange
        } else if MILESTONE_DAYS.contains(&offset) {
            DayShade::Milestone
        } else {
            DayShade::Unclassified
        }
    }
}

impl std::fmt::Display for DayShade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayShade::MediaChange => write!(f, "media-change"),
            DayShade::Milestone => write!(f, "milestone"),
            DayShade::Unclassified => write!(f, "-"),
        }
    }
}

/// Differentiation stage for a day offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Days 0-5: floor plate induction
    FpInduction,
    /// Days 6-11: neural progenitor induction
    NpInduction,
    /// Days 12-21: midbrain dopaminergic neuron induction
    MdanInduction,
    Unknown,
}

impl Stage {
    pub fn for_day(offset: i64) -> Self {
        match offset {
            0..=5 => Stage::FpInduction,
            6..=11 => Stage::NpInduction,
            12..=21 => Stage::MdanInduction,
            _ => Stage::Unknown,
        }
    }

    /// Single-letter stage code used in compact views
    pub fn code(&self) -> &'static str {
        match self {
            Stage::FpInduction => "A",
            Stage::NpInduction => "B",
            Stage::MdanInduction => "C",
            Stage::Unknown => "?",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::FpInduction => write!(f, "FP induction"),
            Stage::NpInduction => write!(f, "NP induction"),
            Stage::MdanInduction => write!(f, "mDAN induction"),
            Stage::Unknown => write!(f, "Unknown"),
        }
    }
}
