//! Filter enums for list commands

use clap::ValueEnum;
use chrono::NaiveDate;

use crate::entities::batch::{Batch, BatchPhase};

/// Batch filter relative to a reference date
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum BatchFilter {
    /// Started and not past day 21
    Ongoing,
    /// Past day 21 or past the end date
    Finished,
    /// Start date still ahead
    Upcoming,
    /// Every batch - default
    #[default]
    All,
}

impl BatchFilter {
    pub fn matches(&self, batch: &Batch, date: NaiveDate) -> bool {
        match self {
            BatchFilter::Ongoing => batch.phase(date) == BatchPhase::Ongoing,
            BatchFilter::Finished => batch.phase(date) == BatchPhase::Finished,
            BatchFilter::Upcoming => batch.phase(date) == BatchPhase::Upcoming,
            BatchFilter::All => true,
        }
    }
}

impl std::fmt::Display for BatchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchFilter::Ongoing => write!(f, "ongoing"),
            BatchFilter::Finished => write!(f, "finished"),
            BatchFilter::Upcoming => write!(f, "upcoming"),
            BatchFilter::All => write!(f, "all"),
        }
    }
}
