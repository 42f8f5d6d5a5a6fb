//! difftrack: schedule and track stem-cell differentiation batches
//!
//! Batches are placed on a day-offset calendar against a protocol table, and
//! each day's tasks come with the media volumes to dispense.

pub mod cli;
pub mod core;
pub mod entities;
pub mod report;
pub mod yaml;
