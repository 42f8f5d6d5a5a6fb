//! Volume calculator - dispense volumes for media compositions

use serde::Serialize;

use crate::core::concentration::parse_value;
use crate::core::protocol::CompositionItem;
use crate::entities::batch::Batch;

/// Day from which the replated plate count drives the suggested volume
pub const REPLATE_DAY: i64 = 15;

/// Default medium per plate, in mL
pub const DEFAULT_ML_PER_PLATE: f64 = 4.0;

/// A computed dispense volume, stored in mL
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Volume {
    pub ml: f64,
}

impl Volume {
    pub fn from_ml(ml: f64) -> Self {
        Self { ml }
    }

    /// Whether the volume is reported in µL
    pub fn is_microliters(&self) -> bool {
        self.ml < 1.0
    }
}

impl std::fmt::Display for Volume {
    /// Below 1 mL: whole µL. Otherwise mL to two decimals.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_microliters() {
            write!(f, "{} µL", (self.ml * 1000.0).round() as i64)
        } else {
            write!(f, "{:.2} mL", self.ml)
        }
    }
}

/// Volume of one component in `total_ml` of medium
///
/// Uses the percentage when present, otherwise the working/stock ratio.
/// Returns `None` when neither is usable.
pub fn component_volume(
    percentage: Option<f64>,
    stock_conc: &str,
    working_conc: &str,
    total_ml: f64,
) -> Option<Volume> {
    if let Some(pct) = percentage.filter(|p| p.is_finite()) {
        return Some(Volume::from_ml(total_ml * pct / 100.0));
    }

    let stock = parse_value(stock_conc)?;
    let working = parse_value(working_conc)?;
    if stock == 0.0 {
        return None;
    }
    Some(Volume::from_ml(working * total_ml / stock))
}

/// A composition item resolved against a total volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispenseLine {
    pub component: String,
    pub volume: Option<Volume>,
}

impl DispenseLine {
    /// Display text, empty when unknown
    pub fn volume_text(&self) -> String {
        self.volume.map(|v| v.to_string()).unwrap_or_default()
    }
}

/// Resolve every component of a composition for a total volume
pub fn dispense_lines(composition: &[CompositionItem], total_ml: f64) -> Vec<DispenseLine> {
    composition
        .iter()
        .map(|item| DispenseLine {
            component: item.component.clone(),
            volume: component_volume(
                item.percentage,
                &item.stock_conc,
                &item.working_conc,
                total_ml,
            ),
        })
        .collect()
}

/// Suggested total medium for a batch on a given day
///
/// One plate of headroom on top of the plates in culture: the initial count
/// before replating, the replated count from day 15 on.
pub fn suggested_total_ml(batch: &Batch, day: i64, ml_per_plate: f64) -> f64 {
    let plates = if day >= REPLATE_DAY {
        batch.replaced_plate_count
    } else {
        batch.initial_plate_count
    };
    f64::from(plates + 1) * ml_per_plate
}
