//! Concentration parsing - normalizes reagent concentration strings
//!
//! Stock and working concentrations in a protocol table are written by hand
//! ("10 uM", "5 ng/mL", "2X", "0.5"). This module folds them onto a common
//! numeric basis so dilution percentages can be computed uniformly:
//!
//! - molar units are expressed in µM
//! - mass/volume units are expressed in µg/mL
//! - "X" fold notation keeps its multiplier
//!
//! Unit detection is a substring test in a fixed priority order. The order is
//! significant and intentionally kept as-is, ambiguities included.

use serde::{Deserialize, Serialize};

/// Family a parsed concentration was normalized into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFamily {
    /// nM / uM / mM, normalized to µM
    Molar,
    /// ng/mL / ug/mL, normalized to µg/mL
    MassPerVolume,
    /// Fold concentration ("2X")
    Fold,
    /// Bare number with no recognized unit
    Unitless,
}

impl std::fmt::Display for UnitFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitFamily::Molar => write!(f, "uM"),
            UnitFamily::MassPerVolume => write!(f, "ug/mL"),
            UnitFamily::Fold => write!(f, "X"),
            UnitFamily::Unitless => write!(f, "-"),
        }
    }
}

/// A successfully parsed, normalized concentration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Concentration {
    /// Normalized value, always finite and non-negative
    pub value: f64,
    pub family: UnitFamily,
}

impl Concentration {
    fn new(value: f64, family: UnitFamily) -> Option<Self> {
        if value.is_finite() && value >= 0.0 {
            Some(Self { value, family })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Concentration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.family {
            UnitFamily::Unitless => write!(f, "{}", self.value),
            UnitFamily::Fold => write!(f, "{}X", self.value),
            family => write!(f, "{} {}", self.value, family),
        }
    }
}

/// Unit suffixes in match priority order, with their factor to the normalized unit
const UNIT_TABLE: &[(&str, f64, UnitFamily)] = &[
    ("nm", 1e-3, UnitFamily::Molar),
    ("um", 1.0, UnitFamily::Molar),
    ("mm", 1e3, UnitFamily::Molar),
    ("ng/ml", 1e-3, UnitFamily::MassPerVolume),
    ("ug/ml", 1.0, UnitFamily::MassPerVolume),
    ("x", 1.0, UnitFamily::Fold),
];

/// Parse a concentration string into its normalized form
///
/// Returns `None` for anything that cannot be read as a non-negative number,
/// with or without a recognized unit. Never panics.
pub fn parse_concentration(input: &str) -> Option<Concentration> {
    let normalized = input
        .trim()
        .to_lowercase()
        .replace(['\u{00b5}', '\u{03bc}'], "u");

    for (unit, factor, family) in UNIT_TABLE {
        if normalized.contains(unit) {
            let number = normalized.replace(unit, "");
            return number
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|v| Concentration::new(v * factor, *family));
        }
    }

    normalized
        .parse::<f64>()
        .ok()
        .and_then(|v| Concentration::new(v, UnitFamily::Unitless))
}

/// Normalized numeric value of a concentration string, if it parses
pub fn parse_value(input: &str) -> Option<f64> {
    parse_concentration(input).map(|c| c.value)
}

/// Working/stock ratio as a percentage
///
/// `None` when either side fails to parse or the stock is zero. Mixed unit
/// families are not rejected; the ratio is computed on the raw normalized
/// values.
pub fn dilution_percentage(working: &str, stock: &str) -> Option<f64> {
    let working = parse_concentration(working)?;
    let stock = parse_concentration(stock)?;

    if stock.value == 0.0 {
        return None;
    }

    if working.family != stock.family {
        tracing::debug!(
            working = %working,
            stock = %stock,
            "dilution computed across different unit families"
        );
    }

    Some(working.value / stock.value * 100.0)
}
