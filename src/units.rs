//! Mass units and conversion to and from grams.
//!
//! Grams are the canonical base unit. The conversion table is fixed:
//!
//! | unit | grams |
//! |------|-------|
//! | kg   | 1000  |
//! | g    | 1     |
//! | mg   | 0.001 |
//!
//! No rounding happens here; rounding is left to slip formatting.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::errors::{FormulaError, FormulaResult};

/// Recognised mass units.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MassUnit {
    Kg,
    G,
    Mg,
}

impl MassUnit {
    /// Number of grams in one of this unit.
    pub fn grams_per_unit(self) -> f64 {
        match self {
            MassUnit::Kg => 1000.0,
            MassUnit::G => 1.0,
            MassUnit::Mg => 0.001,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Parse a unit label, trimming whitespace and ignoring case.
    pub fn parse_label(label: &str) -> FormulaResult<Self> {
        let normalised = label.trim().to_lowercase();
        MassUnit::from_str(&normalised).map_err(|_| FormulaError::InvalidUnit(label.to_string()))
    }
}

/// Convert a quantity expressed in `unit` to grams.
pub fn to_base(quantity: f64, unit: MassUnit) -> f64 {
    quantity * unit.grams_per_unit()
}

/// Convert grams to a quantity expressed in `target`.
pub fn from_base(grams: f64, target: MassUnit) -> f64 {
    grams / target.grams_per_unit()
}

/// String-level variant of [`to_base`] for callers holding raw unit labels.
pub fn to_base_labelled(quantity: f64, unit: &str) -> FormulaResult<f64> {
    Ok(to_base(quantity, MassUnit::parse_label(unit)?))
}

/// String-level variant of [`from_base`].
pub fn from_base_labelled(grams: f64, target: &str) -> FormulaResult<f64> {
    Ok(from_base(grams, MassUnit::parse_label(target)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn converts_to_grams() {
        assert_eq!(to_base(12.5, MassUnit::Kg), 12500.0);
        assert_eq!(to_base(10.0, MassUnit::G), 10.0);
        assert!(approx_eq(to_base(250.0, MassUnit::Mg), 0.25));
    }

    #[test]
    fn converts_from_grams() {
        assert_eq!(from_base(25000.0, MassUnit::Kg), 25.0);
        assert!(approx_eq(from_base(10.0, MassUnit::Kg), 0.01));
        assert!(approx_eq(from_base(1.5, MassUnit::Mg), 1500.0));
    }

    #[test]
    fn round_trips_every_unit() {
        for unit in MassUnit::iter() {
            for x in [0.001, 0.37, 1.0, 12.5, 1050.0, 987_654.321] {
                assert!(
                    approx_eq(from_base(to_base(x, unit), unit), x),
                    "round trip failed for {x} {unit}"
                );
            }
        }
    }

    #[test]
    fn parses_labels() {
        assert_eq!(MassUnit::parse_label("kg").unwrap(), MassUnit::Kg);
        assert_eq!(MassUnit::parse_label(" G ").unwrap(), MassUnit::G);
        assert_eq!(MassUnit::parse_label("MG").unwrap(), MassUnit::Mg);
        assert_eq!(MassUnit::Mg.to_string(), "mg");
        assert_eq!(MassUnit::Kg.as_str(), "kg");
    }

    #[test]
    fn rejects_unknown_units() {
        let err = MassUnit::parse_label("lb").unwrap_err();
        assert!(matches!(err, FormulaError::InvalidUnit(ref u) if u == "lb"));
        assert!(to_base_labelled(1.0, "tonne").is_err());
        assert!(from_base_labelled(1.0, "").is_err());
        assert_eq!(to_base_labelled(2.0, "kg").unwrap(), 2000.0);
    }
}
