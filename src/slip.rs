//! Scales a formula to a production weight and formats the result.
//!
//! Each quantity is converted to grams and multiplied by the target weight,
//! so the weight is a plain linear factor over the recipe as authored. The
//! scaled grams are then expressed in the display unit:
//!
//! - `kg` below 1 → `0.01 kg (10 g)`, grams rounded to an integer
//! - `g` below 1000 → `12.50 g (12500 mg)`, milligrams rounded to an integer
//! - `mg` below 1 000 000 → `250.00 mg (0.25 g)`, grams to two decimals
//! - anything else → `25.00 kg`
//!
//! Integer figures round ties to even, so half a gram prints as `(0 g)`.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::errors::{FormulaError, FormulaResult};
use crate::formula_types::{revalidate, FormulaEntry};
use crate::units::{from_base, to_base, MassUnit};

/// One scaled compound of a slip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlipLine {
    pub compound: String,
    pub grams: f64,
    pub amount: f64,
    pub display_unit: MassUnit,
    pub formatted: String,
}

/// Scale every entry of `formula` by `target_weight`. Entries are
/// validated first, so a blank compound or a non-positive quantity fails
/// with `InvalidEntry`.
pub fn scale(
    formula: &[FormulaEntry],
    target_weight: f64,
    display_unit: MassUnit,
) -> FormulaResult<Vec<SlipLine>> {
    if !target_weight.is_finite() || target_weight <= 0.0 {
        return Err(FormulaError::InvalidWeight(target_weight));
    }
    let formula = revalidate(formula)?;

    Ok(formula
        .iter()
        .map(|entry| {
            let grams = to_base(entry.quantity, entry.unit) * target_weight;
            let amount = from_base(grams, display_unit);
            SlipLine {
                compound: entry.compound.clone(),
                grams,
                amount,
                display_unit,
                formatted: format_amount(grams, display_unit),
            }
        })
        .collect())
}

/// Format a gram amount in `display_unit`, adding a finer secondary figure
/// for small amounts.
pub fn format_amount(grams: f64, display_unit: MassUnit) -> String {
    let amount = from_base(grams, display_unit);
    match display_unit {
        MassUnit::Kg if amount < 1.0 => format!("{:.2} kg ({:.0} g)", amount, grams),
        MassUnit::G if amount < 1000.0 => {
            format!("{:.2} g ({:.0} mg)", amount, from_base(grams, MassUnit::Mg))
        }
        MassUnit::Mg if amount < 1_000_000.0 => format!("{:.2} mg ({:.2} g)", amount, grams),
        _ => format!("{:.2} {}", amount, display_unit),
    }
}

/// A printable quantity slip
#[derive(Debug, Clone, Serialize)]
pub struct Slip {
    pub party: String,
    pub grade: String,
    pub date: NaiveDate,
    pub target_weight: f64,
    pub display_unit: MassUnit,
    pub lines: Vec<SlipLine>,
}

impl Slip {
    /// Build a slip stamped with today's local date
    pub fn new(
        party: impl Into<String>,
        grade: impl Into<String>,
        formula: &[FormulaEntry],
        target_weight: f64,
        display_unit: MassUnit,
    ) -> FormulaResult<Self> {
        Ok(Self {
            party: party.into(),
            grade: grade.into(),
            date: Local::now().date_naive(),
            target_weight,
            display_unit,
            lines: scale(formula, target_weight, display_unit)?,
        })
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn date_label(&self) -> String {
        self.date.format("%d.%m.%y").to_string()
    }

    pub fn render_text(&self) -> String {
        let header = "Compound";
        let width = self
            .lines
            .iter()
            .map(|line| line.compound.chars().count())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(header.len());

        let mut out = format!("Grade: {}, {}\n", self.grade, self.date_label());
        out.push_str(&format!("Party: {}\n\n", self.party));
        out.push_str(&format!("{:<width$}  Final Quantity\n", header, width = width));
        out.push_str(&format!("{}  {}\n", "-".repeat(width), "-".repeat(14)));
        for line in &self.lines {
            out.push_str(&format!(
                "{:<width$}  {}\n",
                line.compound,
                line.formatted,
                width = width
            ));
        }
        out
    }
}
