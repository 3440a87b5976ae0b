use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{FormulaError, FormulaResult};
use crate::units::MassUnit;

/// A validated compound line of a formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaEntry {
    pub compound: String,
    pub quantity: f64,
    pub unit: MassUnit,
}

impl FormulaEntry {
    pub fn new(compound: impl Into<String>, quantity: f64, unit: MassUnit) -> Self {
        Self {
            compound: compound.into(),
            quantity,
            unit,
        }
    }

    /// Rebuild an entry from stored columns. Stored rows may predate
    /// validation, so only the unit is checked.
    pub fn from_stored(compound: String, quantity: f64, unit: &str) -> FormulaResult<Self> {
        Ok(Self {
            compound,
            quantity,
            unit: MassUnit::parse_label(unit)?,
        })
    }
}

/// Raw entry as supplied by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub compound: String,
    pub quantity: f64,
    pub unit: String,
}

impl EntryDraft {
    pub fn new(compound: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            compound: compound.into(),
            quantity,
            unit: unit.into(),
        }
    }

    pub fn validate(&self) -> FormulaResult<FormulaEntry> {
        let compound = self.compound.trim();
        if compound.is_empty() {
            return Err(FormulaError::invalid_entry(
                "compound",
                "compound name cannot be empty",
            ));
        }

        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(FormulaError::invalid_entry(
                format!("quantity for '{}'", compound),
                format!("{} is not a positive number", self.quantity),
            ));
        }

        let unit = MassUnit::parse_label(&self.unit)?;

        Ok(FormulaEntry::new(compound, self.quantity, unit))
    }
}

impl From<&FormulaEntry> for EntryDraft {
    fn from(entry: &FormulaEntry) -> Self {
        Self::new(entry.compound.clone(), entry.quantity, entry.unit.as_str())
    }
}

/// Parses the compact `Compound=12.5kg` form used on the command line.
impl FromStr for EntryDraft {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (compound, amount) = s.rsplit_once('=').ok_or_else(|| {
            FormulaError::invalid_entry("entry", format!("'{}' is not of the form Compound=QtyUnit", s))
        })?;

        let amount = amount.trim();
        let split_at = amount
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| FormulaError::InvalidUnit(amount.to_string()))?;
        let (number, unit) = amount.split_at(split_at);

        let quantity = number.trim().parse::<f64>().map_err(|_| {
            FormulaError::invalid_entry(
                format!("quantity for '{}'", compound.trim()),
                format!("'{}' is not a number", number.trim()),
            )
        })?;

        Ok(EntryDraft::new(compound.trim(), quantity, unit.trim()))
    }
}

/// Validate an ordered list of drafts, failing on the first bad entry.
pub fn validate_entries(drafts: &[EntryDraft]) -> FormulaResult<Vec<FormulaEntry>> {
    drafts.iter().map(EntryDraft::validate).collect()
}

/// Re-run validation over entries built outside [`EntryDraft::validate`].
pub fn revalidate(entries: &[FormulaEntry]) -> FormulaResult<Vec<FormulaEntry>> {
    entries
        .iter()
        .map(|entry| EntryDraft::from(entry).validate())
        .collect()
}

/// Apply edits to a formula: an edit for an existing compound replaces its
/// quantity and unit in place, an edit for an unknown compound is appended.
pub fn apply_edits(entries: &[FormulaEntry], edits: &[FormulaEntry]) -> Vec<FormulaEntry> {
    let mut edited = entries.to_vec();
    for edit in edits {
        match edited.iter_mut().find(|e| e.compound == edit.compound) {
            Some(existing) => {
                existing.quantity = edit.quantity;
                existing.unit = edit.unit;
            }
            None => edited.push(edit.clone()),
        }
    }
    edited
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_and_trims() {
        let entry = EntryDraft::new("  Resin China ", 12.5, "KG").validate().unwrap();
        assert_eq!(entry, FormulaEntry::new("Resin China", 12.5, MassUnit::Kg));
    }

    #[test]
    fn rejects_bad_drafts() {
        assert!(matches!(
            EntryDraft::new("  ", 1.0, "kg").validate(),
            Err(FormulaError::InvalidEntry { .. })
        ));
        assert!(matches!(
            EntryDraft::new("OB", 0.0, "g").validate(),
            Err(FormulaError::InvalidEntry { .. })
        ));
        assert!(matches!(
            EntryDraft::new("OB", f64::NAN, "g").validate(),
            Err(FormulaError::InvalidEntry { .. })
        ));
        assert!(matches!(
            EntryDraft::new("OB", 10.0, "oz").validate(),
            Err(FormulaError::InvalidUnit(_))
        ));
    }

    #[test]
    fn parses_compact_form() {
        let draft: EntryDraft = "Resin China=12.5kg".parse().unwrap();
        assert_eq!(draft, EntryDraft::new("Resin China", 12.5, "kg"));

        let draft: EntryDraft = "G-3 = 250 g".parse().unwrap();
        assert_eq!(draft, EntryDraft::new("G-3", 250.0, "g"));

        assert!("Resin China".parse::<EntryDraft>().is_err());
        assert!("OB=10".parse::<EntryDraft>().is_err());
        assert!("OB=tenkg".parse::<EntryDraft>().is_err());
    }

    #[test]
    fn edits_replace_in_place_and_append() {
        let base = vec![
            FormulaEntry::new("Resin China", 12.5, MassUnit::Kg),
            FormulaEntry::new("OB", 10.0, MassUnit::G),
        ];
        let edits = vec![
            FormulaEntry::new("OB", 12.0, MassUnit::G),
            FormulaEntry::new("Toner", 50.0, MassUnit::G),
        ];

        let edited = apply_edits(&base, &edits);

        assert_eq!(edited.len(), 3);
        assert_eq!(edited[0], base[0]);
        assert_eq!(edited[1], FormulaEntry::new("OB", 12.0, MassUnit::G));
        assert_eq!(edited[2].compound, "Toner");
    }

    #[test]
    fn stored_rows_with_unknown_units_fail() {
        assert!(FormulaEntry::from_stored("OB".into(), 10.0, "g").is_ok());
        assert!(matches!(
            FormulaEntry::from_stored("OB".into(), 10.0, "grain"),
            Err(FormulaError::InvalidUnit(_))
        ));
    }
}
