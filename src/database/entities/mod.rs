pub mod custom_formula_entries;
pub mod custom_grades;
pub mod formulas;
pub mod parties;
