use crate::slip::Slip;
use csv::Writer;
use std::error::Error;

pub fn render(slip: &Slip) -> Result<String, Box<dyn Error>> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record(["compound", "final_quantity", "grams"])?;

    for line in &slip.lines {
        wtr.write_record(&[
            line.compound.clone(),
            line.formatted.clone(),
            format!("{:.3}", line.grams),
        ])?;
    }

    let data = wtr.into_inner()?;
    let csv_string = String::from_utf8(data)?;

    Ok(csv_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula_types::FormulaEntry;
    use crate::units::MassUnit;

    #[test]
    fn test_render_slip_csv() {
        let formula = vec![
            FormulaEntry::new("Resin China", 12.5, MassUnit::Kg),
            FormulaEntry::new("OB", 10.0, MassUnit::G),
        ];
        let slip = Slip::new("ABC", "250R", &formula, 2.0, MassUnit::Kg).unwrap();

        let csv = render(&slip).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "compound,final_quantity,grams");
        assert_eq!(lines[1], "Resin China,25.00 kg,25000.000");
        assert_eq!(lines[2], "OB,0.02 kg (20 g),20.000");
    }
}
