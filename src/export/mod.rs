pub mod to_csv_slip;
