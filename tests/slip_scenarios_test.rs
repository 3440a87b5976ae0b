use chrono::NaiveDate;
use slip_generator::database::establish_connection;
use slip_generator::database::migrations::Migrator;
use slip_generator::database::seed_data::{apply_seed, SeedFile};
use slip_generator::errors::FormulaError;
use slip_generator::export::to_csv_slip;
use slip_generator::formula_types::FormulaEntry;
use slip_generator::services::AllowAll;
use slip_generator::units::MassUnit;
use slip_generator::AppContext;
use sea_orm_migration::MigratorTrait;

async fn seeded_context() -> AppContext {
    let db = establish_connection("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let ctx = AppContext::new(db);
    apply_seed(&ctx, &AllowAll, &SeedFile::sample().unwrap())
        .await
        .unwrap();
    ctx
}

fn line<'a>(slip: &'a slip_generator::slip::Slip, compound: &str) -> &'a str {
    &slip
        .lines
        .iter()
        .find(|l| l.compound == compound)
        .unwrap_or_else(|| panic!("no line for {}", compound))
        .formatted
}

#[tokio::test]
async fn test_scale_direct_scenarios() {
    let ctx = seeded_context().await;

    let resin = vec![FormulaEntry::new("Resin China", 12.5, MassUnit::Kg)];
    let lines = ctx.scale(&resin, 2.0, MassUnit::Kg).unwrap();
    assert_eq!(lines[0].grams, 25000.0);
    assert_eq!(lines[0].formatted, "25.00 kg");

    let ob = vec![FormulaEntry::new("OB", 10.0, MassUnit::G)];
    let lines = ctx.scale(&ob, 1.0, MassUnit::Kg).unwrap();
    assert_eq!(lines[0].formatted, "0.01 kg (10 g)");
}

#[tokio::test]
async fn test_generate_slip_for_seeded_grade() {
    let ctx = seeded_context().await;
    let party = ctx.require_party_by_name("ABC").await.unwrap();

    let slip = ctx
        .generate_slip(&party, "250R", &[], 2.0, MassUnit::Kg)
        .await
        .unwrap()
        .with_date(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());

    assert_eq!(slip.lines.len(), 16);
    assert_eq!(slip.lines[0].compound, "Resin China");
    assert_eq!(line(&slip, "Resin China"), "25.00 kg");
    assert_eq!(line(&slip, "TT"), "3.60 kg");
    assert_eq!(line(&slip, "OB"), "0.02 kg (20 g)");
    assert_eq!(line(&slip, "DHRUV"), "0.24 kg (240 g)");
    assert!(slip.render_text().starts_with("Grade: 250R, 31.01.25\n"));
}

#[tokio::test]
async fn test_slip_edits_do_not_touch_stored_formula() {
    let ctx = seeded_context().await;
    let party = ctx.require_party_by_name("ABC").await.unwrap();

    let edits = vec![FormulaEntry::new("OB", 15.0, MassUnit::G)];
    let slip = ctx
        .generate_slip(&party, "250R", &edits, 1.0, MassUnit::G)
        .await
        .unwrap();
    assert_eq!(line(&slip, "OB"), "15.00 g (15000 mg)");

    let stored = ctx.resolve_formula(party.id, "250R").await.unwrap();
    let ob = stored.iter().find(|e| e.compound == "OB").unwrap();
    assert_eq!(ob.quantity, 10.0);
}

#[tokio::test]
async fn test_slip_for_missing_grade_or_bad_weight() {
    let ctx = seeded_context().await;
    let party = ctx.require_party_by_name("ABC").await.unwrap();

    let err = ctx
        .generate_slip(&party, "NoSuchGrade", &[], 1.0, MassUnit::Kg)
        .await
        .unwrap_err();
    assert!(matches!(err, FormulaError::NotFound { entity: "Grade", .. }));

    let err = ctx
        .generate_slip(&party, "250R", &[], 0.0, MassUnit::Kg)
        .await
        .unwrap_err();
    assert!(matches!(err, FormulaError::InvalidWeight(_)));
}

#[tokio::test]
async fn test_slip_csv_export() {
    let ctx = seeded_context().await;
    let party = ctx.require_party_by_name("ABC").await.unwrap();
    let slip = ctx
        .generate_slip(&party, "250R", &[], 1.0, MassUnit::Mg)
        .await
        .unwrap();

    let csv = to_csv_slip::render(&slip).unwrap();
    assert!(csv.starts_with("compound,final_quantity,grams\n"));
    assert!(csv.contains("OB,10000.00 mg (10.00 g),10.000\n"));
    assert!(csv.contains("Resin China,12500000.00 mg,12500.000\n"));
}

#[tokio::test]
async fn test_slip_rejects_invalid_edits() {
    let ctx = seeded_context().await;
    let party = ctx.require_party_by_name("ABC").await.unwrap();

    for bad in [
        FormulaEntry::new("OB", -5.0, MassUnit::G),
        FormulaEntry::new("OB", f64::NAN, MassUnit::G),
        FormulaEntry::new("", 10.0, MassUnit::G),
    ] {
        let err = ctx
            .generate_slip(&party, "250R", &[bad], 1.0, MassUnit::Kg)
            .await
            .unwrap_err();
        assert!(matches!(err, FormulaError::InvalidEntry { .. }), "{:?}", err);
    }

    // A valid edit for a new compound is appended
    let slip = ctx
        .generate_slip(
            &party,
            "250R",
            &[FormulaEntry::new(" Toner Blue ", 5.0, MassUnit::G)],
            1.0,
            MassUnit::Kg,
        )
        .await
        .unwrap();
    assert_eq!(slip.lines.len(), 17);
    assert_eq!(slip.lines[16].compound, "Toner Blue");
}
