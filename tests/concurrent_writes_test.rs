use slip_generator::formula_types::FormulaEntry;
use slip_generator::services::AllowAll;
use slip_generator::units::MassUnit;
use slip_generator::AppContext;

/// File-backed database, so the connection pool holds several connections
async fn setup_file_context(dir: &tempfile::TempDir) -> AppContext {
    let path = dir.path().join("formulas.db");
    AppContext::open(path.to_str().unwrap()).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_across_parties_all_commit() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = setup_file_context(&dir).await;

    let abc = ctx.create_party(&AllowAll, "ABC", None).await.unwrap();
    let xyz = ctx.create_party(&AllowAll, "XYZ", None).await.unwrap();

    let mut handles = Vec::new();
    for round in 0..25 {
        for party_id in [abc.id, xyz.id] {
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                let entries = vec![FormulaEntry::new("OB", 10.0 + round as f64, MassUnit::G)];
                ctx.save_custom_grade(party_id, "250R", &format!("g{}", round), &entries)
                    .await
            }));
        }
    }

    let mut failures = Vec::new();
    for handle in handles {
        if let Err(err) = handle.await.unwrap() {
            failures.push(err.to_string());
        }
    }
    assert!(failures.is_empty(), "failed saves: {:?}", failures);

    assert_eq!(ctx.list_grades(abc.id).await.unwrap().len(), 25);
    assert_eq!(ctx.list_grades(xyz.id).await.unwrap().len(), 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mixed_writes_all_commit() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = setup_file_context(&dir).await;

    let base = vec![FormulaEntry::new("Resin China", 12.5, MassUnit::Kg)];
    let abc = ctx
        .create_party_with_formula(&AllowAll, "ABC", None, "250R", &base)
        .await
        .unwrap();
    let doomed = ctx
        .create_party_with_formula(&AllowAll, "Old", None, "250R", &base)
        .await
        .unwrap();

    let creates = (0..10).map(|i| {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            ctx.create_party(&AllowAll, &format!("P{}", i), None)
                .await
                .map(|_| ())
        })
    });
    let upserts = (0..10).map(|i| {
        let ctx = ctx.clone();
        let party_id = abc.id;
        tokio::spawn(async move {
            let entry = FormulaEntry::new(format!("C{}", i), 1.0, MassUnit::Kg);
            ctx.upsert_base_formula_row(party_id, "250R", &entry).await
        })
    });
    let delete = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.delete_party(&AllowAll, doomed.id).await.map(|_| ()) })
    };

    let mut handles: Vec<_> = creates.chain(upserts).collect();
    handles.push(delete);

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ctx.list_parties().await.unwrap().len(), 11);
    assert_eq!(ctx.resolve_formula(abc.id, "250R").await.unwrap().len(), 11);
}
