use enclave::BoundaryError;

use super::fixture_runner;

#[tokio::test]
async fn load_unit_and_list_exports() {
    let runner = fixture_runner();

    let exports = runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("Sample").await?;
            Ok(boundary.exports("Sample").await?)
        })
        .await
        .expect("run should succeed");

    assert_eq!(exports, vec!["memory", "answer", "double"]);
}

#[tokio::test]
async fn dummy_assembly_scenario() {
    // Load a unit, read a name string out of it (not a handle), and return
    // that string across the boundary intact.
    let runner = fixture_runner();

    let (result, report) = runner
        .run_isolated_with_report(|boundary| async move {
            boundary.load_unit("DummyAssembly").await?;
            let exports = boundary.exports("DummyAssembly").await?;
            Ok(exports
                .into_iter()
                .next()
                .expect("DummyAssembly should have exports"))
        })
        .await;

    assert_eq!(result.unwrap(), "Widget");
    assert!(report.is_reclaimed());
}

#[tokio::test]
async fn invoke_across_units_in_one_boundary() {
    let runner = fixture_runner();

    let (answer, widget) = runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("Sample").await?;
            boundary.load_unit("DummyAssembly").await?;
            assert_eq!(boundary.unit_names().await, vec!["DummyAssembly", "Sample"]);

            let answer = boundary.invoke("Sample", "answer", &[]).await?;
            let widget = boundary.invoke("DummyAssembly", "Widget", &[]).await?;
            Ok((answer[0], widget[0]))
        })
        .await
        .expect("run should succeed");

    assert_eq!(answer, 42);
    assert_eq!(widget, 1);
}

#[tokio::test]
async fn dotted_unit_name_loads_the_named_artifact() {
    // Both unit-2.v1.wat and unit-2.wat exist; the dot in the name must not
    // be treated as an extension boundary.
    let runner = fixture_runner();

    let version = runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("unit-2.v1").await?;
            let results = boundary.invoke("unit-2.v1", "version", &[]).await?;
            Ok(results[0])
        })
        .await
        .expect("run should succeed");

    assert_eq!(version, 21);
}

#[tokio::test]
async fn missing_unit_fails_with_load_error() {
    let runner = fixture_runner();

    let result = runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("Nonexistent").await?;
            Ok(())
        })
        .await;

    let err = result.unwrap_err();
    match err.downcast_ref::<BoundaryError>() {
        Some(BoundaryError::UnitNotFound { name, .. }) => assert_eq!(name, "Nonexistent"),
        other => panic!("expected UnitNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_unit_fails_with_flattened_diagnostic() {
    let runner = fixture_runner();

    let result = runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("Broken").await?;
            Ok(())
        })
        .await;

    let err = result.unwrap_err();
    match err.downcast_ref::<BoundaryError>() {
        Some(BoundaryError::InvalidUnit { name, message }) => {
            assert_eq!(name, "Broken");
            // The diagnostic crossed the boundary as a plain message string.
            assert!(!message.is_empty());
        }
        other => panic!("expected InvalidUnit, got {other:?}"),
    }
}

#[tokio::test]
async fn unit_imports_resolve_only_against_host() {
    // NeedsGhost imports ghost.missing, which no host linker defines. The
    // load must fail outward instead of being resolved inside the boundary.
    let runner = fixture_runner();

    let result = runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("NeedsGhost").await?;
            Ok(())
        })
        .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BoundaryError>(),
        Some(BoundaryError::UnresolvedImport { .. })
    ));
}

#[tokio::test]
async fn guest_trap_is_flattened() {
    let runner = fixture_runner();

    let result = runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("Trapper").await?;
            boundary.invoke("Trapper", "boom", &[]).await?;
            Ok(())
        })
        .await;

    let err = result.unwrap_err();
    match err.downcast_ref::<BoundaryError>() {
        Some(BoundaryError::UnitTrap { unit, name, message }) => {
            assert_eq!(unit, "Trapper");
            assert_eq!(name, "boom");
            assert!(message.contains("unreachable"));
        }
        other => panic!("expected UnitTrap, got {other:?}"),
    }
}

#[tokio::test]
async fn traversal_names_rejected_before_resolution() {
    let runner = fixture_runner();

    let result = runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("../units/Sample").await?;
            Ok(())
        })
        .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BoundaryError>(),
        Some(BoundaryError::InvalidName(_))
    ));
}
