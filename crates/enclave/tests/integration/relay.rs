use std::sync::Arc;

use enclave::IsolationRunner;

use super::{BufferSink, fixture_config, fixture_runner};

#[tokio::test]
async fn relay_effect_lands_in_host_context() {
    // The callback writes into host-owned storage; the write must be
    // observable from the host after the boundary is gone.
    let runner = fixture_runner();
    let host_output: Arc<std::sync::Mutex<Vec<String>>> = Arc::default();

    let captured = host_output.clone();
    runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("Sample").await?;
            boundary.relay(
                |line: String| {
                    captured.lock().expect("host output lock").push(line);
                    Ok(())
                },
                "written from the host side".to_string(),
            )?;
            Ok(())
        })
        .await
        .expect("run should succeed");

    assert_eq!(
        host_output.lock().expect("host output lock").as_slice(),
        ["written from the host side"]
    );
}

#[tokio::test]
async fn relay_is_synchronous() {
    // relay must not return until the callback has completed.
    let runner = fixture_runner();

    let value = runner
        .run_isolated(|boundary| async move {
            let mut completed = false;
            boundary.relay(
                |flag: &mut bool| {
                    *flag = true;
                    Ok(())
                },
                &mut completed,
            )?;
            assert!(completed, "relay returned before the callback finished");
            Ok(1)
        })
        .await
        .expect("run should succeed");

    assert_eq!(value, 1);
}

#[tokio::test]
async fn relay_fault_propagates_to_relay_caller() {
    #[derive(Debug, thiserror::Error)]
    #[error("relay callback fault")]
    struct RelayFault;

    let runner = fixture_runner();

    let result = runner
        .run_isolated(|boundary| async move {
            boundary.relay(|_: ()| Err(RelayFault.into()), ())?;
            Ok(())
        })
        .await;

    let err = result.unwrap_err();
    assert!(err.downcast_ref::<RelayFault>().is_some());
}

#[tokio::test]
async fn guest_output_crosses_into_host_sink() {
    // The wasm-side face of the relay: a guest unit calling host.log must
    // produce its effect in the host sink, not anywhere boundary-owned.
    let sink = Arc::new(BufferSink::default());
    let runner = IsolationRunner::new(fixture_config())
        .expect("runner should construct")
        .with_sink(sink.clone());

    runner
        .run_isolated(|boundary| async move {
            boundary.load_unit("Chatty").await?;
            boundary.invoke("Chatty", "speak", &[]).await?;
            Ok(())
        })
        .await
        .expect("run should succeed");

    // The boundary is reclaimed; the output survives host-side.
    assert_eq!(sink.lines(), vec!["hello from guest"]);
}
