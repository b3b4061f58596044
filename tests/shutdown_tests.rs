#![cfg(unix)]

use std::{process::Command, time::Duration};

use stage_store::graceful_shutdown::{shutdown_signal, ShutdownSignal};

#[tokio::test]
async fn sigterm_is_reported_as_terminate() {
    let waiter = tokio::spawn(shutdown_signal());
    // Let the task install its handlers before the signal is sent.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(status.success());

    let received = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("shutdown signal not observed")
        .unwrap();
    assert_eq!(received, ShutdownSignal::Terminate);
}
