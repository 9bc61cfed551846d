use tracing::{info, warn};

/// Wait for a `SIGTERM` or `SIGINT` to stop the process on UNIX systems
#[cfg(unix)]
pub(crate) async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut term, mut int) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "failed to register signal handler, run cannot be interrupted");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = term.recv() => info!("Received SIGTERM, cancelling plan"),
        _ = int.recv() => info!("Received SIGINT, cancelling plan"),
    }
}

/// Wait for a `ctrl+c` to stop the process on Windows systems
#[cfg(windows)]
pub(crate) async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to register signal handler, run cannot be interrupted");
        return std::future::pending().await;
    }
    info!("Received SIGINT, cancelling plan");
}
