use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::warn!("Couldn't listen for SIGTERM {e:?}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// Waits until the process is asked to stop (Ctrl-C, or SIGTERM which `focuswatch stop` sends)
/// or until `cancelation` is cancelled elsewhere, and cancels it.
///
/// On Windows detached processes can't detect signals sent to them, there `stop` kills the
/// process and the open session is lost.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C");
        },
        _ = terminate() => {
            info!("Received termination signal");
        },
        _ = cancelation.cancelled() => {},
    };
    cancelation.cancel();
}
