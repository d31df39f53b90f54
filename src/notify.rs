//! Desktop notifications. Delivery is fire-and-forget: it happens off the calling thread, failures
//! are logged and never reach the caller, so state machines behave the same whether or not a
//! notification was shown.

use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tracing::{info, warn};

/// How long notifications stay on screen.
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

const APP_NAME: &str = "focuswatch";

#[cfg_attr(test, automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str, timeout: Duration);
}

/// Shows notifications through the desktop notification service.
#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str, timeout: Duration) {
        info!("Notification: {title} - {message}");
        let mut notification = notify_rust::Notification::new();
        notification
            .summary(title)
            .body(message)
            .appname(APP_NAME)
            .timeout(notify_rust::Timeout::Milliseconds(
                timeout.as_millis().min(u32::MAX as u128) as u32,
            ));
        // `show` blocks on the notification server, which may be slow or missing.
        run_detached(move || {
            if let Err(e) = notification.show() {
                warn!("Failed to deliver notification {:?}: {e:?}", notification.summary);
            }
        });
    }
}

/// Runs `job` without waiting for it. Uses the blocking pool of the current runtime, or a new
/// thread outside of one.
fn run_detached(job: impl FnOnce() + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(job);
        }
        Err(_) => {
            if let Err(e) = std::thread::Builder::new()
                .name("focuswatch-notify".into())
                .spawn(job)
            {
                warn!("Couldn't start notification thread {e:?}");
            }
        }
    }
}

/// Only writes notifications to the log. Used when desktop notifications are disabled.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str, _timeout: Duration) {
        info!("Notification: {title} - {message}");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            mpsc, Arc,
        },
        time::Duration,
    };

    use super::run_detached;

    /// A job that waits until it is released, and reports whether it got released.
    fn gated_job(
        finished: Arc<AtomicBool>,
    ) -> (
        mpsc::Sender<()>,
        mpsc::Receiver<bool>,
        impl FnOnce() + Send + 'static,
    ) {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel();
        let job = move || {
            let released = release_rx.recv_timeout(Duration::from_secs(5)).is_ok();
            finished.store(true, Ordering::SeqCst);
            let _ = done_tx.send(released);
        };
        (release_tx, done_rx, job)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_slow_delivery_doesnt_block_the_runtime() {
        let finished = Arc::new(AtomicBool::new(false));
        let (release, done, job) = gated_job(finished.clone());

        run_detached(job);
        // Still inside the caller while the job waits on the release.
        assert!(!finished.load(Ordering::SeqCst));
        tokio::task::yield_now().await;

        release.send(()).unwrap();
        let released =
            tokio::task::spawn_blocking(move || done.recv_timeout(Duration::from_secs(5)))
                .await
                .unwrap();
        assert_eq!(released, Ok(true));
    }

    #[test]
    fn test_delivery_outside_a_runtime() {
        let finished = Arc::new(AtomicBool::new(false));
        let (release, done, job) = gated_job(finished.clone());

        run_detached(job);
        assert!(!finished.load(Ordering::SeqCst));

        release.send(()).unwrap();
        assert_eq!(done.recv_timeout(Duration::from_secs(5)), Ok(true));
        assert!(finished.load(Ordering::SeqCst));
    }
}
