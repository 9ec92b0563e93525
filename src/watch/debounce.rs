//! Burst coalescing for reload requests.
//!
//! A [`ReloadDebouncer`] is a single task that owns the timer. Every event
//! (re)arms the timer; when it expires without another event arriving the
//! callback runs once on the blocking pool. The task waits for the callback
//! to return before it looks at the next event, so a reset can never race a
//! firing. Events that arrive while the callback runs start the next cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, error};

/// Quiet period before a reload fires. Bulk content replacement can touch
/// hundreds of files over a few seconds.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(4);

/// Cheap, cloneable sender of change events.
#[derive(Debug, Clone)]
pub struct DebounceNotifier {
    tx: mpsc::UnboundedSender<()>,
}

impl DebounceNotifier {
    /// Returns false once the debouncer has stopped.
    pub fn notify(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Handle to a running debounce task.
///
/// Dropping the handle stops the task as well; [`ReloadDebouncer::shutdown`]
/// additionally waits for an in-flight callback to finish.
pub struct ReloadDebouncer {
    notifier: DebounceNotifier,
    stopping: Arc<AtomicBool>,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ReloadDebouncer {
    /// Start the debounce task on the current tokio runtime.
    pub fn spawn<F>(delay: Duration, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let stopping = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run(
            delay,
            Arc::new(callback),
            rx,
            stop_rx,
            Arc::clone(&stopping),
        ));
        Self {
            notifier: DebounceNotifier { tx },
            stopping,
            stop_tx,
            task,
        }
    }

    pub fn notifier(&self) -> DebounceNotifier {
        self.notifier.clone()
    }

    pub fn notify(&self) -> bool {
        self.notifier.notify()
    }

    /// Cancel any pending reload and wait for the task to exit.
    /// No callback starts after this is called.
    pub async fn shutdown(self) {
        self.stopping.store(true, Ordering::SeqCst);
        let _ = self.stop_tx.send(());
        if let Err(e) = self.task.await {
            error!("Reload debouncer task failed: {}", e);
        }
    }
}

async fn run<F>(
    delay: Duration,
    callback: Arc<F>,
    mut events: mpsc::UnboundedReceiver<()>,
    mut stop: oneshot::Receiver<()>,
    stopping: Arc<AtomicBool>,
) where
    F: Fn() + Send + Sync + 'static,
{
    loop {
        // Idle: wait for the first event of a burst.
        tokio::select! {
            biased;
            _ = &mut stop => return,
            event = events.recv() => {
                if event.is_none() {
                    return;
                }
            }
        }

        // Pending: every further event pushes the deadline out.
        let timer = sleep(delay);
        tokio::pin!(timer);
        loop {
            tokio::select! {
                biased;
                _ = &mut stop => return,
                () = &mut timer => break,
                event = events.recv() => match event {
                    Some(()) => timer.as_mut().reset(Instant::now() + delay),
                    // All notifiers are gone; let the pending reload run.
                    None => break,
                },
            }
        }

        if stopping.load(Ordering::SeqCst) {
            return;
        }

        debug!("Change burst settled, running reload");
        let callback = Arc::clone(&callback);
        if let Err(e) = tokio::task::spawn_blocking(move || callback()).await {
            error!("Reload callback panicked: {}", e);
        }
    }
}
