use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

pub const KEY_PRESS_WINDOW: Duration = Duration::from_millis(300);

/// Runs a task after a quiet period; scheduling again cancels the pending one.
///
/// Only the wait is cancellable. Once the window elapses the task runs on its
/// own and later calls to `schedule` or `cancel` no longer reach it.
pub struct Debouncer {
    window: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            sleep(window).await;
            tokio::spawn(task);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(KEY_PRESS_WINDOW)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counter_task(counter: &Arc<AtomicUsize>, amount: usize) -> impl Future<Output = ()> {
        let counter = counter.clone();
        async move {
            counter.fetch_add(amount, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_quiet_window() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::default();

        debouncer.schedule(counter_task(&fired, 1));
        sleep(Duration::from_millis(299)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn new_schedule_restarts_the_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(counter_task(&fired, 1));
        sleep(Duration::from_millis(200)).await;
        debouncer.schedule(counter_task(&fired, 10));
        sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_window_leaves_running_task_alone() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::default();

        let slow = {
            let fired = fired.clone();
            async move {
                sleep(Duration::from_millis(500)).await;
                fired.fetch_add(1, Ordering::SeqCst);
            }
        };
        debouncer.schedule(slow);
        sleep(Duration::from_millis(350)).await;
        assert!(!debouncer.is_pending());

        debouncer.cancel();
        debouncer.schedule(counter_task(&fired, 10));
        sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_task() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::default();

        debouncer.schedule(counter_task(&fired, 1));
        debouncer.cancel();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!debouncer.is_pending());
    }
}
