use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Fixed-cadence tick driver. At most one loop task is alive at a time.
#[derive(Debug, Default)]
pub struct TickLoop {
    handle: Option<JoinHandle<()>>,
}

impl TickLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts ticking every `period`, replacing any loop already running. The first
    /// call to `on_tick` happens one period after arming; the loop ends when
    /// `on_tick` resolves to `false`.
    pub fn arm<F, Fut>(&mut self, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !on_tick().await {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}
