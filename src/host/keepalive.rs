//! Keep-alive timer for the embedded session.
//!
//! At most one recurring timer exists at a time. [`KeepAliveTimer::start`]
//! cancels any running timer before arming a new one, so the collaborator
//! never receives doubled `PARENT_SESSION_ALIVE` traffic.
//!
//! In production the timer spawns a tokio task that sends
//! [`HostEvent::KeepAliveTick`] every period. Without an event channel
//! (tests, offline replay) the timer falls back to deadline polling via
//! [`KeepAliveTimer::poll_due`].
//!
//! Ticks carry the timer id; a tick whose id is no longer current belongs to
//! a cancelled timer and is ignored by the controller.

use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::HostEvent;

/// The single armed timer.
#[derive(Debug)]
struct ActiveTimer {
    id: u64,
    period: Duration,
    /// Next deadline (deadline-polling mode only).
    next_due: Instant,
    /// Spawned tick task (event-driven mode only). Aborted on cancel.
    task: Option<JoinHandle<()>>,
}

/// Owner of the keep-alive timer handle.
#[derive(Debug, Default)]
pub struct KeepAliveTimer {
    active: Option<ActiveTimer>,
    next_id: u64,
    events: Option<(UnboundedSender<HostEvent>, tokio::runtime::Handle)>,
}

impl KeepAliveTimer {
    /// Timer that relies on [`poll_due`](Self::poll_due).
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver ticks through the host event channel from spawned tasks.
    pub(crate) fn set_event_channel(
        &mut self,
        tx: UnboundedSender<HostEvent>,
        handle: tokio::runtime::Handle,
    ) {
        self.events = Some((tx, handle));
    }

    /// Arm a recurring timer, cancelling any existing one. Returns its id.
    pub fn start(&mut self, period: Duration) -> u64 {
        if self.cancel() {
            log::debug!("Replaced running keep-alive timer");
        }

        let id = self.next_id;
        self.next_id += 1;

        let task = self.events.as_ref().map(|(tx, handle)| {
            let tx = tx.clone();
            handle.spawn(async move {
                let start = tokio::time::Instant::now() + period;
                let mut interval = tokio::time::interval_at(start, period);
                loop {
                    interval.tick().await;
                    if tx.send(HostEvent::KeepAliveTick { timer_id: id }).is_err() {
                        break;
                    }
                }
            })
        });

        self.active = Some(ActiveTimer {
            id,
            period,
            next_due: Instant::now() + period,
            task,
        });
        log::info!("Keep-alive timer {id} armed every {}s", period.as_secs());
        id
    }

    /// Cancel the running timer. Returns `true` if one was running.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(timer) => {
                if let Some(task) = timer.task {
                    task.abort();
                }
                log::debug!("Keep-alive timer {} cancelled", timer.id);
                true
            }
            None => false,
        }
    }

    /// Whether a timer is armed.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Number of armed timers (0 or 1).
    pub fn active_count(&self) -> usize {
        usize::from(self.active.is_some())
    }

    /// Id of the armed timer.
    pub fn current_id(&self) -> Option<u64> {
        self.active.as_ref().map(|t| t.id)
    }

    /// Whether `timer_id` is the armed timer.
    pub fn is_current(&self, timer_id: u64) -> bool {
        self.current_id() == Some(timer_id)
    }

    /// Deadline-polling fallback. Returns the timer id if a tick is due at
    /// `now` and advances the deadline. Event-driven timers never fire here.
    pub fn poll_due(&mut self, now: Instant) -> Option<u64> {
        let timer = self.active.as_mut()?;
        if timer.task.is_some() || now < timer.next_due {
            return None;
        }
        while timer.next_due <= now {
            timer.next_due += timer.period;
        }
        Some(timer.id)
    }
}

impl Drop for KeepAliveTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_twice_leaves_one_timer() {
        let mut timer = KeepAliveTimer::new();
        let first = timer.start(Duration::from_secs(600));
        let second = timer.start(Duration::from_secs(600));

        assert_ne!(first, second);
        assert_eq!(timer.active_count(), 1);
        assert!(timer.is_current(second));
        assert!(!timer.is_current(first));
    }

    #[test]
    fn test_cancel() {
        let mut timer = KeepAliveTimer::new();
        assert!(!timer.cancel());
        timer.start(Duration::from_secs(1));
        assert!(timer.cancel());
        assert!(!timer.is_active());
        assert_eq!(timer.current_id(), None);
    }

    #[test]
    fn test_poll_due_deadlines() {
        let mut timer = KeepAliveTimer::new();
        let id = timer.start(Duration::from_secs(10));
        let now = Instant::now();

        assert_eq!(timer.poll_due(now), None);
        assert_eq!(timer.poll_due(now + Duration::from_secs(11)), Some(id));
        // Deadline advanced past the previous poll.
        assert_eq!(timer.poll_due(now + Duration::from_secs(12)), None);
        assert_eq!(timer.poll_due(now + Duration::from_secs(21)), Some(id));
    }

    #[test]
    fn test_poll_due_without_timer() {
        let mut timer = KeepAliveTimer::new();
        assert_eq!(timer.poll_due(Instant::now()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_driven_ticks_and_cancel() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut timer = KeepAliveTimer::new();
        timer.set_event_channel(tx, tokio::runtime::Handle::current());

        let id = timer.start(Duration::from_secs(600));
        tokio::time::sleep(Duration::from_secs(601)).await;
        match rx.try_recv() {
            Ok(HostEvent::KeepAliveTick { timer_id }) => assert_eq!(timer_id, id),
            other => panic!("Expected KeepAliveTick, got {:?}", other),
        }

        // Event-driven timers never fire through deadline polling.
        assert_eq!(timer.poll_due(Instant::now() + Duration::from_secs(3600)), None);

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(1200)).await;
        assert!(rx.try_recv().is_err());
    }
}
