//! Rotating progress messages shown while a thumbnail is generating.
//!
//! [`Narrator::start`] begins a narration period and hands back a [`NarrationGuard`]; the
//! timer task lives exactly as long as the guard. Every period starts from the first
//! message, and once the guard is dropped the position can no longer change.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Position {
    period: u64,
    index: usize,
    active: bool,
}

/// Cycles a fixed list of messages on a timer.
#[derive(Clone, Debug)]
pub struct Narrator {
    messages: &'static [&'static str],
    interval: Duration,
    position: Arc<watch::Sender<Position>>,
}

impl Narrator {
    /// Creates an idle narrator. A zero interval is raised to one millisecond.
    pub fn new(messages: &'static [&'static str], interval: Duration) -> Self {
        let (position, _) = watch::channel(Position::default());
        Self {
            messages,
            interval: interval.max(Duration::from_millis(1)),
            position: Arc::new(position),
        }
    }

    /// Starts a new narration period at the first message.
    pub fn start(&self) -> NarrationGuard {
        let mut period = 0;
        self.position.send_modify(|position| {
            position.period += 1;
            position.index = 0;
            position.active = true;
            period = position.period;
        });

        let position = Arc::clone(&self.position);
        let interval = self.interval;
        let len = self.messages.len();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let advanced = position.send_if_modified(|position| {
                    if !position.active || position.period != period {
                        return false;
                    }
                    position.index = (position.index + 1).checked_rem(len).unwrap_or(0);
                    true
                });
                if !advanced {
                    break;
                }
            }
        });
        trace!(period, "narration started");

        NarrationGuard {
            position: Arc::clone(&self.position),
            period,
            task,
        }
    }

    /// The message at the current position.
    pub fn current_message(&self) -> Option<&'static str> {
        self.messages.get(self.position.borrow().index).copied()
    }

    /// Whether a narration period is running.
    pub fn is_active(&self) -> bool {
        self.position.borrow().active
    }

    /// The full message list.
    pub fn messages(&self) -> &'static [&'static str] {
        self.messages
    }

    /// Follows message changes from now on.
    pub fn subscribe(&self) -> NarrationUpdates {
        NarrationUpdates {
            messages: self.messages,
            receiver: self.position.subscribe(),
        }
    }
}

/// Keeps a narration period running; dropping it stops the timer.
#[derive(Debug)]
#[must_use = "narration stops as soon as the guard is dropped"]
pub struct NarrationGuard {
    position: Arc<watch::Sender<Position>>,
    period: u64,
    task: JoinHandle<()>,
}

impl NarrationGuard {
    /// Ends the narration period.
    pub fn stop(self) {}
}

impl Drop for NarrationGuard {
    fn drop(&mut self) {
        let period = self.period;
        self.position.send_if_modified(|position| {
            if position.period != period || !position.active {
                return false;
            }
            position.active = false;
            true
        });
        self.task.abort();
        trace!(period, "narration stopped");
    }
}

/// Stream of narrator messages.
#[derive(Debug)]
pub struct NarrationUpdates {
    messages: &'static [&'static str],
    receiver: watch::Receiver<Position>,
}

impl NarrationUpdates {
    /// Waits for the next message. Returns `None` once narration stops or the narrator is
    /// gone.
    pub async fn next(&mut self) -> Option<&'static str> {
        self.receiver.changed().await.ok()?;
        let position = *self.receiver.borrow_and_update();
        if !position.active {
            return None;
        }
        self.messages.get(position.index).copied()
    }
}
