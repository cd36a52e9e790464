//! Delayed command scheduler.
//!
//! Commands read from a command book are not run inline with the interaction that
//! triggered them. They are queued here with a delay measured in ticks and released, in
//! due order, to an output channel that the host drains and executes as the acting user.
//! Spacing successive commands by a few ticks gives each one a chance to settle before
//! the next runs.
//!
//! The scheduler is a single spawned task owning a small queue (`Vec` kept sorted by due
//! time, then submission order). The public surface is [`SchedulerHandle`] plus the
//! [`TaskQueue`] trait that the trigger handler submits through.
//!
//! There is no per-task cancellation: once submitted a command will be released unless the
//! whole scheduler is shut down first.

use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::logutil::escape_log;

/// A command to run as `actor` once `delay_ticks` have elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCommand {
    pub actor: String,
    pub command: String,
    pub delay_ticks: u64,
}

/// Anything that accepts delayed commands.
pub trait TaskQueue {
    fn submit(&self, task: ScheduledCommand);
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Length of one tick.
    pub tick: Duration,
}

impl SchedulerConfig {
    pub fn from_tick_ms(tick_ms: u64) -> Self {
        Self {
            tick: Duration::from_millis(tick_ms.max(1)),
        }
    }

    pub fn delay_for(&self, ticks: u64) -> Duration {
        self.tick.saturating_mul(ticks.min(u32::MAX as u64) as u32)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_tick_ms(50)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub queued: usize,
    pub submitted_total: u64,
    pub dispatched_total: u64,
    pub dropped_total: u64,
}

enum ScheduleRequest {
    Submit(ScheduledCommand),
    Snapshot(oneshot::Sender<SchedulerStats>),
    Shutdown(oneshot::Sender<()>),
}

struct Pending {
    due: Instant,
    seq: u64,
    task: ScheduledCommand,
}

#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<ScheduleRequest>,
}

impl SchedulerHandle {
    pub fn schedule(&self, task: ScheduledCommand) {
        if self.tx.send(ScheduleRequest::Submit(task)).is_err() {
            warn!("scheduler stopped; dropping command");
        }
    }

    pub async fn snapshot(&self) -> Option<SchedulerStats> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(ScheduleRequest::Snapshot(tx)).is_ok() {
            rx.await.ok()
        } else {
            None
        }
    }

    /// Stop the scheduler. Commands still queued are discarded.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(ScheduleRequest::Shutdown(tx));
        let _ = rx.await;
    }
}

impl TaskQueue for SchedulerHandle {
    fn submit(&self, task: ScheduledCommand) {
        self.schedule(task);
    }
}

/// Longest wait before a queued command is released, whatever its delay.
const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 3600);

/// Due time `delay` after `now`, clamped to [`MAX_DELAY`] so it never overflows.
fn due_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay.min(MAX_DELAY)).unwrap_or(now)
}

/// Spawn the scheduler loop. Released commands are sent to `outgoing`.
pub fn start_scheduler(
    cfg: SchedulerConfig,
    outgoing: mpsc::UnboundedSender<ScheduledCommand>,
) -> SchedulerHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<ScheduleRequest>();
    let handle = SchedulerHandle { tx };

    tokio::spawn(async move {
        let mut queue: Vec<Pending> = Vec::new();
        let mut stats = SchedulerStats::default();
        let mut next_seq = 0u64;
        // Wake-up used while the queue is empty.
        const IDLE: Duration = Duration::from_secs(3600);

        loop {
            let wake = queue
                .first()
                .map(|p| p.due)
                .unwrap_or_else(|| Instant::now() + IDLE);

            tokio::select! {
                req = rx.recv() => {
                    match req {
                        Some(ScheduleRequest::Submit(task)) => {
                            let due = due_after(Instant::now(), cfg.delay_for(task.delay_ticks));
                            debug!(
                                "scheduled command actor={} delay_ticks={} command={}",
                                escape_log(&task.actor),
                                task.delay_ticks,
                                escape_log(&task.command)
                            );
                            let pos = queue.partition_point(|p| (p.due, p.seq) <= (due, next_seq));
                            queue.insert(pos, Pending { due, seq: next_seq, task });
                            next_seq += 1;
                            stats.submitted_total += 1;
                        }
                        Some(ScheduleRequest::Snapshot(resp)) => {
                            let _ = resp.send(SchedulerStats { queued: queue.len(), ..stats.clone() });
                        }
                        Some(ScheduleRequest::Shutdown(done)) => {
                            let _ = done.send(());
                            break;
                        }
                        // Every handle dropped: drain what is left, then stop.
                        None => {
                            for pending in queue.drain(..) {
                                tokio::time::sleep_until(pending.due).await;
                                if outgoing.send(pending.task).is_err() {
                                    break;
                                }
                            }
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(wake) => {}
            }

            let now = Instant::now();
            while queue.first().is_some_and(|p| p.due <= now) {
                let ready = queue.remove(0);
                if outgoing.send(ready.task).is_err() {
                    warn!("command output closed; dropping command");
                    stats.dropped_total += 1;
                } else {
                    stats.dispatched_total += 1;
                }
            }
        }
        if !queue.is_empty() {
            debug!("scheduler stopped with {} command(s) still queued", queue.len());
        }
        debug!("scheduler loop terminated");
    });

    handle
}
