//! Interval Scheduler
//!
//! Runs any number of recurring tasks from one driver task holding one
//! timer. The schedule is ordered by `(due, sequence)`, so two tasks that land
//! on the same instant are both kept. Firing pops the earliest entry, runs its
//! periodic hook, then reinserts it at `fire time + interval`; a task is absent
//! from the schedule while its hook runs, so its runs never overlap.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::state::BotContext;
use crate::utils::isolate::isolated;

/// A recurring background task (a "component").
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Delay between two runs of [`perform`](Self::perform).
    fn interval(&self) -> Duration;

    /// Startup hook, run once when the bot becomes operational.
    async fn activate(&self, _ctx: &BotContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Periodic hook, run once per interval.
    async fn perform(&self) -> anyhow::Result<()>;
}

type TaskRef = Arc<dyn ScheduledTask>;

/// Identity comparison; the vtable half of the fat pointer is ignored.
fn same_task(a: &TaskRef, b: &TaskRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Task whose periodic hook is currently running.
struct Running {
    task: TaskRef,
    unscheduled: bool,
}

#[derive(Default)]
struct Schedule {
    entries: BTreeMap<(Instant, u64), TaskRef>,
    next_seq: u64,
    running: Option<Running>,
}

impl Schedule {
    /// Insert `task` due at `due`; returns `true` if it became the earliest.
    fn insert(&mut self, due: Instant, task: TaskRef) -> bool {
        let key = (due, self.next_seq);
        self.next_seq += 1;
        self.entries.insert(key, task);
        self.entries.keys().next() == Some(&key)
    }

    fn next_due(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(due, _)| *due)
    }
}

struct Inner {
    schedule: Mutex<Schedule>,
    /// Wakes the driver so it re-reads the earliest due time.
    rearm: Notify,
}

/// Interval scheduler with a single background driver.
pub struct Scheduler {
    inner: Arc<Inner>,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Create the scheduler and spawn its driver.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let inner = Arc::new(Inner {
            schedule: Mutex::new(Schedule::default()),
            rearm: Notify::new(),
        });
        let cancel = CancellationToken::new();
        tokio::spawn(drive(Arc::clone(&inner), cancel.clone()));
        Self { inner, cancel }
    }

    /// Schedule `task` to first run one interval from now.
    ///
    /// Scheduling a task that is already scheduled adds a second entry.
    pub async fn schedule(&self, task: TaskRef) {
        let due = Instant::now() + task.interval();
        debug!(task = task.name(), interval_ms = task.interval().as_millis() as u64, "task scheduled");

        let earliest = self.inner.schedule.lock().await.insert(due, task);
        if earliest {
            self.inner.rearm.notify_one();
        }
    }

    /// Remove `task` from the schedule.
    ///
    /// A task whose periodic hook is running right now finishes that run and
    /// is not reinserted. Returns `false` if the task was not scheduled.
    pub async fn unschedule(&self, task: &TaskRef) -> bool {
        let mut schedule = self.inner.schedule.lock().await;

        let key = schedule
            .entries
            .iter()
            .find(|(_, scheduled)| same_task(scheduled, task))
            .map(|(key, _)| *key);
        let removed = key.and_then(|key| schedule.entries.remove(&key)).is_some();

        let stopped_running = match schedule.running.as_mut() {
            Some(running) if same_task(&running.task, task) => {
                running.unscheduled = true;
                true
            }
            _ => false,
        };

        if removed || stopped_running {
            debug!(task = task.name(), "task unscheduled");
        }
        removed || stopped_running
    }

    /// Run the startup hook of every scheduled task, earliest due first.
    ///
    /// A task in the middle of its periodic run is still scheduled; it was
    /// due before everything left in the schedule, so it goes first. Periodic
    /// hooks are not invoked. A failing hook is logged and does not stop the
    /// others.
    pub async fn activate(&self, ctx: &BotContext) {
        let tasks: Vec<TaskRef> = {
            let schedule = self.inner.schedule.lock().await;
            let running = schedule
                .running
                .as_ref()
                .filter(|running| !running.unscheduled)
                .map(|running| Arc::clone(&running.task));
            running
                .into_iter()
                .chain(schedule.entries.values().cloned())
                .collect()
        };

        info!(tasks = tasks.len(), "activating scheduled tasks");
        for task in tasks {
            if let Err(e) = isolated(task.activate(ctx)).await {
                error!(task = task.name(), error = %e, "task activation failed");
            }
        }
    }

    /// Number of tasks waiting in the schedule.
    pub async fn len(&self) -> usize {
        self.inner.schedule.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Earliest due time, if anything is scheduled.
    pub async fn next_due(&self) -> Option<Instant> {
        self.inner.schedule.lock().await.next_due()
    }

    /// Stop the driver. Scheduled tasks stay in place but never fire again.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The single timer: sleep until the earliest due time, fire, repeat.
async fn drive(inner: Arc<Inner>, cancel: CancellationToken) {
    loop {
        let next_due = inner.schedule.lock().await.next_due();
        let timer = async {
            match next_due {
                Some(due) => sleep_until(due).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("scheduler driver stopped");
                return;
            }
            _ = inner.rearm.notified() => continue,
            _ = timer => {}
        }

        fire_earliest(&inner).await;
    }
}

/// Run the earliest entry if it is due, then reinsert it.
async fn fire_earliest(inner: &Inner) {
    let task = {
        let mut schedule = inner.schedule.lock().await;
        // An early wake (or an unschedule) may have changed the minimum.
        match schedule.next_due() {
            Some(due) if due <= Instant::now() => {}
            _ => return,
        }
        let Some((_, task)) = schedule.entries.pop_first() else {
            return;
        };
        schedule.running = Some(Running {
            task: Arc::clone(&task),
            unscheduled: false,
        });
        task
    };

    let fired_at = Instant::now();
    debug!(task = task.name(), "task firing");
    if let Err(e) = isolated(task.perform()).await {
        error!(task = task.name(), error = %e, "scheduled task failed");
    }

    let mut schedule = inner.schedule.lock().await;
    let unscheduled = schedule.running.take().is_some_and(|running| running.unscheduled);
    if !unscheduled {
        schedule.insert(fired_at + task.interval(), task);
    }
}
