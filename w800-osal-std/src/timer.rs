//! Software timers served by one timer-service thread.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use w800_osal_api::{KernelError, KernelResult, Ticks, TimerCallback};

use crate::clock::Clock;
use crate::sync::lock;

/// Name of the timer-service thread; timer callbacks run there.
pub const TIMER_THREAD_NAME: &str = "timer service";

type SharedCallback = Arc<dyn Fn() + Send + Sync>;

struct TimerEntry {
    first: Ticks,
    round: Ticks,
    deadline: Option<Instant>,
    callback: SharedCallback,
}

#[derive(Default)]
struct TimerTable {
    timers: HashMap<u32, TimerEntry>,
    shutdown: bool,
}

/// The timer table and the thread that fires its entries.
pub(crate) struct TimerService {
    table: Mutex<TimerTable>,
    changed: Condvar,
    thread: Mutex<Option<JoinHandle<()>>>,
    clock: Clock,
}

/// Handle of a host timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdTimer {
    id: u32,
    name: String,
}

impl StdTimer {
    /// Returns the kernel object id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the name the timer was created with.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TimerService {
    pub(crate) fn new(clock: Clock) -> Arc<Self> {
        Arc::new(Self {
            table: Mutex::new(TimerTable::default()),
            changed: Condvar::new(),
            thread: Mutex::new(None),
            clock,
        })
    }

    /// Spawns the service thread on first use.
    fn ensure_running(self: &Arc<Self>) -> KernelResult<()> {
        let mut thread = lock(&self.thread);
        if thread.is_some() {
            return Ok(());
        }

        let service = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(TIMER_THREAD_NAME.to_owned())
            .spawn(move || service.run())
            .map_err(|error| {
                tracing::debug!(%error, "failed to spawn timer service");
                KernelError::NoMemory
            })?;
        *thread = Some(handle);
        Ok(())
    }

    pub(crate) fn create(
        self: &Arc<Self>,
        id: u32,
        name: &str,
        callback: TimerCallback,
        first: Ticks,
        round: Ticks,
    ) -> KernelResult<StdTimer> {
        self.ensure_running()?;

        lock(&self.table).timers.insert(
            id,
            TimerEntry {
                first,
                round,
                deadline: None,
                callback: Arc::from(callback),
            },
        );

        Ok(StdTimer {
            id,
            name: name.to_owned(),
        })
    }

    fn with_entry<R>(
        &self,
        timer: &StdTimer,
        f: impl FnOnce(&mut TimerEntry) -> R,
    ) -> KernelResult<R> {
        let mut table = lock(&self.table);
        let entry = table
            .timers
            .get_mut(&timer.id)
            .ok_or(KernelError::InvalidHandle)?;
        let result = f(entry);
        self.changed.notify_all();
        Ok(result)
    }

    pub(crate) fn start(&self, timer: &StdTimer) -> KernelResult<()> {
        self.with_entry(timer, |entry| {
            entry.deadline = Some(self.clock.deadline(entry.first));
        })
    }

    pub(crate) fn stop(&self, timer: &StdTimer) -> KernelResult<()> {
        self.with_entry(timer, |entry| entry.deadline = None)
    }

    pub(crate) fn change(&self, timer: &StdTimer, first: Ticks, round: Ticks) -> KernelResult<()> {
        self.with_entry(timer, |entry| {
            entry.first = first;
            entry.round = round;
        })
    }

    pub(crate) fn round(&self, timer: &StdTimer) -> Ticks {
        self.with_entry(timer, |entry| entry.round).unwrap_or(0)
    }

    pub(crate) fn delete(&self, timer: &StdTimer) -> KernelResult<()> {
        let mut table = lock(&self.table);
        table
            .timers
            .remove(&timer.id)
            .ok_or(KernelError::InvalidHandle)?;
        self.changed.notify_all();
        Ok(())
    }

    /// Stops the service thread and waits for it, unless called from a timer callback.
    pub(crate) fn shutdown(&self) {
        lock(&self.table).shutdown = true;
        self.changed.notify_all();

        if let Some(handle) = lock(&self.thread).take()
            && handle.thread().id() != thread::current().id()
        {
            let _ = handle.join();
        }
    }

    fn run(&self) {
        let mut table = lock(&self.table);
        loop {
            if table.shutdown {
                return;
            }

            let next = table
                .timers
                .iter()
                .filter_map(|(id, entry)| entry.deadline.map(|deadline| (*id, deadline)))
                .min_by_key(|(_, deadline)| *deadline);

            let now = Instant::now();
            table = match next {
                None => self
                    .changed
                    .wait(table)
                    .unwrap_or_else(PoisonError::into_inner),
                Some((_, deadline)) if deadline > now => {
                    self.changed
                        .wait_timeout(table, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                Some((id, deadline)) => {
                    let Some(entry) = table.timers.get_mut(&id) else {
                        continue;
                    };
                    entry.deadline = (entry.round != 0)
                        .then(|| deadline + self.clock.duration(entry.round));
                    let callback = Arc::clone(&entry.callback);
                    drop(table);

                    if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                        tracing::error!(id, "timer callback panicked");
                    }

                    lock(&self.table)
                }
            };
        }
    }
}
