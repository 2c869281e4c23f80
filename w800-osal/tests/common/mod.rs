use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use w800_osal::{ObjectAllocation, Osal, OsalConfig};
use w800_osal_api::log::LogTarget;
use w800_osal_api::{
    Block, Kernel, KernelError, KernelResult, MemoryAllocator, Message, ObjectKind, OsType,
    Platform, Priority, TaskParams, Ticks, TimerCallback, Wait,
};

/// Control block size the mock kernel asks for, per object kind.
pub const CONTROL_BLOCK_SIZE: usize = 64;

/// What the mock kernel remembers about a created task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub name: String,
    pub priority: Priority,
    pub time_slice: Ticks,
    pub stack_words: usize,
    pub static_stack: bool,
    pub autorun: bool,
    pub deleted: bool,
}

/// What the mock kernel remembers about a created timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRecord {
    pub name: String,
    pub first: Ticks,
    pub round: Ticks,
    pub running: bool,
    pub in_control_block: bool,
}

#[derive(Default)]
struct State {
    next_id: u32,
    tasks: HashMap<u32, TaskRecord>,
    semaphores: HashMap<u32, (String, u32)>,
    queues: HashMap<u32, (usize, VecDeque<Message>)>,
    timers: HashMap<u32, (TimerRecord, TimerCallback)>,
    waits: Vec<Wait>,
    sleeps: Vec<Ticks>,
    calls: Vec<&'static str>,
    failing: HashSet<&'static str>,
}

impl State {
    fn call(&mut self, operation: &'static str) -> KernelResult<u32> {
        self.calls.push(operation);
        if self.failing.contains(operation) {
            return Err(KernelError::Internal);
        }
        self.next_id += 1;
        Ok(self.next_id)
    }
}

/// A kernel double that records every call and never blocks.
///
/// Task entries run synchronously inside `task_create`. Empty semaphores and queues time out immediately.
#[derive(Default)]
pub struct MockKernel {
    state: Mutex<State>,
    ticks: AtomicU32,
}

impl std::fmt::Debug for MockKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockKernel").finish_non_exhaustive()
    }
}

impl MockKernel {
    /// Makes every later call of `operation` fail with [`KernelError::Internal`].
    pub fn fail(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    /// Lets `operation` succeed again.
    pub fn heal(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.remove(operation);
    }

    pub fn set_ticks(&self, ticks: Ticks) {
        self.ticks.store(ticks, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn waits(&self) -> Vec<Wait> {
        self.state.lock().unwrap().waits.clone()
    }

    pub fn sleeps(&self) -> Vec<Ticks> {
        self.state.lock().unwrap().sleeps.clone()
    }

    pub fn task(&self, id: u32) -> TaskRecord {
        self.state.lock().unwrap().tasks[&id].clone()
    }

    pub fn semaphore_name(&self, id: u32) -> String {
        self.state.lock().unwrap().semaphores[&id].0.clone()
    }

    pub fn timer(&self, id: u32) -> TimerRecord {
        self.state.lock().unwrap().timers[&id].0.clone()
    }

    /// Runs the callback of a timer as if it expired.
    pub fn expire(&self, id: u32) {
        let state = self.state.lock().unwrap();
        (state.timers[&id].1)();
    }

    pub fn live_queues(&self) -> usize {
        self.state.lock().unwrap().queues.len()
    }

    fn check_block(control: &Block) -> KernelResult<()> {
        if control.len() < CONTROL_BLOCK_SIZE {
            return Err(KernelError::InvalidArgument);
        }
        Ok(())
    }

    fn new_timer(
        &self,
        operation: &'static str,
        name: &str,
        callback: TimerCallback,
        first: Ticks,
        round: Ticks,
        in_control_block: bool,
    ) -> KernelResult<u32> {
        let mut state = self.state.lock().unwrap();
        let id = state.call(operation)?;
        let record = TimerRecord {
            name: name.to_owned(),
            first,
            round,
            running: false,
            in_control_block,
        };
        state.timers.insert(id, (record, callback));
        Ok(id)
    }

    fn with_timer(
        &self,
        operation: &'static str,
        id: u32,
        f: impl FnOnce(&mut TimerRecord),
    ) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call(operation)?;
        let (record, _) = state
            .timers
            .get_mut(&id)
            .ok_or(KernelError::InvalidHandle)?;
        f(record);
        Ok(())
    }
}

impl Kernel for MockKernel {
    type Task = u32;
    type Semaphore = u32;
    type Queue = u32;
    type Timer = u32;

    fn os_type(&self) -> OsType {
        OsType::Rhino
    }

    fn control_block_size(&self, _kind: ObjectKind) -> usize {
        CONTROL_BLOCK_SIZE
    }

    fn task_create(&self, control: &mut Block, params: TaskParams<'_>) -> KernelResult<u32> {
        Self::check_block(control)?;
        let TaskParams {
            name,
            priority,
            time_slice,
            stack,
            stack_words,
            autorun,
            entry,
        } = params;

        let id = {
            let mut state = self.state.lock().unwrap();
            let id = state.call("task_create")?;
            state.tasks.insert(
                id,
                TaskRecord {
                    name: name.to_owned(),
                    priority,
                    time_slice,
                    stack_words,
                    static_stack: stack.is_some(),
                    autorun,
                    deleted: false,
                },
            );
            id
        };

        if autorun {
            entry();
        }
        Ok(id)
    }

    fn task_delete(&self, task: &u32) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call("task_delete")?;
        let record = state
            .tasks
            .get_mut(task)
            .filter(|record| !record.deleted)
            .ok_or(KernelError::InvalidHandle)?;
        record.deleted = true;
        Ok(())
    }

    fn semaphore_create(&self, name: &str, count: u32) -> KernelResult<u32> {
        let mut state = self.state.lock().unwrap();
        let id = state.call("semaphore_create")?;
        state.semaphores.insert(id, (name.to_owned(), count));
        Ok(id)
    }

    fn semaphore_init(&self, control: &mut Block, name: &str, count: u32) -> KernelResult<u32> {
        Self::check_block(control)?;
        let mut state = self.state.lock().unwrap();
        let id = state.call("semaphore_init")?;
        state.semaphores.insert(id, (name.to_owned(), count));
        Ok(id)
    }

    fn semaphore_delete(&self, semaphore: &u32) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call("semaphore_delete")?;
        state
            .semaphores
            .remove(semaphore)
            .map(drop)
            .ok_or(KernelError::InvalidHandle)
    }

    fn semaphore_take(&self, semaphore: &u32, wait: Wait) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call("semaphore_take")?;
        state.waits.push(wait);
        let (_, count) = state
            .semaphores
            .get_mut(semaphore)
            .ok_or(KernelError::InvalidHandle)?;
        if *count == 0 {
            return Err(KernelError::Timeout);
        }
        *count -= 1;
        Ok(())
    }

    fn semaphore_give(&self, semaphore: &u32) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call("semaphore_give")?;
        let (_, count) = state
            .semaphores
            .get_mut(semaphore)
            .ok_or(KernelError::InvalidHandle)?;
        *count += 1;
        Ok(())
    }

    fn queue_create(&self, _name: &str, capacity: usize) -> KernelResult<u32> {
        let mut state = self.state.lock().unwrap();
        let id = state.call("queue_create")?;
        state.queues.insert(id, (capacity, VecDeque::new()));
        Ok(id)
    }

    fn queue_init(
        &self,
        control: &mut Block,
        storage: &mut Block,
        _name: &str,
        capacity: usize,
    ) -> KernelResult<u32> {
        Self::check_block(control)?;
        if storage.len() < capacity * size_of::<usize>() {
            return Err(KernelError::InvalidArgument);
        }
        let mut state = self.state.lock().unwrap();
        let id = state.call("queue_init")?;
        state.queues.insert(id, (capacity, VecDeque::new()));
        Ok(id)
    }

    fn queue_delete(&self, queue: &u32) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call("queue_delete")?;
        state
            .queues
            .remove(queue)
            .map(drop)
            .ok_or(KernelError::InvalidHandle)
    }

    fn queue_send_back(&self, queue: &u32, message: Message) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call("queue_send_back")?;
        let (capacity, messages) = state
            .queues
            .get_mut(queue)
            .ok_or(KernelError::InvalidHandle)?;
        if messages.len() == *capacity {
            return Err(KernelError::QueueFull);
        }
        messages.push_back(message);
        Ok(())
    }

    fn queue_receive(&self, queue: &u32, wait: Wait) -> KernelResult<Message> {
        let mut state = self.state.lock().unwrap();
        state.call("queue_receive")?;
        state.waits.push(wait);
        let (_, messages) = state
            .queues
            .get_mut(queue)
            .ok_or(KernelError::InvalidHandle)?;
        messages.pop_front().ok_or(KernelError::Timeout)
    }

    fn queue_flush(&self, queue: &u32) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call("queue_flush")?;
        let (_, messages) = state
            .queues
            .get_mut(queue)
            .ok_or(KernelError::InvalidHandle)?;
        messages.clear();
        Ok(())
    }

    fn timer_create(
        &self,
        name: &str,
        callback: TimerCallback,
        first: Ticks,
        round: Ticks,
    ) -> KernelResult<u32> {
        self.new_timer("timer_create", name, callback, first, round, false)
    }

    fn timer_init(
        &self,
        control: &mut Block,
        name: &str,
        callback: TimerCallback,
        first: Ticks,
        round: Ticks,
    ) -> KernelResult<u32> {
        Self::check_block(control)?;
        self.new_timer("timer_init", name, callback, first, round, true)
    }

    fn timer_start(&self, timer: &u32) -> KernelResult<()> {
        self.with_timer("timer_start", *timer, |record| record.running = true)
    }

    fn timer_stop(&self, timer: &u32) -> KernelResult<()> {
        self.with_timer("timer_stop", *timer, |record| record.running = false)
    }

    fn timer_change(&self, timer: &u32, first: Ticks, round: Ticks) -> KernelResult<()> {
        self.with_timer("timer_change", *timer, |record| {
            record.first = first;
            record.round = round;
        })
    }

    fn timer_round(&self, timer: &u32) -> Ticks {
        let state = self.state.lock().unwrap();
        state
            .timers
            .get(timer)
            .map_or(0, |(record, _)| record.round)
    }

    fn timer_delete(&self, timer: &u32) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call("timer_delete")?;
        state
            .timers
            .remove(timer)
            .map(drop)
            .ok_or(KernelError::InvalidHandle)
    }

    fn tick_count(&self) -> Ticks {
        self.ticks.load(Ordering::SeqCst)
    }

    fn sleep(&self, ticks: Ticks) -> KernelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.call("sleep")?;
        state.sleeps.push(ticks);
        Ok(())
    }
}

/// Diagnostics printed through the mock platform's log target.
pub static DIAGNOSTICS: Mutex<String> = Mutex::new(String::new());

#[derive(Debug)]
pub struct CapturingLog;

impl LogTarget for CapturingLog {
    fn init() {}

    fn println(args: std::fmt::Arguments<'_>) {
        let _ = writeln!(DIAGNOSTICS.lock().unwrap(), "{args}");
    }
}

/// A platform whose interrupt flag is plain state and whose halt panics.
#[derive(Debug)]
pub struct MockPlatform {
    pub interrupts_enabled: AtomicBool,
    pub disables: AtomicU32,
    pub enables: AtomicU32,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            interrupts_enabled: AtomicBool::new(true),
            disables: AtomicU32::new(0),
            enables: AtomicU32::new(0),
        }
    }
}

impl Platform for MockPlatform {
    type Log = CapturingLog;

    fn disable_interrupts(&self) {
        self.interrupts_enabled.store(false, Ordering::SeqCst);
        self.disables.fetch_add(1, Ordering::SeqCst);
    }

    fn enable_interrupts(&self) {
        self.interrupts_enabled.store(true, Ordering::SeqCst);
        self.enables.fetch_add(1, Ordering::SeqCst);
    }

    fn halt(&self) -> ! {
        panic!("platform halted");
    }
}

/// An allocator that counts live blocks and can be told to fail.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    live: AtomicUsize,
    total: AtomicUsize,
    fail_at: Mutex<Option<usize>>,
}

impl CountingAllocator {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Makes the `nth` allocation from now on (counting from 1) fail.
    pub fn fail_at(&self, nth: usize) {
        *self.fail_at.lock().unwrap() = Some(self.total() + nth);
    }
}

impl MemoryAllocator for CountingAllocator {
    fn allocate(&self, size: usize) -> Option<Block> {
        let attempt = self.total.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_at.lock().unwrap() == Some(attempt) {
            return None;
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Some(Block::zeroed(size))
    }

    fn release(&self, _block: Block) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

pub type MockOsal = Osal<MockKernel, MockPlatform>;

/// Builds an adapter over fresh doubles with the given allocation mode.
pub fn osal(allocation: ObjectAllocation) -> (MockOsal, Arc<CountingAllocator>) {
    let allocator = Arc::new(CountingAllocator::default());
    let config = OsalConfig {
        object_allocation: allocation,
        ..OsalConfig::default()
    };
    let osal = Osal::new(
        MockKernel::default(),
        MockPlatform::default(),
        allocator.clone(),
        config,
    )
    .unwrap();
    (osal, allocator)
}
