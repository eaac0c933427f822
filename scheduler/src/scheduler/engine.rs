use super::{
    error::{Result, SchedulerError},
    fifo::FifoScheduler,
    policy::{Policy, PolicyKind},
    round_robin::RoundRobinScheduler,
    schedule::{Run, Schedule},
    sjf::SjfScheduler,
    stcf::StcfScheduler,
    task::{Task, TaskId},
};
use std::collections::VecDeque;
use tracing::{debug, info, trace};

/// Runs `tasks` to completion under the policy selected by `kind`.
pub fn simulate(tasks: Vec<Task>, kind: PolicyKind) -> Result<Schedule> {
    match kind {
        PolicyKind::Fifo => Engine::new(FifoScheduler, tasks).map(Engine::run),
        PolicyKind::Sjf => Engine::new(SjfScheduler, tasks).map(Engine::run),
        PolicyKind::Stcf => Engine::new(StcfScheduler, tasks).map(Engine::run),
        PolicyKind::RoundRobin => Engine::new(RoundRobinScheduler, tasks).map(Engine::run),
    }
}

/// Discrete-time simulation of a single processor under policy `P`.
///
/// All state lives in the engine value and is consumed by [`Engine::run`], so
/// separate simulations never share anything.
pub struct Engine<P> {
    policy: P,
    tasks: Vec<Task>,
    originals: usize,
    // Originals ordered by arrival, submission order among equal arrivals.
    pending: Vec<TaskId>,
    next_arrival: usize,
    ready: VecDeque<TaskId>,
    running: Option<TaskId>,
    clock: u64,
    completed: usize,
    trace: Vec<Run>,
}

impl<P: Policy> Engine<P> {
    pub fn new(policy: P, tasks: Vec<Task>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(SchedulerError::NoTasks);
        }
        if let Some(task) = tasks
            .iter()
            .find(|task| task.is_slice() || task.first_run().is_some())
        {
            return Err(SchedulerError::invalid(
                task.name(),
                "task has already been scheduled",
            ));
        }

        let mut pending: Vec<TaskId> = (0..tasks.len()).map(TaskId).collect();
        pending.sort_by_key(|id| tasks[id.index()].arrival());

        Ok(Self {
            policy,
            originals: tasks.len(),
            tasks,
            pending,
            next_arrival: 0,
            ready: VecDeque::new(),
            running: None,
            clock: 0,
            completed: 0,
            trace: Vec::new(),
        })
    }

    /// Steps the clock until every original task has completed.
    pub fn run(mut self) -> Schedule {
        info!(
            policy = P::KIND.short_name(),
            task_count = self.originals,
            "starting simulation"
        );

        while self.completed < self.originals {
            self.step();
        }

        info!(
            policy = P::KIND.short_name(),
            makespan = self.clock,
            slices = self.tasks.len() - self.originals,
            "simulation finished"
        );

        Schedule::new(P::KIND, self.tasks, self.originals, self.clock, self.trace)
    }

    fn step(&mut self) {
        let admitted = self.admit_arrivals();
        self.policy.order(&mut self.ready, &self.tasks, admitted);

        if self.running.is_none() {
            self.dispatch_next();
        }
        let Some(mut current) = self.running else {
            // nothing runs before the next arrival
            let until = self
                .pending
                .get(self.next_arrival)
                .map_or(self.clock + 1, |id| self.tasks[id.index()].arrival());
            trace!(from = self.clock, until, "processor idle");
            self.record(None, until - self.clock);
            return;
        };

        if let Some(&head) = self.ready.front() {
            if self
                .policy
                .preempts(&self.tasks[current.index()], &self.tasks[head.index()])
            {
                self.preempt(current);
                current = match self.dispatch_next() {
                    Some(next) => next,
                    None => return,
                };
            }
        }

        self.record(Some(current), 1);

        let task = &mut self.tasks[current.index()];
        if task.work(self.clock) {
            debug!(task = task.name(), clock = self.clock, "task completed");
            self.completed += 1;
            self.running = None;
        } else if self.policy.quantum_expired(task) {
            self.preempt(current);
            self.dispatch_next();
        }
    }

    /// Appends `len` units of `task` to the trace and advances the clock.
    fn record(&mut self, task: Option<TaskId>, len: u64) {
        match self.trace.last_mut() {
            Some(run) if run.task == task && run.end() == self.clock => run.len += len,
            _ => self.trace.push(Run {
                start: self.clock,
                len,
                task,
            }),
        }
        self.clock += len;
    }

    /// Moves every original arriving at the current clock into the ready queue.
    fn admit_arrivals(&mut self) -> usize {
        let mut admitted = 0;
        while let Some(&id) = self.pending.get(self.next_arrival) {
            if self.tasks[id.index()].arrival() > self.clock {
                break;
            }
            self.ready.push_back(id);
            self.next_arrival += 1;
            admitted += 1;
        }
        admitted
    }

    /// Pops the head of the ready queue onto the processor.
    fn dispatch_next(&mut self) -> Option<TaskId> {
        let id = self.ready.pop_front()?;
        let task = &mut self.tasks[id.index()];
        task.dispatch(self.clock);
        debug!(task = task.name(), slice = %id, clock = self.clock, "dispatched");

        self.running = Some(id);
        Some(id)
    }

    /// Takes the processor away from `id`, queueing a continuation slice
    /// with its remaining work at the tail of the ready queue.
    fn preempt(&mut self, id: TaskId) {
        let slice_id = TaskId(self.tasks.len());
        let task = &mut self.tasks[id.index()];
        let origin = task.origin().unwrap_or(id);
        let slice = task.split(self.clock, origin, slice_id);
        debug!(
            task = task.name(),
            clock = self.clock,
            remaining = slice.cost(),
            "preempted"
        );

        self.tasks.push(slice);
        self.ready.push_back(slice_id);
        self.running = None;
    }
}
