use super::{
    policy::PolicyKind,
    task::{Task, TaskId},
};
use serde::Serialize;

/// A stretch of consecutive time units with the same occupant, `None` when
/// the processor was idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Run {
    pub start: u64,
    pub len: u64,
    pub task: Option<TaskId>,
}

impl Run {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    /// Units of this run that fall before `clock`.
    fn units_before(&self, clock: u64) -> u64 {
        self.end().min(clock).saturating_sub(self.start)
    }
}

/// The outcome of a simulation: every original task and every continuation
/// slice with its timing fields filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    policy: PolicyKind,
    tasks: Vec<Task>,
    originals: usize,
    makespan: u64,
    trace: Vec<Run>,
}

impl Schedule {
    pub(crate) fn new(
        policy: PolicyKind,
        tasks: Vec<Task>,
        originals: usize,
        makespan: u64,
        trace: Vec<Run>,
    ) -> Self {
        Self {
            policy,
            tasks,
            originals,
            makespan,
            trace,
        }
    }

    pub fn policy(&self) -> PolicyKind {
        self.policy
    }

    /// Clock value when the last task completed.
    pub fn makespan(&self) -> u64 {
        self.makespan
    }

    /// All tasks: originals in submission order, then slices in creation order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.index()]
    }

    pub fn originals(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks[..self.originals]
            .iter()
            .enumerate()
            .map(|(index, task)| (TaskId(index), task))
    }

    pub fn original_count(&self) -> usize {
        self.originals
    }

    /// Number of continuation slices created by preemption.
    pub fn slice_count(&self) -> usize {
        self.tasks.len() - self.originals
    }

    /// Who occupied the processor, as consecutive runs covering `0..makespan`.
    pub fn trace(&self) -> &[Run] {
        &self.trace
    }

    /// The task on the processor during time unit `clock`, `None` when idle
    /// or past the makespan.
    pub fn running_at(&self, clock: u64) -> Option<TaskId> {
        let index = self.trace.partition_point(|run| run.end() <= clock);
        self.trace
            .get(index)
            .filter(|run| run.start <= clock)
            .and_then(|run| run.task)
    }

    /// The original task `id` belongs to.
    pub fn origin_of(&self, id: TaskId) -> TaskId {
        self.task(id).origin().unwrap_or(id)
    }

    /// Walks the continuation chain starting at `id`.
    pub fn chain(&self, id: TaskId) -> Chain<'_> {
        Chain {
            schedule: self,
            next: Some(id),
        }
    }

    /// The slice that finished the work started by `id`.
    pub fn last_slice(&self, id: TaskId) -> &Task {
        let mut last = self.task(id);
        while let Some(next) = last.continuation() {
            last = self.task(next);
        }
        last
    }

    pub fn is_sliced(&self, id: TaskId) -> bool {
        self.task(id).continuation().is_some()
    }

    /// Time the work of `id` spent in the system, up to its last slice.
    pub fn turnaround(&self, id: TaskId) -> Option<u64> {
        let arrival = self.task(id).arrival();
        self.last_slice(id)
            .completion()
            .map(|completion| completion - arrival)
    }

    /// Time the work of `id` waited before it first ran.
    pub fn response(&self, id: TaskId) -> Option<u64> {
        self.task(id).response_time()
    }

    /// Every task that ran, ordered by the time it first ran.
    pub fn segments(&self) -> Vec<(TaskId, &Task)> {
        let mut segments: Vec<_> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.executed() > 0)
            .map(|(index, task)| (TaskId(index), task))
            .collect();
        segments.sort_by_key(|(_, task)| task.first_run());
        segments
    }

    /// Units of work done by the chain of `origin` before time `clock`.
    pub fn executed_before(&self, origin: TaskId, clock: u64) -> u64 {
        self.trace
            .iter()
            .take_while(|run| run.start < clock)
            .filter(|run| run.task.map(|id| self.origin_of(id)) == Some(origin))
            .map(|run| run.units_before(clock))
            .sum()
    }
}

/// Iterator over a continuation chain, see [`Schedule::chain`].
pub struct Chain<'a> {
    schedule: &'a Schedule,
    next: Option<TaskId>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<Self::Item> {
        let task = self.schedule.task(self.next?);
        self.next = task.continuation();
        Some(task)
    }
}
