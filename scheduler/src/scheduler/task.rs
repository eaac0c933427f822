use super::error::{Result, SchedulerError};
use serde::Serialize;
use std::fmt;

/// Index of a task inside a [`Schedule`](super::Schedule).
///
/// Original tasks occupy the first indices in submission order, continuation
/// slices follow in the order they were created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub usize);

impl TaskId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit of work, or a slice of one created by preemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    name: String,
    cost: u64,
    arrival: u64,
    first_run: Option<u64>,
    executed: u64,
    completion: Option<u64>,
    continuation: Option<TaskId>,
    origin: Option<TaskId>,
}

impl Task {
    /// Creates a task needing `cost` units of work that becomes eligible at `arrival`.
    ///
    /// Fails with [`SchedulerError::InvalidInput`] when `cost <= 0` or
    /// `arrival < 0`.
    pub fn new(name: &str, cost: i64, arrival: i64) -> Result<Self> {
        if cost <= 0 {
            return Err(SchedulerError::invalid(
                name,
                format!("cost must be positive, got {cost}"),
            ));
        }
        if arrival < 0 {
            return Err(SchedulerError::invalid(
                name,
                format!("arrival time must not be negative, got {arrival}"),
            ));
        }

        Ok(Self {
            name: name.to_owned(),
            cost: cost as u64,
            arrival: arrival as u64,
            first_run: None,
            executed: 0,
            completion: None,
            continuation: None,
            origin: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Work units needed. For a slice this is the work left when it was split off.
    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn arrival(&self) -> u64 {
        self.arrival
    }

    pub fn first_run(&self) -> Option<u64> {
        self.first_run
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Time at which this task stopped occupying the processor.
    ///
    /// For a task that was preempted this is the end of its slice, the work
    /// itself completes in the last task of its continuation chain.
    pub fn completion(&self) -> Option<u64> {
        self.completion
    }

    pub fn continuation(&self) -> Option<TaskId> {
        self.continuation
    }

    /// The original task this slice was split from, `None` for originals.
    pub fn origin(&self) -> Option<TaskId> {
        self.origin
    }

    pub fn is_slice(&self) -> bool {
        self.origin.is_some()
    }

    pub fn remaining(&self) -> u64 {
        self.cost - self.executed
    }

    pub fn is_done(&self) -> bool {
        self.executed == self.cost
    }

    /// `completion - arrival`, once the task has stopped running.
    pub fn turnaround_time(&self) -> Option<u64> {
        self.completion.map(|completion| completion - self.arrival)
    }

    /// `first_run - arrival`, once the task has been dispatched.
    pub fn response_time(&self) -> Option<u64> {
        self.first_run.map(|first_run| first_run - self.arrival)
    }

    /// Records the first dispatch. Later dispatches leave the value alone.
    pub(crate) fn dispatch(&mut self, clock: u64) {
        self.first_run.get_or_insert(clock);
    }

    /// Accounts one unit of work; returns true when the task just completed.
    pub(crate) fn work(&mut self, clock: u64) -> bool {
        debug_assert!(self.executed < self.cost, "task worked past its cost");
        self.executed += 1;
        if self.is_done() {
            self.completion = Some(clock);
        }
        self.is_done()
    }

    /// Ends this task's occupancy at `clock` and returns the slice that
    /// carries the remaining work.
    ///
    /// The slice keeps the parent's name and arrival time so metrics for the
    /// chain stay relative to when the work first arrived.
    pub(crate) fn split(&mut self, clock: u64, origin: TaskId, slice_id: TaskId) -> Task {
        debug_assert!(!self.is_done(), "cannot split a finished task");
        self.completion = Some(clock);
        self.continuation = Some(slice_id);

        Task {
            name: self.name.clone(),
            cost: self.remaining(),
            arrival: self.arrival,
            first_run: None,
            executed: 0,
            completion: None,
            continuation: None,
            origin: Some(origin),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (cost {}, arrival {}, executed {})",
            self.name, self.cost, self.arrival, self.executed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_untouched() {
        let task = Task::new("A", 3, 1).unwrap();
        assert_eq!(task.name(), "A");
        assert_eq!(task.cost(), 3);
        assert_eq!(task.arrival(), 1);
        assert_eq!(task.executed(), 0);
        assert_eq!(task.first_run(), None);
        assert_eq!(task.completion(), None);
        assert_eq!(task.continuation(), None);
        assert!(!task.is_slice());
    }

    #[test]
    fn rejects_non_positive_cost() {
        for cost in [0, -4] {
            let err = Task::new("A", cost, 0).unwrap_err();
            assert!(matches!(err, SchedulerError::InvalidInput { ref name, .. } if name == "A"));
        }
    }

    #[test]
    fn rejects_negative_arrival() {
        let err = Task::new("B", 1, -1).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidInput { .. }));
    }

    #[test]
    fn metrics_are_unset_until_recorded() {
        let mut task = Task::new("A", 2, 1).unwrap();
        assert_eq!(task.response_time(), None);
        assert_eq!(task.turnaround_time(), None);

        task.dispatch(3);
        assert_eq!(task.response_time(), Some(2));
        assert!(!task.work(4));
        assert!(task.work(5));
        assert_eq!(task.turnaround_time(), Some(4));
    }

    #[test]
    fn dispatch_only_records_first_run() {
        let mut task = Task::new("A", 2, 0).unwrap();
        task.dispatch(1);
        task.dispatch(7);
        assert_eq!(task.first_run(), Some(1));
    }

    #[test]
    fn split_carries_remaining_work() {
        let mut task = Task::new("A", 4, 2).unwrap();
        task.dispatch(2);
        task.work(3);

        let slice = task.split(3, TaskId(0), TaskId(5));
        assert_eq!(task.completion(), Some(3));
        assert_eq!(task.continuation(), Some(TaskId(5)));
        assert_eq!(slice.name(), "A");
        assert_eq!(slice.cost(), 3);
        assert_eq!(slice.arrival(), 2);
        assert_eq!(slice.origin(), Some(TaskId(0)));
        assert_eq!(slice.executed(), 0);
        assert_eq!(slice.first_run(), None);
    }
}
