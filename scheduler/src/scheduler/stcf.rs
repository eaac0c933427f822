use super::{
    policy::{sort_by_cost, Policy, PolicyKind},
    task::{Task, TaskId},
};
use std::collections::VecDeque;

/// Shortest-Time-to-Completion-First.
///
/// The ready queue is kept sorted by cost every unit. Queued entries have not
/// run yet, so their cost is their remaining work. The running task is
/// preempted only by a strictly shorter head; ties keep the running task.
#[derive(Debug, Clone, Copy, Default)]
pub struct StcfScheduler;

impl Policy for StcfScheduler {
    const KIND: PolicyKind = PolicyKind::Stcf;

    fn order(&self, ready: &mut VecDeque<TaskId>, tasks: &[Task], _admitted: usize) {
        sort_by_cost(ready, tasks);
    }

    fn preempts(&self, running: &Task, head: &Task) -> bool {
        head.cost() < running.remaining()
    }
}
