use super::{
    policy::{sort_by_cost, Policy, PolicyKind},
    task::{Task, TaskId},
};
use std::collections::VecDeque;

/// Shortest-Job-First, non-preemptive.
///
/// Newly admitted tasks are sorted into the ready queue by cost, but an
/// arrival never interrupts the running task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SjfScheduler;

impl Policy for SjfScheduler {
    const KIND: PolicyKind = PolicyKind::Sjf;

    fn order(&self, ready: &mut VecDeque<TaskId>, tasks: &[Task], admitted: usize) {
        if admitted > 0 {
            sort_by_cost(ready, tasks);
        }
    }
}
