use super::{
    error::SchedulerError,
    task::{Task, TaskId},
};
use serde::Serialize;
use std::{collections::VecDeque, fmt, str::FromStr};

/// The selection and preemption rules plugged into the [`Engine`](super::Engine).
///
/// The engine owns the stepping loop; a policy only decides how the ready
/// queue is ordered and when the running task gives up the processor.
pub trait Policy {
    const KIND: PolicyKind;

    /// Orders the ready queue at the start of a time unit, after `admitted`
    /// new arrivals have been appended to its tail.
    fn order(&self, _ready: &mut VecDeque<TaskId>, _tasks: &[Task], _admitted: usize) {}

    /// Checked before the unit of work is accounted: should `head` take the
    /// processor away from `running`?
    fn preempts(&self, _running: &Task, _head: &Task) -> bool {
        false
    }

    /// Checked after the unit of work is accounted, if `running` is not done.
    fn quantum_expired(&self, _running: &Task) -> bool {
        false
    }
}

/// Stable reorder of the ready queue by ascending cost.
pub(crate) fn sort_by_cost(ready: &mut VecDeque<TaskId>, tasks: &[Task]) {
    ready
        .make_contiguous()
        .sort_by_key(|id| tasks[id.index()].cost());
}

/// Selector for one of the four supported policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Fifo,
    Sjf,
    Stcf,
    RoundRobin,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Fifo,
        PolicyKind::Sjf,
        PolicyKind::Stcf,
        PolicyKind::RoundRobin,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            PolicyKind::Fifo => "FIFO",
            PolicyKind::Sjf => "SJF",
            PolicyKind::Stcf => "STCF",
            PolicyKind::RoundRobin => "RR",
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            PolicyKind::Fifo => "FIFO (First In First Out)",
            PolicyKind::Sjf => "SJF (Shortest Job First)",
            PolicyKind::Stcf => "STCF (Shortest Time to Completion First)",
            PolicyKind::RoundRobin => "RR (Round Robin)",
        }
    }

    /// Whether the policy can take the processor away from an unfinished task.
    pub fn is_preemptive(self) -> bool {
        matches!(self, PolicyKind::Stcf | PolicyKind::RoundRobin)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name())
    }
}

impl FromStr for PolicyKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "fifo" | "fcfs" | "first-in-first-out" => Ok(PolicyKind::Fifo),
            "sjf" | "shortest-job-first" => Ok(PolicyKind::Sjf),
            "stcf" | "srtf" | "shortest-time-to-completion-first" => Ok(PolicyKind::Stcf),
            "rr" | "round-robin" | "roundrobin" => Ok(PolicyKind::RoundRobin),
            _ => Err(SchedulerError::UnknownPolicy(s.to_owned())),
        }
    }
}
