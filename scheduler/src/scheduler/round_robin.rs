use super::{
    policy::{Policy, PolicyKind},
    task::Task,
};

/// Round-Robin with a quantum of one work unit.
///
/// The ready queue keeps arrival order; a task that is still unfinished
/// after its unit goes back to the tail as a continuation slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinScheduler;

impl RoundRobinScheduler {
    pub const QUANTUM: u64 = 1;
}

impl Policy for RoundRobinScheduler {
    const KIND: PolicyKind = PolicyKind::RoundRobin;

    fn quantum_expired(&self, running: &Task) -> bool {
        running.executed() >= Self::QUANTUM
    }
}
