use super::policy::{Policy, PolicyKind};

/// First-In-First-Out: the ready queue keeps arrival order, and a dispatched
/// task runs to completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoScheduler;

impl Policy for FifoScheduler {
    const KIND: PolicyKind = PolicyKind::Fifo;
}
