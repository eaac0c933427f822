use super::{policy::PolicyKind, workload::TaskSpec};
use std::time::Duration;

/// Columns drawn per time unit on the timeline.
pub const DEFAULT_SCALE: u16 = 6;

/// Time between two replayed units in the interactive view.
pub const DEFAULT_TICK_RATE: Duration = Duration::from_millis(500);

/// What to print once the simulation has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputMode {
    pub timeline: bool,
    pub stats: bool,
    pub json: bool,
    pub interactive: bool,
}

impl OutputMode {
    pub fn is_empty(&self) -> bool {
        !(self.timeline || self.stats || self.json || self.interactive)
    }
}

/// Everything one run of the simulator needs.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub policy: PolicyKind,
    pub workload: Vec<TaskSpec>,
    pub output: OutputMode,
    pub scale: u16,
    pub tick_rate: Duration,
}

impl SimConfig {
    /// Create a config for `policy` over `workload`.
    ///
    /// Prints the timeline and statistics unless another output is chosen.
    pub fn new(policy: PolicyKind, workload: Vec<TaskSpec>) -> Self {
        Self {
            policy,
            workload,
            output: OutputMode {
                timeline: true,
                stats: true,
                ..OutputMode::default()
            },
            scale: DEFAULT_SCALE,
            tick_rate: DEFAULT_TICK_RATE,
        }
    }

    /// Set the outputs. An empty selection keeps the defaults.
    pub fn with_output(mut self, output: OutputMode) -> Self {
        if !output.is_empty() {
            self.output = output;
        }
        self
    }

    /// Set timeline columns per time unit, at least one.
    pub fn with_scale(mut self, scale: u16) -> Self {
        self.scale = scale.max(1);
        self
    }

    /// Set replay speed.
    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }
}
