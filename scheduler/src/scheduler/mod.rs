mod config;
mod display;
mod engine;
mod error;
mod fifo;
mod policy;
mod round_robin;
mod runner;
mod schedule;
mod sjf;
mod stats;
mod stcf;
mod task;
pub mod workload;

pub use config::{OutputMode, SimConfig, DEFAULT_SCALE, DEFAULT_TICK_RATE};
pub use display::{
    color_of, draw_replay, render_timeline, write_buffer, write_timeline, TaskState, Timeline,
    MAX_TIMELINE_CHUNKS, PALETTE, TIMELINE_WIDTH,
};
pub use engine::{simulate, Engine};
pub use error::{Result, SchedulerError};
pub use fifo::FifoScheduler;
pub use policy::{Policy, PolicyKind};
pub use round_robin::RoundRobinScheduler;
pub use runner::{ReplayRunner, ReplayState, RunnerEvent};
pub use schedule::{Chain, Run, Schedule};
pub use sjf::SjfScheduler;
pub use stats::{Statistics, TaskStats};
pub use stcf::StcfScheduler;
pub use task::{Task, TaskId};
pub use workload::TaskSpec;
