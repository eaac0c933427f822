use super::{display::DisplayTerminal, schedule::Schedule};
use std::{io, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerEvent {
    Quit,
    Pause,
    Resume,
    Step,
    Tick,
    None,
}

/// Position and pause state of a replay, independent of any terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayState {
    clock: u64,
    makespan: u64,
    paused: bool,
}

impl ReplayState {
    pub fn new(makespan: u64) -> Self {
        Self {
            clock: 0,
            makespan,
            paused: false,
        }
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.clock >= self.makespan
    }

    // Returns false if the replay should quit
    pub fn handle(&mut self, event: RunnerEvent) -> bool {
        match event {
            RunnerEvent::Quit => return false,
            RunnerEvent::Pause if !self.paused => self.paused = true,
            RunnerEvent::Resume if self.paused => self.paused = false,
            RunnerEvent::Step if self.paused => self.advance(),
            RunnerEvent::Tick if !self.paused => self.advance(),
            _ => {}
        }
        true
    }

    fn advance(&mut self) {
        if !self.is_finished() {
            self.clock += 1;
        }
    }
}

/// Replays a finished schedule one time unit per tick in the terminal.
pub struct ReplayRunner<'a> {
    terminal: DisplayTerminal,
    schedule: &'a Schedule,
    state: ReplayState,
}

impl<'a> ReplayRunner<'a> {
    pub fn new(schedule: &'a Schedule, tick_rate: Duration) -> io::Result<Self> {
        let terminal = DisplayTerminal::new(tick_rate)?;

        Ok(Self {
            terminal,
            schedule,
            state: ReplayState::new(schedule.makespan()),
        })
    }

    // Returns false if the program should quit
    pub fn run(&mut self) -> io::Result<bool> {
        self.terminal.draw(self.schedule, self.state.clock())?;
        Ok(self.state.handle(self.terminal.get_input()))
    }
}
