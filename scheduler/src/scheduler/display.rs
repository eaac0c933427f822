use super::{
    runner::RunnerEvent,
    schedule::Schedule,
    task::TaskId,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    queue,
    style::{self, Print, ResetColor, SetForegroundColor},
};
use std::{
    io::{self, Stdout, Write},
    sync::mpsc::{self, Receiver},
    thread,
    time::{Duration, Instant},
};
use tui::{
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};

/// Colors handed out to original tasks in submission order; slices inherit
/// the color of their original.
pub const PALETTE: [Color; 6] = [
    Color::Red,
    Color::Blue,
    Color::Green,
    Color::Magenta,
    Color::Cyan,
    Color::LightRed,
];

const TIMELINE_HEIGHT: u16 = 5;
/// Columns per timeline chunk; longer timelines wrap into stacked chunks.
pub const TIMELINE_WIDTH: u16 = 120;
/// Chunks drawn before the timeline is cut off.
pub const MAX_TIMELINE_CHUNKS: usize = 64;

const FILL: char = '░';
const BAR: char = '┃';
const DASH: char = '—';

pub fn color_of(schedule: &Schedule, id: TaskId) -> Color {
    PALETTE[schedule.origin_of(id).index() % PALETTE.len()]
}

/// A rendered timeline, split into buffers of at most [`TIMELINE_WIDTH`]
/// columns.
#[derive(Debug, Clone)]
pub struct Timeline {
    chunks: Vec<Buffer>,
    truncated_at: Option<u64>,
}

impl Timeline {
    fn new(columns: u64, scale: u64) -> Self {
        let width = u64::from(TIMELINE_WIDTH);
        let limit = columns.min(width * MAX_TIMELINE_CHUNKS as u64);

        let mut chunks = Vec::new();
        let mut offset = 0;
        while offset < limit {
            let chunk_width = u16::try_from((limit - offset).min(width)).unwrap_or(TIMELINE_WIDTH);
            chunks.push(Buffer::empty(Rect::new(0, 0, chunk_width, TIMELINE_HEIGHT)));
            offset += width;
        }

        Self {
            chunks,
            truncated_at: (limit < columns).then(|| limit / scale),
        }
    }

    pub fn chunks(&self) -> &[Buffer] {
        &self.chunks
    }

    /// The time unit where drawing stopped, if the timeline did not fit.
    pub fn truncated_at(&self) -> Option<u64> {
        self.truncated_at
    }

    /// Number of columns actually drawn.
    fn drawn(&self) -> u64 {
        self.chunks.iter().map(|buf| u64::from(buf.area.width)).sum()
    }

    fn chunk_of(&self, column: u64) -> usize {
        (column / u64::from(TIMELINE_WIDTH)) as usize
    }

    /// Sets the cell at global `column`, ignoring columns past the drawn area.
    fn put(&mut self, column: u64, y: u16, symbol: char, style: Style) {
        let index = self.chunk_of(column);
        let x = (column % u64::from(TIMELINE_WIDTH)) as u16;
        if let Some(buf) = self.chunks.get_mut(index) {
            if x < buf.area.width {
                buf.get_mut(x, y).set_char(symbol).set_style(style);
            }
        }
    }
}

/// Glyph `k` of a band label: `▏name▕` centered in `inner` cells of fill, or
/// the name cut to fit when the band is too narrow.
fn label_glyph(name: &[char], inner: u64, k: u64) -> char {
    let len = name.len() as u64;
    if len + 2 > inner {
        return name.get(k as usize).copied().unwrap_or(FILL);
    }

    let left = (inner - len - 2) / 2;
    match k {
        k if k == left => '▏',
        k if k == left + len + 1 => '▕',
        k if k > left && k <= left + len => name[(k - left - 1) as usize],
        _ => FILL,
    }
}

/// Draws every executed slice as a colored band over a time axis.
///
/// Bands sit at `first_run * scale` and are `executed * scale` columns wide,
/// so idle units show up as gaps. The drawing wraps every [`TIMELINE_WIDTH`]
/// columns and stops after [`MAX_TIMELINE_CHUNKS`] chunks.
pub fn render_timeline(schedule: &Schedule, scale: u16) -> Timeline {
    let scale = u64::from(scale.max(1));
    let makespan = schedule.makespan();
    let axis_end = makespan.saturating_mul(scale);
    let mut timeline = Timeline::new(axis_end.saturating_add(4), scale);
    let drawn = timeline.drawn();

    for (id, task) in schedule.segments() {
        let Some(first_run) = task.first_run() else {
            continue;
        };
        let start = first_run.saturating_mul(scale);
        if start >= drawn {
            continue;
        }
        let style = Style::default().fg(color_of(schedule, id));
        let inner = task.executed().saturating_mul(scale).saturating_sub(1);
        let end = start.saturating_add(inner).saturating_add(1);
        let name: Vec<char> = task.name().chars().collect();

        for column in start..=end.min(drawn - 1) {
            let k = column - start;
            let (band, label) = if column == start || column == end {
                (BAR, BAR)
            } else {
                (FILL, label_glyph(&name, inner, k - 1))
            };
            timeline.put(column, 0, band, style);
            timeline.put(column, 1, label, style);
            timeline.put(column, 2, band, style);
        }
    }

    for column in 0..drawn {
        let mark = if column > axis_end {
            if column == axis_end + 3 {
                '>'
            } else {
                DASH
            }
        } else if column % scale != 0 {
            DASH
        } else if (column / scale) % 2 == 0 {
            '+'
        } else {
            ':'
        };
        timeline.put(column, 3, mark, Style::default());
    }

    // numbers stay inside the chunk their first digit lands in
    for unit in (0..=makespan).step_by(2) {
        let column = unit * scale;
        if column >= drawn {
            break;
        }
        let chunk = timeline.chunk_of(column);
        for (offset, digit) in unit.to_string().chars().enumerate() {
            let at = column + offset as u64;
            if timeline.chunk_of(at) != chunk {
                break;
            }
            timeline.put(at, 4, digit, Style::default());
        }
    }

    timeline
}

fn to_crossterm(color: Color) -> style::Color {
    match color {
        Color::Red => style::Color::DarkRed,
        Color::Green => style::Color::DarkGreen,
        Color::Blue => style::Color::DarkBlue,
        Color::Magenta => style::Color::DarkMagenta,
        Color::Cyan => style::Color::DarkCyan,
        Color::LightRed => style::Color::Red,
        _ => style::Color::Reset,
    }
}

/// Writes a rendered buffer line by line with its colors.
pub fn write_buffer<W: Write>(out: &mut W, buf: &Buffer) -> io::Result<()> {
    let area = buf.area;
    for y in area.top()..area.bottom() {
        let last = (area.left()..area.right())
            .rev()
            .find(|&x| buf.get(x, y).symbol != " ")
            .map_or(area.left(), |x| x + 1);

        let mut color = None;
        for x in area.left()..last {
            let cell = buf.get(x, y);
            if color != Some(cell.fg) {
                queue!(out, SetForegroundColor(to_crossterm(cell.fg)))?;
                color = Some(cell.fg);
            }
            queue!(out, Print(&cell.symbol))?;
        }
        queue!(out, ResetColor, Print("\n"))?;
    }
    out.flush()
}

/// Writes every chunk of `timeline`, separated by blank lines, followed by a
/// note when it was cut off.
pub fn write_timeline<W: Write>(out: &mut W, timeline: &Timeline) -> io::Result<()> {
    for (index, chunk) in timeline.chunks().iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        write_buffer(out, chunk)?;
    }
    if let Some(unit) = timeline.truncated_at() {
        writeln!(out, "… timeline truncated at t={unit}, use --json for the full schedule")?;
    }
    out.flush()
}

/// Where an original task stands at a given time unit of the replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Waiting,
    Ready,
    Running,
    Done,
}

impl TaskState {
    pub fn at(schedule: &Schedule, id: TaskId, clock: u64) -> Self {
        let task = schedule.task(id);
        let running = schedule
            .running_at(clock)
            .map(|unit| schedule.origin_of(unit));

        if running == Some(id) {
            TaskState::Running
        } else if schedule
            .last_slice(id)
            .completion()
            .map_or(false, |completion| completion <= clock)
        {
            TaskState::Done
        } else if task.arrival() > clock {
            TaskState::Waiting
        } else {
            TaskState::Ready
        }
    }

    fn label(self) -> &'static str {
        match self {
            TaskState::Waiting => "waiting",
            TaskState::Ready => "ready",
            TaskState::Running => "running",
            TaskState::Done => "done",
        }
    }
}

fn current_line(schedule: &Schedule, clock: u64) -> String {
    if clock >= schedule.makespan() {
        return format!("t={clock} | All tasks completed. Press q to quit.");
    }
    match schedule.running_at(clock) {
        Some(id) => {
            let task = schedule.task(id);
            // a slice runs without interruption from its first run
            let done = clock - task.first_run().unwrap_or(clock);
            format!(
                "t={clock} | {} | slice {} | {} of {} units left",
                task.name(),
                id,
                task.cost() - done,
                task.cost()
            )
        }
        None => format!("t={clock} | Processor idle."),
    }
}

/// Draws the replay view of `schedule` at time unit `clock`.
pub fn draw_replay<B: Backend>(f: &mut Frame<B>, schedule: &Schedule, clock: u64) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(f.size());

    let current = Paragraph::new(current_line(schedule, clock))
        .style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::LightBlue),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Processor")
                .border_type(BorderType::Rounded),
        );

    f.render_widget(current, chunks[0]);

    let items = schedule.originals().map(|(id, task)| {
        let state = TaskState::at(schedule, id, clock);
        let until = clock.saturating_add(1).min(schedule.makespan());
        let executed = schedule.executed_before(id, until);
        let style = Style::default().fg(color_of(schedule, id));
        let style = if state == TaskState::Running {
            style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            style
        };

        Row::new(vec![
            Cell::from(task.name().to_owned())
                .style(Style::default().add_modifier(Modifier::BOLD)),
            Cell::from("|"),
            Cell::from(task.arrival().to_string()),
            Cell::from("|"),
            Cell::from(format!("{executed}/{}", task.cost())),
            Cell::from("|"),
            Cell::from(state.label()),
        ])
        .style(style)
    });

    let table = Table::new(items)
        .header(
            Row::new(vec!["Name", "|", "Arrival", "|", "Work", "|", "State"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .widths(&[
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(7),
            Constraint::Length(1),
            Constraint::Length(7),
            Constraint::Length(1),
            Constraint::Length(8),
        ])
        .block(
            Block::default()
                .title(schedule.policy().long_name())
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::LightGreen))
        .column_spacing(1);

    f.render_widget(table, chunks[1]);
}

pub enum DisplayEvent {
    Input(KeyEvent),
    Tick,
}

/// Runs its restore function when dropped, so every exit path after setup
/// puts the terminal back.
struct Restore<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Restore<F> {
    fn new(restore: F) -> Self {
        Self(Some(restore))
    }
}

impl<F: FnOnce()> Drop for Restore<F> {
    fn drop(&mut self) {
        if let Some(restore) = self.0.take() {
            restore();
        }
    }
}

fn leave_raw_mode() {
    let _ = crossterm::terminal::disable_raw_mode();
}

pub struct DisplayTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    input_rx: Receiver<DisplayEvent>,
    _raw_mode: Restore<fn()>,
}

impl DisplayTerminal {
    pub fn new(tick_rate: Duration) -> Result<Self, io::Error> {
        crossterm::terminal::enable_raw_mode()?;
        let raw_mode = Restore::new(leave_raw_mode as fn());

        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            input_rx: spawn_input(tick_rate),
            _raw_mode: raw_mode,
        })
    }

    pub fn draw(&mut self, schedule: &Schedule, clock: u64) -> io::Result<()> {
        self.terminal
            .draw(|f| draw_replay(f, schedule, clock))
            .map(|_| ())
    }

    pub fn get_input(&self) -> RunnerEvent {
        match self.input_rx.recv() {
            Ok(DisplayEvent::Input(key)) => RunnerEvent::from_key(key),
            Ok(DisplayEvent::Tick) => RunnerEvent::Tick,
            // The input thread is gone, nothing can drive the replay anymore
            Err(_) => RunnerEvent::Quit,
        }
    }
}

/// Input handling thread, stops once the receiver is gone or polling fails.
fn spawn_input(tick_rate: Duration) -> Receiver<DisplayEvent> {
    let (input_tx, input_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut last_tick = Instant::now();
        loop {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or(Duration::ZERO);

            match event::poll(timeout) {
                Ok(true) => {
                    if let Ok(Event::Key(key)) = event::read() {
                        if input_tx.send(DisplayEvent::Input(key)).is_err() {
                            break;
                        }
                    }
                }
                Ok(false) => {}
                Err(_) => break,
            }

            if last_tick.elapsed() >= tick_rate {
                if input_tx.send(DisplayEvent::Tick).is_err() {
                    break;
                }
                last_tick = Instant::now();
            }
        }
    });
    input_rx
}

impl RunnerEvent {
    fn from_key(key: KeyEvent) -> Self {
        if !key.modifiers.is_empty() {
            return RunnerEvent::None;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => RunnerEvent::Quit,
            KeyCode::Char('p') => RunnerEvent::Pause,
            KeyCode::Char('r') => RunnerEvent::Resume,
            KeyCode::Char('s') => RunnerEvent::Step,
            _ => RunnerEvent::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{simulate, PolicyKind, Task};
    use tui::backend::TestBackend;

    fn schedule(specs: &[(&str, i64, i64)], kind: PolicyKind) -> Schedule {
        let tasks = specs
            .iter()
            .map(|&(name, cost, arrival)| Task::new(name, cost, arrival).unwrap())
            .collect();
        simulate(tasks, kind).unwrap()
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (buf.area.left()..buf.area.right())
            .map(|x| buf.get(x, y).symbol.as_str())
            .collect::<String>()
            .trim_end()
            .to_owned()
    }

    fn text(buf: &Buffer) -> String {
        (buf.area.top()..buf.area.bottom())
            .map(|y| row(buf, y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn band_label_centers_name() {
        let label = |name: &str, inner: u64| -> String {
            let name: Vec<char> = name.chars().collect();
            (0..inner).map(|k| label_glyph(&name, inner, k)).collect()
        };
        assert_eq!(label("A", 11), "░░░░▏A▕░░░░");
        assert_eq!(label("B", 5), "░▏B▕░");
        assert_eq!(label("long", 3), "lon");
        assert_eq!(label("AB", 3), "AB░");
    }

    #[test]
    fn timeline_draws_bands_and_axis() {
        let schedule = schedule(&[("A", 2, 0), ("B", 1, 1)], PolicyKind::Fifo);
        let timeline = render_timeline(&schedule, 6);
        assert_eq!(timeline.chunks().len(), 1);
        assert_eq!(timeline.truncated_at(), None);

        let buf = &timeline.chunks()[0];
        assert_eq!(row(buf, 0), "┃░░░░░░░░░░░┃░░░░░┃");
        assert_eq!(row(buf, 1), "┃░░░░▏A▕░░░░┃░▏B▕░┃");
        assert_eq!(row(buf, 2), row(buf, 0));
        assert_eq!(row(buf, 3), "+—————:—————+—————:——>");
        assert_eq!(row(buf, 4), "0           2");
    }

    #[test]
    fn timeline_leaves_idle_gaps() {
        let schedule = schedule(&[("A", 1, 1)], PolicyKind::Fifo);
        let timeline = render_timeline(&schedule, 2);
        assert_eq!(row(&timeline.chunks()[0], 0), "  ┃░┃");
    }

    #[test]
    fn slices_share_their_original_color() {
        let schedule = schedule(&[("A", 2, 0), ("B", 2, 0)], PolicyKind::RoundRobin);
        let timeline = render_timeline(&schedule, 2);
        let buf = &timeline.chunks()[0];

        // A, B, A', B' each one unit wide
        assert_eq!(buf.get(0, 0).fg, PALETTE[0]);
        assert_eq!(buf.get(2, 0).fg, PALETTE[1]);
        assert_eq!(buf.get(4, 0).fg, PALETTE[0]);
        assert_eq!(buf.get(6, 0).fg, PALETTE[1]);
    }

    #[test]
    fn wide_timeline_wraps_into_chunks() {
        let schedule = schedule(&[("A", 30, 0)], PolicyKind::Fifo);
        let timeline = render_timeline(&schedule, 6);

        // 30 units * 6 columns + axis arrow
        let widths: Vec<u16> = timeline.chunks().iter().map(|buf| buf.area.width).collect();
        assert_eq!(widths, vec![TIMELINE_WIDTH, 64]);
        assert_eq!(timeline.truncated_at(), None);

        let second = &timeline.chunks()[1];
        assert_eq!(row(second, 0), format!("{}┃", "░".repeat(60)));
        assert!(row(second, 3).starts_with('+'));
        assert!(row(second, 3).ends_with("+——>"));
        assert!(row(second, 4).starts_with("20"));
        assert!(row(&timeline.chunks()[0], 1).contains("▏A▕"));
    }

    #[test]
    fn long_timeline_is_truncated_without_panicking() {
        let schedule = schedule(&[("A", 2500, 0)], PolicyKind::Fifo);
        let timeline = render_timeline(&schedule, 6);

        assert_eq!(timeline.chunks().len(), MAX_TIMELINE_CHUNKS);
        assert!(timeline
            .chunks()
            .iter()
            .all(|buf| buf.area.width == TIMELINE_WIDTH && buf.area.height == TIMELINE_HEIGHT));
        assert_eq!(timeline.truncated_at(), Some(1280));

        let mut out = Vec::new();
        write_timeline(&mut out, &timeline).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("truncated at t=1280"));
    }

    #[test]
    fn late_arrival_timeline_stays_small() {
        let schedule = schedule(&[("A", 1, 1_000_000_000_000)], PolicyKind::Fifo);
        let timeline = render_timeline(&schedule, 6);
        assert_eq!(timeline.chunks().len(), MAX_TIMELINE_CHUNKS);
        assert_eq!(timeline.truncated_at(), Some(1280));
        // the band lies far past the drawn area
        assert!(timeline
            .chunks()
            .iter()
            .all(|buf| row(buf, 0).is_empty()));
    }

    #[test]
    fn write_timeline_emits_one_line_per_row() {
        let schedule = schedule(&[("A", 1, 0)], PolicyKind::Fifo);
        let timeline = render_timeline(&schedule, 6);
        let mut out = Vec::new();
        write_timeline(&mut out, &timeline).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.matches('\n').count(), TIMELINE_HEIGHT as usize);
        assert!(printed.contains("▏A▕"));
    }

    #[test]
    fn write_timeline_separates_chunks() {
        let schedule = schedule(&[("A", 30, 0)], PolicyKind::Fifo);
        let timeline = render_timeline(&schedule, 6);
        let mut out = Vec::new();
        write_timeline(&mut out, &timeline).unwrap();

        let printed = String::from_utf8(out).unwrap();
        let rows = 2 * TIMELINE_HEIGHT as usize;
        assert_eq!(printed.matches('\n').count(), rows + 1);
        assert!(!printed.contains("truncated"));
    }

    #[test]
    fn restore_runs_on_early_return() {
        fn setup(
            restored: &std::cell::Cell<bool>,
            fail: bool,
        ) -> io::Result<Restore<impl FnOnce() + '_>> {
            let guard = Restore::new(move || restored.set(true));
            if fail {
                return Err(io::Error::new(io::ErrorKind::Other, "no terminal"));
            }
            Ok(guard)
        }

        let restored = std::cell::Cell::new(false);
        assert!(setup(&restored, true).is_err());
        assert!(restored.get());

        let restored = std::cell::Cell::new(false);
        let guard = setup(&restored, false).unwrap();
        assert!(!restored.get());
        drop(guard);
        assert!(restored.get());
    }

    #[test]
    fn task_state_follows_trace() {
        let schedule = schedule(&[("A", 4, 0), ("B", 1, 1), ("C", 1, 6)], PolicyKind::Stcf);
        let (a, b, c) = (TaskId(0), TaskId(1), TaskId(2));

        assert_eq!(TaskState::at(&schedule, a, 0), TaskState::Running);
        assert_eq!(TaskState::at(&schedule, b, 0), TaskState::Waiting);
        assert_eq!(TaskState::at(&schedule, a, 1), TaskState::Ready);
        assert_eq!(TaskState::at(&schedule, b, 1), TaskState::Running);
        assert_eq!(TaskState::at(&schedule, b, 2), TaskState::Done);
        assert_eq!(TaskState::at(&schedule, a, 3), TaskState::Running);
        assert_eq!(TaskState::at(&schedule, c, 5), TaskState::Waiting);
        assert_eq!(TaskState::at(&schedule, a, 5), TaskState::Done);
    }

    #[test]
    fn replay_view_shows_running_task() {
        let schedule = schedule(&[("A", 4, 0), ("B", 1, 1)], PolicyKind::Stcf);
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|f| draw_replay(f, &schedule, 1)).unwrap();

        let screen = text(terminal.backend().buffer());
        assert!(screen.contains("t=1 | B | slice #1 | 1 of 1 units left"), "{screen}");
        assert!(screen.contains("STCF (Shortest Time to Completion First)"));
        assert!(screen.contains("running"));
        assert!(screen.contains("1/4"));
    }

    #[test]
    fn replay_view_reports_completion() {
        let schedule = schedule(&[("A", 1, 0)], PolicyKind::Fifo);
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal.draw(|f| draw_replay(f, &schedule, 1)).unwrap();

        let screen = text(terminal.backend().buffer());
        assert!(screen.contains("All tasks completed"));
        assert!(screen.contains("done"));
    }
}
