use anyhow::{Context, Result};
use clap::{ArgAction, ArgGroup, Parser};
use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use scheduling_simulator::scheduler::{
    render_timeline, simulate, workload, write_timeline, OutputMode, PolicyKind, ReplayRunner,
    Schedule, SimConfig, Statistics, TaskSpec, DEFAULT_SCALE,
};
use std::{io, path::PathBuf, time::Duration};
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schedsim")]
#[command(about = "Simulate FIFO, SJF, STCF and Round-Robin CPU scheduling", long_about = None)]
#[command(group(
    ArgGroup::new("policy_choice")
        .required(true)
        .args(["policy", "fifo", "sjf", "stcf", "rr"])
))]
struct Cli {
    /// Scheduling policy (fifo, sjf, stcf, rr)
    #[arg(short, long)]
    policy: Option<String>,
    /// First In First Out
    #[arg(long)]
    fifo: bool,
    /// Shortest Job First
    #[arg(long)]
    sjf: bool,
    /// Shortest Time to Completion First
    #[arg(long)]
    stcf: bool,
    /// Round Robin
    #[arg(long)]
    rr: bool,

    /// Task as name:cost:arrival, may be repeated
    #[arg(long = "task", value_name = "NAME:COST:ARRIVAL")]
    tasks: Vec<TaskSpec>,
    /// JSON file with an array of { name, cost, arrival }
    #[arg(short, long, conflicts_with = "tasks")]
    workload: Option<PathBuf>,

    /// Print the timeline
    #[arg(short, long)]
    timeline: bool,
    /// Print per-task and average statistics
    #[arg(short, long)]
    stats: bool,
    /// Print the schedule as JSON
    #[arg(long)]
    json: bool,
    /// Replay the schedule in the terminal (q quit, p pause, r resume, s step)
    #[arg(short, long, conflicts_with_all = ["timeline", "stats", "json"])]
    interactive: bool,

    /// Timeline columns per time unit
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    scale: u16,
    /// Milliseconds per replayed time unit
    #[arg(long, default_value = "500")]
    tick_ms: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn policy(&self) -> Result<PolicyKind> {
        let kind = match &self.policy {
            Some(name) => name.parse()?,
            None if self.fifo => PolicyKind::Fifo,
            None if self.sjf => PolicyKind::Sjf,
            None if self.stcf => PolicyKind::Stcf,
            None => PolicyKind::RoundRobin,
        };
        Ok(kind)
    }

    fn workload(&self) -> Result<Vec<TaskSpec>> {
        if let Some(path) = &self.workload {
            return workload::load(path)
                .with_context(|| format!("failed to load workload {}", path.display()));
        }
        if self.tasks.is_empty() {
            return Ok(workload::demo());
        }
        Ok(self.tasks.clone())
    }

    fn into_config(self) -> Result<SimConfig> {
        let config = SimConfig::new(self.policy()?, self.workload()?)
            .with_output(OutputMode {
                timeline: self.timeline,
                stats: self.stats,
                json: self.json,
                interactive: self.interactive,
            })
            .with_scale(self.scale)
            .with_tick_rate(Duration::from_millis(self.tick_ms));
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn replay(config: &SimConfig, schedule: &Schedule) -> Result<()> {
    execute!(io::stdout(), Clear(ClearType::All))?;

    let mut runner = ReplayRunner::new(schedule, config.tick_rate)
        .context("failed to set up the terminal")?;
    while runner.run()? {}
    drop(runner);

    execute!(io::stdout(), Clear(ClearType::All))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.into_config()?;
    debug!(policy = %config.policy, tasks = config.workload.len(), "configured");

    let tasks = workload::into_tasks(&config.workload)?;
    let schedule = simulate(tasks, config.policy)?;

    if config.output.interactive {
        return replay(&config, &schedule);
    }
    if config.output.timeline {
        println!();
        let timeline = render_timeline(&schedule, config.scale);
        write_timeline(&mut io::stdout(), &timeline)?;
        println!();
    }
    if config.output.stats {
        print!("{}", Statistics::collect(&schedule));
        println!();
    }
    if config.output.json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{error::ErrorKind, CommandFactory};

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn interactive_rejects_printed_outputs() {
        for flag in ["-t", "-s", "--json"] {
            let err = Cli::try_parse_from(["schedsim", "--fifo", "-i", flag])
                .err()
                .unwrap();
            assert_eq!(err.kind(), ErrorKind::ArgumentConflict, "{flag}");
        }
        assert!(Cli::try_parse_from(["schedsim", "--fifo", "-i"]).is_ok());
    }

    #[test]
    fn one_policy_is_required() {
        let err = Cli::try_parse_from(["schedsim", "-t"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["schedsim", "--fifo", "--rr"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn tasks_and_outputs_reach_the_config() {
        let cli =
            Cli::try_parse_from(["schedsim", "--rr", "--task", "A:2:0", "--task", "B:1:1", "-s"])
                .unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.policy, PolicyKind::RoundRobin);
        assert_eq!(config.workload, vec![TaskSpec::new("A", 2, 0), TaskSpec::new("B", 1, 1)]);
        assert!(config.output.stats);
        assert!(!config.output.timeline);
    }
}
