use super::{policy::PolicyKind, schedule::Schedule};
use serde::Serialize;
use std::fmt;

/// Metrics for one original task, aggregated over its continuation chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub name: String,
    pub cost: u64,
    pub arrival: u64,
    pub first_run: u64,
    pub completion: u64,
    pub sliced: bool,
}

impl TaskStats {
    pub fn turnaround(&self) -> u64 {
        self.completion - self.arrival
    }

    pub fn response(&self) -> u64 {
        self.first_run - self.arrival
    }
}

impl fmt::Display for TaskStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}:  COST={:2}  ARRIVAL={:2}  FIRST_RUN={:2}  FINISHED={:2}",
            self.name, self.cost, self.arrival, self.first_run, self.completion
        )?;
        writeln!(
            f,
            "    TURNAROUND={:2} ({}-{})",
            self.turnaround(),
            self.completion,
            self.arrival
        )?;
        writeln!(
            f,
            "    RESPONSE={:2} ({}-{})  SLICED={}",
            self.response(),
            self.first_run,
            self.arrival,
            self.sliced
        )
    }
}

/// Per-task metrics and their averages over the original tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub policy: PolicyKind,
    pub tasks: Vec<TaskStats>,
    pub average_turnaround: f64,
    pub average_response: f64,
}

impl Statistics {
    /// Collects metrics for every original task. Slices only contribute
    /// through the chain they belong to.
    pub fn collect(schedule: &Schedule) -> Self {
        let mut tasks: Vec<TaskStats> = schedule
            .originals()
            .filter_map(|(id, task)| {
                Some(TaskStats {
                    name: task.name().to_owned(),
                    cost: task.cost(),
                    arrival: task.arrival(),
                    first_run: task.first_run()?,
                    completion: schedule.last_slice(id).completion()?,
                    sliced: schedule.is_sliced(id),
                })
            })
            .collect();
        tasks.sort_by_key(|stats| stats.first_run);

        let average = |metric: fn(&TaskStats) -> u64| {
            if tasks.is_empty() {
                return 0.0;
            }
            tasks.iter().map(metric).sum::<u64>() as f64 / tasks.len() as f64
        };
        let average_turnaround = average(TaskStats::turnaround);
        let average_response = average(TaskStats::response);

        Self {
            policy: schedule.policy(),
            tasks,
            average_turnaround,
            average_response,
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.policy)?;
        for task in &self.tasks {
            writeln!(f, "{task}")?;
        }
        writeln!(f, "TURNAROUND_AVG={:.2}", self.average_turnaround)?;
        writeln!(f, "RESPONSE_AVG={:.2}", self.average_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{simulate, Task};

    fn collect(specs: &[(&str, i64, i64)], kind: PolicyKind) -> Statistics {
        let tasks = specs
            .iter()
            .map(|&(name, cost, arrival)| Task::new(name, cost, arrival).unwrap())
            .collect();
        Statistics::collect(&simulate(tasks, kind).unwrap())
    }

    #[test]
    fn fifo_averages() {
        let stats = collect(&[("A", 2, 0), ("B", 1, 1)], PolicyKind::Fifo);
        assert_eq!(stats.tasks.len(), 2);
        assert_eq!(stats.tasks[1].name, "B");
        assert_eq!(stats.tasks[1].turnaround(), 2);
        assert_eq!(stats.tasks[1].response(), 1);
        // turnaround (2 + 2) / 2, response (0 + 1) / 2
        assert_eq!(stats.average_turnaround, 2.0);
        assert_eq!(stats.average_response, 0.5);
    }

    #[test]
    fn slices_do_not_count_as_tasks() {
        let stats = collect(&[("A", 2, 0), ("B", 2, 0)], PolicyKind::RoundRobin);
        assert_eq!(stats.tasks.len(), 2);
        assert!(stats.tasks.iter().all(|task| task.sliced));
        assert_eq!(stats.tasks[0].completion, 3);
        assert_eq!(stats.tasks[1].completion, 4);
        assert_eq!(stats.average_turnaround, 3.5);
        assert_eq!(stats.average_response, 0.5);
    }

    #[test]
    fn report_lists_policy_and_averages() {
        let stats = collect(&[("A", 4, 0), ("B", 1, 1)], PolicyKind::Stcf);
        let report = stats.to_string();
        assert!(report.starts_with("STCF (Shortest Time to Completion First)\n"));
        assert!(report.contains("TURNAROUND= 5 (5-0)"));
        assert!(report.contains("SLICED=true"));
        assert!(report.contains("TURNAROUND_AVG=3.00"));
        assert!(report.contains("RESPONSE_AVG=0.00"));
    }
}
