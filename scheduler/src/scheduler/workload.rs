use super::{
    error::{Result, SchedulerError},
    task::Task,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, str::FromStr};

/// A task as written by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub cost: i64,
    pub arrival: i64,
}

impl TaskSpec {
    pub fn new(name: &str, cost: i64, arrival: i64) -> Self {
        Self {
            name: name.to_owned(),
            cost,
            arrival,
        }
    }

    pub fn to_task(&self) -> Result<Task> {
        Task::new(&self.name, self.cost, self.arrival)
    }
}

/// Parses `name:cost:arrival`, e.g. `A:2:0`.
impl FromStr for TaskSpec {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let &[name, cost, arrival] = parts.as_slice() else {
            return Err(SchedulerError::Workload(format!(
                "expected name:cost:arrival, got \"{s}\""
            )));
        };
        if name.is_empty() {
            return Err(SchedulerError::Workload(format!(
                "missing task name in \"{s}\""
            )));
        }

        let number = |field: &str, value: &str| {
            value.parse::<i64>().map_err(|_| {
                SchedulerError::Workload(format!(
                    "{field} of task {name} is not a number: \"{value}\""
                ))
            })
        };

        Ok(Self::new(name, number("cost", cost)?, number("arrival", arrival)?))
    }
}

/// The workload used when none is given: six tasks with staggered arrivals.
pub fn demo() -> Vec<TaskSpec> {
    vec![
        TaskSpec::new("A", 2, 2),
        TaskSpec::new("B", 4, 0),
        TaskSpec::new("C", 2, 4),
        TaskSpec::new("D", 1, 2),
        TaskSpec::new("E", 3, 1),
        TaskSpec::new("F", 4, 0),
    ]
}

/// Reads a JSON array of `{ "name", "cost", "arrival" }` objects.
pub fn load(path: &Path) -> Result<Vec<TaskSpec>> {
    let content = fs::read_to_string(path)?;
    parse_json(&content)
}

pub fn parse_json(content: &str) -> Result<Vec<TaskSpec>> {
    Ok(serde_json::from_str(content)?)
}

/// Validates every spec, stopping at the first invalid one.
pub fn into_tasks(specs: &[TaskSpec]) -> Result<Vec<Task>> {
    specs.iter().map(TaskSpec::to_task).collect()
}
