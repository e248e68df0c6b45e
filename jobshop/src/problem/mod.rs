mod random;

use std::io::{ BufRead, BufReader, Read };
use std::fs::File;
use std::path::Path;

use disjunctgraph::Instance;
use itertools::Itertools;

pub trait ProblemSolver {
    type Solution;
    fn solve(&self, problem: &Problem) -> Self::Solution;
}

#[derive(Debug, thiserror::Error)]
pub enum ProblemError {
    #[error("could not read instance: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("expected {expected} jobs, found {found}")]
    MissingJobs { expected: usize, found: usize },
    #[error("job {job} uses machine {machine}, but there are only {machines} machines")]
    MachineOutOfRange { job: usize, machine: usize, machines: usize },
    #[error("job {job} does not visit every machine exactly once")]
    NotAPermutation { job: usize },
    #[error("instance has no jobs or no machines")]
    Empty,
    #[error("total processing time {total} does not fit in a schedule")]
    TooLong { total: u64 },
}

/// A job-shop instance: every job visits every machine exactly once, in its own order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub machines: usize,
    pub jobs: Vec<Vec<Activity>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    pub machine_id: usize,
    pub process_time: u32,
}

impl Problem {
    pub fn new(machines: usize, jobs: Vec<Vec<Activity>>) -> Result<Self, ProblemError> {
        if machines == 0 || jobs.is_empty() {
            return Err(ProblemError::Empty);
        }

        for (job, activities) in jobs.iter().enumerate() {
            let mut visited = vec!(false; machines);
            for activity in activities {
                let machine = activity.machine_id;
                if machine >= machines {
                    return Err(ProblemError::MachineOutOfRange { job, machine, machines });
                }
                if visited[machine] {
                    return Err(ProblemError::NotAPermutation { job });
                }
                visited[machine] = true;
            }
            if activities.len() != machines {
                return Err(ProblemError::NotAPermutation { job });
            }
        }

        // No start or end time can exceed the sum of all durations.
        let total = jobs.iter().flatten().map(|a| u64::from(a.process_time)).sum::<u64>();
        if total > u64::from(u32::MAX) {
            return Err(ProblemError::TooLong { total });
        }

        Ok(Problem { machines, jobs })
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ProblemError> {
        Self::from_reader(File::open(path)?)
    }

    /// Reads the usual text format: `<jobs> <machines>` followed by one line per job of
    /// `<machine> <duration>` pairs. Blank lines and lines starting with `#` are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ProblemError> {
        let mut lines = Vec::new();
        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let content = line.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            let numbers = content.split_whitespace()
                .map(|token| token.parse::<u32>().map_err(|_| ProblemError::Malformed {
                    line: index + 1,
                    reason: format!("`{}` is not a number", token),
                }))
                .collect::<Result<Vec<_>, _>>()?;
            lines.push((index + 1, numbers));
        }

        let mut lines = lines.into_iter();
        let (line, header) = lines.next().ok_or(ProblemError::Empty)?;
        let (jobs, machines) = match header[..] {
            [jobs, machines] => (jobs as usize, machines as usize),
            _ => return Err(ProblemError::Malformed { line, reason: "expected `<jobs> <machines>`".to_owned() }),
        };

        let activities = lines.take(jobs)
            .map(|(line, numbers)| {
                if numbers.len() != 2 * machines {
                    return Err(ProblemError::Malformed {
                        line,
                        reason: format!("expected {} numbers, found {}", 2 * machines, numbers.len()),
                    });
                }
                Ok(numbers.chunks(2)
                    .map(|pair| Activity { machine_id: pair[0] as usize, process_time: pair[1] })
                    .collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, _>>()?;

        if activities.len() < jobs {
            return Err(ProblemError::MissingJobs { expected: jobs, found: activities.len() });
        }

        Problem::new(machines, activities)
    }

    /// The larger of the longest job and the most loaded machine.
    pub fn lower_bound(&self) -> u32 {
        let job_bound = self.jobs.iter()
            .map(|activities| activities.iter().map(|a| a.process_time).sum::<u32>())
            .max()
            .unwrap_or(0);

        let mut loads = vec!(0u32; self.machines);
        for activity in self.jobs.iter().flatten() {
            loads[activity.machine_id] += activity.process_time;
        }
        let machine_bound = loads.into_iter().max().unwrap_or(0);

        std::cmp::max(job_bound, machine_bound)
    }
}

impl Instance for Problem {
    fn num_jobs(&self) -> usize { self.jobs.len() }
    fn num_machines(&self) -> usize { self.machines }
    fn steps_per_job(&self) -> usize { self.machines }
    fn duration(&self, job: usize, step: usize) -> u32 { self.jobs[job][step].process_time }
    fn machine(&self, job: usize, step: usize) -> usize { self.jobs[job][step].machine_id }
}

/// Writes the instance in the format [`Problem::from_reader`] reads.
impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} {}", self.jobs.len(), self.machines)?;
        for activities in &self.jobs {
            let line = activities.iter()
                .map(|a| format!("{} {}", a.machine_id, a.process_time))
                .join(" ");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
