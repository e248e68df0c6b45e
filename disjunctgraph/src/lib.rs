mod resource_order;
mod schedule;

#[cfg(feature = "labeller")]
pub mod labeller;

pub use resource_order::ResourceOrder;
pub use schedule::Schedule;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Job precedences and machine orders contradict each other.
    #[error("machine orders are cyclic, only {scheduled} of {total} operations could be scheduled")]
    Cyclic { scheduled: usize, total: usize },
    #[error("resource order is incomplete")]
    Incomplete,
    #[error("operation {found} placed out of order, job {job} expects step {expected}")]
    OutOfOrder { job: usize, expected: usize, found: Operation },
    #[error("operation {0} does not exist")]
    UnknownOperation(Operation),
    #[error("operation {operation} does not belong on machine {machine}")]
    Misplaced { operation: Operation, machine: usize },
    #[error("operation {0} appears more than once")]
    Duplicate(Operation),
    #[error("position {position} does not exist on machine {machine}")]
    InvalidPosition { machine: usize, position: usize },
}

/// Read-only view of a job-shop problem.
///
/// Every job is a sequence of `steps_per_job` operations, operation `(job, step)`
/// occupies `machine(job, step)` for `duration(job, step)` time units.
/// The durations of all operations must sum to at most `u32::MAX`.
pub trait Instance {
    fn num_jobs(&self) -> usize;
    fn num_machines(&self) -> usize;
    fn steps_per_job(&self) -> usize;
    fn duration(&self, job: usize, step: usize) -> u32;
    fn machine(&self, job: usize, step: usize) -> usize;
}

/// The `step`-th operation of job `job`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Operation {
    pub job: usize,
    pub step: usize,
}

impl Operation {
    pub fn new(job: usize, step: usize) -> Self {
        Operation { job, step }
    }

    pub fn duration(&self, instance: &(impl Instance + ?Sized)) -> u32 {
        instance.duration(self.job, self.step)
    }

    pub fn machine(&self, instance: &(impl Instance + ?Sized)) -> usize {
        instance.machine(self.job, self.step)
    }

    /// The operation of the same job that has to finish first.
    pub fn job_predecessor(&self) -> Option<Operation> {
        if self.step > 0 {
            Some(Operation::new(self.job, self.step - 1))
        } else {
            None
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.job, self.step)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::Instance;

    /// Instance given as `(machine, duration)` per job and step.
    pub struct Jobs(pub Vec<Vec<(usize, u32)>>);

    impl Instance for Jobs {
        fn num_jobs(&self) -> usize { self.0.len() }
        fn num_machines(&self) -> usize {
            self.0.iter().flatten().map(|(m, _)| m + 1).max().unwrap_or(0)
        }
        fn steps_per_job(&self) -> usize { self.0.first().map_or(0, |j| j.len()) }
        fn duration(&self, job: usize, step: usize) -> u32 { self.0[job][step].1 }
        fn machine(&self, job: usize, step: usize) -> usize { self.0[job][step].0 }
    }

    // job0 = [(M0,3),(M1,2)], job1 = [(M1,2),(M0,4)]
    pub fn two_by_two() -> Jobs {
        Jobs(vec!(
            vec!((0, 3), (1, 2)),
            vec!((1, 2), (0, 4)),
        ))
    }

    pub fn three_by_three() -> Jobs {
        Jobs(vec!(
            vec!((0, 3), (1, 2), (2, 2)),
            vec!((0, 2), (2, 1), (1, 4)),
            vec!((1, 4), (2, 3), (0, 1)),
        ))
    }
}
