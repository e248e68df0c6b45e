use crate::{ GraphError, Instance, Operation, ResourceOrder };

/// Start times of every operation, as decoded from a [`ResourceOrder`].
///
/// A schedule carries the durations and machines of its operations as well as the
/// machine order it was decoded from, so it can be analysed without the instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    starts: Vec<Vec<u32>>,
    durations: Vec<Vec<u32>>,
    machines: Vec<Vec<usize>>,
    machine_predecessors: Vec<Vec<Option<Operation>>>,
    num_machines: usize,
}

impl Schedule {
    /// Computes the earliest start time of every operation under the machine orders of `order`.
    ///
    /// Repeatedly picks an operation that is next on its machine and next in its job,
    /// and starts it as soon as both its job predecessor and its machine are done.
    /// Fails with [`GraphError::Cyclic`] once no such operation exists while some remain.
    pub fn decode(instance: &(impl Instance + ?Sized), order: &ResourceOrder) -> Result<Schedule, GraphError> {
        if !order.is_complete() {
            return Err(GraphError::Incomplete);
        }

        let jobs = instance.num_jobs();
        let steps = instance.steps_per_job();
        let machines = order.num_machines();
        let total = jobs * steps;

        let durations = (0..jobs)
            .map(|job| (0..steps).map(|step| instance.duration(job, step)).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let mut starts = vec!(vec!(0u32; steps); jobs);
        let mut machine_predecessors = vec!(vec!(None; steps); jobs);

        let mut next_step = vec!(0usize; jobs);
        let mut next_position = vec!(0usize; machines);
        let mut machine_free = vec!(0u32; machines);

        for scheduled in 0..total {
            let ready = (0..machines)
                .filter_map(|machine| {
                    order.machine_order(machine)
                        .get(next_position[machine])
                        .map(|operation| (machine, *operation))
                })
                .find(|(_, operation)| operation.step == next_step[operation.job]);

            let (machine, operation) = match ready {
                Some(ready) => ready,
                None => return Err(GraphError::Cyclic { scheduled, total }),
            };

            let job_ready = operation.job_predecessor()
                .map_or(0, |prev| starts[prev.job][prev.step] + durations[prev.job][prev.step]);
            let start = std::cmp::max(job_ready, machine_free[machine]);

            starts[operation.job][operation.step] = start;
            if next_position[machine] > 0 {
                machine_predecessors[operation.job][operation.step] =
                    Some(order.machine_order(machine)[next_position[machine] - 1]);
            }

            machine_free[machine] = start + durations[operation.job][operation.step];
            next_step[operation.job] += 1;
            next_position[machine] += 1;
        }

        let machine_ids = (0..jobs)
            .map(|job| (0..steps).map(|step| instance.machine(job, step)).collect())
            .collect();

        Ok(Schedule {
            starts,
            durations,
            machines: machine_ids,
            machine_predecessors,
            num_machines: machines,
        })
    }

    pub fn num_jobs(&self) -> usize {
        self.starts.len()
    }

    pub fn steps_per_job(&self) -> usize {
        self.starts.first().map_or(0, |steps| steps.len())
    }

    pub fn num_machines(&self) -> usize {
        self.num_machines
    }

    /// All operations, job by job in step order.
    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.starts.iter()
            .enumerate()
            .flat_map(|(job, steps)| (0..steps.len()).map(move |step| Operation::new(job, step)))
    }

    pub fn start(&self, operation: Operation) -> u32 {
        self.starts[operation.job][operation.step]
    }

    pub fn end(&self, operation: Operation) -> u32 {
        self.start(operation) + self.duration(operation)
    }

    pub fn duration(&self, operation: Operation) -> u32 {
        self.durations[operation.job][operation.step]
    }

    pub fn machine(&self, operation: Operation) -> usize {
        self.machines[operation.job][operation.step]
    }

    /// The operation processed right before `operation` on its machine.
    pub fn machine_predecessor(&self, operation: Operation) -> Option<Operation> {
        self.machine_predecessors[operation.job][operation.step]
    }

    pub fn makespan(&self) -> u32 {
        self.operations().map(|op| self.end(op)).max().unwrap_or(0)
    }

    /// True if every operation starts after its job predecessor and its machine predecessor end.
    pub fn respects_precedences(&self) -> bool {
        self.operations().all(|op| {
            let after_job = op.job_predecessor().map_or(true, |prev| self.end(prev) <= self.start(op));
            let after_machine = self.machine_predecessor(op).map_or(true, |prev| self.end(prev) <= self.start(op));
            after_job && after_machine
        })
    }

    /// A chain of operations, each starting exactly when its predecessor in the chain ends,
    /// leading from time 0 to the makespan.
    ///
    /// The chain ends in the first operation (in job, step order) with maximal end time.
    /// Walking backwards, a tight job predecessor is preferred over a tight machine predecessor.
    pub fn critical_path(&self) -> Vec<Operation> {
        let last = self.operations().fold(None, |last: Option<Operation>, op| match last {
            Some(last) if self.end(last) >= self.end(op) => Some(last),
            _ => Some(op),
        });
        let mut current = match last {
            Some(last) => last,
            None => return vec!(),
        };

        let mut path = vec!(current);
        while self.start(current) > 0 {
            let start = self.start(current);
            let tight = current.job_predecessor()
                .filter(|prev| self.end(*prev) == start)
                .or_else(|| self.machine_predecessor(current).filter(|prev| self.end(*prev) == start));

            match tight {
                Some(prev) => {
                    path.push(prev);
                    current = prev;
                },
                // Only a schedule with idle time before `current` ends up here.
                None => break,
            }
        }

        path.reverse();
        path
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for job in 0..self.num_jobs() {
            write!(f, "job {}:", job)?;
            for step in 0..self.steps_per_job() {
                let op = Operation::new(job, step);
                write!(f, " m{}[{}, {})", self.machine(op), self.start(op), self.end(op))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
