use itertools::Itertools;

use crate::{ GraphError, Instance, Operation, Schedule };

/// Solution encoding: for every machine, the order in which it processes its operations.
///
/// An order is built either at once from complete machine sequences, or one operation
/// at a time with [`ResourceOrder::place`], which only accepts the next step of a job.
/// Cloning copies every machine sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceOrder {
    machines: Vec<Vec<Operation>>,
    // Number of operations placed so far, per job.
    placed: Vec<usize>,
    steps: usize,
}

impl ResourceOrder {
    /// An order in which nothing has been placed yet.
    pub fn new(instance: &(impl Instance + ?Sized)) -> Self {
        ResourceOrder {
            machines: (0..instance.num_machines())
                .map(|_| Vec::with_capacity(instance.num_jobs()))
                .collect(),
            placed: vec!(0; instance.num_jobs()),
            steps: instance.steps_per_job(),
        }
    }

    /// Builds a complete order from one operation sequence per machine.
    pub fn from_machine_orders(instance: &(impl Instance + ?Sized), machines: Vec<Vec<Operation>>) -> Result<Self, GraphError> {
        let mut seen = vec!(vec!(false; instance.steps_per_job()); instance.num_jobs());

        for (machine, operations) in machines.iter().enumerate() {
            for operation in operations {
                let belongs = operation.job < instance.num_jobs()
                    && operation.step < instance.steps_per_job()
                    && operation.machine(instance) == machine;
                if !belongs {
                    return Err(GraphError::Misplaced { operation: *operation, machine });
                }
                if seen[operation.job][operation.step] {
                    return Err(GraphError::Duplicate(*operation));
                }
                seen[operation.job][operation.step] = true;
            }
        }

        if machines.len() != instance.num_machines() || seen.iter().flatten().any(|s| !s) {
            return Err(GraphError::Incomplete);
        }

        Ok(ResourceOrder {
            machines,
            placed: vec!(instance.steps_per_job(); instance.num_jobs()),
            steps: instance.steps_per_job(),
        })
    }

    /// Appends `operation` to its machine. Only the next unplaced step of a job is accepted.
    pub fn place(&mut self, instance: &(impl Instance + ?Sized), operation: Operation) -> Result<(), GraphError> {
        let expected = *self.placed.get(operation.job).ok_or(GraphError::UnknownOperation(operation))?;
        if operation.step >= self.steps {
            return Err(GraphError::UnknownOperation(operation));
        }
        if operation.step != expected {
            return Err(GraphError::OutOfOrder { job: operation.job, expected, found: operation });
        }

        let machine = operation.machine(instance);
        self.machines.get_mut(machine)
            .ok_or(GraphError::Misplaced { operation, machine })?
            .push(operation);
        self.placed[operation.job] += 1;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.placed.iter().all(|placed| *placed == self.steps)
    }

    /// Number of operations of `job` placed so far.
    pub fn placed(&self, job: usize) -> usize {
        self.placed[job]
    }

    /// The next operation of every job that still has unplaced operations.
    pub fn schedulable(&self) -> Vec<Operation> {
        self.placed.iter()
            .enumerate()
            .filter(|(_, placed)| **placed < self.steps)
            .map(|(job, placed)| Operation::new(job, *placed))
            .collect()
    }

    pub fn num_machines(&self) -> usize {
        self.machines.len()
    }

    pub fn machine_order(&self, machine: usize) -> &[Operation] {
        &self.machines[machine]
    }

    /// Position of `operation` within the sequence of `machine`.
    pub fn position(&self, machine: usize, operation: Operation) -> Option<usize> {
        self.machines.get(machine)?.iter().position(|o| *o == operation)
    }

    /// Exchanges the operations at two positions of one machine sequence.
    pub fn swap(&mut self, machine: usize, first: usize, second: usize) -> Result<(), GraphError> {
        let sequence = self.machines.get_mut(machine)
            .ok_or(GraphError::InvalidPosition { machine, position: first })?;
        for position in [first, second] {
            if position >= sequence.len() {
                return Err(GraphError::InvalidPosition { machine, position });
            }
        }
        sequence.swap(first, second);
        Ok(())
    }

    pub fn decode(&self, instance: &(impl Instance + ?Sized)) -> Result<Schedule, GraphError> {
        Schedule::decode(instance, self)
    }
}

/// Orders every machine by the start times of the schedule.
impl From<&Schedule> for ResourceOrder {
    fn from(schedule: &Schedule) -> ResourceOrder {
        let machines = (0..schedule.num_machines())
            .map(|machine| {
                schedule.operations()
                    .filter(|op| schedule.machine(*op) == machine)
                    .sorted_by_key(|op| (schedule.start(*op), schedule.end(*op), op.job))
                    .collect()
            })
            .collect();

        ResourceOrder {
            machines,
            placed: vec!(schedule.steps_per_job(); schedule.num_jobs()),
            steps: schedule.steps_per_job(),
        }
    }
}

impl std::fmt::Display for ResourceOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (machine, operations) in self.machines.iter().enumerate() {
            writeln!(f, "machine {}: {}", machine, operations.iter().join(" "))?;
        }
        Ok(())
    }
}
