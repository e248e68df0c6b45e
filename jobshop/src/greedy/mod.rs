use std::cmp::Reverse;
use std::str::FromStr;

use disjunctgraph::{ GraphError, Instance, Operation, ResourceOrder };
use log::debug;

use crate::problem::{ Problem, ProblemSolver };

/// What a dispatch rule can see of the order built so far.
pub struct Dispatch<'a> {
    instance: &'a dyn Instance,
    machine_free: Vec<u32>,
    job_ready: Vec<u32>,
    remaining: Vec<u32>,
}

impl<'a> Dispatch<'a> {
    fn new(instance: &'a dyn Instance) -> Self {
        let remaining = (0..instance.num_jobs())
            .map(|job| (0..instance.steps_per_job()).map(|step| instance.duration(job, step)).sum())
            .collect();

        Dispatch {
            instance,
            machine_free: vec!(0; instance.num_machines()),
            job_ready: vec!(0; instance.num_jobs()),
            remaining,
        }
    }

    pub fn instance(&self) -> &dyn Instance {
        self.instance
    }

    pub fn duration(&self, operation: Operation) -> u32 {
        operation.duration(self.instance)
    }

    /// Time at which the last operation placed on `machine` ends.
    pub fn machine_free(&self, machine: usize) -> u32 {
        self.machine_free[machine]
    }

    /// Time at which the last placed operation of `job` ends.
    pub fn job_ready(&self, job: usize) -> u32 {
        self.job_ready[job]
    }

    /// Processing time of the operations of `job` not placed yet.
    pub fn remaining(&self, job: usize) -> u32 {
        self.remaining[job]
    }

    pub fn earliest_start(&self, operation: Operation) -> u32 {
        std::cmp::max(self.job_ready[operation.job], self.machine_free[operation.machine(self.instance)])
    }

    fn record(&mut self, operation: Operation) {
        let end = self.earliest_start(operation) + self.duration(operation);
        self.machine_free[operation.machine(self.instance)] = end;
        self.job_ready[operation.job] = end;
        self.remaining[operation.job] -= self.duration(operation);
    }
}

/// Chooses the next operation to place among the eligible ones.
///
/// `eligible` holds the next unplaced operation of every unfinished job and is never empty.
pub trait DispatchRule {
    fn pick(&self, eligible: &[Operation], context: &Dispatch) -> Option<Operation>;
}

impl<F> DispatchRule for F where F: Fn(&[Operation], &Dispatch) -> Option<Operation> {
    fn pick(&self, eligible: &[Operation], context: &Dispatch) -> Option<Operation> {
        self(eligible, context)
    }
}

/// Shortest processing time first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Spt;

impl DispatchRule for Spt {
    fn pick(&self, eligible: &[Operation], context: &Dispatch) -> Option<Operation> {
        eligible.iter().copied().min_by_key(|op| context.duration(*op))
    }
}

/// Longest remaining processing time (of the job) first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lrpt;

impl DispatchRule for Lrpt {
    fn pick(&self, eligible: &[Operation], context: &Dispatch) -> Option<Operation> {
        eligible.iter().copied().min_by_key(|op| Reverse(context.remaining(op.job)))
    }
}

/// Only considers the operations that can start the earliest, then defers to `R`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Est<R>(pub R);

impl<R: DispatchRule> DispatchRule for Est<R> {
    fn pick(&self, eligible: &[Operation], context: &Dispatch) -> Option<Operation> {
        let earliest = eligible.iter().map(|op| context.earliest_start(*op)).min()?;
        let candidates = eligible.iter()
            .copied()
            .filter(|op| context.earliest_start(*op) == earliest)
            .collect::<Vec<_>>();

        self.0.pick(&candidates, context)
    }
}

/// The built-in rules, selectable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    Spt,
    Lrpt,
    EstSpt,
    EstLrpt,
}

impl Rule {
    pub const NAMES: [&'static str; 4] = ["spt", "lrpt", "est-spt", "est-lrpt"];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Spt => "spt",
            Rule::Lrpt => "lrpt",
            Rule::EstSpt => "est-spt",
            Rule::EstLrpt => "est-lrpt",
        }
    }
}

impl DispatchRule for Rule {
    fn pick(&self, eligible: &[Operation], context: &Dispatch) -> Option<Operation> {
        match self {
            Rule::Spt => Spt.pick(eligible, context),
            Rule::Lrpt => Lrpt.pick(eligible, context),
            Rule::EstSpt => Est(Spt).pick(eligible, context),
            Rule::EstLrpt => Est(Lrpt).pick(eligible, context),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dispatch rule `{0}`")]
pub struct UnknownRule(String);

impl FromStr for Rule {
    type Err = UnknownRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spt" => Ok(Rule::Spt),
            "lrpt" => Ok(Rule::Lrpt),
            "est-spt" => Ok(Rule::EstSpt),
            "est-lrpt" => Ok(Rule::EstLrpt),
            _ => Err(UnknownRule(s.to_owned())),
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds a complete order by repeatedly placing the operation `rule` picks.
///
/// Operations are placed in job order, so the result always decodes.
pub fn initial_solution<I, R>(instance: &I, rule: &R) -> Result<ResourceOrder, GraphError>
    where I: Instance, R: DispatchRule + ?Sized
{
    let mut order = ResourceOrder::new(instance);
    let mut context = Dispatch::new(instance);

    loop {
        let eligible = order.schedulable();
        if eligible.is_empty() {
            break;
        }

        let next = rule.pick(&eligible, &context).ok_or(GraphError::Incomplete)?;
        order.place(instance, next)?;
        context.record(next);
    }

    Ok(order)
}

pub struct GreedySolver<R> {
    rule: R,
}

impl<R: DispatchRule> GreedySolver<R> {
    pub fn new(rule: R) -> Self {
        GreedySolver { rule }
    }

    pub fn build<I: Instance>(&self, instance: &I) -> Result<ResourceOrder, GraphError> {
        let order = initial_solution(instance, &self.rule)?;
        debug!("greedy order built for {} jobs on {} machines", instance.num_jobs(), instance.num_machines());
        Ok(order)
    }
}

impl<R: DispatchRule> ProblemSolver for GreedySolver<R> {
    type Solution = Result<ResourceOrder, GraphError>;

    fn solve(&self, problem: &Problem) -> Self::Solution {
        self.build(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> Problem {
        Problem::from_reader(r"2 2
0 3 1 2
1 2 0 4".as_bytes()).unwrap()
    }

    fn ops(pairs: &[(usize, usize)]) -> Vec<Operation> {
        pairs.iter().map(|(job, step)| Operation::new(*job, *step)).collect()
    }

    #[test]
    fn spt_picks_shortest() {
        let problem = two_by_two();
        let order = GreedySolver::new(Spt).solve(&problem).unwrap();

        assert_eq!(order.machine_order(0), &ops(&[(0, 0), (1, 1)])[..]);
        assert_eq!(order.machine_order(1), &ops(&[(1, 0), (0, 1)])[..]);
        assert_eq!(order.decode(&problem).unwrap().makespan(), 7);
    }

    #[test]
    fn lrpt_and_est_rules() {
        let problem = two_by_two();

        for rule in &[Rule::Lrpt, Rule::EstSpt, Rule::EstLrpt] {
            let order = GreedySolver::new(*rule).solve(&problem).unwrap();
            assert_eq!(order.decode(&problem).unwrap().makespan(), 7, "rule {}", rule);
        }
    }

    #[test]
    fn closures_are_rules() {
        let problem = two_by_two();
        let last = |eligible: &[Operation], _: &Dispatch<'_>| eligible.last().copied();
        let order = GreedySolver::new(last).solve(&problem).unwrap();

        assert_eq!(order.machine_order(0), &ops(&[(1, 1), (0, 0)])[..]);
        assert_eq!(order.decode(&problem).unwrap().makespan(), 11);

        let nothing = |_: &[Operation], _: &Dispatch<'_>| -> Option<Operation> { None };
        assert_eq!(GreedySolver::new(nothing).solve(&problem), Err(GraphError::Incomplete));
    }

    #[test]
    fn dispatch_tracks_placed_operations() {
        let problem = two_by_two();
        let mut context = Dispatch::new(&problem);

        assert_eq!(context.instance().num_jobs(), 2);
        context.record(Operation::new(1, 0));
        assert_eq!(context.job_ready(1), 2);
        assert_eq!(context.machine_free(1), 2);
        assert_eq!(context.remaining(1), 4);
        assert_eq!(context.earliest_start(Operation::new(1, 1)), 2);
        assert_eq!(context.earliest_start(Operation::new(0, 0)), 0);
    }

    #[test]
    fn rules_parse_by_name() {
        for name in Rule::NAMES.iter() {
            assert_eq!(name.parse::<Rule>().unwrap().name(), *name);
        }
        assert!("fifo".parse::<Rule>().is_err());
    }
}
