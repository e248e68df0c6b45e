use std::time::Instant;

use disjunctgraph::{ Instance, ResourceOrder, Schedule };
use log::{ debug, trace };

use crate::SolveError;
use crate::greedy::{ initial_solution, DispatchRule };
use crate::problem::{ Problem, ProblemSolver };
use super::{ evaluate, neighborhood, Budget, ExitReason, Outcome, Step };

/// Best-improvement descent over the block neighborhood, seeded by a dispatch rule.
pub struct Descent<R> {
    rule: R,
    budget: Budget,
    threads: usize,
}

impl<R: DispatchRule> Descent<R> {
    pub fn new(rule: R) -> Self {
        Descent { rule, budget: Budget::unlimited(), threads: 1 }
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = std::cmp::max(threads, 1);
        self
    }

    pub fn run<I: Instance + Sync>(&self, instance: &I) -> Result<Outcome, SolveError> {
        let seed = initial_solution(instance, &self.rule).map_err(SolveError::InfeasibleSeed)?;
        self.improve(instance, seed)
    }

    /// Descends from `seed` until no move improves it or the budget runs out.
    pub fn improve<I: Instance + Sync>(&self, instance: &I, seed: ResourceOrder) -> Result<Outcome, SolveError> {
        let started = Instant::now();
        let mut state = DescentState::new(instance, seed, self.threads)?;
        debug!("descent starting from makespan {}", state.makespan());

        let exit_reason = loop {
            if let Some(reason) = self.budget.exhausted(started, state.iterations()) {
                break reason;
            }
            if let Step::Stopped(reason) = state.step() {
                break reason;
            }
        };

        debug!("descent stopped ({}) after {} iterations at makespan {}", exit_reason, state.iterations(), state.makespan());
        Ok(state.into_outcome(exit_reason))
    }
}

impl<R: DispatchRule> ProblemSolver for Descent<R> {
    type Solution = Result<Outcome, SolveError>;

    fn solve(&self, problem: &Problem) -> Self::Solution {
        self.run(problem)
    }
}

/// The descent as a state machine, advanced one iteration at a time.
pub struct DescentState<'i, I> {
    instance: &'i I,
    order: ResourceOrder,
    schedule: Schedule,
    iterations: usize,
    threads: usize,
}

impl<'i, I: Instance + Sync> DescentState<'i, I> {
    pub fn new(instance: &'i I, seed: ResourceOrder, threads: usize) -> Result<Self, SolveError> {
        let schedule = seed.decode(instance).map_err(SolveError::InfeasibleSeed)?;
        Ok(DescentState { instance, order: seed, schedule, iterations: 0, threads })
    }

    /// Moves to the best neighbor if it is strictly better, otherwise reports convergence.
    pub fn step(&mut self) -> Step {
        let moves = neighborhood(&self.order, &self.schedule);
        let best = evaluate(self.instance, &self.order, &moves, self.threads)
            .into_iter()
            .min_by_key(|candidate| candidate.makespan());

        match best {
            Some(candidate) if candidate.makespan() < self.schedule.makespan() => {
                trace!("iteration {}: {} moves, {} -> {} with {}",
                    self.iterations, moves.len(), self.schedule.makespan(), candidate.makespan(), candidate.swap);
                self.order = candidate.order;
                self.schedule = candidate.schedule;
                self.iterations += 1;
                Step::Moved(candidate.swap)
            },
            _ => Step::Stopped(ExitReason::Converged),
        }
    }

    pub fn order(&self) -> &ResourceOrder {
        &self.order
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn makespan(&self) -> u32 {
        self.schedule.makespan()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn into_outcome(self, exit_reason: ExitReason) -> Outcome {
        Outcome {
            order: self.order,
            schedule: self.schedule,
            exit_reason,
            iterations: self.iterations,
        }
    }
}
