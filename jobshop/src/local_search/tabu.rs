use std::time::{ Duration, Instant };

use disjunctgraph::{ Instance, ResourceOrder, Schedule };
use hashbrown::HashMap;
use log::{ debug, trace };

use crate::SolveError;
use crate::greedy::{ initial_solution, DispatchRule };
use crate::problem::{ Problem, ProblemSolver };
use super::{ evaluate, neighborhood, Budget, ExitReason, Outcome, Step, Swap };

pub const DEFAULT_TENURE: usize = 10;
pub const DEFAULT_MAX_ITERATIONS: usize = 500;
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(2);

/// Moves that may not be applied, keyed by move, each until some iteration.
#[derive(Clone, Debug)]
pub struct TabuList {
    tenure: usize,
    // Iteration from which the move is allowed again.
    until: HashMap<Swap, usize>,
}

impl TabuList {
    pub fn new(tenure: usize) -> Self {
        TabuList { tenure, until: HashMap::new() }
    }

    pub fn tenure(&self) -> usize {
        self.tenure
    }

    /// Forbids undoing `applied`, which was applied at `iteration`.
    pub fn forbid(&mut self, applied: Swap, iteration: usize) {
        self.until.insert(applied.reversed(), iteration + self.tenure);
    }

    pub fn is_tabu(&self, swap: &Swap, iteration: usize) -> bool {
        self.until.get(swap).map_or(false, |until| iteration < *until)
    }

    fn expire(&mut self, iteration: usize) {
        self.until.retain(|_, until| *until > iteration);
    }

    pub fn len(&self) -> usize {
        self.until.len()
    }

    pub fn is_empty(&self) -> bool {
        self.until.is_empty()
    }
}

/// Tabu search over the block neighborhood, seeded by a dispatch rule.
pub struct Tabu<R> {
    rule: R,
    tenure: usize,
    budget: Budget,
    threads: usize,
}

impl<R: DispatchRule> Tabu<R> {
    pub fn new(rule: R) -> Self {
        Tabu {
            rule,
            tenure: DEFAULT_TENURE,
            budget: Budget::iterations(DEFAULT_MAX_ITERATIONS).with_time_limit(DEFAULT_TIME_LIMIT),
            threads: 1,
        }
    }

    pub fn with_tenure(mut self, tenure: usize) -> Self {
        self.tenure = tenure;
        self
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

    /// Searches from `seed` until the budget runs out or no move is allowed,
    /// and returns the best order seen on the way.
    pub fn improve<I: Instance + Sync>(&self, instance: &I, seed: ResourceOrder) -> Result<Outcome, SolveError> {
        let started = Instant::now();
        let mut state = TabuState::new(instance, seed, self.tenure, self.threads)?;
        debug!("tabu search starting from makespan {}, tenure {}", state.best_makespan(), self.tenure);

        let exit_reason = loop {
            if let Some(reason) = self.budget.exhausted(started, state.iteration()) {
                break reason;
            }
            if let Step::Stopped(reason) = state.step() {
                break reason;
            }
        };

        debug!("tabu search stopped ({}) after {} iterations, best makespan {}",
            exit_reason, state.iteration(), state.best_makespan());
        Ok(state.into_outcome(exit_reason))
    }
}

impl<R: DispatchRule> ProblemSolver for Tabu<R> {
    type Solution = Result<Outcome, SolveError>;

    fn solve(&self, problem: &Problem) -> Self::Solution {
        self.run(problem)
    }
}

/// The tabu search as a state machine, advanced one iteration at a time.
pub struct TabuState<'i, I> {
    instance: &'i I,
    current: ResourceOrder,
    schedule: Schedule,
    best_order: ResourceOrder,
    best_schedule: Schedule,
    tabu: TabuList,
    iteration: usize,
    threads: usize,
}

impl<'i, I: Instance + Sync> TabuState<'i, I> {
    pub fn new(instance: &'i I, seed: ResourceOrder, tenure: usize, threads: usize) -> Result<Self, SolveError> {
        Self::with_tabu_list(instance, seed, TabuList::new(tenure), threads)
    }

    /// Starts from `seed` with moves already forbidden by `tabu`, counting iterations from 0.
    pub fn with_tabu_list(instance: &'i I, seed: ResourceOrder, tabu: TabuList, threads: usize) -> Result<Self, SolveError> {
        let schedule = seed.decode(instance).map_err(SolveError::InfeasibleSeed)?;

        Ok(TabuState {
            instance,
            best_order: seed.clone(),
            best_schedule: schedule.clone(),
            current: seed,
            schedule,
            tabu,
            iteration: 0,
            threads,
        })
    }

    /// Applies the best allowed move, even if it makes the current order worse.
    ///
    /// A tabu move is allowed only if it beats the best makespan seen so far.
    pub fn step(&mut self) -> Step {
        let moves = neighborhood(&self.current, &self.schedule);
        let best_makespan = self.best_makespan();
        let iteration = self.iteration;
        let tabu = &self.tabu;

        let chosen = evaluate(self.instance, &self.current, &moves, self.threads)
            .into_iter()
            .filter(|candidate| !tabu.is_tabu(&candidate.swap, iteration) || candidate.makespan() < best_makespan)
            .min_by_key(|candidate| candidate.makespan());

        let candidate = match chosen {
            Some(candidate) => candidate,
            None => return Step::Stopped(ExitReason::EmptyNeighborhood),
        };

        trace!("iteration {}: {} moves, {} -> {} with {}",
            iteration, moves.len(), self.schedule.makespan(), candidate.makespan(), candidate.swap);

        self.tabu.forbid(candidate.swap, iteration);
        self.iteration += 1;
        self.tabu.expire(self.iteration);

        if candidate.makespan() < best_makespan {
            debug!("iteration {}: new best makespan {}", iteration, candidate.makespan());
            self.best_order = candidate.order.clone();
            self.best_schedule = candidate.schedule.clone();
        }

        self.current = candidate.order;
        self.schedule = candidate.schedule;
        Step::Moved(candidate.swap)
    }

    /// Whether `swap` would be rejected at the next iteration, aspiration aside.
    pub fn is_tabu(&self, swap: &Swap) -> bool {
        self.tabu.is_tabu(swap, self.iteration)
    }

    pub fn tabu_list(&self) -> &TabuList {
        &self.tabu
    }

    pub fn current(&self) -> &ResourceOrder {
        &self.current
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn best_schedule(&self) -> &Schedule {
        &self.best_schedule
    }

    pub fn best_makespan(&self) -> u32 {
        self.best_schedule.makespan()
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn into_outcome(self, exit_reason: ExitReason) -> Outcome {
        Outcome {
            order: self.best_order,
            schedule: self.best_schedule,
            exit_reason,
            iterations: self.iteration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabu_entries_expire_after_tenure() {
        let mut list = TabuList::new(3);
        let swap = Swap::new(1, 4, 5);

        list.forbid(swap, 7);
        assert!(!list.is_tabu(&swap, 7 + 3));
        for iteration in 8..10 {
            assert!(list.is_tabu(&swap, iteration));
        }
        assert!(!list.is_tabu(&Swap::new(1, 5, 6), 8));

        assert_eq!(list.tenure(), 3);
        assert_eq!(list.len(), 1);
        list.expire(10);
        assert!(list.is_empty());
    }
}
