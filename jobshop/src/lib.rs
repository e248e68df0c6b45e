pub mod problem;
pub mod greedy;
pub mod local_search;

#[cfg(test)]
mod tests;

use std::time::Duration;

use disjunctgraph::GraphError;

use crate::greedy::{ Est, Lrpt };
use crate::local_search::{ Budget, Outcome, Tabu };
use crate::problem::{ Problem, ProblemError };

pub use disjunctgraph::{ Instance, Operation, ResourceOrder, Schedule };

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// The seed order could not be decoded, so there is nothing to improve.
    #[error("seed solution cannot be decoded")]
    InfeasibleSeed(#[source] GraphError),
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

/// Runs tabu search from an earliest-start / longest-remaining-work seed until
/// `time_budget` is spent or no move is allowed.
pub fn solve(problem: &Problem, time_budget: Duration) -> Result<Outcome, SolveError> {
    Tabu::new(Est(Lrpt))
        .with_budget(Budget::time(time_budget))
        .run(problem)
}
