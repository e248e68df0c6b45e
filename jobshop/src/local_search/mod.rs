mod neighborhood;
pub mod descent;
pub mod tabu;

use std::time::{ Duration, Instant };

use disjunctgraph::{ Instance, ResourceOrder, Schedule };
use log::warn;

pub use neighborhood::{ blocks, moves_for, neighborhood, Block, Swap };
pub use descent::{ Descent, DescentState };
pub use tabu::{ Tabu, TabuList, TabuState };

/// Limits on a local search run. Whichever bound is hit first ends the run.
///
/// The budget is checked once at the top of every iteration, an iteration in flight
/// is never interrupted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Budget {
    pub time_limit: Option<Duration>,
    pub max_iterations: Option<usize>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Budget { time_limit: None, max_iterations: None }
    }

    pub fn time(limit: Duration) -> Self {
        Budget::unlimited().with_time_limit(limit)
    }

    pub fn iterations(max: usize) -> Self {
        Budget::unlimited().with_max_iterations(max)
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    fn exhausted(&self, started: Instant, iterations: usize) -> Option<ExitReason> {
        if self.time_limit.map_or(false, |limit| started.elapsed() >= limit) {
            Some(ExitReason::TimeExpired)
        } else if self.max_iterations.map_or(false, |max| iterations >= max) {
            Some(ExitReason::IterationLimitReached)
        } else {
            None
        }
    }
}

/// Why a search stopped. None of these is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// No move improves the current solution.
    Converged,
    TimeExpired,
    IterationLimitReached,
    /// Every move was tabu or infeasible.
    EmptyNeighborhood,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            ExitReason::Converged => "converged",
            ExitReason::TimeExpired => "time expired",
            ExitReason::IterationLimitReached => "iteration limit reached",
            ExitReason::EmptyNeighborhood => "empty neighborhood",
        };
        f.write_str(reason)
    }
}

/// Result of a finished search: the best order found and its schedule.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub order: ResourceOrder,
    pub schedule: Schedule,
    pub exit_reason: ExitReason,
    pub iterations: usize,
}

impl Outcome {
    pub fn makespan(&self) -> u32 {
        self.schedule.makespan()
    }
}

/// What a single iteration of a search state machine did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Moved(Swap),
    Stopped(ExitReason),
}

/// A neighbor of the current order, already decoded.
pub(crate) struct Candidate {
    pub swap: Swap,
    pub order: ResourceOrder,
    pub schedule: Schedule,
}

impl Candidate {
    fn try_new<I: Instance>(instance: &I, current: &ResourceOrder, swap: Swap) -> Option<Candidate> {
        let mut order = current.clone();
        let decoded = order.swap(swap.machine, swap.first, swap.second)
            .and_then(|()| order.decode(instance));

        match decoded {
            Ok(schedule) => Some(Candidate { swap, order, schedule }),
            Err(e) => {
                warn!("dropping move {}: {}", swap, e);
                None
            },
        }
    }

    pub fn makespan(&self) -> u32 {
        self.schedule.makespan()
    }
}

/// Applies every move to its own copy of `current` and decodes it, dropping infeasible ones.
///
/// With more than one thread the moves are split into chunks decoded concurrently.
/// Candidates are returned in the order of `moves` either way.
pub(crate) fn evaluate<I>(instance: &I, current: &ResourceOrder, moves: &[Swap], threads: usize) -> Vec<Candidate>
    where I: Instance + Sync
{
    if threads <= 1 || moves.len() < 2 {
        return moves.iter()
            .filter_map(|swap| Candidate::try_new(instance, current, *swap))
            .collect();
    }

    let chunk_size = (moves.len() + threads - 1) / threads;

    std::thread::scope(|scope| {
        let handles = moves.chunks(chunk_size)
            .map(|chunk| scope.spawn(move || {
                chunk.iter()
                    .filter_map(|swap| Candidate::try_new(instance, current, *swap))
                    .collect::<Vec<_>>()
            }))
            .collect::<Vec<_>>();

        let mut candidates = Vec::with_capacity(moves.len());
        for handle in handles {
            match handle.join() {
                Ok(chunk) => candidates.extend(chunk),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        candidates
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Problem;
    use crate::greedy::{ initial_solution, Rule };

    #[test]
    fn budget_checks_both_bounds() {
        let started = Instant::now();

        assert_eq!(Budget::unlimited().exhausted(started, 1_000_000), None);
        assert_eq!(Budget::iterations(3).exhausted(started, 2), None);
        assert_eq!(Budget::iterations(3).exhausted(started, 3), Some(ExitReason::IterationLimitReached));
        assert_eq!(
            Budget::iterations(3).with_time_limit(Duration::from_secs(0)).exhausted(started, 0),
            Some(ExitReason::TimeExpired)
        );
    }

    #[test]
    fn parallel_evaluation_keeps_move_order() {
        let problem = Problem::random(8, 6, 3);
        let order = initial_solution(&problem, &Rule::Spt).unwrap();
        let schedule = order.decode(&problem).unwrap();
        let moves = neighborhood(&order, &schedule);

        let serial = evaluate(&problem, &order, &moves, 1);
        let parallel = evaluate(&problem, &order, &moves, 3);

        assert_eq!(serial.len(), moves.len());
        assert_eq!(
            serial.iter().map(|c| (c.swap, c.makespan())).collect::<Vec<_>>(),
            parallel.iter().map(|c| (c.swap, c.makespan())).collect::<Vec<_>>()
        );
    }

    #[test]
    fn candidates_are_copies() {
        let problem = Problem::random(4, 4, 11);
        let order = initial_solution(&problem, &Rule::EstLrpt).unwrap();
        let swap = Swap::new(0, 0, 1);

        let candidate = Candidate::try_new(&problem, &order, swap);
        if let Some(candidate) = candidate {
            assert_eq!(candidate.order.machine_order(0)[0], order.machine_order(0)[1]);
            assert_eq!(candidate.order.machine_order(0)[1], order.machine_order(0)[0]);
        }
        assert!(Candidate::try_new(&problem, &order, Swap::new(0, 0, 4)).is_none());
    }
}
