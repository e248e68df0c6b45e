mod schedule;

use disjunctgraph::{ Operation, ResourceOrder };

use crate::problem::Problem;

// job0 = [(M0,3),(M1,2)], job1 = [(M1,2),(M0,4)]
fn two_by_two() -> Problem {
    Problem::from_reader(r"2 2
0 3 1 2
1 2 0 4".as_bytes()).unwrap()
}

fn three_by_three() -> Problem {
    Problem::from_reader(r"# three jobs on three machines
3 3
0 3 1 2 2 2
0 2 2 1 1 4
1 4 2 3 0 1".as_bytes()).unwrap()
}

/// Order given as `(job, step)` pairs per machine.
fn order(problem: &Problem, machines: Vec<Vec<(usize, usize)>>) -> ResourceOrder {
    let machines = machines.into_iter()
        .map(|ops| ops.into_iter().map(|(job, step)| Operation::new(job, step)).collect())
        .collect();
    ResourceOrder::from_machine_orders(problem, machines).unwrap()
}

/// Random instances of assorted shapes, the same on every run.
fn random_problems() -> impl Iterator<Item = Problem> {
    (0..12u64).map(|seed| Problem::random(2 + (seed as usize % 5), 2 + (seed as usize % 4), seed))
}
