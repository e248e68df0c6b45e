use disjunctgraph::{ Operation, ResourceOrder };

use crate::greedy::{ initial_solution, Rule };
use crate::problem::Problem;
use super::{ order, random_problems, three_by_three, two_by_two };

const RULES: [Rule; 4] = [Rule::Spt, Rule::Lrpt, Rule::EstSpt, Rule::EstLrpt];

#[test]
fn optimal_two_by_two() {
    let problem = two_by_two();
    let schedule = order(&problem, vec!(
        vec!((0, 0), (1, 1)),
        vec!((1, 0), (0, 1)),
    )).decode(&problem).unwrap();

    assert_eq!(schedule.makespan(), 7);
    assert_eq!(schedule.makespan(), problem.lower_bound());
}

#[test]
fn seeds_always_decode() {
    for problem in random_problems() {
        for rule in RULES.iter() {
            let schedule = initial_solution(&problem, rule).unwrap().decode(&problem).unwrap();

            assert!(schedule.respects_precedences());
            assert!(schedule.makespan() >= problem.lower_bound());
            let latest = schedule.operations().map(|op| schedule.end(op)).max().unwrap();
            assert_eq!(schedule.makespan(), latest);
        }
    }
}

#[test]
fn schedule_order_round_trip() {
    for problem in random_problems() {
        for rule in RULES.iter() {
            let original = initial_solution(&problem, rule).unwrap();
            let schedule = original.decode(&problem).unwrap();
            let rebuilt = ResourceOrder::from(&schedule);

            assert_eq!(rebuilt, original);
            assert_eq!(rebuilt.decode(&problem).unwrap(), schedule);
        }
    }
}

#[test]
fn critical_paths_are_tight() {
    for problem in random_problems() {
        let schedule = initial_solution(&problem, &Rule::Lrpt).unwrap().decode(&problem).unwrap();
        let path = schedule.critical_path();

        assert_eq!(schedule.start(path[0]), 0);
        assert_eq!(schedule.end(*path.last().unwrap()), schedule.makespan());
        for pair in path.windows(2) {
            assert_eq!(schedule.end(pair[0]), schedule.start(pair[1]));
        }
        let span = path.iter().map(|op| schedule.duration(*op)).sum::<u32>();
        assert_eq!(span, schedule.makespan());
    }
}

#[test]
fn critical_operations_are_bottlenecks() {
    let problem = three_by_three();
    let order = order(&problem, vec!(
        vec!((1, 0), (0, 0), (2, 2)),
        vec!((2, 0), (0, 1), (1, 2)),
        vec!((1, 1), (2, 1), (0, 2)),
    ));
    let schedule = order.decode(&problem).unwrap();
    let path = schedule.critical_path();

    assert_eq!(schedule.makespan(), 11);
    assert_eq!(path, vec!(
        Operation::new(1, 0),
        Operation::new(0, 0),
        Operation::new(0, 1),
        Operation::new(1, 2),
    ));

    for operation in path {
        let mut shorter = problem.clone();
        shorter.jobs[operation.job][operation.step].process_time -= 1;

        let makespan = order.decode(&shorter).unwrap().makespan();
        assert_eq!(makespan, 10, "shortening {}", operation);
    }
}

#[test]
fn longest_accepted_instance_decodes() {
    let problem = Problem::from_reader("2 1\n0 4000000000\n0 294967295".as_bytes()).unwrap();

    for rule in RULES.iter() {
        let schedule = initial_solution(&problem, rule).unwrap().decode(&problem).unwrap();
        assert_eq!(schedule.makespan(), u32::MAX);
        assert_eq!(schedule.critical_path().len(), 2);
    }
}
