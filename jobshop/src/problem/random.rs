use rand::{ rngs::StdRng, seq::SliceRandom, Rng, SeedableRng };

use super::{ Activity, Problem };

impl Problem {
    /// Taillard-style instance: every job visits the machines in a random order,
    /// durations are uniform in `1..=99`. The same seed always gives the same instance.
    pub fn random(jobs: usize, machines: usize, seed: u64) -> Problem {
        let mut rng = StdRng::seed_from_u64(seed);

        let jobs = (0..jobs)
            .map(|_| {
                let mut routing = (0..machines).collect::<Vec<_>>();
                routing.shuffle(&mut rng);
                routing.into_iter()
                    .map(|machine_id| Activity { machine_id, process_time: rng.gen_range(1..=99) })
                    .collect()
            })
            .collect();

        Problem { machines, jobs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_instances_are_valid_and_reproducible() {
        let problem = Problem::random(5, 4, 42);

        assert_eq!(problem, Problem::random(5, 4, 42));
        assert_eq!(Problem::new(problem.machines, problem.jobs.clone()).unwrap(), problem);
        assert!(problem.jobs.iter().flatten().all(|a| (1..=99).contains(&a.process_time)));
    }
}
