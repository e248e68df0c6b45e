use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{ Duration, Instant };

use anyhow::{ anyhow, bail, Context, Result };
use clap::{ arg, ArgMatches, Command };
use disjunctgraph::labeller::ScheduleGraph;
use disjunctgraph::{ ResourceOrder, Schedule };
use jobshop::greedy::{ GreedySolver, Rule };
use jobshop::local_search::{ Budget, Descent, ExitReason, Tabu };
use jobshop::local_search::tabu::{ DEFAULT_MAX_ITERATIONS, DEFAULT_TIME_LIMIT };
use jobshop::problem::{ Problem, ProblemSolver };
use log::info;

fn cli() -> Command {
    Command::new("jobshop")
        .about("Job-shop scheduling with dispatch rules, descent and tabu search")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("solve")
                .about("Solves an instance file")
                .arg(arg!(<INSTANCE> "Path to the instance file").value_parser(clap::value_parser!(PathBuf)))
                .arg(
                    arg!(--solver <SOLVER> "Search to run")
                        .value_parser(["greedy", "descent", "tabu"])
                        .default_value("tabu"),
                )
                .arg(
                    arg!(--rule <RULE> "Dispatch rule building the seed solution [default: spt for descent, est-lrpt otherwise]")
                        .value_parser(Rule::NAMES),
                )
                .arg(arg!(--"time-limit" <SECS> "Time limit in seconds").value_parser(clap::value_parser!(f64)))
                .arg(arg!(--"max-iterations" <N> "Maximum number of iterations").value_parser(clap::value_parser!(usize)))
                .arg(
                    arg!(--tenure <N> "Iterations a move stays tabu")
                        .default_value("10")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--threads <N> "Threads decoding neighbors")
                        .default_value("1")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--dot <PATH> "Writes the solved disjunctive graph in Graphviz format")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Prints a random instance")
                .arg(arg!(<JOBS> "Number of jobs").value_parser(clap::value_parser!(usize)))
                .arg(arg!(<MACHINES> "Number of machines").value_parser(clap::value_parser!(usize)))
                .arg(
                    arg!(--seed <SEED> "Random seed")
                        .default_value("0")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("solve", sub)) => solve(sub),
        Some(("generate", sub)) => generate(sub),
        _ => Err(anyhow!("Invalid subcommand")),
    }
}

fn solve(matches: &ArgMatches) -> Result<()> {
    let path = required::<PathBuf>(matches, "INSTANCE")?;
    let problem = Problem::read(path).with_context(|| format!("Failed to read instance {}", path.display()))?;
    let threads = *required::<usize>(matches, "threads")?;
    let tenure = *required::<usize>(matches, "tenure")?;
    let solver = required::<String>(matches, "solver")?.as_str();
    let rule = match matches.get_one::<String>("rule") {
        Some(name) => name.parse::<Rule>()?,
        None if solver == "descent" => Rule::Spt,
        None => Rule::EstLrpt,
    };

    info!("{} jobs, {} machines, solver {} seeded by {}", problem.jobs.len(), problem.machines, solver, rule);
    let started = Instant::now();

    let (order, schedule, summary) = match solver {
        "greedy" => {
            let order = GreedySolver::new(rule).solve(&problem)?;
            let schedule = order.decode(&problem)?;
            (order, schedule, None)
        },
        "descent" => {
            let outcome = Descent::new(rule)
                .with_budget(budget(matches, Budget::unlimited())?)
                .with_threads(threads)
                .solve(&problem)?;
            (outcome.order, outcome.schedule, Some((outcome.exit_reason, outcome.iterations)))
        },
        "tabu" => {
            let defaults = Budget::iterations(DEFAULT_MAX_ITERATIONS).with_time_limit(DEFAULT_TIME_LIMIT);
            let outcome = Tabu::new(rule)
                .with_tenure(tenure)
                .with_budget(budget(matches, defaults)?)
                .with_threads(threads)
                .solve(&problem)?;
            (outcome.order, outcome.schedule, Some((outcome.exit_reason, outcome.iterations)))
        },
        other => bail!("Unknown solver {}", other),
    };

    report(&problem, &order, &schedule, summary, started.elapsed());

    if let Some(path) = matches.get_one::<PathBuf>("dot") {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        ScheduleGraph::new(&schedule).render(&mut BufWriter::new(file))?;
    }

    Ok(())
}

fn generate(matches: &ArgMatches) -> Result<()> {
    let jobs = *required::<usize>(matches, "JOBS")?;
    let machines = *required::<usize>(matches, "MACHINES")?;
    let seed = *required::<u64>(matches, "seed")?;
    if jobs == 0 || machines == 0 {
        bail!("An instance needs at least one job and one machine");
    }

    print!("{}", Problem::random(jobs, machines, seed));
    Ok(())
}

fn required<'a, T>(matches: &'a ArgMatches, id: &str) -> Result<&'a T>
    where T: Clone + Send + Sync + 'static
{
    matches.get_one::<T>(id).ok_or_else(|| anyhow!("Missing argument {}", id))
}

/// Uses the bounds given on the command line, or `default` if there are none.
fn budget(matches: &ArgMatches, default: Budget) -> Result<Budget> {
    let time_limit = match matches.get_one::<f64>("time-limit") {
        Some(secs) => {
            let limit = Duration::try_from_secs_f64(*secs).with_context(|| format!("Invalid time limit {}", secs))?;
            Some(limit)
        },
        None => None,
    };
    let max_iterations = matches.get_one::<usize>("max-iterations").copied();

    if time_limit.is_none() && max_iterations.is_none() {
        Ok(default)
    } else {
        Ok(Budget { time_limit, max_iterations })
    }
}

fn report(problem: &Problem, order: &ResourceOrder, schedule: &Schedule, summary: Option<(ExitReason, usize)>, elapsed: Duration) {
    println!("makespan: {} (lower bound {})", schedule.makespan(), problem.lower_bound());
    if let Some((exit_reason, iterations)) = summary {
        println!("stopped: {} after {} iterations", exit_reason, iterations);
    }
    println!("time: {:.3}s", elapsed.as_secs_f64());

    for machine in 0..order.num_machines() {
        let line = order.machine_order(machine)
            .iter()
            .map(|op| format!("{}[{}, {})", op, schedule.start(*op), schedule.end(*op)))
            .collect::<Vec<_>>()
            .join(" ");
        println!("m{}: {}", machine, line);
    }
}
