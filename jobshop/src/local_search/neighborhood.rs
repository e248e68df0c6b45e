use disjunctgraph::{ Operation, ResourceOrder, Schedule };

/// A run of at least two critical operations processed back to back on one machine,
/// given by positions in that machine's sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    pub machine: usize,
    pub first: usize,
    pub last: usize,
}

impl Block {
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Exchange of two positions in the sequence of one machine, with `first < second`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Swap {
    pub machine: usize,
    pub first: usize,
    pub second: usize,
}

impl Swap {
    pub fn new(machine: usize, a: usize, b: usize) -> Self {
        Swap { machine, first: std::cmp::min(a, b), second: std::cmp::max(a, b) }
    }

    /// The move undoing this one. Exchanging two positions is its own inverse.
    pub fn reversed(&self) -> Swap {
        *self
    }
}

impl std::fmt::Display for Swap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m{}[{} <> {}]", self.machine, self.first, self.second)
    }
}

/// Splits a critical path into blocks, in path order.
///
/// Consecutive path operations form a block when they share a machine and sit at
/// adjacent positions of its sequence. Runs of a single operation are dropped.
pub fn blocks(order: &ResourceOrder, schedule: &Schedule, path: &[Operation]) -> Vec<Block> {
    let mut blocks = vec!();
    let mut current: Option<Block> = None;

    for operation in path {
        let machine = schedule.machine(*operation);
        let position = match order.position(machine, *operation) {
            Some(position) => position,
            None => continue,
        };

        current = match current {
            Some(block) if block.machine == machine && block.last + 1 == position => {
                Some(Block { last: position, ..block })
            },
            previous => {
                blocks.extend(previous.filter(|b| b.len() >= 2));
                Some(Block { machine, first: position, last: position })
            },
        };
    }
    blocks.extend(current.filter(|b| b.len() >= 2));

    blocks
}

/// Swaps at the boundaries of a block: the single pair of a 2-block, otherwise the
/// first two and the last two operations.
pub fn moves_for(block: &Block) -> Vec<Swap> {
    match block.len() {
        0 | 1 => vec!(),
        2 => vec!(Swap::new(block.machine, block.first, block.last)),
        _ => vec!(
            Swap::new(block.machine, block.first, block.first + 1),
            Swap::new(block.machine, block.last - 1, block.last),
        ),
    }
}

/// All boundary swaps of the blocks on the critical path of `schedule`.
///
/// `schedule` has to be the decoding of `order`.
pub fn neighborhood(order: &ResourceOrder, schedule: &Schedule) -> Vec<Swap> {
    let path = schedule.critical_path();
    blocks(order, schedule, &path)
        .iter()
        .flat_map(moves_for)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Problem;

    #[test]
    fn block_moves() {
        assert!(moves_for(&Block { machine: 0, first: 3, last: 3 }).is_empty());
        assert_eq!(moves_for(&Block { machine: 1, first: 2, last: 3 }), vec!(Swap::new(1, 2, 3)));
        assert_eq!(moves_for(&Block { machine: 2, first: 0, last: 3 }), vec!(
            Swap::new(2, 0, 1),
            Swap::new(2, 2, 3),
        ));
        assert_eq!(moves_for(&Block { machine: 2, first: 4, last: 6 }), vec!(
            Swap::new(2, 4, 5),
            Swap::new(2, 5, 6),
        ));
    }

    #[test]
    fn swaps_are_normalized() {
        assert_eq!(Swap::new(0, 5, 2), Swap { machine: 0, first: 2, second: 5 });
        assert_eq!(Swap::new(0, 5, 2).reversed(), Swap::new(0, 2, 5));
    }

    #[test]
    fn blocks_follow_critical_path() {
        let problem = Problem::from_reader(r"2 2
0 3 1 2
1 2 0 4".as_bytes()).unwrap();
        // M0: job 1 then job 0, M1: job 1 then job 0
        let order = ResourceOrder::from_machine_orders(&problem, vec!(
            vec!(Operation::new(1, 1), Operation::new(0, 0)),
            vec!(Operation::new(1, 0), Operation::new(0, 1)),
        )).unwrap();
        let schedule = order.decode(&problem).unwrap();

        // (1,0) m1, (1,1) m0, (0,0) m0, (0,1) m1
        assert_eq!(schedule.critical_path(), vec!(
            Operation::new(1, 0),
            Operation::new(1, 1),
            Operation::new(0, 0),
            Operation::new(0, 1),
        ));
        assert_eq!(neighborhood(&order, &schedule), vec!(Swap::new(0, 0, 1)));

        let path = vec!(Operation::new(1, 1), Operation::new(0, 0));
        assert_eq!(blocks(&order, &schedule, &path), vec!(Block { machine: 0, first: 0, last: 1 }));
    }
}
