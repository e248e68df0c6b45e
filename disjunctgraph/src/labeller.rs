use std::borrow::Cow;
use std::io::{ self, Write };

use hashbrown::HashSet;

use crate::{ Operation, Schedule };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precedence {
    Job,
    Machine,
}

pub type Edge = (Operation, Operation, Precedence);

/// Disjunctive graph of a decoded schedule, with every disjunction fixed by the machine orders.
pub struct ScheduleGraph<'s> {
    schedule: &'s Schedule,
    critical: HashSet<(Operation, Operation)>,
}

impl<'s> ScheduleGraph<'s> {
    pub fn new(schedule: &'s Schedule) -> Self {
        let critical = schedule.critical_path()
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();

        ScheduleGraph { schedule, critical }
    }

    pub fn is_critical(&self, edge: &Edge) -> bool {
        self.critical.contains(&(edge.0, edge.1))
    }

    pub fn render<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        dot::render(self, writer)
    }
}

impl<'a, 's> dot::Labeller<'a, Operation, Edge> for ScheduleGraph<'s> {
    fn graph_id(&'a self) -> dot::Id<'a> {
        dot::Id::new("schedule").expect("static graph id is valid")
    }

    fn node_id(&'a self, n: &Operation) -> dot::Id<'a> {
        dot::Id::new(format!("J{}S{}", n.job, n.step)).expect("generated node id is valid")
    }

    fn node_label<'b>(&'b self, n: &Operation) -> dot::LabelText<'b> {
        let label = format!("{} m{} [{}, {})", n, self.schedule.machine(*n), self.schedule.start(*n), self.schedule.end(*n));
        dot::LabelText::LabelStr(label.into())
    }

    fn edge_label<'b>(&'b self, _: &Edge) -> dot::LabelText<'b> {
        dot::LabelText::LabelStr("".into())
    }

    fn edge_style(&'a self, e: &Edge) -> dot::Style {
        if self.is_critical(e) {
            dot::Style::Bold
        } else if e.2 == Precedence::Machine {
            dot::Style::Dashed
        } else {
            dot::Style::Solid
        }
    }
}

impl<'a, 's> dot::GraphWalk<'a, Operation, Edge> for ScheduleGraph<'s> {
    fn nodes(&'a self) -> dot::Nodes<'a, Operation> {
        Cow::Owned(self.schedule.operations().collect())
    }

    fn edges(&'a self) -> dot::Edges<'a, Edge> {
        let schedule = self.schedule;
        let jobs = schedule.operations()
            .filter_map(|op| op.job_predecessor().map(|prev| (prev, op, Precedence::Job)));
        let machines = schedule.operations()
            .filter_map(|op| schedule.machine_predecessor(op).map(|prev| (prev, op, Precedence::Machine)));

        Cow::Owned(jobs.chain(machines).collect())
    }

    fn source(&'a self, e: &Edge) -> Operation { e.0 }
    fn target(&'a self, e: &Edge) -> Operation { e.1 }
}
