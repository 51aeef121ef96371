//! `count` (`spec.md` §4.6): emit a count and a total-byte tally once the
//! sequence ends.

use corewalker_macros::VisitorMeta;

use crate::allocation::AllocationIndex;
use crate::iterators::AnalysisContext;

use super::{Visitor, VisitorFactory};

#[derive(Default)]
struct CounterVisitor {
    count: u64,
    bytes: u64,
}

impl Visitor for CounterVisitor {
    fn visit(&mut self, index: AllocationIndex, ctx: &AnalysisContext<'_>) -> String {
        if let Some(allocation) = ctx.finder.allocation_at(index) {
            self.count += 1;
            self.bytes += allocation.size.as_u64();
        }
        String::new()
    }

    fn finish(&mut self, _ctx: &AnalysisContext<'_>) -> String {
        format!("{} allocations, {} bytes\n", self.count, self.bytes)
    }
}

#[derive(VisitorMeta)]
#[visitor(name = "count")]
pub struct CounterFactory;

impl VisitorFactory for CounterFactory {
    fn create(&self) -> Box<dyn Visitor> {
        Box::<CounterVisitor>::default()
    }
}
