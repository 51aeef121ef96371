//! `enumerate` (`spec.md` §4.6): one address per line.

use corewalker_macros::VisitorMeta;

use crate::allocation::AllocationIndex;
use crate::iterators::AnalysisContext;

use super::{Visitor, VisitorFactory};

#[derive(Default)]
struct EnumeratorVisitor;

impl Visitor for EnumeratorVisitor {
    fn visit(&mut self, index: AllocationIndex, ctx: &AnalysisContext<'_>) -> String {
        match ctx.finder.allocation_at(index) {
            Some(allocation) => format!("{}\n", allocation.address),
            None => String::new(),
        }
    }

    fn finish(&mut self, _ctx: &AnalysisContext<'_>) -> String {
        String::new()
    }
}

#[derive(VisitorMeta)]
#[visitor(name = "enumerate")]
pub struct EnumeratorFactory;

impl VisitorFactory for EnumeratorFactory {
    fn create(&self) -> Box<dyn Visitor> {
        Box::<EnumeratorVisitor>::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_map::SparseAddressMap;
    use crate::allocation::Allocation;
    use crate::finder::SortedFinder;
    use crate::offset::{ByteOrder, Offset, Width};
    use crate::roots::FixedRoots;
    use crate::signature::SignatureDirectory;

    #[test]
    fn emits_address_per_line() {
        let map = SparseAddressMap::new();
        let finder =
            SortedFinder::new(vec![Allocation::new(Offset::U64(0x1000), Offset::U64(0x10), true)])
                .unwrap();
        let signatures = SignatureDirectory::default();
        let roots = FixedRoots::default();
        let graph = crate::graph::Graph::build(
            &finder, &map, &roots, &roots, &roots, Width::Bits64, ByteOrder::Little,
        );
        let ctx = AnalysisContext {
            finder: &finder,
            address_map: &map,
            graph: &graph,
            signatures: &signatures,
            width: Width::Bits64,
            order: ByteOrder::Little,
        };

        let mut visitor = EnumeratorVisitor;
        assert_eq!(
            visitor.visit(AllocationIndex(0), &ctx),
            format!("{}\n", Offset::U64(0x1000))
        );
    }
}
