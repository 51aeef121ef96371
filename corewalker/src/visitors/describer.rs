//! `describe` (`spec.md` §4.6): a lister line plus a signature-aware
//! structured description. The structured part is delegated to
//! type-aware helpers that are out of this subsystem's core (§1 "Out of
//! scope"); `TypeDescriber` is the extension point a caller plugs in, and
//! with none installed `describe` degrades to exactly `list`'s output.

use corewalker_macros::VisitorMeta;

use crate::allocation::AllocationIndex;
use crate::iterators::AnalysisContext;
use crate::offset::Offset;

use super::lister::{format_allocation_line, leading_word};
use super::{Visitor, VisitorFactory};

/// An external, type-aware helper that knows how to render the body of an
/// allocation with a given signature. No implementation ships here.
pub trait TypeDescriber {
    fn describe(&self, signature: Offset, bytes: &[u8]) -> Option<String>;
}

#[derive(Default)]
struct DescriberVisitor {
    describer: Option<Box<dyn TypeDescriber>>,
}

impl Visitor for DescriberVisitor {
    fn visit(&mut self, index: AllocationIndex, ctx: &AnalysisContext<'_>) -> String {
        let mut line = format_allocation_line(ctx, index);
        if let (Some(describer), Some(signature)) = (&self.describer, leading_word(ctx, index)) {
            if let Some(allocation) = ctx.finder.allocation_at(index) {
                if let Some(bytes) = ctx.address_map.find(allocation.address) {
                    if let Some(description) = describer.describe(signature, bytes) {
                        line.push_str(&description);
                        line.push('\n');
                    }
                }
            }
        }
        line
    }

    fn finish(&mut self, _ctx: &AnalysisContext<'_>) -> String {
        String::new()
    }
}

#[derive(VisitorMeta)]
#[visitor(name = "describe")]
pub struct DescriberFactory;

impl VisitorFactory for DescriberFactory {
    fn create(&self) -> Box<dyn Visitor> {
        Box::<DescriberVisitor>::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_map::SparseAddressMap;
    use crate::allocation::Allocation;
    use crate::finder::SortedFinder;
    use crate::offset::{ByteOrder, Width};
    use crate::roots::FixedRoots;
    use crate::signature::SignatureDirectory;

    #[test]
    fn with_no_describer_matches_the_lister_line() {
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

        let mut visitor = DescriberVisitor::default();
        assert_eq!(
            visitor.visit(AllocationIndex(0), &ctx),
            format_allocation_line(&ctx, AllocationIndex(0))
        );
    }
}
