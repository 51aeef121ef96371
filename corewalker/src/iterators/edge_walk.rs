//! `outgoing <addr>`, `incoming <addr>`, `reach <addr>`, `retained <addr>`
//! (`spec.md` §4.5) — one address argument resolved to an allocation
//! index, then a fixed-size or transitive-closure walk over the graph's
//! adjacency. All four share an arity-1 parse step, so one factory
//! parameterized over `EdgeWalkKind` backs all four set names.

use corewalker_macros::IteratorMeta;

use crate::allocation::AllocationIndex;
use crate::cancel::CancelFlag;
use crate::command::error::ArgumentError;
use crate::offset::Offset;

use super::{AnalysisContext, IteratorFactory, SetIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeWalkKind {
    Outgoing,
    Incoming,
    Reach,
    Retained,
}

/// Replays a precomputed `Vec<AllocationIndex>` — the walk itself (direct
/// neighbors or transitive closure) is done once up front by `Graph`,
/// since every kind here is bounded by the allocation count and cheap to
/// materialize eagerly.
pub struct EdgeWalkIterator {
    indices: std::vec::IntoIter<AllocationIndex>,
}

impl SetIterator for EdgeWalkIterator {
    fn next(&mut self, cancel: &CancelFlag) -> Option<AllocationIndex> {
        if cancel.is_cancelled() {
            return None;
        }
        self.indices.next()
    }
}

fn parse_one_address(
    positionals: &[String],
    ctx: &AnalysisContext<'_>,
) -> Result<AllocationIndex, ArgumentError> {
    if positionals.is_empty() {
        return Err(ArgumentError::MissingAddress);
    }
    let token = &positionals[0];
    let address = Offset::parse_hex(token, ctx.width)
        .ok_or_else(|| ArgumentError::InvalidAddress(token.clone()))?;
    let index = ctx.finder.allocation_index_of(address);
    if index == ctx.finder.none_index() {
        return Err(ArgumentError::NotAnAllocation(token.clone()));
    }
    Ok(index)
}

macro_rules! edge_walk_factory {
    ($factory:ident, $name:literal, $help:literal, $kind:expr) => {
        #[derive(IteratorMeta)]
        #[iterator(name = $name, args = 1, help = $help)]
        pub struct $factory;

        impl IteratorFactory for $factory {
            fn create<'a>(
                &self,
                ctx: &AnalysisContext<'a>,
                positionals: &[String],
            ) -> Result<Box<dyn SetIterator + 'a>, ArgumentError> {
                let index = parse_one_address(positionals, ctx)?;
                let indices = match $kind {
                    EdgeWalkKind::Outgoing => ctx.graph.outgoing(index).to_vec(),
                    EdgeWalkKind::Incoming => ctx.graph.incoming(index).to_vec(),
                    EdgeWalkKind::Reach => ctx.graph.reach(index),
                    EdgeWalkKind::Retained => ctx.graph.retained(index),
                };
                Ok(Box::new(EdgeWalkIterator {
                    indices: indices.into_iter(),
                }))
            }
        }
    };
}

edge_walk_factory!(
    OutgoingFactory,
    "outgoing",
    "Use \"outgoing <address-in-hex>\" to specify the set of allocations directly referenced by the allocation containing the given address.",
    EdgeWalkKind::Outgoing
);
edge_walk_factory!(
    IncomingFactory,
    "incoming",
    "Use \"incoming <address-in-hex>\" to specify the set of allocations that directly reference the allocation containing the given address.",
    EdgeWalkKind::Incoming
);
edge_walk_factory!(
    ReachFactory,
    "reach",
    "Use \"reach <address-in-hex>\" to specify the set of allocations reachable from the allocation containing the given address.",
    EdgeWalkKind::Reach
);
edge_walk_factory!(
    RetainedFactory,
    "retained",
    "Use \"retained <address-in-hex>\" to specify the set of allocations from which the allocation containing the given address is reachable.",
    EdgeWalkKind::Retained
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_map::SparseAddressMap;
    use crate::allocation::Allocation;
    use crate::finder::SortedFinder;
    use crate::offset::{ByteOrder, Width};
    use crate::roots::FixedRoots;

    fn two_allocations_pointer_a_to_b() -> (SortedFinder, SparseAddressMap) {
        let mut a_bytes = vec![0u8; 0x20];
        a_bytes[0x8..0x10].copy_from_slice(&0x2000u64.to_le_bytes());
        let mut map = SparseAddressMap::new();
        map.insert(Offset::U64(0x1000), a_bytes);
        map.insert(Offset::U64(0x2000), vec![0u8; 0x20]);
        let finder = SortedFinder::new(vec![
            Allocation::new(Offset::U64(0x1000), Offset::U64(0x20), true),
            Allocation::new(Offset::U64(0x2000), Offset::U64(0x20), true),
        ])
        .unwrap();
        (finder, map)
    }

    #[test]
    fn outgoing_and_reach_and_retained_agree_with_p2() {
        let (finder, map) = two_allocations_pointer_a_to_b();
        let roots = FixedRoots::default();
        let graph = crate::graph::Graph::build(
            &finder, &map, &roots, &roots, &roots, Width::Bits64, ByteOrder::Little,
        );
        let signatures = crate::signature::SignatureDirectory::default();
        let ctx = AnalysisContext {
            finder: &finder,
            address_map: &map,
            graph: &graph,
            signatures: &signatures,
            width: Width::Bits64,
            order: ByteOrder::Little,
        };
        let cancel = CancelFlag::new();

        let mut it = OutgoingFactory
            .create(&ctx, &["0x1000".to_string()])
            .unwrap();
        assert_eq!(it.next(&cancel), Some(AllocationIndex(1)));
        assert_eq!(it.next(&cancel), None);

        let mut it = ReachFactory
            .create(&ctx, &["0x1000".to_string()])
            .unwrap();
        assert_eq!(it.next(&cancel), Some(AllocationIndex(1)));
        assert_eq!(it.next(&cancel), None);

        let mut it = RetainedFactory
            .create(&ctx, &["0x2000".to_string()])
            .unwrap();
        assert_eq!(it.next(&cancel), Some(AllocationIndex(0)));
        assert_eq!(it.next(&cancel), None);
    }

    #[test]
    fn missing_or_invalid_address_is_reported() {
        let (finder, map) = two_allocations_pointer_a_to_b();
        let roots = FixedRoots::default();
        let graph = crate::graph::Graph::build(
            &finder, &map, &roots, &roots, &roots, Width::Bits64, ByteOrder::Little,
        );
        let signatures = crate::signature::SignatureDirectory::default();
        let ctx = AnalysisContext {
            finder: &finder,
            address_map: &map,
            graph: &graph,
            signatures: &signatures,
            width: Width::Bits64,
            order: ByteOrder::Little,
        };

        assert_eq!(
            OutgoingFactory.create(&ctx, &[]).map(|_| ()).unwrap_err(),
            ArgumentError::MissingAddress
        );
        assert_eq!(
            OutgoingFactory
                .create(&ctx, &["0xdead".to_string()])
                .map(|_| ())
                .unwrap_err(),
            ArgumentError::NotAnAllocation("0xdead".to_string())
        );
    }
}
