//! `anchored`, `staticanchored`, `stackanchored`, `registeranchored`,
//! `leaked`, `unreferenced` (`spec.md` §4.5) — filters over the graph's
//! per-allocation classification (§3 `cls[i]`). `unreferenced` is the
//! complement of P4's `anchored ∪ leaked ∪ threadcached` partition: a
//! freed allocation never gets classified past `Unclassified`, since
//! `Graph::build` only promotes `Unclassified` to `Leaked` for allocations
//! that are `used` (`spec.md` §4.4 step 5, I4).

use corewalker_macros::IteratorMeta;

use crate::allocation::AllocationIndex;
use crate::cancel::CancelFlag;
use crate::command::error::ArgumentError;
use crate::graph::AnchorClass;

use super::{AnalysisContext, IteratorFactory, SetIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifiedKind {
    Anchored,
    StaticAnchored,
    StackAnchored,
    RegisterAnchored,
    Leaked,
    Unreferenced,
}

impl ClassifiedKind {
    fn matches(self, class: AnchorClass) -> bool {
        match self {
            ClassifiedKind::Anchored => matches!(
                class,
                AnchorClass::StaticAnchor | AnchorClass::StackAnchor | AnchorClass::RegisterAnchor
            ),
            ClassifiedKind::StaticAnchored => class == AnchorClass::StaticAnchor,
            ClassifiedKind::StackAnchored => class == AnchorClass::StackAnchor,
            ClassifiedKind::RegisterAnchored => class == AnchorClass::RegisterAnchor,
            ClassifiedKind::Leaked => class == AnchorClass::Leaked,
            ClassifiedKind::Unreferenced => class == AnchorClass::Unclassified,
        }
    }
}

/// Walks every allocation index in order, yielding only those whose class
/// matches `kind`.
pub struct ClassifiedIterator<'a> {
    graph: &'a crate::graph::Graph,
    kind: ClassifiedKind,
    next: usize,
    num_allocations: usize,
}

impl SetIterator for ClassifiedIterator<'_> {
    fn next(&mut self, cancel: &CancelFlag) -> Option<AllocationIndex> {
        while self.next < self.num_allocations {
            if cancel.is_cancelled() {
                return None;
            }
            let index = AllocationIndex(self.next);
            self.next += 1;
            if self.kind.matches(self.graph.class_of(index)) {
                return Some(index);
            }
        }
        None
    }
}

macro_rules! classified_factory {
    ($factory:ident, $name:literal, $help:literal, $kind:expr) => {
        #[derive(IteratorMeta)]
        #[iterator(name = $name, args = 0, help = $help)]
        pub struct $factory;

        impl IteratorFactory for $factory {
            fn create<'a>(
                &self,
                ctx: &AnalysisContext<'a>,
                _positionals: &[String],
            ) -> Result<Box<dyn SetIterator + 'a>, ArgumentError> {
                Ok(Box::new(ClassifiedIterator {
                    graph: ctx.graph,
                    kind: $kind,
                    next: 0,
                    num_allocations: ctx.finder.num_allocations(),
                }))
            }
        }
    };
}

classified_factory!(
    AnchoredFactory,
    "anchored",
    "Use \"anchored\" to specify the set of allocations reachable from any root.",
    ClassifiedKind::Anchored
);
classified_factory!(
    StaticAnchoredFactory,
    "staticanchored",
    "Use \"staticanchored\" to specify the set of allocations reachable from a static root.",
    ClassifiedKind::StaticAnchored
);
classified_factory!(
    StackAnchoredFactory,
    "stackanchored",
    "Use \"stackanchored\" to specify the set of allocations reachable from a stack root.",
    ClassifiedKind::StackAnchored
);
classified_factory!(
    RegisterAnchoredFactory,
    "registeranchored",
    "Use \"registeranchored\" to specify the set of allocations reachable from a register root.",
    ClassifiedKind::RegisterAnchored
);
classified_factory!(
    LeakedFactory,
    "leaked",
    "Use \"leaked\" to specify the set of allocations reachable from no root.",
    ClassifiedKind::Leaked
);
classified_factory!(
    UnreferencedFactory,
    "unreferenced",
    "Use \"unreferenced\" to specify the set of recognized but freed allocations.",
    ClassifiedKind::Unreferenced
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_map::SparseAddressMap;
    use crate::allocation::Allocation;
    use crate::finder::SortedFinder;
    use crate::offset::{ByteOrder, Offset, Width};
    use crate::roots::{FixedRoots, RootPointer};

    #[test]
    fn anchored_and_leaked_and_unreferenced_partition_allocations() {
        let mut a_bytes = vec![0u8; 0x20];
        a_bytes[0x8..0x10].copy_from_slice(&0x2000u64.to_le_bytes());
        let mut map = SparseAddressMap::new();
        map.insert(Offset::U64(0x1000), a_bytes);
        map.insert(Offset::U64(0x2000), vec![0u8; 0x20]);
        map.insert(Offset::U64(0x3000), vec![0u8; 0x20]);

        let finder = SortedFinder::new(vec![
            Allocation::new(Offset::U64(0x1000), Offset::U64(0x20), true),
            Allocation::new(Offset::U64(0x2000), Offset::U64(0x20), true),
            Allocation::new(Offset::U64(0x3000), Offset::U64(0x20), false),
        ])
        .unwrap();

        let roots = FixedRoots {
            static_roots: vec![RootPointer {
                descriptor: crate::roots::RootDescriptor::Static(Offset::U64(0x7000)),
                addr: Offset::U64(0x1000),
            }],
            ..Default::default()
        };

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

        let collect = |factory: &dyn IteratorFactory| -> Vec<AllocationIndex> {
            let mut it = factory.create(&ctx, &[]).unwrap();
            let mut out = Vec::new();
            while let Some(i) = it.next(&cancel) {
                out.push(i);
            }
            out
        };

        assert_eq!(
            collect(&AnchoredFactory),
            vec![AllocationIndex(0), AllocationIndex(1)]
        );
        assert_eq!(collect(&StaticAnchoredFactory), vec![AllocationIndex(0), AllocationIndex(1)]);
        assert!(collect(&LeakedFactory).is_empty());
        assert_eq!(collect(&UnreferencedFactory), vec![AllocationIndex(2)]);
    }
}
