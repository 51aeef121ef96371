//! C6: the Allocation Graph (`spec.md` §4.4/§5). Forward/reverse adjacency
//! is materialized in compact CSR storage (two index arrays plus one edge
//! array per direction) rather than per-vertex `Vec`s, per the resource
//! model in §5. Classification runs three breadth-first reachability
//! passes over the forward adjacency from each kind of root set, in
//! Static > Stack > Register priority order.
//!
//! Grounded on the teacher's worklist-based reachability walk
//! (`Allocator::trace`/`finish_or_progress` in `lib.rs`, generalized here
//! from a concurrent mark phase to a single one-shot BFS since the graph
//! is immutable after `build()`, per `spec.md` §5).

mod anchor_chain;

pub use anchor_chain::{AnchorChainVisitor, ChainNode};

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, instrument};

use crate::address_map::VirtualAddressMap;
use crate::allocation::AllocationIndex;
use crate::finder::AllocationFinder;
use crate::offset::{ByteOrder, Width};
use crate::roots::{RegisterRootSource, RootDescriptor, StackRootSource, StaticRootSource};
use crate::scanner::scan_references;

/// The strongest-priority anchor kind an allocation is reachable from, or
/// `Leaked`/`Unclassified` (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorClass {
    StaticAnchor,
    StackAnchor,
    RegisterAnchor,
    ThreadCached,
    Leaked,
    Unclassified,
}

/// Compressed sparse row adjacency: `starts[i]..starts[i + 1]` indexes
/// into `targets` for allocation `i`'s edges.
#[derive(Debug, Default, Clone)]
struct Csr {
    starts: Vec<usize>,
    targets: Vec<AllocationIndex>,
}

impl Csr {
    fn build(num_allocations: usize, mut edges_by_source: Vec<Vec<AllocationIndex>>) -> Self {
        let mut starts = Vec::with_capacity(num_allocations + 1);
        let mut targets = Vec::new();
        starts.push(0);
        for edges in edges_by_source.iter_mut() {
            edges.sort_by_key(|i| i.0);
            targets.extend_from_slice(edges);
            starts.push(targets.len());
        }
        debug_assert_eq!(starts.len(), num_allocations + 1);
        Self { starts, targets }
    }

    fn neighbors(&self, index: AllocationIndex) -> &[AllocationIndex] {
        &self.targets[self.starts[index.0]..self.starts[index.0 + 1]]
    }
}

/// The root-incidence map for one kind of root: allocation index ->
/// nonempty list of root descriptors pointing directly at it.
pub type RootIncidence = HashMap<AllocationIndex, Vec<RootDescriptor>>;

pub struct Graph {
    num_allocations: usize,
    forward: Csr,
    reverse: Csr,
    static_roots: RootIncidence,
    stack_roots: RootIncidence,
    register_roots: RootIncidence,
    classes: Vec<AnchorClass>,
    width: Width,
    order: ByteOrder,
}

impl Graph {
    /// Builds the graph from a frozen C2/C4/C5 snapshot: reference edges
    /// for every used allocation, root incidence from the three root
    /// enumerators, then classifies every allocation (`spec.md` §4.4).
    #[instrument(skip_all)]
    pub fn build(
        finder: &dyn AllocationFinder,
        address_map: &dyn VirtualAddressMap,
        static_roots: &dyn StaticRootSource,
        stack_roots: &dyn StackRootSource,
        register_roots: &dyn RegisterRootSource,
        width: Width,
        order: ByteOrder,
    ) -> Self {
        let num_allocations = finder.num_allocations();
        debug!(num_allocations, "scanning references");

        let mut forward_edges: Vec<Vec<AllocationIndex>> = vec![Vec::new(); num_allocations];
        let mut reverse_edges: Vec<Vec<AllocationIndex>> = vec![Vec::new(); num_allocations];

        for i in 0..num_allocations {
            let index = AllocationIndex(i);
            let allocation = finder
                .allocation_at(index)
                .expect("allocation_at(i) for i in [0, N) must exist");
            // §4.2: the scanner never looks inside freed allocations for
            // anchor-chain purposes.
            if !allocation.used {
                continue;
            }
            let edges = scan_references(index, allocation, finder, address_map, width, order);
            for target in edges {
                forward_edges[i].push(target);
                reverse_edges[target.0].push(index);
            }
        }

        let forward = Csr::build(num_allocations, forward_edges);
        let reverse = Csr::build(num_allocations, reverse_edges);

        let static_roots = collect_root_incidence(finder, static_roots.static_roots());
        let stack_roots = collect_root_incidence(finder, stack_roots.stack_roots());
        let register_roots = collect_root_incidence(finder, register_roots.register_roots());

        debug!(
            static_roots = static_roots.len(),
            stack_roots = stack_roots.len(),
            register_roots = register_roots.len(),
            "root enumeration complete"
        );

        let mut classes = vec![AnchorClass::Unclassified; num_allocations];
        classify(&forward, &static_roots, AnchorClass::StaticAnchor, &mut classes);
        classify(&forward, &stack_roots, AnchorClass::StackAnchor, &mut classes);
        classify(&forward, &register_roots, AnchorClass::RegisterAnchor, &mut classes);

        let mut leaked = 0;
        for (i, class) in classes.iter_mut().enumerate() {
            if *class == AnchorClass::Unclassified {
                let used = finder
                    .allocation_at(AllocationIndex(i))
                    .map(|a| a.used)
                    .unwrap_or(false);
                if used {
                    *class = AnchorClass::Leaked;
                    leaked += 1;
                }
            }
        }
        info!(leaked, "classification complete");

        Self {
            num_allocations,
            forward,
            reverse,
            static_roots,
            stack_roots,
            register_roots,
            classes,
            width,
            order,
        }
    }

    pub fn num_allocations(&self) -> usize {
        self.num_allocations
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn class_of(&self, index: AllocationIndex) -> AnchorClass {
        self.classes[index.0]
    }

    pub fn outgoing(&self, index: AllocationIndex) -> &[AllocationIndex] {
        self.forward.neighbors(index)
    }

    pub fn incoming(&self, index: AllocationIndex) -> &[AllocationIndex] {
        self.reverse.neighbors(index)
    }

    pub fn is_direct_static_anchor(&self, index: AllocationIndex) -> bool {
        self.static_roots.contains_key(&index)
    }

    pub fn is_direct_stack_anchor(&self, index: AllocationIndex) -> bool {
        self.stack_roots.contains_key(&index)
    }

    pub fn is_direct_register_anchor(&self, index: AllocationIndex) -> bool {
        self.register_roots.contains_key(&index)
    }

    pub fn is_anchored(&self, index: AllocationIndex) -> bool {
        matches!(
            self.class_of(index),
            AnchorClass::StaticAnchor | AnchorClass::StackAnchor | AnchorClass::RegisterAnchor
        )
    }

    pub fn is_leaked(&self, index: AllocationIndex) -> bool {
        self.class_of(index) == AnchorClass::Leaked
    }

    pub fn is_thread_cached(&self, index: AllocationIndex) -> bool {
        self.class_of(index) == AnchorClass::ThreadCached
    }

    /// Extension point for the allocator-dependent thread-cache heuristic
    /// named as an optional post-pass in `spec.md` §4.4 step 6. No default
    /// heuristic ships; callers that have one invoke this after `build()`.
    pub fn mark_thread_cached(&mut self, predicate: impl Fn(AllocationIndex) -> bool) {
        for i in 0..self.num_allocations {
            let index = AllocationIndex(i);
            if self.classes[i] == AnchorClass::Leaked && predicate(index) {
                self.classes[i] = AnchorClass::ThreadCached;
            }
        }
    }

    /// The `reach` iterator's transitive closure (`spec.md` §4.5): every
    /// allocation reachable from `start` via `out*`, excluding `start`
    /// itself. By P2, `b ∈ reach(a) ⇔ a ∈ retained(b)`.
    pub fn reach(&self, start: AllocationIndex) -> Vec<AllocationIndex> {
        let mut visited = vec![false; self.num_allocations];
        visited[start.0] = true;
        let mut queue = VecDeque::from([start]);
        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            for &next in self.outgoing(current) {
                if !visited[next.0] {
                    visited[next.0] = true;
                    result.push(next);
                    queue.push_back(next);
                }
            }
        }
        result
    }

    /// The `retained` iterator's transitive closure (`spec.md` §4.5): every
    /// allocation from which `target` is reachable via `out*`, excluding
    /// `target` itself. Identical to the anchor-chain walk's candidate
    /// search.
    pub fn retained(&self, target: AllocationIndex) -> Vec<AllocationIndex> {
        self.ancestors(target)
    }

    fn root_incidence(&self, kind: AnchorClass) -> &RootIncidence {
        match kind {
            AnchorClass::StaticAnchor => &self.static_roots,
            AnchorClass::StackAnchor => &self.stack_roots,
            AnchorClass::RegisterAnchor => &self.register_roots,
            _ => panic!("root_incidence is only defined for Static/Stack/RegisterAnchor"),
        }
    }

    /// Ancestors of `target` in the forward graph: every allocation `X`
    /// such that `target` is reachable from `X` via `out*`. This is
    /// exactly the `retained` iterator's transitive closure (`spec.md`
    /// §4.5) and is what the anchor-chain walk uses to find candidate
    /// anchor points.
    fn ancestors(&self, target: AllocationIndex) -> Vec<AllocationIndex> {
        let mut visited = vec![false; self.num_allocations];
        visited[target.0] = true;
        let mut queue = VecDeque::from([target]);
        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            for &predecessor in self.incoming(current) {
                if !visited[predecessor.0] {
                    visited[predecessor.0] = true;
                    result.push(predecessor);
                    queue.push_back(predecessor);
                }
            }
        }
        result
    }

    /// Shortest path from `start` to `target` over `out`, excluding
    /// `start` and including `target` last. Ties are broken by lowest
    /// successor index at each step (`spec.md` §4.4 "Chain selection"):
    /// forward adjacency is CSR-sorted ascending, so a plain BFS that
    /// explores each node's neighbors in stored order already yields the
    /// canonical tie-break.
    fn shortest_path(&self, start: AllocationIndex, target: AllocationIndex) -> Vec<AllocationIndex> {
        if start == target {
            return Vec::new();
        }
        let mut visited = vec![false; self.num_allocations];
        let mut predecessor = vec![None; self.num_allocations];
        visited[start.0] = true;
        let mut queue = VecDeque::from([start]);
        'bfs: while let Some(current) = queue.pop_front() {
            for &next in self.outgoing(current) {
                if visited[next.0] {
                    continue;
                }
                visited[next.0] = true;
                predecessor[next.0] = Some(current);
                if next == target {
                    break 'bfs;
                }
                queue.push_back(next);
            }
        }

        if predecessor[target.0].is_none() && start != target {
            // `target` wasn't reachable from `start`; shouldn't happen
            // since callers only invoke this for ancestors of `target`.
            return Vec::new();
        }

        let mut path = vec![target];
        let mut current = target;
        while current != start {
            let prev = predecessor[current.0].expect("path reconstruction");
            if prev != start {
                path.push(prev);
            }
            current = prev;
        }
        path.reverse();
        path
    }
}

fn collect_root_incidence(
    finder: &dyn AllocationFinder,
    pointers: Vec<crate::roots::RootPointer>,
) -> RootIncidence {
    let mut map: RootIncidence = HashMap::new();
    let none = finder.none_index();
    for pointer in pointers {
        let index = finder.allocation_index_of(pointer.addr);
        if index != none {
            map.entry(index).or_default().push(pointer.descriptor);
        }
    }
    map
}

fn classify(
    forward: &Csr,
    roots: &RootIncidence,
    class: AnchorClass,
    classes: &mut [AnchorClass],
) {
    let mut queue: VecDeque<AllocationIndex> = roots.keys().copied().collect();
    for &root in roots.keys() {
        if classes[root.0] == AnchorClass::Unclassified {
            classes[root.0] = class;
        }
    }
    let mut visited = vec![false; classes.len()];
    for &root in roots.keys() {
        visited[root.0] = true;
    }
    while let Some(current) = queue.pop_front() {
        for &next in forward.neighbors(current) {
            if visited[next.0] {
                continue;
            }
            visited[next.0] = true;
            if classes[next.0] == AnchorClass::Unclassified {
                classes[next.0] = class;
            }
            queue.push_back(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_map::SparseAddressMap;
    use crate::allocation::Allocation;
    use crate::finder::SortedFinder;
    use crate::offset::Offset;
    use crate::roots::{FixedRoots, RootPointer};

    fn two_allocations_pointer_a_to_b() -> (SortedFinder, SparseAddressMap) {
        let mut a_bytes = vec![0u8; 0x40];
        a_bytes[0x10..0x18].copy_from_slice(&0x2000u64.to_le_bytes());
        let mut map = SparseAddressMap::new();
        map.insert(Offset::U64(0x1000), a_bytes);
        map.insert(Offset::U64(0x2000), vec![0u8; 0x20]);

        let finder = SortedFinder::new(vec![
            Allocation::new(Offset::U64(0x1000), Offset::U64(0x40), true),
            Allocation::new(Offset::U64(0x2000), Offset::U64(0x20), true),
        ])
        .unwrap();
        (finder, map)
    }

    /// Scenario S1 (`spec.md` §8): no roots -> both allocations leaked.
    #[test]
    fn s1_unrooted_allocations_are_leaked() {
        let (finder, map) = two_allocations_pointer_a_to_b();
        let roots = FixedRoots::default();
        let graph = Graph::build(
            &finder,
            &map,
            &roots,
            &roots,
            &roots,
            Width::Bits64,
            ByteOrder::Little,
        );

        assert_eq!(
            graph.outgoing(AllocationIndex(0)),
            &[AllocationIndex(1)]
        );
        assert_eq!(
            graph.incoming(AllocationIndex(1)),
            &[AllocationIndex(0)]
        );
        assert!(graph.is_leaked(AllocationIndex(0)));
        assert!(graph.is_leaked(AllocationIndex(1)));
    }

    /// Scenario S2 (`spec.md` §8): a static root at 0x7000 holds 0x1000 (A's
    /// address). A is directly anchored, B is indirectly anchored.
    #[test]
    fn s2_static_root_anchors_directly_and_indirectly() {
        let (finder, map) = two_allocations_pointer_a_to_b();
        let roots = FixedRoots {
            static_roots: vec![RootPointer {
                descriptor: RootDescriptor::Static(Offset::U64(0x7000)),
                addr: Offset::U64(0x1000),
            }],
            ..Default::default()
        };
        let graph = Graph::build(
            &finder,
            &map,
            &roots,
            &roots,
            &roots,
            Width::Bits64,
            ByteOrder::Little,
        );

        assert!(graph.is_direct_static_anchor(AllocationIndex(0)));
        assert!(!graph.is_direct_static_anchor(AllocationIndex(1)));
        assert_eq!(graph.class_of(AllocationIndex(0)), AnchorClass::StaticAnchor);
        assert_eq!(graph.class_of(AllocationIndex(1)), AnchorClass::StaticAnchor);

        let path = graph.shortest_path(AllocationIndex(0), AllocationIndex(1));
        assert_eq!(path, vec![AllocationIndex(1)]);

        let ancestors = graph.ancestors(AllocationIndex(1));
        assert_eq!(ancestors, vec![AllocationIndex(0)]);
    }

    #[test]
    fn priority_order_is_static_then_stack_then_register() {
        let (finder, map) = two_allocations_pointer_a_to_b();
        let roots = FixedRoots {
            static_roots: vec![RootPointer {
                descriptor: RootDescriptor::Static(Offset::U64(0x7000)),
                addr: Offset::U64(0x1000),
            }],
            stack_roots: vec![RootPointer {
                descriptor: RootDescriptor::Stack {
                    thread_id: 1,
                    address: Offset::U64(0x8000),
                },
                addr: Offset::U64(0x1000),
            }],
            ..Default::default()
        };
        let graph = Graph::build(
            &finder,
            &map,
            &roots,
            &roots,
            &roots,
            Width::Bits64,
            ByteOrder::Little,
        );

        // A is directly rooted both ways, but cls[] reports Static first.
        assert!(graph.is_direct_static_anchor(AllocationIndex(0)));
        assert!(graph.is_direct_stack_anchor(AllocationIndex(0)));
        assert_eq!(graph.class_of(AllocationIndex(0)), AnchorClass::StaticAnchor);
    }
}
