//! C4: the Reference Scanner (`spec.md` §4.2). Grounded on the worklist
//! word-walk in `examples/jacob-hughes-gcmalloc/src/gc.rs::enter_mark_phase`
//! (`for addr in (ptr..ptr+size).step_by(WORD_SIZE)`) and the
//! `DataStructureNode::pointers` contract in the teacher's `lib.rs`.

use std::collections::BTreeSet;

use crate::address_map::VirtualAddressMap;
use crate::allocation::{Allocation, AllocationIndex};
use crate::finder::AllocationFinder;
use crate::offset::{ByteOrder, Offset, Width};

/// Walks every pointer-sized, pointer-aligned word inside `allocation`'s
/// body and yields the distinct allocation indices it references,
/// excluding `self_index` (self-edges are suppressed, per `spec.md` §9
/// Open Questions) and the sentinel `N`.
pub fn scan_references(
    self_index: AllocationIndex,
    allocation: &Allocation,
    finder: &dyn AllocationFinder,
    address_map: &dyn VirtualAddressMap,
    width: Width,
    order: ByteOrder,
) -> Vec<AllocationIndex> {
    let word_len = width.byte_len() as u64;
    let size = allocation.size.as_u64();
    let none = finder.none_index();

    // De-duplicate within one allocation; `spec.md` §4.2 "Duplicate
    // emissions within one allocation are coalesced".
    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();

    let mut cursor = 0u64;
    while cursor + word_len <= size {
        let word_addr = allocation.address + cursor;
        if let Some(bytes) = address_map.find(word_addr) {
            if let Some(word) = Offset::read_at(bytes, width, order) {
                let target = finder.allocation_index_of(word);
                if target != none && target != self_index && seen.insert(target) {
                    edges.push(target);
                }
            }
            // Transient read failure (word straddles an unmapped page
            // boundary): `spec.md` §7 says "no further edges from this
            // word", not fatal; we simply skip it.
        }
        cursor += word_len;
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_map::SparseAddressMap;
    use crate::finder::SortedFinder;

    #[test]
    fn finds_pointer_to_another_allocation_and_suppresses_self_edges() {
        let mut bytes = vec![0u8; 0x40];
        bytes[0x10..0x18].copy_from_slice(&0x2000u64.to_le_bytes());
        // A self-pointing word at offset 0x20 must not produce a self-edge.
        bytes[0x20..0x28].copy_from_slice(&0x1000u64.to_le_bytes());

        let mut map = SparseAddressMap::new();
        map.insert(Offset::U64(0x1000), bytes);
        map.insert(Offset::U64(0x2000), vec![0u8; 0x20]);

        let finder = SortedFinder::new(vec![
            Allocation::new(Offset::U64(0x1000), Offset::U64(0x40), true),
            Allocation::new(Offset::U64(0x2000), Offset::U64(0x20), true),
        ])
        .unwrap();

        let a = finder.allocation_at(AllocationIndex(0)).unwrap();
        let edges = scan_references(
            AllocationIndex(0),
            a,
            &finder,
            &map,
            Width::Bits64,
            ByteOrder::Little,
        );

        assert_eq!(edges, vec![AllocationIndex(1)]);
    }
}
