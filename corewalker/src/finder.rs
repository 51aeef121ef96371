//! C2: Allocation Finder (`spec.md` §4.1). Addresses are strictly
//! increasing across the allocation array (I1), so `AllocationIndexOf` is a
//! binary search over interior ranges.

use crate::allocation::{Allocation, AllocationIndex};
use crate::offset::Offset;

pub trait AllocationFinder {
    fn num_allocations(&self) -> usize;

    /// `None` for the sentinel index `N`, undefined for out-of-range input
    /// otherwise (per §4.1, "undefined for i == N").
    fn allocation_at(&self, index: AllocationIndex) -> Option<&Allocation>;

    /// Returns the sentinel index (`num_allocations()`) if `addr` is not
    /// inside any allocation's `[address, address+size)` range.
    fn allocation_index_of(&self, addr: Offset) -> AllocationIndex;

    fn none_index(&self) -> AllocationIndex {
        AllocationIndex(self.num_allocations())
    }
}

/// Reference `AllocationFinder` over an address-sorted `Vec<Allocation>`.
pub struct SortedFinder {
    allocations: Vec<Allocation>,
}

impl SortedFinder {
    /// Builds a finder from allocations that must already be sorted by
    /// ascending `address`, matching invariant I1. Returns `None` if the
    /// input violates that invariant.
    pub fn new(allocations: Vec<Allocation>) -> Option<Self> {
        if allocations
            .windows(2)
            .any(|w| w[0].address.as_u64() >= w[1].address.as_u64())
        {
            return None;
        }
        Some(Self { allocations })
    }
}

impl AllocationFinder for SortedFinder {
    fn num_allocations(&self) -> usize {
        self.allocations.len()
    }

    fn allocation_at(&self, index: AllocationIndex) -> Option<&Allocation> {
        self.allocations.get(index.0)
    }

    fn allocation_index_of(&self, addr: Offset) -> AllocationIndex {
        let probe = addr.as_u64();
        let idx = match self
            .allocations
            .binary_search_by_key(&probe, |a| a.address.as_u64())
        {
            Ok(i) => i,
            Err(0) => return self.none_index(),
            Err(i) => i - 1,
        };
        if self.allocations[idx].contains(addr) {
            AllocationIndex(idx)
        } else {
            self.none_index()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finder() -> SortedFinder {
        SortedFinder::new(vec![
            Allocation::new(Offset::U64(0x1000), Offset::U64(0x40), true),
            Allocation::new(Offset::U64(0x2000), Offset::U64(0x20), true),
        ])
        .unwrap()
    }

    #[test]
    fn finds_start_and_interior_addresses() {
        let f = finder();
        assert_eq!(
            f.allocation_index_of(Offset::U64(0x1000)),
            AllocationIndex(0)
        );
        assert_eq!(
            f.allocation_index_of(Offset::U64(0x1010)),
            AllocationIndex(0)
        );
        assert_eq!(
            f.allocation_index_of(Offset::U64(0x2008)),
            AllocationIndex(1)
        );
    }

    #[test]
    fn addresses_outside_any_allocation_are_none() {
        let f = finder();
        assert_eq!(f.allocation_index_of(Offset::U64(0xdead)), f.none_index());
        assert_eq!(
            f.allocation_index_of(Offset::U64(0x1040)),
            f.none_index()
        );
        assert_eq!(f.allocation_index_of(Offset::U64(0x0fff)), f.none_index());
    }

    #[test]
    fn rejects_non_increasing_addresses() {
        let out_of_order = vec![
            Allocation::new(Offset::U64(0x2000), Offset::U64(0x20), true),
            Allocation::new(Offset::U64(0x1000), Offset::U64(0x40), true),
        ];
        assert!(SortedFinder::new(out_of_order).is_none());
    }
}
