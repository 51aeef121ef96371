//! C1: the Virtual Address Map (`spec.md` §3/§4.1, consumed interface in
//! §6). Out of this subsystem's scope is *how* the map gets populated (raw
//! core-file parsing); only the lookup contract lives here.

use crate::offset::Offset;

/// `find(addr) -> (bytes, length)`; `length = 0` signals unmapped, modeled
/// here as `None`.
pub trait VirtualAddressMap {
    /// Returns the backing bytes for the contiguous mapped region starting
    /// at `addr`, or `None` if `addr` is not mapped.
    fn find(&self, addr: Offset) -> Option<&[u8]>;
}

/// A reference `VirtualAddressMap` backed by a sorted list of mapped
/// regions. Used by tests and the demo CLI's JSON snapshot loader; real
/// deployments back this with a memory-mapped core file instead.
#[derive(Debug, Default)]
pub struct SparseAddressMap {
    // Kept sorted by start address so lookups can binary-search.
    regions: Vec<(Offset, Vec<u8>)>,
}

impl SparseAddressMap {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// Inserts a mapped region starting at `addr`. Regions must not
    /// overlap; this is a test/fixture helper, not validated further.
    pub fn insert(&mut self, addr: Offset, bytes: Vec<u8>) {
        let pos = self
            .regions
            .binary_search_by_key(&addr.as_u64(), |(a, _)| a.as_u64())
            .unwrap_or_else(|e| e);
        self.regions.insert(pos, (addr, bytes));
    }
}

impl VirtualAddressMap for SparseAddressMap {
    fn find(&self, addr: Offset) -> Option<&[u8]> {
        let probe = addr.as_u64();
        let idx = match self
            .regions
            .binary_search_by_key(&probe, |(a, _)| a.as_u64())
        {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        let (start, bytes) = &self.regions[idx];
        let start = start.as_u64();
        if probe < start || probe >= start + bytes.len() as u64 {
            return None;
        }
        Some(&bytes[(probe - start) as usize..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_exact_and_interior_addresses() {
        let mut map = SparseAddressMap::new();
        map.insert(Offset::U64(0x1000), vec![0xaa; 0x40]);

        assert_eq!(map.find(Offset::U64(0x1000)).unwrap()[0], 0xaa);
        assert_eq!(map.find(Offset::U64(0x1010)).unwrap().len(), 0x30);
        assert!(map.find(Offset::U64(0x2000)).is_none());
        assert!(map.find(Offset::U64(0x1040)).is_none());
    }
}
