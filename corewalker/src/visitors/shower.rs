//! `show` (`spec.md` §4.6): a lister line plus a hex+ASCII dump of the
//! allocation body, sixteen bytes per row.

use corewalker_macros::VisitorMeta;

use crate::allocation::AllocationIndex;
use crate::iterators::AnalysisContext;

use super::lister::format_allocation_line;
use super::{Visitor, VisitorFactory};

const BYTES_PER_ROW: usize = 16;

fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for row in bytes.chunks(BYTES_PER_ROW) {
        for byte in row {
            out.push_str(&format!("{byte:02x} "));
        }
        for _ in row.len()..BYTES_PER_ROW {
            out.push_str("   ");
        }
        out.push_str(" |");
        for &byte in row {
            let ch = byte as char;
            out.push(if ch.is_ascii_graphic() || ch == ' ' { ch } else { '.' });
        }
        out.push_str("|\n");
    }
    out
}

#[derive(Default)]
struct ShowerVisitor;

impl Visitor for ShowerVisitor {
    fn visit(&mut self, index: AllocationIndex, ctx: &AnalysisContext<'_>) -> String {
        let mut line = format_allocation_line(ctx, index);
        if let Some(allocation) = ctx.finder.allocation_at(index) {
            if let Some(bytes) = ctx.address_map.find(allocation.address) {
                let size = allocation.size.as_usize().min(bytes.len());
                line.push_str(&hex_dump(&bytes[..size]));
            }
        }
        line
    }

    fn finish(&mut self, _ctx: &AnalysisContext<'_>) -> String {
        String::new()
    }
}

#[derive(VisitorMeta)]
#[visitor(name = "show")]
pub struct ShowerFactory;

impl VisitorFactory for ShowerFactory {
    fn create(&self) -> Box<dyn Visitor> {
        Box::<ShowerVisitor>::default()
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
    fn dumps_ascii_printable_bytes() {
        let mut bytes = vec![0u8; 0x10];
        bytes[0..4].copy_from_slice(b"ABCD");
        let mut map = SparseAddressMap::new();
        map.insert(Offset::U64(0x1000), bytes);

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

        let mut visitor = ShowerVisitor;
        let output = visitor.visit(AllocationIndex(0), &ctx);
        assert!(output.contains("ABCD"));
    }
}
