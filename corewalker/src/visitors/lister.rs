//! `list` (`spec.md` §4.6): one line per allocation — address, size,
//! used/free, and signature name or `-` if unsigned.

use corewalker_macros::VisitorMeta;

use crate::allocation::AllocationIndex;
use crate::iterators::AnalysisContext;
use crate::offset::Offset;

use super::{Visitor, VisitorFactory};

/// The leading word of `allocation`'s body, if it's big enough to hold
/// one and the bytes are mapped (I5).
pub fn leading_word(ctx: &AnalysisContext<'_>, index: AllocationIndex) -> Option<Offset> {
    let allocation = ctx.finder.allocation_at(index)?;
    if allocation.size.as_u64() < ctx.width.byte_len() as u64 {
        return None;
    }
    let bytes = ctx.address_map.find(allocation.address)?;
    Offset::read_at(bytes, ctx.width, ctx.order)
}

/// Shared by `list`, `show`, `describe`, and `explain`: `"<addr> <size>
/// used|free <name-or-'-'>"`.
pub fn format_allocation_line(ctx: &AnalysisContext<'_>, index: AllocationIndex) -> String {
    let allocation = match ctx.finder.allocation_at(index) {
        Some(a) => a,
        None => return String::new(),
    };
    let used = if allocation.used { "used" } else { "free" };
    let signature_name = leading_word(ctx, index)
        .filter(|sig| ctx.signatures.is_mapped(*sig))
        .map(|sig| ctx.signatures.name(sig).to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} {} {} {}\n",
        allocation.address, allocation.size, used, signature_name
    )
}

#[derive(Default)]
struct ListerVisitor;

impl Visitor for ListerVisitor {
    fn visit(&mut self, index: AllocationIndex, ctx: &AnalysisContext<'_>) -> String {
        format_allocation_line(ctx, index)
    }

    fn finish(&mut self, _ctx: &AnalysisContext<'_>) -> String {
        String::new()
    }
}

#[derive(VisitorMeta)]
#[visitor(name = "list")]
pub struct ListerFactory;

impl VisitorFactory for ListerFactory {
    fn create(&self) -> Box<dyn Visitor> {
        Box::<ListerVisitor>::default()
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
    fn lists_signature_name_or_dash() {
        let mut a_bytes = vec![0u8; 0x10];
        a_bytes[0..8].copy_from_slice(&0xaaaau64.to_le_bytes());
        let mut map = SparseAddressMap::new();
        map.insert(Offset::U64(0x1000), a_bytes);
        map.insert(Offset::U64(0x2000), vec![0u8; 0x10]);

        let finder = SortedFinder::new(vec![
            Allocation::new(Offset::U64(0x1000), Offset::U64(0x10), true),
            Allocation::new(Offset::U64(0x2000), Offset::U64(0x10), false),
        ])
        .unwrap();

        let mut signatures = SignatureDirectory::default();
        signatures.register(Offset::U64(0xaaaa), "Widget");

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

        let mut visitor = ListerVisitor;
        assert_eq!(
            visitor.visit(AllocationIndex(0), &ctx),
            format!("{} {} used Widget\n", Offset::U64(0x1000), Offset::U64(0x10))
        );
        assert_eq!(
            visitor.visit(AllocationIndex(1), &ctx),
            format!("{} {} free -\n", Offset::U64(0x2000), Offset::U64(0x10))
        );
    }
}
