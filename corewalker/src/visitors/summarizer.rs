//! `summarize` (`spec.md` §4.6/§4.7): accumulate per-signature and
//! per-name tallies, then emit them sorted by count descending.

use corewalker_macros::VisitorMeta;

use crate::allocation::AllocationIndex;
use crate::iterators::AnalysisContext;
use crate::offset::{Offset, Width};
use crate::signature_summary::{Item, SignatureSummary, Tally};

use super::lister::leading_word;
use super::{Visitor, VisitorFactory};

fn offset_of(width: Width) -> fn(u64) -> Offset {
    match width {
        Width::Bits32 => |v| Offset::U32(v as u32),
        Width::Bits64 => Offset::U64,
    }
}

fn format_item(item: &Item) -> String {
    let mut line = format!(
        "{}: {} allocations, {} bytes\n",
        if item.name.is_empty() { "<unnamed>" } else { &item.name },
        item.totals.count,
        item.totals.bytes
    );
    for (signature, Tally { count, bytes }) in &item.subtotals {
        line.push_str(&format!("  {signature}: {count} allocations, {bytes} bytes\n"));
    }
    line
}

#[derive(Default)]
struct SummarizerVisitor {
    sizes: Vec<(u64, Option<Offset>)>,
}

impl Visitor for SummarizerVisitor {
    fn visit(&mut self, index: AllocationIndex, ctx: &AnalysisContext<'_>) -> String {
        if let Some(allocation) = ctx.finder.allocation_at(index) {
            self.sizes.push((allocation.size.as_u64(), leading_word(ctx, index)));
        }
        String::new()
    }

    fn finish(&mut self, ctx: &AnalysisContext<'_>) -> String {
        let mut summary = SignatureSummary::new(ctx.signatures, offset_of(ctx.width));
        for (size, word) in &self.sizes {
            summary.adjust_tally(*size, *word);
        }
        summary
            .summarize_by_count()
            .iter()
            .map(format_item)
            .collect()
    }
}

#[derive(VisitorMeta)]
#[visitor(name = "summarize")]
pub struct SummarizerFactory;

impl VisitorFactory for SummarizerFactory {
    fn create(&self) -> Box<dyn Visitor> {
        Box::new(SummarizerVisitor::default())
    }
}
