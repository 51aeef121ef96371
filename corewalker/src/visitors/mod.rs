//! C8: Visitors (`spec.md` §4.6). A visitor receives `(allocation, index)`
//! callbacks for every index an iterator produces, with access to C1
//! bytes on demand, and closes out with a final report. The seven named
//! visitors live one per file; `registry.rs` keys them by command name
//! for C9's cross product.

mod counter;
mod describer;
mod enumerator;
mod explainer;
mod lister;
mod registry;
mod shower;
mod summarizer;

pub use counter::CounterFactory;
pub use describer::DescriberFactory;
pub use enumerator::EnumeratorFactory;
pub use explainer::{ExplainerFactory, DEFAULT_MAX_CHAINS_PER_KIND};
pub use lister::{format_allocation_line, ListerFactory};
pub use registry::VisitorRegistry;
pub use shower::ShowerFactory;
pub use summarizer::SummarizerFactory;

use crate::allocation::AllocationIndex;
use crate::iterators::AnalysisContext;

/// A sink for one allocation at a time, plus a final report once the
/// iterator it's attached to is exhausted (`spec.md` §5: "the visitor
/// finalizes with a partial result" on cancellation).
pub trait Visitor {
    /// Lines to emit for this allocation right now, or an empty string if
    /// the visitor only accumulates state (e.g. `count`, `summarize`).
    fn visit(&mut self, index: AllocationIndex, ctx: &AnalysisContext<'_>) -> String;

    /// Lines to emit once the sequence ends, or an empty string for
    /// visitors that already streamed everything in `visit`.
    fn finish(&mut self, ctx: &AnalysisContext<'_>) -> String;
}

/// Static metadata a visitor factory exposes: the command name it's
/// registered under (`spec.md` §6 "Visitor factories keyed by command
/// name").
pub trait VisitorFactoryMeta {
    fn command_name(&self) -> &'static str;
}

pub trait VisitorFactory: VisitorFactoryMeta {
    fn create(&self) -> Box<dyn Visitor>;
}
