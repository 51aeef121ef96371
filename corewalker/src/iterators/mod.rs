//! C7: Iterators (`spec.md` §4.5). Each iterator is a lazy, finite,
//! single-pass producer of allocation indices, owned by one command
//! invocation. Factories are registered by name in a flat table (`spec.md`
//! §9 Design Notes, "avoid templating every (iterator, visitor) pair"),
//! grounded on
//! `examples/original_source/src/Allocations/Subcommands/SubcommandsForOneIterator.h`.

mod allocations;
mod chain;
mod classified;
mod edge_walk;
mod registry;

pub use allocations::{AllocationsFactory, AllocationsIterator};
pub use chain::{ChainFactory, ChainIterator};
pub use classified::{
    AnchoredFactory, ClassifiedIterator, ClassifiedKind, LeakedFactory, RegisterAnchoredFactory,
    StackAnchoredFactory, StaticAnchoredFactory, UnreferencedFactory,
};
pub use edge_walk::{
    EdgeWalkIterator, EdgeWalkKind, IncomingFactory, OutgoingFactory, ReachFactory,
    RetainedFactory,
};
pub use registry::IteratorRegistry;

use crate::address_map::VirtualAddressMap;
use crate::allocation::AllocationIndex;
use crate::cancel::CancelFlag;
use crate::command::error::ArgumentError;
use crate::finder::AllocationFinder;
use crate::graph::Graph;
use crate::offset::{ByteOrder, Width};
use crate::signature::SignatureDirectory;

/// Everything an iterator or visitor factory needs: the frozen
/// finder/address-map/graph/signature-directory quadruple plus the dump's
/// pointer width and byte order.
pub struct AnalysisContext<'a> {
    pub finder: &'a dyn AllocationFinder,
    pub address_map: &'a dyn VirtualAddressMap,
    pub graph: &'a Graph,
    pub signatures: &'a SignatureDirectory,
    pub width: Width,
    pub order: ByteOrder,
}

/// A single-pass producer of allocation indices; `None` signals the end of
/// the sequence, including an early end caused by cancellation
/// (`spec.md` §5).
pub trait SetIterator {
    fn next(&mut self, cancel: &CancelFlag) -> Option<AllocationIndex>;
}

/// The static metadata an iterator factory exposes: its set name, how many
/// positional arguments it consumes, and a help string (`spec.md` §6
/// "Exposed interfaces"). Generated by `#[derive(IteratorMeta)]` on most
/// factories.
pub trait IteratorFactoryMeta {
    fn set_name(&self) -> &'static str;
    fn arg_count(&self) -> usize;
    fn help(&self) -> &'static str;
}

/// The factory itself: parses positional arguments against a frozen
/// analysis context and produces a boxed iterator, or an `ArgumentError`
/// if the positionals don't parse or don't resolve to anything meaningful
/// (`spec.md` §7).
pub trait IteratorFactory: IteratorFactoryMeta {
    fn create<'a>(
        &self,
        ctx: &AnalysisContext<'a>,
        positionals: &[String],
    ) -> Result<Box<dyn SetIterator + 'a>, ArgumentError>;
}
