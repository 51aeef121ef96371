//! `explain` (`spec.md` §4.6, scenario S2): a lister line plus the
//! anchor-chain narration driven by C6's `AnchorChainVisitor` protocol.
//! Grounded on `examples/original_source/src/AnchorChainLister.h`, including
//! its reporting-cap bookkeeping (at most 10 chains per kind, at most one
//! once a direct anchor of that kind has been shown) and its direct/indirect
//! header and root-line wording.

use corewalker_macros::VisitorMeta;

use crate::allocation::AllocationIndex;
use crate::graph::{AnchorChainVisitor, ChainNode};
use crate::iterators::AnalysisContext;
use crate::offset::{ByteOrder, Offset};
use crate::roots::RootDescriptor;
use crate::signature::SignatureDirectory;

use super::lister::format_allocation_line;
use super::{Visitor, VisitorFactory};

/// Default reporting cap (`spec.md` §4.4 "Reporting caps"): at most this
/// many chains shown per anchor kind. Overridable via
/// `ExplainerFactory::with_max_chains_per_kind`, per the `AnalysisConfig`
/// builder's reporting-cap knobs.
pub const DEFAULT_MAX_CHAINS_PER_KIND: usize = 10;

struct ChainNarrator<'a> {
    target_address: Offset,
    kind_phrase: &'static str,
    signatures: &'a SignatureDirectory,
    order: ByteOrder,
    max_chains_per_kind: usize,
    num_shown: usize,
    num_direct_shown: usize,
    output: String,
}

impl<'a> ChainNarrator<'a> {
    fn new(
        target_address: Offset,
        kind_phrase: &'static str,
        signatures: &'a SignatureDirectory,
        order: ByteOrder,
        max_chains_per_kind: usize,
    ) -> Self {
        Self {
            target_address,
            kind_phrase,
            signatures,
            order,
            max_chains_per_kind,
            num_shown: 0,
            num_direct_shown: 0,
            output: String::new(),
        }
    }

    fn describe_root(&self, root: &RootDescriptor, anchor_address: Offset, is_direct: bool) -> String {
        let anchor_phrase = if is_direct {
            format!("{anchor_address}")
        } else {
            format!("anchor point {anchor_address}")
        };
        match root {
            RootDescriptor::Static(addr) => {
                format!("Static address {addr} references {anchor_phrase}\n")
            }
            RootDescriptor::Stack { address, .. } => {
                format!("Stack address {address} references {anchor_phrase}\n")
            }
            RootDescriptor::Register { thread_id, register } => {
                format!("Register {register} for thread {thread_id} references {anchor_phrase}\n")
            }
        }
    }

    fn header(&mut self, roots: &[RootDescriptor], node: &ChainNode, bytes: Option<&[u8]>) -> bool {
        let is_direct = node.address == self.target_address;
        if !is_direct && (self.num_direct_shown > 0 || self.num_shown == self.max_chains_per_kind) {
            return true;
        }

        self.output
            .push_str(&format!("Allocation at {} appears to be ", self.target_address));
        if is_direct {
            self.output.push_str(&format!("directly {}.\n", self.kind_phrase));
        } else {
            self.output.push_str(&format!(
                "indirectly {}\n... via anchor point {}",
                self.kind_phrase, node.address
            ));
            self.push_signature_suffix(node.size, bytes);
            self.output.push('\n');
        }
        for root in roots {
            self.output
                .push_str(&self.describe_root(root, node.address, is_direct));
        }

        self.num_shown += 1;
        if is_direct {
            self.num_direct_shown += 1;
        }
        false
    }

    fn push_signature_suffix(&mut self, size: Offset, bytes: Option<&[u8]>) {
        let Some(bytes) = bytes else { return };
        let width = size.width();
        if let Some(word) = Offset::read_at(bytes, width, self.order) {
            if self.signatures.is_mapped(word) {
                self.output.push_str(&format!(" with signature {word}"));
                let name = self.signatures.name(word);
                if !name.is_empty() {
                    self.output.push_str(&format!("({name})"));
                }
            }
        }
    }
}

impl AnchorChainVisitor for ChainNarrator<'_> {
    fn visit_static_anchor_chain_header(
        &mut self,
        roots: &[RootDescriptor],
        node: &ChainNode,
        bytes: Option<&[u8]>,
    ) -> bool {
        self.header(roots, node, bytes)
    }

    fn visit_stack_anchor_chain_header(
        &mut self,
        roots: &[RootDescriptor],
        node: &ChainNode,
        bytes: Option<&[u8]>,
    ) -> bool {
        self.header(roots, node, bytes)
    }

    fn visit_register_anchor_chain_header(
        &mut self,
        roots: &[RootDescriptor],
        node: &ChainNode,
        bytes: Option<&[u8]>,
    ) -> bool {
        self.header(roots, node, bytes)
    }

    fn visit_chain_link(&mut self, node: &ChainNode, bytes: Option<&[u8]>) {
        self.output.push_str(&format!("... which references {}", node.address));
        if node.address != self.target_address {
            self.push_signature_suffix(node.size, bytes);
        }
        self.output.push('\n');
    }
}

struct ExplainerVisitor {
    max_chains_per_kind: usize,
}

impl Visitor for ExplainerVisitor {
    fn visit(&mut self, index: AllocationIndex, ctx: &AnalysisContext<'_>) -> String {
        let mut output = format_allocation_line(ctx, index);
        let target_address = match ctx.finder.allocation_at(index) {
            Some(allocation) => allocation.address,
            None => return output,
        };

        let mut statics = ChainNarrator::new(
            target_address,
            "statically anchored",
            ctx.signatures,
            ctx.order,
            self.max_chains_per_kind,
        );
        ctx.graph
            .visit_static_anchor_chains(index, ctx.finder, ctx.address_map, &mut statics);
        output.push_str(&statics.output);

        let mut stacks = ChainNarrator::new(
            target_address,
            "anchored from at least one stack",
            ctx.signatures,
            ctx.order,
            self.max_chains_per_kind,
        );
        ctx.graph
            .visit_stack_anchor_chains(index, ctx.finder, ctx.address_map, &mut stacks);
        output.push_str(&stacks.output);

        let mut registers = ChainNarrator::new(
            target_address,
            "anchored from at least one register",
            ctx.signatures,
            ctx.order,
            self.max_chains_per_kind,
        );
        ctx.graph
            .visit_register_anchor_chains(index, ctx.finder, ctx.address_map, &mut registers);
        output.push_str(&registers.output);

        if statics.num_shown == 0 && stacks.num_shown == 0 && registers.num_shown == 0 {
            output.push_str(&format!("Allocation at {target_address} appears to be leaked.\n"));
        }

        output
    }

    fn finish(&mut self, _ctx: &AnalysisContext<'_>) -> String {
        String::new()
    }
}

#[derive(VisitorMeta)]
#[visitor(name = "explain")]
pub struct ExplainerFactory {
    max_chains_per_kind: usize,
}

impl Default for ExplainerFactory {
    fn default() -> Self {
        Self {
            max_chains_per_kind: DEFAULT_MAX_CHAINS_PER_KIND,
        }
    }
}

impl ExplainerFactory {
    pub fn with_max_chains_per_kind(max_chains_per_kind: usize) -> Self {
        Self { max_chains_per_kind }
    }
}

impl VisitorFactory for ExplainerFactory {
    fn create(&self) -> Box<dyn Visitor> {
        Box::new(ExplainerVisitor {
            max_chains_per_kind: self.max_chains_per_kind,
        })
    }
}
