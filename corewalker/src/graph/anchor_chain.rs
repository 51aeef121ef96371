//! The `AnchorChainVisitor` protocol (`spec.md` §4.4). Grounded on
//! `examples/original_source/src/AnchorChainLister.h`, which fixes the
//! exact header/link call shape and the reporting-cap placement (in the
//! visitor, not the graph) that this module implements.

use crate::address_map::VirtualAddressMap;
use crate::allocation::AllocationIndex;
use crate::finder::AllocationFinder;
use crate::offset::Offset;
use crate::roots::RootDescriptor;

use super::{AnchorClass, Graph};

/// One allocation along an anchor chain, as handed to the visitor. Backing
/// bytes are passed alongside as `Option<&[u8]>`, separately, since they
/// may be absent (`spec.md` §4.4 "Failure modes" — an unreadable prefix
/// never aborts the walk, the bytes are simply absent).
#[derive(Debug, Clone)]
pub struct ChainNode {
    pub address: Offset,
    pub size: Offset,
}

/// Three header callbacks (one per root kind) plus one link callback, per
/// `spec.md` §4.4. A header returning `true` skips that chain's body.
pub trait AnchorChainVisitor {
    fn visit_static_anchor_chain_header(
        &mut self,
        roots: &[RootDescriptor],
        node: &ChainNode,
        bytes: Option<&[u8]>,
    ) -> bool;

    fn visit_stack_anchor_chain_header(
        &mut self,
        roots: &[RootDescriptor],
        node: &ChainNode,
        bytes: Option<&[u8]>,
    ) -> bool;

    fn visit_register_anchor_chain_header(
        &mut self,
        roots: &[RootDescriptor],
        node: &ChainNode,
        bytes: Option<&[u8]>,
    ) -> bool;

    fn visit_chain_link(&mut self, node: &ChainNode, bytes: Option<&[u8]>);
}

impl Graph {
    pub fn visit_static_anchor_chains(
        &self,
        target: AllocationIndex,
        finder: &dyn AllocationFinder,
        address_map: &dyn VirtualAddressMap,
        visitor: &mut dyn AnchorChainVisitor,
    ) {
        self.visit_anchor_chains(target, AnchorClass::StaticAnchor, finder, address_map, visitor);
    }

    pub fn visit_stack_anchor_chains(
        &self,
        target: AllocationIndex,
        finder: &dyn AllocationFinder,
        address_map: &dyn VirtualAddressMap,
        visitor: &mut dyn AnchorChainVisitor,
    ) {
        self.visit_anchor_chains(target, AnchorClass::StackAnchor, finder, address_map, visitor);
    }

    pub fn visit_register_anchor_chains(
        &self,
        target: AllocationIndex,
        finder: &dyn AllocationFinder,
        address_map: &dyn VirtualAddressMap,
        visitor: &mut dyn AnchorChainVisitor,
    ) {
        self.visit_anchor_chains(target, AnchorClass::RegisterAnchor, finder, address_map, visitor);
    }

    /// Shared walk used by the three `visit_*_anchor_chains` entry points.
    /// Candidate anchor points are `target`'s ancestors that are directly
    /// rooted for `kind`, enumerated in ascending address order so the
    /// visitor's reporting caps are deterministic (§4.4 "Reporting caps").
    fn visit_anchor_chains(
        &self,
        target: AllocationIndex,
        kind: AnchorClass,
        finder: &dyn AllocationFinder,
        address_map: &dyn VirtualAddressMap,
        visitor: &mut dyn AnchorChainVisitor,
    ) {
        let roots = self.root_incidence(kind);

        let mut candidates: Vec<AllocationIndex> = self.ancestors(target);
        if roots.contains_key(&target) {
            candidates.push(target);
        }
        candidates.retain(|index| roots.contains_key(index));
        candidates.sort_by_key(|index| {
            finder
                .allocation_at(*index)
                .expect("anchor-chain candidate must be a live allocation index")
                .address
                .as_u64()
        });

        for anchor in candidates {
            let allocation = finder
                .allocation_at(anchor)
                .unwrap_or_else(|| panic!("invariant violation: dangling edge to index {}", anchor.0));
            let bytes = address_map.find(allocation.address);
            let node = ChainNode {
                address: allocation.address,
                size: allocation.size,
            };
            let descriptors = &roots[&anchor];
            let skip_body = match kind {
                AnchorClass::StaticAnchor => {
                    visitor.visit_static_anchor_chain_header(descriptors, &node, bytes)
                }
                AnchorClass::StackAnchor => {
                    visitor.visit_stack_anchor_chain_header(descriptors, &node, bytes)
                }
                AnchorClass::RegisterAnchor => {
                    visitor.visit_register_anchor_chain_header(descriptors, &node, bytes)
                }
                _ => unreachable!("visit_anchor_chains is only called with a rooted AnchorClass"),
            };
            if skip_body || anchor == target {
                continue;
            }

            for link in self.shortest_path(anchor, target) {
                let link_allocation = finder
                    .allocation_at(link)
                    .unwrap_or_else(|| panic!("invariant violation: dangling edge to index {}", link.0));
                let link_bytes = address_map.find(link_allocation.address);
                let link_node = ChainNode {
                    address: link_allocation.address,
                    size: link_allocation.size,
                };
                visitor.visit_chain_link(&link_node, link_bytes);
            }
        }
    }
}
