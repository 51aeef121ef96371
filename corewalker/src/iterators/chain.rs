//! `chain <address-in-hex> <link-offset-in-hex>` (`spec.md` §4.5, scenarios
//! S3-S5). Grounded on
//! `examples/original_source/src/Allocations/Iterators/Chain.h`: the
//! iterator is "one call behind" its own validity — `next()` always yields
//! the allocation it is currently sitting on, then resolves (and may
//! invalidate) its position for the call after that.

use corewalker_macros::IteratorMeta;

use crate::allocation::AllocationIndex;
use crate::cancel::CancelFlag;
use crate::command::error::ArgumentError;
use crate::offset::Offset;

use super::{AnalysisContext, IteratorFactory, SetIterator};

/// Walks pointer-sized links starting from one allocation until the link
/// offset doesn't fit, the stored word doesn't resolve to an allocation, or
/// the read itself fails.
pub struct ChainIterator<'a> {
    finder: &'a dyn crate::finder::AllocationFinder,
    address_map: &'a dyn crate::address_map::VirtualAddressMap,
    width: crate::offset::Width,
    order: crate::offset::ByteOrder,
    link_offset: u64,
    current: AllocationIndex,
    none_index: AllocationIndex,
}

impl SetIterator for ChainIterator<'_> {
    fn next(&mut self, cancel: &CancelFlag) -> Option<AllocationIndex> {
        if cancel.is_cancelled() || self.current == self.none_index {
            return None;
        }
        let return_value = self.current;
        self.current = self.none_index;

        if let Some(allocation) = self.finder.allocation_at(return_value) {
            let bytes_needed = self.link_offset + self.width.byte_len() as u64;
            if allocation.size.as_u64() >= bytes_needed {
                let link_address = allocation.address + self.link_offset;
                if let Some(bytes) = self.address_map.find(link_address) {
                    if let Some(word) = Offset::read_at(bytes, self.width, self.order) {
                        self.current = self.finder.allocation_index_of(word);
                    }
                }
            }
        }

        Some(return_value)
    }
}

#[derive(IteratorMeta)]
#[iterator(
    name = "chain",
    args = 2,
    help = "Use \"chain <address-in-hex> <offset-in-hex>\" to specify a set starting at the allocation containing the specified address and following links at the given offset until the link offset doesn't fit in the allocation or the target is not in an allocation."
)]
pub struct ChainFactory;

impl IteratorFactory for ChainFactory {
    fn create<'a>(
        &self,
        ctx: &AnalysisContext<'a>,
        positionals: &[String],
    ) -> Result<Box<dyn SetIterator + 'a>, ArgumentError> {
        if positionals.len() < 2 {
            return Err(if positionals.is_empty() {
                ArgumentError::MissingAddressAndLinkOffset
            } else {
                ArgumentError::MissingLinkOffset
            });
        }

        let address_token = &positionals[0];
        let offset_token = &positionals[1];

        let address = Offset::parse_hex(address_token, ctx.width)
            .ok_or_else(|| ArgumentError::InvalidAddress(address_token.clone()))?;
        let link_offset = Offset::parse_hex(offset_token, ctx.width)
            .ok_or_else(|| ArgumentError::InvalidLinkOffset(offset_token.clone()))?;

        let none_index = ctx.finder.none_index();
        let index = ctx.finder.allocation_index_of(address);
        if index == none_index {
            return Err(ArgumentError::NotAnAllocation(address_token.clone()));
        }

        Ok(Box::new(ChainIterator {
            finder: ctx.finder,
            address_map: ctx.address_map,
            width: ctx.width,
            order: ctx.order,
            link_offset: link_offset.as_u64(),
            current: index,
            none_index,
        }))
    }
}
