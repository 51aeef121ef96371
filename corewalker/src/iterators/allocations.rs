use corewalker_macros::IteratorMeta;

use crate::allocation::AllocationIndex;
use crate::cancel::CancelFlag;
use crate::command::error::ArgumentError;

use super::{AnalysisContext, IteratorFactory, SetIterator};

/// `allocations` — every index in order (`spec.md` §4.5).
pub struct AllocationsIterator {
    next: usize,
    num_allocations: usize,
}

impl SetIterator for AllocationsIterator {
    fn next(&mut self, cancel: &CancelFlag) -> Option<AllocationIndex> {
        if cancel.is_cancelled() || self.next >= self.num_allocations {
            return None;
        }
        let index = AllocationIndex(self.next);
        self.next += 1;
        Some(index)
    }
}

#[derive(IteratorMeta)]
#[iterator(
    name = "allocations",
    args = 0,
    help = "Use \"allocations\" to specify the set of all allocations."
)]
pub struct AllocationsFactory;

impl IteratorFactory for AllocationsFactory {
    fn create<'a>(
        &self,
        ctx: &AnalysisContext<'a>,
        _positionals: &[String],
    ) -> Result<Box<dyn SetIterator + 'a>, ArgumentError> {
        Ok(Box::new(AllocationsIterator {
            next: 0,
            num_allocations: ctx.finder.num_allocations(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_every_index_in_order() {
        let mut it = AllocationsIterator {
            next: 0,
            num_allocations: 3,
        };
        let cancel = CancelFlag::new();
        assert_eq!(it.next(&cancel), Some(AllocationIndex(0)));
        assert_eq!(it.next(&cancel), Some(AllocationIndex(1)));
        assert_eq!(it.next(&cancel), Some(AllocationIndex(2)));
        assert_eq!(it.next(&cancel), None);
    }

    #[test]
    fn cancellation_ends_the_sequence_early() {
        let mut it = AllocationsIterator {
            next: 0,
            num_allocations: 3,
        };
        let cancel = CancelFlag::new();
        assert_eq!(it.next(&cancel), Some(AllocationIndex(0)));
        cancel.cancel();
        assert_eq!(it.next(&cancel), None);
    }
}
