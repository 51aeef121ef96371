//! Tallies allocations by signature and by type name, for the `summarize`
//! visitor (`spec.md` §4.6, scenario S6). Grounded verbatim on
//! `examples/original_source/src/SignatureSummary.h`: the tie-break rules
//! in the four comparators are copied exactly, since scenario S6 depends
//! on the precise sort order.

use std::collections::BTreeMap;

use crate::offset::Offset;
use crate::signature::SignatureDirectory;

/// A running `(count, bytes)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: u64,
    pub bytes: u64,
}

impl Tally {
    fn add(&mut self, bytes: u64) {
        self.count += 1;
        self.bytes += bytes;
    }
}

/// One row of summary output: a name (`"-"` for unsigned, `""` for a
/// signature with no registered name, otherwise the registered type
/// name), its grand totals, and a breakdown by signature (or, for the
/// unsigned row, by allocation size).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub totals: Tally,
    pub subtotals: Vec<(Offset, Tally)>,
}

/// Accumulates tallies over a sequence of allocations, then produces
/// sorted summary rows on demand.
pub struct SignatureSummary<'a> {
    directory: &'a SignatureDirectory,
    signature_to_tally: BTreeMap<u64, Tally>,
    name_to_tally: BTreeMap<String, Tally>,
    unsigned_tally: Tally,
    unsigned_size_to_count: BTreeMap<u64, u64>,
    width_offset_of: fn(u64) -> Offset,
}

impl<'a> SignatureSummary<'a> {
    pub fn new(directory: &'a SignatureDirectory, offset_of: fn(u64) -> Offset) -> Self {
        Self {
            directory,
            signature_to_tally: BTreeMap::new(),
            name_to_tally: BTreeMap::new(),
            unsigned_tally: Tally::default(),
            unsigned_size_to_count: BTreeMap::new(),
            width_offset_of: offset_of,
        }
    }

    /// Folds one allocation into the running tallies. `leading_word` is
    /// the allocation's first pointer-sized word, or `None` if the
    /// allocation is smaller than one word or the word couldn't be read
    /// (I5: both cases are "no signature").
    pub fn adjust_tally(&mut self, size: u64, leading_word: Option<Offset>) {
        let signature = leading_word.filter(|s| self.directory.is_mapped(*s));
        match signature {
            Some(signature) => {
                self.signature_to_tally
                    .entry(signature.as_u64())
                    .or_default()
                    .add(size);
                let name = self.directory.name(signature);
                if !name.is_empty() {
                    self.name_to_tally.entry(name.to_string()).or_default().add(size);
                }
            }
            None => {
                self.unsigned_tally.add(size);
                *self.unsigned_size_to_count.entry(size).or_default() += 1;
            }
        }
    }

    pub fn summarize_by_count(&self) -> Vec<Item> {
        let mut items = self.fill_items();
        for item in &mut items {
            if item.subtotals.len() > 1 {
                item.subtotals.sort_by(|(left_sig, left), (right_sig, right)| {
                    right
                        .count
                        .cmp(&left.count)
                        .then_with(|| left_sig.as_u64().cmp(&right_sig.as_u64()))
                });
            }
        }
        items.sort_by(compare_items_by_count);
        items
    }

    pub fn summarize_by_bytes(&self) -> Vec<Item> {
        let mut items = self.fill_items();
        for item in &mut items {
            if item.subtotals.len() > 1 {
                item.subtotals.sort_by(|(left_sig, left), (right_sig, right)| {
                    right
                        .bytes
                        .cmp(&left.bytes)
                        .then_with(|| left_sig.as_u64().cmp(&right_sig.as_u64()))
                });
            }
        }
        items.sort_by(compare_items_by_bytes);
        items
    }

    fn fill_items(&self) -> Vec<Item> {
        let mut items = Vec::new();

        if self.unsigned_tally.count > 0 {
            let subtotals = self
                .unsigned_size_to_count
                .iter()
                .map(|(&size, &count)| {
                    (
                        (self.width_offset_of)(size),
                        Tally {
                            count,
                            bytes: size * count,
                        },
                    )
                })
                .collect();
            items.push(Item {
                name: "-".to_string(),
                totals: self.unsigned_tally,
                subtotals,
            });
        }

        for (&signature, &tally) in &self.signature_to_tally {
            let offset = (self.width_offset_of)(signature);
            if self.directory.name(offset).is_empty() {
                items.push(Item {
                    name: String::new(),
                    totals: tally,
                    subtotals: vec![(offset, tally)],
                });
            }
        }

        for (name, &tally) in &self.name_to_tally {
            let mut subtotals = Vec::new();
            for signature in self.directory.signatures(name) {
                if let Some(&sig_tally) = self.signature_to_tally.get(&signature.as_u64()) {
                    subtotals.push((signature, sig_tally));
                }
            }
            items.push(Item {
                name: name.clone(),
                totals: tally,
                subtotals,
            });
        }

        items
    }
}

fn compare_items_by_count(left: &Item, right: &Item) -> std::cmp::Ordering {
    right
        .totals
        .count
        .cmp(&left.totals.count)
        .then_with(|| left.name.cmp(&right.name))
        .then_with(|| first_subtotal_key(left).cmp(&first_subtotal_key(right)))
}

fn compare_items_by_bytes(left: &Item, right: &Item) -> std::cmp::Ordering {
    right
        .totals
        .bytes
        .cmp(&left.totals.bytes)
        .then_with(|| left.name.cmp(&right.name))
        .then_with(|| first_subtotal_key(left).cmp(&first_subtotal_key(right)))
}

fn first_subtotal_key(item: &Item) -> u64 {
    item.subtotals.first().map(|(sig, _)| sig.as_u64()).unwrap_or(0)
}
