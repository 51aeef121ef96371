//! C3: the Signature Directory (`spec.md` §3). A bidirectional mapping
//! between a candidate leading word of an allocation (the "signature") and
//! a human-readable type name; multiple signatures may share a name (same
//! class, multiple vtables).

use std::collections::{BTreeSet, HashMap};

use crate::offset::Offset;

#[derive(Debug, Default)]
pub struct SignatureDirectory {
    names: HashMap<Offset, String>,
    signatures_by_name: HashMap<String, BTreeSet<Offset>>,
}

impl SignatureDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, signature: Offset, name: impl Into<String>) {
        let name = name.into();
        self.names.insert(signature, name.clone());
        self.signatures_by_name
            .entry(name)
            .or_default()
            .insert(signature);
    }

    pub fn is_mapped(&self, signature: Offset) -> bool {
        self.names.contains_key(&signature)
    }

    /// Empty string if `signature` is unmapped, matching the C++ contract
    /// this was distilled from (`SignatureDirectory::Name`).
    pub fn name(&self, signature: Offset) -> &str {
        self.names.get(&signature).map(String::as_str).unwrap_or("")
    }

    pub fn signatures(&self, name: &str) -> BTreeSet<Offset> {
        self.signatures_by_name.get(name).cloned().unwrap_or_default()
    }
}
