//! Flat name -> factory table (`spec.md` §9 Design Notes: "avoid
//! templating every (iterator, visitor) pair"; ground truth for the
//! lookup shape is
//! `examples/original_source/src/Allocations/Subcommands/SubcommandsForOneIterator.h`,
//! which resolves a set name to one iterator factory before crossing it
//! with a visitor).

use std::collections::HashMap;

use crate::command::error::ArgumentError;

use super::IteratorFactory;

/// Owns every built-in iterator factory, keyed by set name.
pub struct IteratorRegistry {
    factories: HashMap<&'static str, Box<dyn IteratorFactory>>,
}

impl IteratorRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(Box::new(super::allocations::AllocationsFactory));
        registry.register(Box::new(super::chain::ChainFactory));
        registry.register(Box::new(super::classified::AnchoredFactory));
        registry.register(Box::new(super::classified::StaticAnchoredFactory));
        registry.register(Box::new(super::classified::StackAnchoredFactory));
        registry.register(Box::new(super::classified::RegisterAnchoredFactory));
        registry.register(Box::new(super::classified::LeakedFactory));
        registry.register(Box::new(super::classified::UnreferencedFactory));
        registry.register(Box::new(super::edge_walk::OutgoingFactory));
        registry.register(Box::new(super::edge_walk::IncomingFactory));
        registry.register(Box::new(super::edge_walk::ReachFactory));
        registry.register(Box::new(super::edge_walk::RetainedFactory));
        registry
    }

    fn register(&mut self, factory: Box<dyn IteratorFactory>) {
        self.factories.insert(factory.set_name(), factory);
    }

    pub fn get(&self, set_name: &str) -> Result<&dyn IteratorFactory, ArgumentError> {
        self.factories
            .get(set_name)
            .map(|f| f.as_ref())
            .ok_or_else(|| ArgumentError::UnknownSet(set_name.to_string()))
    }

    pub fn set_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for IteratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
