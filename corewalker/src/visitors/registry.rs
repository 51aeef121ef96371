//! Flat command name -> visitor factory table, mirroring
//! `iterators::registry::IteratorRegistry`.

use std::collections::HashMap;

use crate::command::error::ArgumentError;

use super::VisitorFactory;

/// Owns every built-in visitor factory, keyed by command name.
pub struct VisitorRegistry {
    factories: HashMap<&'static str, Box<dyn VisitorFactory>>,
}

impl VisitorRegistry {
    pub fn new() -> Self {
        Self::with_explainer(super::explainer::ExplainerFactory::default())
    }

    /// Builds the registry with a caller-supplied `explain` factory, used
    /// to plumb a non-default reporting cap through from `AnalysisConfig`
    /// (`spec.md` §4.4 "Reporting caps").
    pub fn with_explainer(explainer: super::explainer::ExplainerFactory) -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(Box::new(super::counter::CounterFactory));
        registry.register(Box::new(super::summarizer::SummarizerFactory));
        registry.register(Box::new(super::enumerator::EnumeratorFactory));
        registry.register(Box::new(super::lister::ListerFactory));
        registry.register(Box::new(super::shower::ShowerFactory));
        registry.register(Box::new(super::describer::DescriberFactory));
        registry.register(Box::new(explainer));
        registry
    }

    fn register(&mut self, factory: Box<dyn VisitorFactory>) {
        self.factories.insert(factory.command_name(), factory);
    }

    pub fn get(&self, command_name: &str) -> Result<&dyn VisitorFactory, ArgumentError> {
        self.factories
            .get(command_name)
            .map(|f| f.as_ref())
            .ok_or_else(|| ArgumentError::UnknownVisitor(command_name.to_string()))
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for VisitorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_seven_commands_are_registered() {
        let registry = VisitorRegistry::new();
        assert_eq!(
            registry.command_names(),
            vec!["count", "describe", "enumerate", "explain", "list", "show", "summarize"]
        );
    }

    #[test]
    fn unknown_command_is_reported() {
        let registry = VisitorRegistry::new();
        assert!(matches!(
            registry.get("bogus"),
            Err(ArgumentError::UnknownVisitor(name)) if name == "bogus"
        ));
    }
}
