//! C9: the flat `IteratorRegistry` x `VisitorRegistry` cross product and
//! the `Subcommand = (command, set name)` registration gate (`spec.md`
//! §6/§9 Design Notes: avoid templating every (iterator, visitor) pair;
//! grounded on
//! `examples/original_source/src/Allocations/Subcommands/SubcommandsForOneIterator.h`,
//! whose `RegisterSubcommand` produces the two `ConfigurationError`
//! diagnostics this module reports).

use std::collections::HashSet;

use crate::cancel::CancelFlag;
use crate::config::AnalysisConfig;
use crate::iterators::{AnalysisContext, IteratorRegistry};
use crate::visitors::{ExplainerFactory, VisitorRegistry};

use super::error::{ArgumentError, ConfigurationError};

/// Every visitor command is inherently set-based; this is the fixed set of
/// command names the Runner otherwise recognizes that are *not* — reserved
/// for commands a caller might register that don't cross with a set (e.g.
/// a future `help`). Kept empty by default; tests populate it to exercise
/// `ConfigurationError::NotSetBased`.
pub struct Runner {
    iterators: IteratorRegistry,
    visitors: VisitorRegistry,
    non_set_based_commands: HashSet<&'static str>,
    subcommands: HashSet<(String, String)>,
}

impl Runner {
    pub fn new() -> Self {
        Self {
            iterators: IteratorRegistry::new(),
            visitors: VisitorRegistry::new(),
            non_set_based_commands: HashSet::new(),
            subcommands: HashSet::new(),
        }
    }

    /// Builds a `Runner` whose `explain` visitor honors `config`'s
    /// reporting-cap override.
    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            iterators: IteratorRegistry::new(),
            visitors: VisitorRegistry::with_explainer(ExplainerFactory::with_max_chains_per_kind(
                config.chains_per_kind_cap(),
            )),
            non_set_based_commands: HashSet::new(),
            subcommands: HashSet::new(),
        }
    }

    pub fn with_non_set_based_command(mut self, command: &'static str) -> Self {
        self.non_set_based_commands.insert(command);
        self
    }

    pub fn set_names(&self) -> Vec<&'static str> {
        self.iterators.set_names()
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.visitors.command_names()
    }

    /// Records that `<command> <set>` should be exposed as a subcommand,
    /// matching `spec.md` §6's "Registration is rejected ... if the
    /// parent command is not set-based or is unknown; this is a
    /// configuration error, not a runtime error." Once at least one
    /// subcommand has been registered, `run` only dispatches pairs present
    /// in this table (`ArgumentError::NotRegistered` otherwise); a `Runner`
    /// with an empty table still dispatches the full cross product, so
    /// callers who never curate a subcommand surface see no behavioral
    /// change.
    pub fn register_subcommand(&mut self, command: &str, set: &str) -> Result<(), ConfigurationError> {
        if self.visitors.get(command).is_ok() {
            self.subcommands.insert((command.to_string(), set.to_string()));
            return Ok(());
        }
        if self.non_set_based_commands.contains(command) {
            return Err(ConfigurationError::NotSetBased {
                command: command.to_string(),
                set: set.to_string(),
            });
        }
        Err(ConfigurationError::UnknownCommand {
            command: command.to_string(),
            set: set.to_string(),
        })
    }

    pub fn registered_subcommands(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .subcommands
            .iter()
            .map(|(command, set)| (command.as_str(), set.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Runs `<command> <set> [positionals...]` to completion: resolves the
    /// iterator and visitor factories, drives the iterator through the
    /// visitor, and returns the accumulated report. An `ArgumentError`
    /// here is the runtime counterpart of `register_subcommand`'s
    /// `ConfigurationError` — reported to the caller's error stream,
    /// producing no output (`spec.md` §7). If any subcommand has been
    /// registered, `<command> <set>` must be among them.
    pub fn run<'a>(
        &self,
        command: &str,
        set: &str,
        positionals: &[String],
        ctx: &AnalysisContext<'a>,
        cancel: &CancelFlag,
    ) -> Result<String, ArgumentError> {
        if !self.subcommands.is_empty()
            && !self.subcommands.contains(&(command.to_string(), set.to_string()))
        {
            return Err(ArgumentError::NotRegistered {
                command: command.to_string(),
                set: set.to_string(),
            });
        }

        let iterator_factory = self.iterators.get(set)?;
        let visitor_factory = self.visitors.get(command)?;

        let mut iterator = iterator_factory.create(ctx, positionals)?;
        let mut visitor = visitor_factory.create();

        let mut output = String::new();
        while let Some(index) = iterator.next(cancel) {
            output.push_str(&visitor.visit(index, ctx));
        }
        output.push_str(&visitor.finish(ctx));
        Ok(output)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_map::SparseAddressMap;
    use crate::allocation::Allocation;
    use crate::finder::SortedFinder;
    use crate::offset::{ByteOrder, Offset, Width};
    use crate::roots::FixedRoots;
    use crate::signature::SignatureDirectory;

    fn fixture() -> (SortedFinder, SparseAddressMap, SignatureDirectory, crate::graph::Graph) {
        let map = SparseAddressMap::new();
        let finder = SortedFinder::new(vec![
            Allocation::new(Offset::U64(0x1000), Offset::U64(0x10), true),
            Allocation::new(Offset::U64(0x2000), Offset::U64(0x10), false),
        ])
        .unwrap();
        let signatures = SignatureDirectory::default();
        let roots = FixedRoots::default();
        let graph = crate::graph::Graph::build(
            &finder, &map, &roots, &roots, &roots, Width::Bits64, ByteOrder::Little,
        );
        (finder, map, signatures, graph)
    }

    #[test]
    fn count_over_allocations_reports_both() {
        let (finder, map, signatures, graph) = fixture();
        let ctx = AnalysisContext {
            finder: &finder,
            address_map: &map,
            graph: &graph,
            signatures: &signatures,
            width: Width::Bits64,
            order: ByteOrder::Little,
        };
        let runner = Runner::new();
        let report = runner
            .run("count", "allocations", &[], &ctx, &CancelFlag::new())
            .unwrap();
        assert!(report.contains('2'));
    }

    #[test]
    fn unknown_set_is_reported_as_argument_error() {
        let (finder, map, signatures, graph) = fixture();
        let ctx = AnalysisContext {
            finder: &finder,
            address_map: &map,
            graph: &graph,
            signatures: &signatures,
            width: Width::Bits64,
            order: ByteOrder::Little,
        };
        let runner = Runner::new();
        assert!(matches!(
            runner.run("count", "bogus", &[], &ctx, &CancelFlag::new()),
            Err(ArgumentError::UnknownSet(name)) if name == "bogus"
        ));
    }

    #[test]
    fn registering_under_a_known_command_succeeds() {
        let mut runner = Runner::new();
        runner.register_subcommand("count", "allocations").unwrap();
        assert_eq!(runner.registered_subcommands(), vec![("count", "allocations")]);
    }

    #[test]
    fn registering_under_an_unknown_command_is_a_configuration_error() {
        let mut runner = Runner::new();
        assert!(matches!(
            runner.register_subcommand("bogus", "allocations"),
            Err(ConfigurationError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn registering_under_a_non_set_based_command_is_a_configuration_error() {
        let mut runner = Runner::new().with_non_set_based_command("help");
        assert!(matches!(
            runner.register_subcommand("help", "allocations"),
            Err(ConfigurationError::NotSetBased { .. })
        ));
    }

    #[test]
    fn once_a_subcommand_table_exists_run_only_dispatches_registered_pairs() {
        let (finder, map, signatures, graph) = fixture();
        let ctx = AnalysisContext {
            finder: &finder,
            address_map: &map,
            graph: &graph,
            signatures: &signatures,
            width: Width::Bits64,
            order: ByteOrder::Little,
        };
        let mut runner = Runner::new();
        runner.register_subcommand("count", "allocations").unwrap();

        assert!(runner
            .run("count", "allocations", &[], &ctx, &CancelFlag::new())
            .is_ok());
        assert!(matches!(
            runner.run("count", "leaked", &[], &ctx, &CancelFlag::new()),
            Err(ArgumentError::NotRegistered { command, set })
                if command == "count" && set == "leaked"
        ));
    }

    #[test]
    fn an_empty_subcommand_table_still_dispatches_the_full_cross_product() {
        let (finder, map, signatures, graph) = fixture();
        let ctx = AnalysisContext {
            finder: &finder,
            address_map: &map,
            graph: &graph,
            signatures: &signatures,
            width: Width::Bits64,
            order: ByteOrder::Little,
        };
        let runner = Runner::new();
        assert!(runner
            .run("count", "leaked", &[], &ctx, &CancelFlag::new())
            .is_ok());
    }
}
