//! `corewalker`: the allocation-graph and anchor-chain subsystem of a
//! post-mortem heap analyzer. A `Session` owns the frozen `Offset`-tagged
//! data model (C1–C3) plus the root enumerators, builds the allocation
//! graph (C6) once and caches it, and dispatches `<command> <set>
//! [args...]` invocations through the flat iterator/visitor registries
//! (C9).

pub mod address_map;
pub mod allocation;
pub mod cancel;
pub mod command;
pub mod config;
pub mod finder;
pub mod fixture;
pub mod graph;
pub mod iterators;
pub mod offset;
pub mod roots;
pub mod scanner;
pub mod signature;
pub mod signature_summary;
pub mod visitors;

use std::sync::OnceLock;

use address_map::VirtualAddressMap;
use command::{ArgumentError, Runner};
use config::AnalysisConfig;
use finder::AllocationFinder;
use graph::Graph;
use iterators::AnalysisContext;
use roots::{RegisterRootSource, StackRootSource, StaticRootSource};
use signature::SignatureDirectory;

/// Owns one frozen snapshot (C1–C3 plus root enumerators) and the `Graph`
/// built from it. `graph()` builds on first use and reuses the result
/// afterward, matching the "idempotent; cached" contract for
/// `Graph.Build()` in `spec.md` §6.
pub struct Session<F, M, S, K, R> {
    finder: F,
    address_map: M,
    signatures: SignatureDirectory,
    static_roots: S,
    stack_roots: K,
    register_roots: R,
    config: AnalysisConfig,
    graph: OnceLock<Graph>,
}

impl<F, M, S, K, R> Session<F, M, S, K, R>
where
    F: AllocationFinder,
    M: VirtualAddressMap,
    S: StaticRootSource,
    K: StackRootSource,
    R: RegisterRootSource,
{
    pub fn new(
        finder: F,
        address_map: M,
        signatures: SignatureDirectory,
        static_roots: S,
        stack_roots: K,
        register_roots: R,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            finder,
            address_map,
            signatures,
            static_roots,
            stack_roots,
            register_roots,
            config,
            graph: OnceLock::new(),
        }
    }

    /// Builds the graph on first call; every later call returns the same
    /// cached `Graph`.
    pub fn graph(&self) -> &Graph {
        self.graph.get_or_init(|| {
            Graph::build(
                &self.finder,
                &self.address_map,
                &self.static_roots,
                &self.stack_roots,
                &self.register_roots,
                self.config.width(),
                self.config.order(),
            )
        })
    }

    pub fn analysis_context(&self) -> AnalysisContext<'_> {
        AnalysisContext {
            finder: &self.finder,
            address_map: &self.address_map,
            graph: self.graph(),
            signatures: &self.signatures,
            width: self.config.width(),
            order: self.config.order(),
        }
    }

    /// Runs `<command> <set> [positionals...]` against this session's
    /// frozen snapshot through a fresh `Runner` configured from
    /// `self.config`'s reporting caps.
    pub fn run(
        &self,
        command: &str,
        set: &str,
        positionals: &[String],
        cancel: &cancel::CancelFlag,
    ) -> Result<String, ArgumentError> {
        let runner = Runner::with_config(&self.config);
        runner.run(command, set, positionals, &self.analysis_context(), cancel)
    }
}
