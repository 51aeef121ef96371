//! Error kinds from `spec.md` §7. `ArgumentError` and `ConfigurationError`
//! are ordinary values reported to a stream; `InvariantViolation` is a bug
//! and aborts (`Graph::build` panics instead of returning one — see
//! `spec.md` §7 "implementation aborts with a diagnostic"); transient read
//! failures never surface as errors at all, they're swallowed at the point
//! of the failed read (`address_map::find` returning `None`).

use thiserror::Error;

/// A caller-supplied positional could not be parsed, or resolved to
/// nothing meaningful. The exact wording here matches `spec.md` §6's
/// required error strings verbatim, including the preserved typo in the
/// third variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("No address was specified for a single allocation.")]
    MissingAddress,

    #[error("No offset was provided for the link field.")]
    MissingLinkOffset,

    /// `chain` with zero positionals reports both missing-argument lines
    /// together, matching `Chain::Factory::MakeIterator` in
    /// `examples/original_source/src/Allocations/Iterators/Chain.h`.
    #[error("No address was specified for a single allocation.\nNo offset was provided for the link field.")]
    MissingAddressAndLinkOffset,

    #[error("{0} is not a valid address.")]
    InvalidAddress(String),

    #[error("{0} is not a offset for the link field.")]
    InvalidLinkOffset(String),

    #[error("{0} is not part of an allocation.")]
    NotAnAllocation(String),

    #[error("set \"{set_name}\" takes {expected} positional argument(s), got {actual}")]
    WrongArity {
        set_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("no set named \"{0}\" is registered")]
    UnknownSet(String),

    #[error("no visitor named \"{0}\" is registered")]
    UnknownVisitor(String),

    #[error("subcommand \"{command} {set}\" was not registered")]
    NotRegistered { command: String, set: String },
}

/// An attempt to register a subcommand under a nonexistent or non-set-based
/// command — a startup-time configuration error, not a runtime one
/// (`spec.md` §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Attempted to register subcommand \"{command} {set}\" for command that does not exist.")]
    UnknownCommand { command: String, set: String },

    #[error("Attempted to register subcommand \"{command} {set}\" for command that is not set based.")]
    NotSetBased { command: String, set: String },
}
