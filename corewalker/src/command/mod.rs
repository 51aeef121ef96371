//! C9: the subcommand surface (`spec.md` §6/§9) — the output/error
//! plumbing one invocation uses (`context`), the error kinds it can
//! report (`error`), and the registry/dispatch layer that wires an
//! iterator to a visitor (`runner`).

pub mod context;
pub mod error;
pub mod runner;

pub use context::Context;
pub use error::{ArgumentError, ConfigurationError};
pub use runner::Runner;
