//! The output/error streams and cancellation flag threaded through one
//! command invocation (`spec.md` §7: an `ArgumentError` is reported to the
//! command's error stream and the command returns without producing
//! output, rather than propagating as a crash).

use crate::cancel::CancelFlag;

#[derive(Debug, Default)]
pub struct Context {
    pub output: String,
    pub error: String,
    pub cancel: CancelFlag,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancelFlag) -> Self {
        Self {
            output: String::new(),
            error: String::new(),
            cancel,
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_has_no_error() {
        let ctx = Context::new();
        assert!(!ctx.has_error());
        assert!(ctx.output.is_empty());
    }
}
