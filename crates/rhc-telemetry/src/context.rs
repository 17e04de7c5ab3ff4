//! Per-invocation tracing context.

use tracing::{Span, span::Entered};
use uuid::Uuid;

use crate::init::build_sha;

/// Keeps the `command` span entered for the rest of the process.
///
/// Every event logged while the guard lives carries the command label, a
/// fresh invocation id and the build identifier.
pub struct CommandContextGuard {
    invocation_id: Uuid,
    _guard: Entered<'static>,
}

impl CommandContextGuard {
    /// Enter the span for `command`.
    #[must_use]
    pub fn new(command: &str) -> Self {
        let invocation_id = Uuid::new_v4();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "command",
            command = %command,
            invocation_id = %invocation_id,
            build_sha = %build_sha(),
        )));
        Self {
            invocation_id,
            _guard: span.enter(),
        }
    }

    /// Identifier attached to this invocation's logs.
    #[must_use]
    pub const fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }
}
