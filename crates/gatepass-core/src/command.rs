// ── Command API ──
//
// Every pass mutation (and the gate check) flows through one `Command`
// enum. The manager's command processor routes each variant to the
// backend and applies the local side effects.

use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{VisitorPass, Verification};
use crate::store::ReconcileReport;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All operations routed through the command processor.
#[derive(Debug, Clone)]
pub enum Command {
    /// Generate a code, snapshot the payload, and register the pass.
    CreatePass { visitor_name: Option<String> },
    /// Cancel by backend id, local id, or access code.
    CancelPass { identifier: String },
    /// Ask the backend whether a code is valid right now.
    VerifyPass { code: String },
    /// Reconcile the local list with the backend's active passes.
    Refresh,
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    Created(Arc<VisitorPass>),
    Cancelled {
        /// The pass removed locally, if this client was holding it.
        pass: Option<Arc<VisitorPass>>,
        /// `false` when the backend call failed or was skipped.
        confirmed: bool,
    },
    Verified(Verification),
    Refreshed(ReconcileReport),
}
