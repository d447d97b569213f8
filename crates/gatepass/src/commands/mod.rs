//! Command dispatch: bridges CLI args -> `PassManager` -> output formatting.

pub mod config_cmd;
pub mod passes;
pub mod util;
pub mod verify;

use gatepass_core::{ClientConfig, PassManager};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Run a backend-bound command inside a one-shot manager session.
///
/// The CLI reconciles on demand, so no background refresh loop runs.
pub async fn dispatch(
    cmd: Command,
    config: ClientConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    PassManager::oneshot(config, |manager| async move {
        match cmd {
            Command::Pass(args) => passes::handle(&manager, args, global).await,
            Command::Verify(args) => verify::handle(&manager, args, global).await,
            Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
                "config and completions are handled before dispatch".into(),
            )),
        }
    })
    .await
}
