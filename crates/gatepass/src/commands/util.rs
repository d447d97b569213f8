//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use gatepass_core::lifecycle::qr::DEFAULT_MODULE_PX;
use gatepass_core::{PassManager, QrImage, VisitorPass};

use crate::error::CliError;

/// Reconcile with the backend, then find a pass by id or code.
pub async fn resolve_pass(
    manager: &PassManager,
    identifier: &str,
) -> Result<Arc<VisitorPass>, CliError> {
    manager.refresh().await?;
    manager
        .store()
        .resolve(identifier)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "pass".into(),
            identifier: identifier.into(),
            list_command: "pass list".into(),
        })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Write a QR symbol to `path`; `.svg` gets vector output, anything else PNG.
pub fn write_qr_file(qr: &QrImage, path: &Path) -> Result<(), CliError> {
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    let bytes = if is_svg {
        qr.to_svg().into_bytes()
    } else {
        qr.to_png(DEFAULT_MODULE_PX)
            .map_err(|e| CliError::Qr { message: e.to_string() })?
    };
    std::fs::write(path, bytes)?;
    Ok(())
}
