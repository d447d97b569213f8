//! Visitor pass command handlers.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use futures_util::StreamExt;
use futures_util::stream::select_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;
use tracing::warn;

use gatepass_core::lifecycle::{PASS_VALIDITY_SECS, format_instant, render};
use gatepass_core::{CountdownView, PassManager, PassStatus, QrImage, VisitorPass};

use crate::cli::{GlobalOpts, OutputFormat, PassArgs, PassCommand};
use crate::error::CliError;
use crate::output::{self, paint_countdown, should_color};

use super::util;

// ── Views ───────────────────────────────────────────────────────────

/// Serializable snapshot of a pass at one instant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PassView {
    id: String,
    code: String,
    visitor_name: String,
    created_at: Option<String>,
    expires_at: Option<String>,
    status: PassStatus,
    countdown: CountdownView,
    #[serde(skip)]
    expires: Option<DateTime<Utc>>,
}

impl PassView {
    fn new(pass: &VisitorPass, now: DateTime<Utc>) -> Self {
        Self {
            id: pass.id.to_string(),
            code: pass.code.clone(),
            visitor_name: pass.visitor_name.clone(),
            created_at: pass.created_at.map(format_instant),
            expires_at: pass.expires_at.map(format_instant),
            status: pass.effective_status(now),
            countdown: pass.countdown(now),
            expires: pass.expires_at,
        }
    }
}

#[derive(Tabled)]
struct PassRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Visitor")]
    visitor: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "ID")]
    id: String,
}

fn local_time(instant: Option<DateTime<Utc>>) -> String {
    instant.map_or_else(
        || "-".into(),
        |t| t.with_timezone(&Local).format("%H:%M:%S").to_string(),
    )
}

fn detail(view: &PassView, color: bool) -> String {
    [
        format!("Code:       {}", view.code),
        format!("Visitor:    {}", view.visitor_name),
        format!(
            "Expires:    {} ({})",
            view.expires_at.as_deref().unwrap_or("-"),
            local_time(view.expires)
        ),
        format!("Remaining:  {}", paint_countdown(&view.countdown, color)),
        format!("Status:     {}", view.status),
        format!("ID:         {}", view.id),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    manager: &PassManager,
    args: PassArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = should_color(global.color);

    match args.command {
        PassCommand::Create {
            name,
            qr_out,
            show_qr,
        } => {
            let pass = manager.create_pass(name).await?;
            let qr = render_qr(&pass.qr_payload)?;

            if let Some(ref path) = qr_out {
                util::write_qr_file(&qr, path)?;
                if !global.quiet {
                    eprintln!("QR code written to {}", path.display());
                }
            }
            if show_qr {
                output::print_output(&qr.to_terminal(), global.quiet);
            }

            let view = PassView::new(&pass, manager.now());
            let out = output::render_single(
                global.output,
                &view,
                |v| detail(v, color),
                |v| v.code.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PassCommand::List => {
            manager.refresh().await?;
            let now = manager.now();
            let views: Vec<PassView> = manager
                .active_passes()
                .iter()
                .map(|p| PassView::new(p, now))
                .collect();

            let out = output::render_list(
                global.output,
                &views,
                |v| PassRow {
                    code: v.code.clone(),
                    visitor: v.visitor_name.clone(),
                    expires: local_time(v.expires),
                    remaining: paint_countdown(&v.countdown, color),
                    id: v.id.clone(),
                },
                |v| v.code.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PassCommand::Cancel { id } => {
            if let Err(e) = manager.refresh().await {
                warn!(error = %e, "could not refresh before cancel");
            }
            let label = manager
                .store()
                .resolve(&id)
                .map_or_else(|| id.clone(), |p| format!("{} ({})", p.code, p.visitor_name));

            if !util::confirm(&format!("Cancel pass {label}?"), "pass cancel", global.yes)? {
                return Ok(());
            }

            let (removed, confirmed) = manager.cancel_pass(&id).await?;
            if removed.is_none() && !confirmed {
                return Err(CliError::NotFound {
                    resource_type: "pass".into(),
                    identifier: id,
                    list_command: "pass list".into(),
                });
            }
            if !confirmed {
                eprintln!("warning: the backend did not confirm; pass removed locally");
            }
            if !global.quiet {
                eprintln!("Cancelled pass {label}");
            }
            Ok(())
        }

        PassCommand::Watch { id } => {
            let passes = match id {
                Some(ref id) => vec![util::resolve_pass(manager, id).await?],
                None => {
                    manager.refresh().await?;
                    manager.active_passes()
                }
            };
            watch(manager, &passes, global, color).await
        }

        PassCommand::Qr { id, out } => {
            let pass = util::resolve_pass(manager, &id).await?;
            let payload = pass.payload_string()?;
            let qr = render_qr(&payload)?;

            if let Some(ref path) = out {
                util::write_qr_file(&qr, path)?;
                if !global.quiet {
                    eprintln!("QR code for {} written to {}", pass.code, path.display());
                }
                return Ok(());
            }

            if matches!(global.output, OutputFormat::Table) {
                let art = format!("{}\n{}  {}", qr.to_terminal(), pass.code, pass.visitor_name);
                output::print_output(&art, global.quiet);
            } else {
                let export = QrExport {
                    id: pass.id.to_string(),
                    code: pass.code.clone(),
                    payload,
                    data_url: qr
                        .to_data_url(gatepass_core::lifecycle::qr::DEFAULT_MODULE_PX)
                        .map_err(|e| CliError::Qr { message: e.to_string() })?,
                };
                let out = output::render_single(
                    global.output,
                    &export,
                    |e| e.payload.clone(),
                    |e| e.data_url.clone(),
                );
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QrExport {
    id: String,
    code: String,
    payload: String,
    data_url: String,
}

fn render_qr(payload: &str) -> Result<QrImage, CliError> {
    render(payload).map_err(|e| CliError::Qr {
        message: e.to_string(),
    })
}

// ── Watch ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct WatchLine<'a> {
    code: &'a str,
    #[serde(flatten)]
    countdown: &'a CountdownView,
}

/// Drive one countdown per pass off the shared ticker until every pass
/// has expired or the user hits Ctrl-C.
async fn watch(
    manager: &PassManager,
    passes: &[Arc<VisitorPass>],
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    if passes.is_empty() {
        if !global.quiet {
            eprintln!("No active passes.");
        }
        return Ok(());
    }

    let streams = passes.iter().enumerate().filter_map(|(i, p)| {
        manager
            .watch_countdown(&p.id)
            .map(|s| Box::pin(s.map(move |view| (i, view))))
    });
    let mut merged = select_all(streams);

    let bars = matches!(global.output, OutputFormat::Table).then(|| progress_bars(passes)).transpose()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            next = merged.next() => {
                let Some((i, view)) = next else { break };
                let Some(pass) = passes.get(i) else { continue };

                match bars.as_ref().and_then(|b| b.get(i)) {
                    Some(bar) => {
                        bar.set_position(view.remaining_seconds);
                        let msg = format!("{}  {}", paint_countdown(&view, color), pass.visitor_name);
                        if view.is_expired() {
                            bar.finish_with_message(msg);
                        } else {
                            bar.set_message(msg);
                        }
                    }
                    None => {
                        let line = WatchLine { code: &pass.code, countdown: &view };
                        output::print_output(&output::render_json(&line, true), global.quiet);
                    }
                }
            }
        }
    }

    if let Some(bars) = bars {
        for bar in bars.iter().filter(|b| !b.is_finished()) {
            bar.abandon();
        }
    }
    Ok(())
}

fn progress_bars(passes: &[Arc<VisitorPass>]) -> Result<Vec<ProgressBar>, CliError> {
    let style = ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {msg}")
        .map_err(|e| CliError::Internal(format!("progress template: {e}")))?
        .progress_chars("█▓░");
    let window = u64::try_from(PASS_VALIDITY_SECS).unwrap_or(1800);

    let multi = MultiProgress::new();
    Ok(passes
        .iter()
        .map(|p| {
            let bar = multi.add(ProgressBar::new(window));
            bar.set_style(style.clone());
            bar.set_prefix(p.code.clone());
            bar
        })
        .collect())
}
