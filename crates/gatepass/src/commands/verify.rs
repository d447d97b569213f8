//! Gate verification handler.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;

use gatepass_core::{CountdownView, PassManager, Verification};

use crate::cli::{GlobalOpts, VerifyArgs};
use crate::error::CliError;
use crate::output::{self, paint_countdown, should_color};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyView {
    valid: bool,
    message: Option<String>,
    code: Option<String>,
    visitor_name: Option<String>,
    countdown: CountdownView,
}

impl VerifyView {
    fn new(result: &Verification, now: DateTime<Utc>) -> Self {
        Self {
            valid: result.valid,
            message: result.message.clone(),
            code: result.pass.as_ref().map(|p| p.code.clone()),
            visitor_name: result.pass.as_ref().map(|p| p.visitor_name.clone()),
            countdown: result.countdown(now),
        }
    }
}

fn detail(view: &VerifyView, color: bool) -> String {
    let verdict = match (view.valid, color) {
        (true, true) => "VALID".green().bold().to_string(),
        (false, true) => "INVALID".red().bold().to_string(),
        (true, false) => "VALID".into(),
        (false, false) => "INVALID".into(),
    };

    let mut lines = vec![format!("Result:     {verdict}")];
    if let Some(ref message) = view.message {
        lines.push(format!("Message:    {message}"));
    }
    if let Some(ref code) = view.code {
        lines.push(format!("Code:       {code}"));
    }
    if let Some(ref name) = view.visitor_name {
        lines.push(format!("Visitor:    {name}"));
    }
    if view.valid {
        lines.push(format!("Remaining:  {}", paint_countdown(&view.countdown, color)));
    }
    lines.join("\n")
}

pub async fn handle(
    manager: &PassManager,
    args: VerifyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = manager.verify_pass(&args.code).await?;
    let view = VerifyView::new(&result, manager.now());

    let out = output::render_single(
        global.output,
        &view,
        |v| detail(v, should_color(global.color)),
        |v| if v.valid { "valid".into() } else { "invalid".into() },
    );
    output::print_output(&out, global.quiet);

    if result.valid {
        Ok(())
    } else {
        Err(CliError::PassRejected {
            code: args.code,
            message: result
                .message
                .unwrap_or_else(|| "Pass is not valid".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_detail_omits_countdown() {
        let result = Verification {
            valid: false,
            message: Some("Pass expired".into()),
            pass: None,
            time_remaining: Some(600),
        };
        let view = VerifyView::new(&result, Utc::now());
        let text = detail(&view, false);

        assert!(text.starts_with("Result:     INVALID"));
        assert!(text.contains("Message:    Pass expired"));
        assert!(!text.contains("Remaining"));
        assert_eq!(view.countdown.remaining_seconds, 0);
    }

    #[test]
    fn accepted_detail_uses_server_remaining() {
        let result = Verification {
            valid: true,
            message: None,
            pass: None,
            time_remaining: Some(754),
        };
        let text = detail(&VerifyView::new(&result, Utc::now()), false);

        assert!(text.contains("VALID"));
        assert!(text.contains("Remaining:  12:34"));
    }
}
