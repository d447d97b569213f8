//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use gatepass_core::{CountdownView, UrgencyTier};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// `MM:SS` (or `Expired`) tinted by urgency tier.
pub fn paint_countdown(view: &CountdownView, color: bool) -> String {
    if !color {
        return view.display.clone();
    }
    match view.tier {
        UrgencyTier::Success => view.display.green().to_string(),
        UrgencyTier::Warning => view.display.yellow().to_string(),
        UrgencyTier::Danger => view.display.red().bold().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are not tables.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub(crate) fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatepass_core::lifecycle::view_for_secs;

    #[derive(serde::Serialize)]
    struct Item {
        code: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Code")]
        code: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { code: "K7P2QX" }, Item { code: "AB3CDE" }]
    }

    #[test]
    fn plain_emits_one_id_per_line() {
        let out = render_list(
            OutputFormat::Plain,
            &items(),
            |i| Row { code: i.code.into() },
            |i| i.code.into(),
        );
        assert_eq!(out, "K7P2QX\nAB3CDE");
    }

    #[test]
    fn compact_json_is_one_line() {
        let out = render_list(
            OutputFormat::JsonCompact,
            &items(),
            |i| Row { code: i.code.into() },
            |i| i.code.into(),
        );
        assert_eq!(out, r#"[{"code":"K7P2QX"},{"code":"AB3CDE"}]"#);
    }

    #[test]
    fn table_has_header() {
        let out = render_list(
            OutputFormat::Table,
            &items(),
            |i| Row { code: i.code.into() },
            |i| i.code.into(),
        );
        assert!(out.contains("Code"));
        assert!(out.contains("AB3CDE"));
    }

    #[test]
    fn uncolored_countdown_is_verbatim() {
        assert_eq!(paint_countdown(&view_for_secs(300), false), "05:00");
        assert_eq!(paint_countdown(&view_for_secs(0), false), "Expired");
        assert!(paint_countdown(&view_for_secs(0), true).contains("Expired"));
    }
}
