//! Output formatting: table, JSON, YAML, plain, and message lines.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.
//! Device messages shown in the menu are always rendered as colored text.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use anova_core::{Message, MessageKind, Temperature, TemperatureUnit};

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

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
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
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single item; `table` uses `detail_fn` instead of a grid.
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

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
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

// ── Device messages ──────────────────────────────────────────────────

/// One line per message: state events show temperature and status,
/// everything else shows its tag and compact payload.
pub fn format_message(message: &Message, unit: TemperatureUnit, color: bool) -> String {
    let time = message.received_at.format("%H:%M:%S").to_string();
    let kind = message.kind();
    let label = format!("{:<8}", kind.to_string());
    let label = if color {
        match kind {
            MessageKind::State => label.cyan().bold().to_string(),
            MessageKind::Event => label.yellow().to_string(),
            MessageKind::Response => label.green().to_string(),
            MessageKind::Raw => label.dimmed().to_string(),
        }
    } else {
        label
    };

    let body = match (kind, message.state_summary()) {
        (MessageKind::State, Some(state)) => {
            let temp = state.temperature_c.map_or_else(
                || "-".to_owned(),
                |c| in_unit(Temperature::celsius(c), unit),
            );
            let status = state.status.as_deref().unwrap_or("-");
            format!("Temp: {temp}  Status: {status}")
        }
        (MessageKind::Raw, _) => message.raw.clone(),
        _ => {
            let mut body = message.command_or_unknown().to_owned();
            if let Some(ref request_id) = message.request_id {
                let _ = write!(body, "  [{request_id}]");
            }
            if !message.payload.is_null() {
                let _ = write!(body, "  {}", compact_payload(&message.payload));
            }
            body
        }
    };

    format!("[{time}] {label} {body}")
}

fn compact_payload(payload: &Value) -> String {
    serde_json::to_string(payload).unwrap_or_else(|_| payload.to_string())
}

/// `60.0°C` shown in `unit`.
pub fn in_unit(temperature: Temperature, unit: TemperatureUnit) -> String {
    Temperature::new(temperature.to_unit(unit), unit).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use serde::Serialize;

    #[derive(Serialize)]
    struct Item {
        id: &'static str,
        name: &'static str,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "ID")]
        id: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                id: "c1",
                name: "Kitchen",
            },
            Item {
                id: "o1",
                name: "Oven",
            },
        ]
    }

    fn render(format: OutputFormat) -> String {
        render_list(
            format,
            &items(),
            |i| ItemRow { id: i.id.into() },
            |i| i.id.into(),
        )
    }

    fn message(command: Option<&str>, payload: Value, raw: &str) -> Message {
        Message {
            seq: 0,
            received_at: chrono::Utc::now(),
            command: command.map(str::to_owned),
            request_id: None,
            payload,
            raw: raw.into(),
        }
    }

    #[test]
    fn state_lines_use_the_display_unit() {
        let state = message(
            Some("EVENT_APC_STATE"),
            serde_json::json!({ "temperature": 60.0, "status": "cooking" }),
            "",
        );
        let line = format_message(&state, TemperatureUnit::Fahrenheit, false);
        assert!(line.contains("STATE"), "{line}");
        assert!(line.contains("Temp: 140.0°F"), "{line}");
        assert!(line.contains("Status: cooking"), "{line}");
    }

    #[test]
    fn raw_and_response_lines() {
        let raw = message(None, Value::Null, "not json");
        let line = format_message(&raw, TemperatureUnit::Celsius, false);
        assert!(line.ends_with("RAW      not json"), "{line}");

        let response = message(Some("RESPONSE"), serde_json::json!({ "status": "ok" }), "");
        let line = format_message(&response, TemperatureUnit::Celsius, false);
        assert!(line.contains(r#"RESPONSE  {"status":"ok"}"#), "{line}");
    }

    #[test]
    fn plain_lists_one_id_per_line() {
        assert_eq!(render(OutputFormat::Plain), "c1\no1");
    }

    #[test]
    fn structured_formats_keep_all_fields() {
        let json: Value = serde_json::from_str(&render(OutputFormat::Json)).unwrap();
        assert_eq!(json[1]["name"], "Oven");
        assert!(!render(OutputFormat::JsonCompact).contains('\n'));
        assert!(render(OutputFormat::Yaml).contains("name: Kitchen"));
        assert!(render(OutputFormat::Table).contains("ID"));
    }
}
