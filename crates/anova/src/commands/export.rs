//! `anova export`: one-shot telemetry export.

use std::fmt::Write as _;

use anova_core::{ExportRange, Session, TelemetryExport};

use crate::cli::{ExportArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::{pick_device, with_spinner};

/// Local calendar date, the reference for the 90-day window.
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

pub async fn handle(args: ExportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Bad dates never cost a connection.
    let range = ExportRange::parse(&args.start, &args.end, today())?;

    let resolved = config::resolve(global)?;
    let session = resolved.open_session(global)?;
    let result = export_once(&session, resolved.device.as_deref(), range).await;
    session.close().await;
    let export = result?;

    let out = output::render_single(global.output, &export, detail, |e| {
        e.urls
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn export_once(
    session: &Session,
    wanted: Option<&str>,
    range: ExportRange,
) -> Result<TelemetryExport, CliError> {
    let device = pick_device(session, wanted, false).await?;
    session.connect(&device.id).await?;
    let export = with_spinner(
        format!("Exporting {} to {}...", range.start(), range.end()),
        session.export_telemetry(&device.id, range),
    )
    .await?;
    Ok(export)
}

/// Numbered download links.
pub fn detail(export: &TelemetryExport) -> String {
    let mut out = format!("Telemetry for {}:", export.device);
    for (i, url) in export.urls.iter().enumerate() {
        let _ = write!(out, "\n  {}. {url}", i + 1);
    }
    out
}
