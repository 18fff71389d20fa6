//! `anova devices`

use std::sync::Arc;

use tabled::Tabled;

use anova_core::Device;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

use super::with_spinner;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Hardware")]
    hardware: String,
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            kind: d.kind.to_string(),
            hardware: if d.hardware.is_empty() {
                "-".into()
            } else {
                d.hardware.clone()
            },
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let session = resolved.open_session(global)?;

    let listed = with_spinner("Discovering devices...", session.list_devices()).await;
    session.close().await;
    let devices = listed?;

    let out = output::render_list(
        global.output,
        &devices,
        |d| DeviceRow::from(d),
        |d| d.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
