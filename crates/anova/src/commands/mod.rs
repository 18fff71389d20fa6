//! Command handlers and the helpers they share.

pub mod config_cmd;
pub mod devices;
pub mod export;
pub mod interactive;

use std::future::Future;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};

use anova_core::{Device, Session};

use crate::error::CliError;

/// Map a dialoguer failure into CliError. Ctrl-C in a raw-mode prompt
/// surfaces as `Interrupted`.
pub fn prompt_err(e: dialoguer::Error) -> CliError {
    match e {
        dialoguer::Error::IO(io) if io.kind() == ErrorKind::Interrupted => CliError::Interrupted,
        dialoguer::Error::IO(io) => CliError::Validation {
            field: "interactive".into(),
            reason: format!("prompt failed: {io}"),
        },
    }
}

/// Run a terminal prompt off the async worker threads.
pub async fn blocking_prompt<T, F>(prompt: F) -> Result<T, CliError>
where
    F: FnOnce() -> Result<T, CliError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|e| CliError::Internal(format!("prompt task failed: {e}")))?
}

/// Show a spinner on stderr while `work` runs.
pub async fn with_spinner<F: Future>(message: impl Into<String>, work: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let output = work.await;
    spinner.finish_and_clear();
    output
}

/// Discover devices and pick one: by `wanted` id or name, the only one
/// on the account, or (when `prompt` is set) a selection list.
pub async fn pick_device(
    session: &Session,
    wanted: Option<&str>,
    prompt: bool,
) -> Result<Arc<Device>, CliError> {
    let devices = with_spinner("Discovering devices...", session.list_devices()).await?;

    if let Some(identifier) = wanted {
        return Ok(session.find_device(identifier)?);
    }

    match devices.as_slice() {
        [only] => Ok(Arc::clone(only)),
        _ if prompt => {
            let items: Vec<String> = devices.iter().map(ToString::to_string).collect();
            let index = blocking_prompt(move || {
                Select::new()
                    .with_prompt("Select a device")
                    .items(&items)
                    .default(0)
                    .interact()
                    .map_err(prompt_err)
            })
            .await?;
            devices
                .get(index)
                .cloned()
                .ok_or_else(|| CliError::Internal(format!("selection {index} out of range")))
        }
        _ => Err(CliError::DeviceRequired {
            available: devices
                .iter()
                .map(|d| format!("{} ({})", d.name, d.id))
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}
