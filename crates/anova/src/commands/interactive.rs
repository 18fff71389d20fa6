//! `anova` / `anova interactive`

use anova_core::Session;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::config::{self, Resolved};
use crate::error::{CliError, exit_code};
use crate::menu::Menu;
use crate::output;

use super::{pick_device, with_spinner};

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let session = resolved.open_session(global)?;

    // Prompts block in raw mode, so the interrupt is handled out of band.
    let interrupt = tokio::spawn({
        let session = session.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted, closing connections...");
                session.close().await;
                std::process::exit(exit_code::INTERRUPTED);
            }
        }
    });

    let result = connect_and_run(&session, &resolved, global).await;

    interrupt.abort();
    session.close().await;
    result
}

async fn connect_and_run(
    session: &Session,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = pick_device(session, resolved.device.as_deref(), true).await?;
    with_spinner(
        format!("Connecting to {}...", device.name),
        session.connect(&device.id),
    )
    .await?;
    debug!(device = %device.id, "connected");

    Menu::new(
        session.clone(),
        device,
        resolved.unit,
        output::should_color(global.color),
    )
    .run()
    .await
}
