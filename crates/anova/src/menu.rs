//! Interactive device menu.
//!
//! The entries depend on the device family: cookers get six, ovens get
//! eight (one start entry per cook mode). Errors from an action are
//! printed and the menu comes back; only Exit or an interrupt ends it.

use std::sync::Arc;
use std::time::Duration;

use dialoguer::{Confirm, Input, Select};
use futures_util::StreamExt;
use owo_colors::OwoColorize;

use anova_core::{
    CommandReceipt, ConnectionState, CookMode, CookParams, Device, DeviceKind, ExportRange,
    Session, Temperature, TemperatureRange, TemperatureUnit,
};

use crate::commands::export as export_cmd;
use crate::commands::{blocking_prompt, prompt_err, with_spinner};
use crate::error::CliError;
use crate::output;

/// Messages replayed before the live view starts.
const HISTORY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ShowMessages,
    StartCook(CookMode),
    StopCook,
    SetUnit,
    ExportTelemetry,
    Exit,
}

impl Action {
    /// Entries for a device family, in display order.
    pub fn for_kind(kind: DeviceKind) -> Vec<Self> {
        let mut actions = vec![Self::ShowMessages];
        actions.extend(kind.cook_modes().iter().map(|&mode| Self::StartCook(mode)));
        actions.extend([
            Self::StopCook,
            Self::SetUnit,
            Self::ExportTelemetry,
            Self::Exit,
        ]);
        actions
    }

    pub fn label(self, kind: DeviceKind) -> &'static str {
        match (self, kind) {
            (Self::ShowMessages, _) => "Show message stream",
            (Self::StartCook(CookMode::SousVide), DeviceKind::Cooker) => "Start sous vide cook",
            (Self::StartCook(CookMode::SousVide), DeviceKind::Oven) => {
                "Start sous vide cook (wet bulb)"
            }
            (Self::StartCook(CookMode::Roast), _) => "Start roasting (dry bulb)",
            (Self::StartCook(CookMode::Steam), _) => "Start steam cooking",
            (Self::StopCook, _) => "Stop cooking",
            (Self::SetUnit, _) => "Set temperature unit",
            (Self::ExportTelemetry, _) => "Export telemetry data",
            (Self::Exit, _) => "Exit",
        }
    }
}

/// Numbered entries; Exit is always `0`.
pub fn menu_items(kind: DeviceKind) -> Vec<String> {
    Action::for_kind(kind)
        .into_iter()
        .enumerate()
        .map(|(i, action)| {
            let key = if action == Action::Exit { 0 } else { i + 1 };
            format!("{key}  {}", action.label(kind))
        })
        .collect()
}

/// Map a menu choice to its action. The menu only ends through Exit or an
/// interrupt.
pub fn select_action(
    actions: &[Action],
    choice: Result<usize, CliError>,
) -> Result<Action, CliError> {
    match choice {
        Ok(index) => Ok(actions.get(index).copied().unwrap_or(Action::Exit)),
        Err(CliError::Interrupted) => Ok(Action::Exit),
        Err(e) => Err(e),
    }
}

/// Cook time entered in minutes.
pub fn timer_from_minutes(minutes: f64) -> Result<Duration, CliError> {
    Duration::try_from_secs_f64(minutes * 60.0).map_err(|_| CliError::Validation {
        field: "cook time".into(),
        reason: format!("{minutes} is not a positive number of minutes"),
    })
}

pub struct Menu {
    session: Session,
    device: Arc<Device>,
    unit: TemperatureUnit,
    color: bool,
}

impl Menu {
    pub fn new(session: Session, device: Arc<Device>, unit: TemperatureUnit, color: bool) -> Self {
        Self {
            session,
            device,
            unit,
            color,
        }
    }

    pub async fn run(mut self) -> Result<(), CliError> {
        let kind = self.device.kind;
        let actions = Action::for_kind(kind);
        let items = menu_items(kind);

        loop {
            self.offer_reconnect().await?;

            let prompt = format!("{} [{}]", self.device.name, self.unit.symbol());
            let items = items.clone();
            let choice = blocking_prompt(move || {
                Select::new()
                    .with_prompt(prompt)
                    .items(&items)
                    .default(0)
                    .interact()
                    .map_err(prompt_err)
            })
            .await;

            let action = select_action(&actions, choice)?;
            if action == Action::Exit {
                return Ok(());
            }

            match self.perform(action).await {
                Ok(()) => {}
                Err(CliError::Interrupted) => return Ok(()),
                Err(e) => eprintln!("{:?}", miette::Report::new(e)),
            }
        }
    }

    async fn perform(&mut self, action: Action) -> Result<(), CliError> {
        match action {
            Action::ShowMessages => self.show_messages().await,
            Action::StartCook(mode) => self.start_cook(mode).await,
            Action::StopCook => {
                let receipt = self.session.stop_cook(&self.device.id).await?;
                self.await_reply("Stop cooking", receipt).await
            }
            Action::SetUnit => self.set_unit().await,
            Action::ExportTelemetry => self.export().await,
            Action::Exit => Ok(()),
        }
    }

    /// A closed connection is only reopened when the user agrees.
    async fn offer_reconnect(&self) -> Result<(), CliError> {
        let id = &self.device.id;
        if self.session.connection_state(id) != ConnectionState::Disconnected {
            return Ok(());
        }

        let reconnect = blocking_prompt(|| {
            Confirm::new()
                .with_prompt("The device connection is closed. Reconnect?")
                .default(true)
                .interact()
                .map_err(prompt_err)
        })
        .await?;
        if reconnect {
            let connected = with_spinner("Reconnecting...", self.session.connect(id)).await;
            if let Err(e) = connected {
                eprintln!("{:?}", miette::Report::new(CliError::from(e)));
            }
        }
        Ok(())
    }

    async fn show_messages(&self) -> Result<(), CliError> {
        let log = self.session.message_log(&self.device.id)?;
        let live_from = log.len();
        let history = log.since(live_from.saturating_sub(HISTORY));

        println!(
            "Last {} message(s) from {}; live messages follow. Press Enter to return.",
            history.len(),
            self.device.name
        );
        for message in &history {
            println!("{}", output::format_message(message, self.unit, self.color));
        }

        let mut live = log.stream_from(live_from);
        let mut enter = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| ())
        });
        loop {
            tokio::select! {
                _ = &mut enter => break,
                next = live.next() => match next {
                    Some(message) => {
                        println!("{}", output::format_message(&message, self.unit, self.color));
                    }
                    None => {
                        let _ = (&mut enter).await;
                        break;
                    }
                },
            }
        }
        Ok(())
    }

    async fn start_cook(&self, mode: CookMode) -> Result<(), CliError> {
        let unit = self.unit;
        let (min, max) = TemperatureRange::for_mode(self.device.kind, mode).in_unit(unit);

        let params = blocking_prompt(move || {
            let value: f64 = Input::new()
                .with_prompt(format!(
                    "Target temperature ({min:.0}-{max:.0}{})",
                    unit.symbol()
                ))
                .interact_text()
                .map_err(prompt_err)?;
            let humidity = if mode == CookMode::Steam {
                let humidity: u8 = Input::new()
                    .with_prompt("Humidity (0-100%)")
                    .interact_text()
                    .map_err(prompt_err)?;
                Some(humidity)
            } else {
                None
            };
            let minutes: f64 = Input::new()
                .with_prompt("Cook time (minutes)")
                .interact_text()
                .map_err(prompt_err)?;

            Ok(CookParams {
                mode: Some(mode),
                temperature: Some(Temperature::new(value, unit)),
                timer: Some(timer_from_minutes(minutes)?),
                humidity,
            })
        })
        .await?;

        let receipt = self.session.start_cook(&self.device.id, params).await?;
        self.await_reply("Start cooking", receipt).await
    }

    async fn set_unit(&mut self) -> Result<(), CliError> {
        let units = [TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit];
        let current = usize::from(self.unit == TemperatureUnit::Fahrenheit);
        let index = blocking_prompt(move || {
            Select::new()
                .with_prompt("Temperature unit")
                .items(&["Celsius (°C)", "Fahrenheit (°F)"])
                .default(current)
                .interact()
                .map_err(prompt_err)
        })
        .await?;
        let unit = units.get(index).copied().unwrap_or(self.unit);
        self.apply_unit(unit).await
    }

    /// Displayed temperatures switch only once the device confirms.
    async fn apply_unit(&mut self, unit: TemperatureUnit) -> Result<(), CliError> {
        let receipt = self.session.set_unit(&self.device.id, unit).await?;
        self.await_reply("Set temperature unit", receipt).await?;
        self.unit = unit;
        Ok(())
    }

    async fn export(&self) -> Result<(), CliError> {
        let today = export_cmd::today();
        let suggested_start = (today - chrono::TimeDelta::days(7)).to_string();
        let (start, end) = blocking_prompt(move || {
            let start: String = Input::new()
                .with_prompt("Start date (YYYY-MM-DD)")
                .default(suggested_start)
                .interact_text()
                .map_err(prompt_err)?;
            let end: String = Input::new()
                .with_prompt("End date (YYYY-MM-DD)")
                .default(today.to_string())
                .interact_text()
                .map_err(prompt_err)?;
            Ok((start, end))
        })
        .await?;
        let range = ExportRange::parse(&start, &end, today)?;

        let export = with_spinner(
            "Waiting for export links...",
            self.session.export_telemetry(&self.device.id, range),
        )
        .await?;
        println!("{}", export_cmd::detail(&export));
        Ok(())
    }

    async fn await_reply(&self, label: &str, receipt: CommandReceipt) -> Result<(), CliError> {
        let reply = with_spinner(format!("{label}: waiting for the device..."), receipt.reply())
            .await?;
        let done = format!("✓ {label}");
        let done = if self.color {
            done.green().to_string()
        } else {
            done
        };
        println!(
            "{done}  {}",
            output::format_message(&reply, self.unit, self.color)
        );
        Ok(())
    }
}
