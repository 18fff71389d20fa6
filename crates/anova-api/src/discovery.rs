// Device discovery.
//
// The gateway pushes one WiFi list event per accessory family right after
// the upgrade. Discovery opens a short-lived connection, collects those
// lists until every requested family has reported (or the wait expires),
// and closes it again.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;

use crate::auth::{Accessory, Credential};
use crate::error::Error;
use crate::transport::SocketConfig;
use crate::websocket::{DeviceSocket, SocketEvent};
use crate::wire::WifiListEntry;

/// A device as reported by the gateway, tagged with its family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedDevice {
    pub accessory: Accessory,
    pub entry: WifiListEntry,
}

/// Collect the account's devices in the order the gateway lists them.
///
/// Duplicate `cookerId`s (the gateway repeats lists on state changes) are
/// dropped. An empty result is not an error at this layer.
pub async fn discover(
    config: &SocketConfig,
    credential: &Credential,
    wait: Duration,
) -> Result<Vec<ListedDevice>, Error> {
    let (writer, mut reader) = DeviceSocket::open(config, credential).await?;

    let deadline = Instant::now() + wait;
    let mut pending: HashSet<Accessory> = config.accessories.iter().copied().collect();
    let mut seen_ids = HashSet::new();
    let mut devices = Vec::new();

    while !pending.is_empty() {
        let event = match tokio::time::timeout_at(deadline, reader.next_event()).await {
            Err(_) => {
                tracing::debug!(missing = ?pending, "discovery wait elapsed");
                break;
            }
            Ok(None) => break,
            Ok(Some(event)) => event?,
        };

        let frame = match event {
            SocketEvent::Frame(frame) => frame,
            SocketEvent::Closed { code, reason } => {
                writer.close().await;
                return Err(Error::WebSocketClosed {
                    code: code.unwrap_or(1006),
                    reason,
                });
            }
        };

        let Some(accessory) = config
            .accessories
            .iter()
            .copied()
            .find(|a| frame.command.as_deref() == Some(a.wifi_list_event()))
        else {
            tracing::trace!(command = frame.command_or_unknown(), "ignoring frame during discovery");
            continue;
        };

        match frame.wifi_list() {
            Ok(entries) => {
                tracing::debug!(%accessory, count = entries.len(), "device list received");
                for entry in entries {
                    if seen_ids.insert(entry.cooker_id.clone()) {
                        devices.push(ListedDevice { accessory, entry });
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, %accessory, "malformed device list"),
        }
        pending.remove(&accessory);
    }

    writer.close().await;
    Ok(devices)
}
