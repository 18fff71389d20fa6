// ── Session ──
//
// Explicit owner of the credential, the discovered device list, the live
// per-device connections, and the per-device message logs. Cheaply
// cloneable; every clone drives the same session.

use std::sync::Arc;

use anova_api::Credential;
use arc_swap::ArcSwap;
use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::connection::{CommandReceipt, Connection, ConnectionState};
use crate::convert;
use crate::error::CoreError;
use crate::model::{
    CookCommand, CookParams, Device, DeviceId, ExportRange, TelemetryExport, TemperatureUnit,
};
use crate::stream::{MessageLog, MessageStream};

/// Authenticated relay between the caller and the account's devices.
///
/// ```rust,ignore
/// let session = Session::authenticate("anova-...", SessionConfig::default())?;
/// let devices = session.list_devices().await?;
/// session.connect(&devices[0].id).await?;
/// let receipt = session
///     .start_cook(&devices[0].id, CookParams::sous_vide(Temperature::celsius(60.0), hour))
///     .await?;
/// let reply = receipt.reply().await?;
/// session.close().await;
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    credential: Credential,
    config: SessionConfig,
    devices: ArcSwap<Vec<Arc<Device>>>,
    /// At most one entry per device.
    connections: DashMap<DeviceId, Arc<Connection>>,
    /// Serializes `connect`/`disconnect` per device; other devices never wait.
    gates: DashMap<DeviceId, Arc<Mutex<()>>>,
    /// Outlive individual connections so streams survive a reconnect.
    logs: DashMap<DeviceId, MessageLog>,
    cancel: CancellationToken,
}

impl Session {
    /// Validate the token's format and create a session. No network I/O.
    pub fn authenticate(token: &str, config: SessionConfig) -> Result<Self, CoreError> {
        let credential = Credential::parse(token)?;
        Ok(Self::with_credential(credential, config))
    }

    pub fn with_credential(credential: Credential, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                credential,
                config,
                devices: ArcSwap::from_pointee(Vec::new()),
                connections: DashMap::new(),
                gates: DashMap::new(),
                logs: DashMap::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Discover the account's devices and cache them in the session.
    pub async fn list_devices(&self) -> Result<Vec<Arc<Device>>, CoreError> {
        let config = &self.inner.config;
        let listed = anova_api::discover(
            &config.socket(),
            &self.inner.credential,
            config.discovery_timeout,
        )
        .await?;

        let devices: Vec<Arc<Device>> = listed
            .into_iter()
            .map(|listed| Arc::new(Device::from(listed)))
            .collect();
        if devices.is_empty() {
            return Err(CoreError::NoDevicesFound);
        }

        info!(count = devices.len(), "devices discovered");
        self.inner.devices.store(Arc::new(devices.clone()));
        Ok(devices)
    }

    /// Devices from the last successful discovery.
    pub fn devices(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.devices.load_full()
    }

    pub fn device(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.inner
            .devices
            .load()
            .iter()
            .find(|d| &d.id == id)
            .cloned()
    }

    /// Look up a discovered device by id or name.
    pub fn find_device(&self, identifier: &str) -> Result<Arc<Device>, CoreError> {
        self.inner
            .devices
            .load()
            .iter()
            .find(|d| d.matches(identifier))
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: identifier.to_owned(),
            })
    }

    fn known_device(&self, id: &DeviceId) -> Result<Arc<Device>, CoreError> {
        self.device(id).ok_or_else(|| CoreError::DeviceNotFound {
            identifier: id.to_string(),
        })
    }

    // ── Connections ──────────────────────────────────────────────────

    fn gate(&self, id: &DeviceId) -> Arc<Mutex<()>> {
        Arc::clone(&self.inner.gates.entry(id.clone()).or_default())
    }

    fn closed_error() -> CoreError {
        CoreError::ConnectionError {
            reason: "session is closed".into(),
        }
    }

    /// Open the streaming connection for `id`, replacing any existing one.
    ///
    /// Fails once the session has been closed.
    pub async fn connect(&self, id: &DeviceId) -> Result<(), CoreError> {
        let device = self.known_device(id)?;
        if self.inner.cancel.is_cancelled() {
            return Err(Self::closed_error());
        }

        let gate = self.gate(id);
        let _guard = gate.lock().await;

        let previous = self.inner.connections.remove(id).map(|(_, c)| c);
        if let Some(previous) = previous {
            debug!(device = %id, "replacing existing connection");
            previous.close(self.inner.config.close_grace).await;
        }

        let log = self.inner.logs.entry(id.clone()).or_default().clone();
        let connection = Arc::new(
            Connection::open(
                device,
                &self.inner.config,
                &self.inner.credential,
                log,
                self.inner.cancel.child_token(),
            )
            .await?,
        );

        // `close` may have run while the socket was opening.
        if self.inner.cancel.is_cancelled() {
            connection.close(self.inner.config.close_grace).await;
            return Err(Self::closed_error());
        }
        self.inner.connections.insert(id.clone(), connection);
        Ok(())
    }

    pub fn connection_state(&self, id: &DeviceId) -> ConnectionState {
        self.inner
            .connections
            .get(id)
            .map_or(ConnectionState::Disconnected, |c| c.state())
    }

    /// Follow state changes of the current connection for `id`.
    pub fn watch_connection(&self, id: &DeviceId) -> Option<watch::Receiver<ConnectionState>> {
        self.inner.connections.get(id).map(|c| c.subscribe_state())
    }

    /// Number of devices with an open (not yet closed) connection.
    pub fn connection_count(&self) -> usize {
        self.inner
            .connections
            .iter()
            .filter(|entry| entry.value().is_live())
            .count()
    }

    fn live_connection(&self, device: &Device) -> Result<Arc<Connection>, CoreError> {
        self.inner
            .connections
            .get(&device.id)
            .filter(|c| c.is_live())
            .map(|c| Arc::clone(c.value()))
            .ok_or_else(|| CoreError::NotConnected {
                device: device.name.clone(),
            })
    }

    /// Close the connection for `id`. Its message log is kept.
    pub async fn disconnect(&self, id: &DeviceId) {
        let gate = self.gate(id);
        let _guard = gate.lock().await;

        let connection = self.inner.connections.remove(id).map(|(_, c)| c);
        if let Some(connection) = connection {
            connection.close(self.inner.config.close_grace).await;
        }
    }

    /// Close every connection. Later `connect` calls fail.
    pub async fn close(&self) {
        self.inner.cancel.cancel();

        let ids: Vec<DeviceId> = self
            .inner
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let connections: Vec<_> = ids
            .iter()
            .filter_map(|id| self.inner.connections.remove(id).map(|(_, c)| c))
            .collect();
        for connection in &connections {
            connection.close(self.inner.config.close_grace).await;
        }
        info!(closed = connections.len(), "session closed");
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate `params` for the device's family and send a start command.
    pub async fn start_cook(
        &self,
        id: &DeviceId,
        params: CookParams,
    ) -> Result<CommandReceipt, CoreError> {
        let device = self.known_device(id)?;
        let command = params.into_command(device.kind)?;
        self.send_cook(&device, &command).await
    }

    async fn send_cook(
        &self,
        device: &Device,
        command: &CookCommand,
    ) -> Result<CommandReceipt, CoreError> {
        let frame = convert::start_frame(device, command, &convert::new_request_id())?;
        let connection = self.live_connection(device)?;
        info!(
            device = %device.id,
            kind = %command.kind(),
            temperature = %command.temperature(),
            timer_secs = command.timer().as_secs(),
            "starting cook"
        );
        connection
            .send(&frame, self.inner.config.command_timeout)
            .await
    }

    pub async fn stop_cook(&self, id: &DeviceId) -> Result<CommandReceipt, CoreError> {
        let device = self.known_device(id)?;
        let connection = self.live_connection(&device)?;
        let frame = convert::stop_frame(&device, &convert::new_request_id())?;
        info!(device = %device.id, "stopping cook");
        connection
            .send(&frame, self.inner.config.command_timeout)
            .await
    }

    pub async fn set_unit(
        &self,
        id: &DeviceId,
        unit: TemperatureUnit,
    ) -> Result<CommandReceipt, CoreError> {
        let device = self.known_device(id)?;
        let connection = self.live_connection(&device)?;
        let frame = convert::unit_frame(&device, unit, &convert::new_request_id())?;
        info!(device = %device.id, %unit, "setting temperature unit");
        connection
            .send(&frame, self.inner.config.command_timeout)
            .await
    }

    /// Request a telemetry export and wait for the download links.
    pub async fn export_telemetry(
        &self,
        id: &DeviceId,
        range: ExportRange,
    ) -> Result<TelemetryExport, CoreError> {
        let device = self.known_device(id)?;
        let connection = self.live_connection(&device)?;
        let frame = convert::export_frame(
            &device,
            range.start_param(),
            range.end_param(),
            &convert::new_request_id(),
        )?;
        info!(device = %device.id, start = %range.start(), end = %range.end(), "requesting telemetry export");

        let reply = connection
            .send_export(&frame, self.inner.config.export_timeout)
            .await?
            .reply()
            .await?;
        convert::export_result(&device, &reply)
    }

    // ── Messages ─────────────────────────────────────────────────────

    /// The device's message log, created on first use.
    pub fn message_log(&self, id: &DeviceId) -> Result<MessageLog, CoreError> {
        self.known_device(id)?;
        Ok(self.inner.logs.entry(id.clone()).or_default().clone())
    }

    /// Every message of the device from the first one, then live.
    pub fn stream_messages(&self, id: &DeviceId) -> Result<MessageStream, CoreError> {
        Ok(self.message_log(id)?.stream())
    }
}
