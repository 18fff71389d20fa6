// Shared connection settings for every websocket the client opens.
//
// Discovery and per-device connections hit the same endpoint with the
// same query string, so the URL and upgrade request are built here once.

use std::time::Duration;

use tokio_tungstenite::tungstenite::{ClientRequestBuilder, http::Uri};
use url::Url;

use crate::auth::{Accessory, Credential};
use crate::error::Error;

/// Production device gateway.
pub const DEFAULT_ENDPOINT: &str = "wss://devices.anovaculinary.io";

/// Websocket connection settings.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Gateway URL without query parameters.
    pub endpoint: Url,
    /// Device families to request from the gateway.
    pub accessories: Vec<Accessory>,
    /// Upper bound on the TCP + TLS + upgrade handshake.
    pub connect_timeout: Duration,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            accessories: vec![Accessory::Apc, Accessory::Apo],
            connect_timeout: Duration::from_secs(15),
        }
    }
}

impl SocketConfig {
    /// Config pointing at a different gateway (tests, staging).
    pub fn with_endpoint(endpoint: Url) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    /// Full connection URL, including the token. Never log this.
    pub(crate) fn request_url(&self, credential: &Credential) -> Url {
        let accessories = self
            .accessories
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("token", credential.expose())
            .append_pair("supportedAccessories", &accessories);
        url
    }

    /// Upgrade request with the client's user agent attached.
    pub(crate) fn build_request(&self, credential: &Credential) -> Result<ClientRequestBuilder, Error> {
        let uri: Uri = self
            .request_url(credential)
            .as_str()
            .parse()
            .map_err(|e: tokio_tungstenite::tungstenite::http::uri::InvalidUri| {
                Error::WebSocketConnect(e.to_string())
            })?;

        Ok(ClientRequestBuilder::new(uri)
            .with_header("User-Agent", concat!("anova/", env!("CARGO_PKG_VERSION"))))
    }

    /// Rounded up so a sub-second timeout never reports `0s`.
    pub(crate) fn connect_timeout_secs(&self) -> u64 {
        self.connect_timeout.as_secs() + u64::from(self.connect_timeout.subsec_nanos() > 0)
    }
}
