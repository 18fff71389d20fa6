// anova-api: Async Rust client for the Anova cloud device websocket

pub mod auth;
pub mod discovery;
pub mod error;
pub mod transport;
pub mod websocket;
pub mod wire;

pub use auth::{Accessory, Credential, TOKEN_PREFIX};
pub use discovery::{ListedDevice, discover};
pub use error::Error;
pub use transport::SocketConfig;
pub use websocket::{DeviceSocket, SocketEvent, SocketReader, SocketWriter};
pub use wire::InboundFrame;
