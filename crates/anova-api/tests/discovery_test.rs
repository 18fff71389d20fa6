#![allow(clippy::unwrap_used)]
// Integration tests for discovery against an in-process websocket gateway.

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http;
use url::Url;

use anova_api::{Accessory, Credential, Error, SocketConfig, discover};

// ── Helpers ─────────────────────────────────────────────────────────

/// Accept one websocket connection and hand it to `handler`.
async fn serve_once<F, Fut>(handler: F) -> SocketConfig
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        handler(ws).await;
    });
    SocketConfig::with_endpoint(Url::parse(&format!("ws://{addr}")).unwrap())
}

fn credential() -> Credential {
    Credential::parse("anova-abc123").unwrap()
}

fn text(value: &serde_json::Value) -> Message {
    Message::text(value.to_string())
}

/// Keep the socket open until the client goes away.
async fn drain(ws: &mut WebSocketStream<TcpStream>) {
    while let Some(Ok(_)) = ws.next().await {}
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_discover_collects_both_families_in_order() {
    let config = serve_once(|mut ws| async move {
        ws.send(text(&json!({
            "command": "EVENT_APC_WIFI_LIST",
            "payload": [{"cookerId": "c1", "name": "Kitchen Cooker", "type": "a5"}]
        })))
        .await
        .unwrap();
        ws.send(text(&json!({"command": "EVENT_APC_STATE", "payload": {"cookerId": "c1"}})))
            .await
            .unwrap();
        ws.send(text(&json!({
            "command": "EVENT_APO_WIFI_LIST",
            "payload": [
                {"cookerId": "o1", "name": "Oven", "type": "oven_v2"},
                {"cookerId": "c1", "name": "Duplicate", "type": "a5"}
            ]
        })))
        .await
        .unwrap();
        drain(&mut ws).await;
    })
    .await;

    let devices = discover(&config, &credential(), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].accessory, Accessory::Apc);
    assert_eq!(devices[0].entry.cooker_id, "c1");
    assert_eq!(devices[0].entry.name.as_deref(), Some("Kitchen Cooker"));
    assert_eq!(devices[1].accessory, Accessory::Apo);
    assert_eq!(devices[1].entry.hardware.as_deref(), Some("oven_v2"));
}

#[tokio::test]
async fn test_discover_returns_partial_list_when_wait_elapses() {
    let config = serve_once(|mut ws| async move {
        ws.send(text(&json!({
            "command": "EVENT_APC_WIFI_LIST",
            "payload": [{"cookerId": "c1"}]
        })))
        .await
        .unwrap();
        drain(&mut ws).await;
    })
    .await;

    let devices = discover(&config, &credential(), Duration::from_millis(200))
        .await
        .unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].entry.cooker_id, "c1");
}

#[tokio::test]
async fn test_discover_with_no_devices_is_empty() {
    let config = serve_once(|mut ws| async move {
        ws.send(text(&json!({"command": "EVENT_APC_WIFI_LIST", "payload": []})))
            .await
            .unwrap();
        ws.send(text(&json!({"command": "EVENT_APO_WIFI_LIST", "payload": []})))
            .await
            .unwrap();
        drain(&mut ws).await;
    })
    .await;

    let devices = discover(&config, &credential(), Duration::from_secs(5))
        .await
        .unwrap();
    assert!(devices.is_empty());
}

// ── Handshake ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_token_and_accessories_sent_in_query() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (uri_tx, uri_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let _ = uri_tx.send(req.uri().to_string());
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(tcp, callback)
            .await
            .unwrap();
        ws.send(text(&json!({"command": "EVENT_APC_WIFI_LIST", "payload": []})))
            .await
            .unwrap();
        ws.send(text(&json!({"command": "EVENT_APO_WIFI_LIST", "payload": []})))
            .await
            .unwrap();
        drain(&mut ws).await;
    });

    let config = SocketConfig::with_endpoint(Url::parse(&format!("ws://{addr}")).unwrap());
    discover(&config, &credential(), Duration::from_secs(5))
        .await
        .unwrap();

    let uri = uri_rx.await.unwrap();
    assert!(uri.contains("token=anova-abc123"), "uri was {uri}");
    assert!(uri.contains("supportedAccessories=APC%2CAPO"), "uri was {uri}");
}

#[tokio::test]
async fn test_rejected_token_maps_to_authentication_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let callback = |_req: &Request, _resp: Response| -> Result<Response, ErrorResponse> {
            Err(http::Response::builder()
                .status(http::StatusCode::UNAUTHORIZED)
                .body(None)
                .unwrap())
        };
        let _ = tokio_tungstenite::accept_hdr_async(tcp, callback).await;
    });

    let config = SocketConfig::with_endpoint(Url::parse(&format!("ws://{addr}")).unwrap());
    let result = discover(&config, &credential(), Duration::from_secs(5)).await;

    assert!(
        matches!(result, Err(Error::Authentication { status: 401 })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unreachable_gateway_is_connect_error() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = SocketConfig::with_endpoint(Url::parse(&format!("ws://127.0.0.1:{port}")).unwrap());

    let result = discover(&config, &credential(), Duration::from_secs(1)).await;
    assert!(
        matches!(result, Err(Error::WebSocketConnect(_))),
        "expected WebSocketConnect error, got: {result:?}"
    );
}
