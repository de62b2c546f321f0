//! Common test utilities: loopback stand-ins for the chat backend.

#![allow(dead_code)]

use std::time::Duration;

use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{WebSocketStream, accept_async};

use rust_chat_client::{AppConfig, ChatEvent, ChatSession, ReconnectPolicy};

pub const EVENT_WAIT: Duration = Duration::from_secs(5);

/// Bind a loopback listener for the realtime channel and return its URL.
pub async fn bind_ws() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

/// Accept one WebSocket connection from the client under test.
pub async fn accept_ws(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(EVENT_WAIT, listener.accept()).await.unwrap().unwrap();
    accept_async(stream).await.unwrap()
}

/// Serve the fallback REST contract on a loopback port: every POST /chat
/// answers with the given JSON body. Returns the base URL.
pub async fn spawn_fallback(reply: Value) -> String {
    let app = Router::new().route(
        "/chat",
        post(move || {
            let reply = reply.clone();
            async move { Json(reply) }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Config pointed at the given backends, with a backoff schedule short
/// enough for tests.
pub fn test_config(ws_url: &str, api_url: &str) -> AppConfig {
    AppConfig {
        ws_url: ws_url.to_string(),
        api_url: api_url.to_string(),
        reconnect: ReconnectPolicy {
            max_attempts: 5,
            base_delay_ms: 20,
            max_delay_ms: 200,
        },
    }
}

/// A realtime URL nothing listens on; dials fail with connection refused.
pub fn dead_ws_url() -> String {
    "ws://127.0.0.1:9".to_string()
}

/// A fallback URL nothing listens on.
pub fn dead_api_url() -> String {
    "http://127.0.0.1:9/api".to_string()
}

/// Wait for the next transport event, panicking if none arrives in time.
pub async fn next_event(session: &mut ChatSession) -> ChatEvent {
    timeout(EVENT_WAIT, session.recv_event())
        .await
        .expect("timed out waiting for a transport event")
        .expect("driver stopped unexpectedly")
}

/// Drive the session until the given predicate matches an event.
pub async fn wait_for_event<F>(session: &mut ChatSession, mut predicate: F) -> ChatEvent
where
    F: FnMut(&ChatEvent) -> bool,
{
    loop {
        let event = next_event(session).await;
        if predicate(&event) {
            return event;
        }
    }
}
