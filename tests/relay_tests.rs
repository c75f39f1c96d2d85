//! End-to-end tests: real listener, WebSocket clients and webhook calls

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use mail_relay::{serve, AllowedOrigins, AppState, RelayConfig};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

struct TestServer {
    addr: String,
    state: Arc<AppState>,
    http: reqwest::Client,
}

impl TestServer {
    async fn start(config: RelayConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let state = Arc::new(AppState::new(config));

        tokio::spawn(serve(listener, state.clone(), std::future::pending()));

        Self {
            addr,
            state,
            http: reqwest::Client::new(),
        }
    }

    async fn default() -> Self {
        Self::start(RelayConfig::default()).await
    }

    /// Connect a client and consume its welcome message
    async fn connect(&self) -> Client {
        let (mut ws, _) = connect_async(format!("ws://{}/ws", self.addr)).await.unwrap();
        let welcome = next_json(&mut ws).await;
        assert_eq!(welcome["type"], "connected");
        ws
    }

    async fn post_json(&self, body: Value) -> reqwest::Response {
        self.http
            .post(format!("http://{}/webhook-email", self.addr))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn post_empty(&self) -> reqwest::Response {
        self.http
            .post(format!("http://{}/webhook-email", self.addr))
            .send()
            .await
            .unwrap()
    }

    async fn wait_for_clients(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.state.connected_clients() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {} clients, have {}",
                expected,
                self.state.connected_clients()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Next text frame as JSON
async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("websocket error");
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

/// Next `new_mail_notification` payload
async fn next_mail(ws: &mut Client) -> Value {
    let msg = next_json(ws).await;
    assert_eq!(msg["event"], "new_mail_notification");
    msg["data"].clone()
}

async fn assert_quiet(ws: &mut Client) {
    let next = tokio::time::timeout(QUIET_PERIOD, ws.next()).await;
    assert!(next.is_err(), "unexpected message: {:?}", next);
}

#[tokio::test]
async fn test_connected_client_receives_notification_once() {
    let server = TestServer::default().await;
    let mut client = server.connect().await;

    let response = server
        .post_json(json!({"from": "alice@x.com", "subject": "Invoice #42"}))
        .await;
    assert_eq!(response.status(), 200);
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack, json!({"status": "Notificación enviada exitosamente"}));

    let data = next_mail(&mut client).await;
    assert_eq!(data, json!({"from": "alice@x.com", "subject": "Invoice #42"}));
    assert_quiet(&mut client).await;
}

#[tokio::test]
async fn test_empty_body_broadcasts_defaults() {
    let server = TestServer::default().await;
    let mut client = server.connect().await;

    let response = server.post_empty().await;
    assert_eq!(response.status(), 200);

    let data = next_mail(&mut client).await;
    assert_eq!(data, json!({"from": "Desconocido", "subject": "Sin asunto"}));
}

#[tokio::test]
async fn test_query_string_fields() {
    let server = TestServer::default().await;
    let mut client = server.connect().await;

    let response = server
        .http
        .post(format!(
            "http://{}/webhook-email?from=bob%40x.com&subject=Reuni%C3%B3n",
            server.addr
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let data = next_mail(&mut client).await;
    assert_eq!(data, json!({"from": "bob@x.com", "subject": "Reunión"}));
}

#[tokio::test]
async fn test_late_client_gets_no_replay() {
    let server = TestServer::default().await;

    server.post_json(json!({"subject": "before"})).await;

    let mut client = server.connect().await;
    assert_quiet(&mut client).await;

    server.post_json(json!({"subject": "after"})).await;
    let data = next_mail(&mut client).await;
    assert_eq!(data["subject"], "after");
}

#[tokio::test]
async fn test_disconnected_client_is_dropped() {
    let server = TestServer::default().await;
    let mut leaving = server.connect().await;
    let mut staying = server.connect().await;
    server.wait_for_clients(2).await;

    leaving.close(None).await.unwrap();
    server.wait_for_clients(1).await;

    let response = server.post_json(json!({"subject": "after disconnect"})).await;
    assert_eq!(response.status(), 200);

    let data = next_mail(&mut staying).await;
    assert_eq!(data["subject"], "after disconnect");
}

#[tokio::test]
async fn test_sequential_posts_arrive_in_order_for_all_clients() {
    let server = TestServer::default().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;

    server.post_json(json!({"subject": "first"})).await;
    server.post_json(json!({"subject": "second"})).await;

    for client in [&mut a, &mut b] {
        let first = next_json(client).await;
        let second = next_json(client).await;
        assert_eq!(first["data"]["subject"], "first");
        assert_eq!(second["data"]["subject"], "second");
        assert!(first["sequence_id"].as_u64() < second["sequence_id"].as_u64());
    }
}

#[tokio::test]
async fn test_concurrent_posts_deliver_two_events_in_same_order() {
    let server = TestServer::default().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;

    let (r1, r2) = tokio::join!(
        server.post_json(json!({"subject": "one"})),
        server.post_json(json!({"subject": "two"})),
    );
    assert_eq!(r1.status(), 200);
    assert_eq!(r2.status(), 200);

    let mut orders = Vec::new();
    for client in [&mut a, &mut b] {
        let first = next_mail(client).await;
        let second = next_mail(client).await;
        assert_ne!(first["subject"], second["subject"]);
        orders.push((first["subject"].clone(), second["subject"].clone()));
        assert_quiet(client).await;
    }
    assert_eq!(orders[0], orders[1]);
}

#[tokio::test]
async fn test_json_ping_gets_pong() {
    let server = TestServer::default().await;
    let mut client = server.connect().await;

    client
        .send(Message::text(r#"{"type":"ping"}"#.to_string()))
        .await
        .unwrap();

    let pong = next_json(&mut client).await;
    assert_eq!(pong, json!({"type": "pong"}));
}

#[tokio::test]
async fn test_health_reports_connected_clients() {
    let server = TestServer::default().await;
    let _client = server.connect().await;

    let health: Value = server
        .http
        .get(format!("http://{}/health", server.addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health["status"], "ok");
    assert_eq!(health["connected_clients"], 1);
}

#[tokio::test]
async fn test_disallowed_origin_cannot_connect() {
    let config = RelayConfig {
        allowed_origins: AllowedOrigins::parse("https://crm.example.com"),
        ..RelayConfig::default()
    };
    let server = TestServer::start(config).await;

    let mut request = format!("ws://{}/ws", server.addr)
        .into_client_request()
        .unwrap();
    request
        .headers_mut()
        .insert("Origin", "https://evil.test".parse().unwrap());
    assert!(connect_async(request).await.is_err());

    let mut request = format!("ws://{}/ws", server.addr)
        .into_client_request()
        .unwrap();
    request
        .headers_mut()
        .insert("Origin", "https://crm.example.com".parse().unwrap());
    let (mut ws, _) = connect_async(request).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "connected");
    assert_eq!(server.state.connected_clients(), 1);
}
