use axum::body::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use gitbridge::protocol::{self, Message};
use gitbridge::{Server, SseOptions, SseTransport, Transport};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct SseEvent {
    event: String,
    data: String,
}

/// Minimal SSE reader over a streaming reqwest body
struct EventReader {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: String,
}

impl EventReader {
    fn new(response: reqwest::Response) -> Self {
        Self {
            body: response.bytes_stream().boxed(),
            buffer: String::new(),
        }
    }

    /// Next event, or `None` when the stream ends
    async fn next(&mut self) -> Option<SseEvent> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                if let Some(event) = parse_block(&block) {
                    return Some(event);
                }
                continue;
            }

            let chunk = timeout(WAIT, self.body.next()).await.expect("timed out waiting for event")?;
            let chunk = chunk.ok()?;
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = String::from("message");
    let mut data = Vec::new();

    for line in block.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            event = value.trim_start().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
    }

    // Comment-only blocks are keep-alives
    if data.is_empty() {
        return None;
    }
    Some(SseEvent {
        event,
        data: data.join("\n"),
    })
}

async fn start() -> (Arc<SseTransport>, String) {
    let transport = SseTransport::bind("127.0.0.1:0".parse().unwrap(), SseOptions::default())
        .await
        .expect("bind");
    let base = format!("http://{}", transport.local_addr());
    (Arc::new(transport), base)
}

/// Open the stream and return the reader plus the advertised POST URL
async fn connect(client: &reqwest::Client, base: &str) -> (EventReader, String) {
    let response = client.get(format!("{}/sse", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    assert_eq!(response.headers()["cache-control"], "no-cache");

    let mut reader = EventReader::new(response);
    let endpoint = reader.next().await.expect("endpoint event");
    assert_eq!(endpoint.event, "endpoint");
    assert!(endpoint.data.starts_with("/message?sessionId="));

    (reader, format!("{}{}", base, endpoint.data))
}

#[tokio::test]
async fn test_endpoint_token_is_32_hex_chars() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();

    let (_reader, url) = connect(&client, &base).await;
    let token = url.rsplit('=').next().unwrap();

    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    transport.close().await;
}

#[tokio::test]
async fn test_post_before_stream_is_unavailable() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/message?sessionId=abc", base))
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    transport.close().await;
}

#[tokio::test]
async fn test_second_stream_conflicts() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();

    let (_reader, _url) = connect(&client, &base).await;
    let second = client.get(format!("{}/sse", base)).send().await.unwrap();

    assert_eq!(second.status(), StatusCode::CONFLICT);
    transport.close().await;
}

#[tokio::test]
async fn test_post_rejections() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();
    let (_reader, url) = connect(&client, &base).await;

    let wrong_token = client
        .post(format!("{}/message?sessionId=deadbeef", base))
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_token.status(), StatusCode::FORBIDDEN);

    let missing_token = client
        .post(format!("{}/message", base))
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(missing_token.status(), StatusCode::FORBIDDEN);

    let bad_json = client.post(&url).body("{not json").send().await.unwrap();
    assert_eq!(bad_json.status(), StatusCode::BAD_REQUEST);

    let accepted = client
        .post(&url)
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);

    transport.close().await;
}

#[tokio::test]
async fn test_recv_preserves_post_order() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();
    let (_reader, url) = connect(&client, &base).await;

    for id in 1..=3 {
        let body = json!({"jsonrpc": "2.0", "id": id, "method": "ping"}).to_string();
        let response = client.post(&url).body(body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    for id in 1..=3 {
        let msg = timeout(WAIT, transport.recv()).await.unwrap().unwrap().unwrap();
        assert_eq!(msg.id, Some(json!(id)));
    }

    transport.close().await;
}

#[tokio::test]
async fn test_concurrent_sends_arrive_as_whole_events() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();
    let (mut reader, _url) = connect(&client, &base).await;

    let sends: Vec<_> = (0..20)
        .map(|i| {
            let transport = Arc::clone(&transport);
            tokio::spawn(async move {
                let msg = Message::response(Some(json!(i)), json!({"payload": "x".repeat(512)}));
                transport.send(&msg).await
            })
        })
        .collect();
    for send in sends {
        send.await.unwrap().unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..20 {
        let event = reader.next().await.expect("message event");
        assert_eq!(event.event, "message");
        let value: Value = serde_json::from_str(&event.data).expect("whole JSON payload");
        seen.push(value["id"].as_i64().unwrap());
    }
    seen.sort_unstable();
    assert_eq!(seen, (0..20).collect::<Vec<_>>());

    transport.close().await;
}

#[tokio::test]
async fn test_close_unblocks_recv_and_ends_stream() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();
    let (mut reader, _url) = connect(&client, &base).await;

    let pending = {
        let transport = Arc::clone(&transport);
        tokio::spawn(async move { transport.recv().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    transport.close().await;
    transport.close().await;

    let received = timeout(WAIT, pending).await.unwrap().unwrap().unwrap();
    assert!(received.is_none());
    assert!(reader.next().await.is_none());

    let send = transport.send(&Message::notification("ping", None)).await;
    assert!(send.is_err());
}

#[tokio::test]
async fn test_client_disconnect_closes_session() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();
    let (reader, _url) = connect(&client, &base).await;

    drop(reader);

    // The server notices the dead socket on its next write
    let closed = transport.session().closed();
    for _ in 0..100 {
        if closed.is_cancelled() {
            break;
        }
        let _ = transport.send(&Message::notification("ping", None)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(closed.is_cancelled());

    let received = timeout(WAIT, transport.recv()).await.unwrap().unwrap();
    assert!(received.is_none());

    transport.close().await;
}

#[tokio::test]
async fn test_server_answers_over_sse() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();
    let (mut reader, url) = connect(&client, &base).await;

    let server = Server::new(gitbridge::ToolContext::new(Default::default()));
    let loop_transport = Arc::clone(&transport);
    let dispatch = tokio::spawn(async move { server.run(loop_transport).await });

    let list = json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"}).to_string();
    let response = client.post(&url).body(list).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let event = reader.next().await.expect("response event");
    let reply: Value = serde_json::from_str(&event.data).unwrap();
    assert_eq!(reply["id"], 7);
    let tools = reply["result"]["tools"].as_array().unwrap();
    assert!(tools.iter().any(|t| t["name"] == "git_status"));

    let unknown = json!({"jsonrpc": "2.0", "id": 8, "method": "bogus/method"}).to_string();
    client.post(&url).body(unknown).send().await.unwrap();

    let event = reader.next().await.expect("error event");
    let reply: Value = serde_json::from_str(&event.data).unwrap();
    assert_eq!(reply["id"], 8);
    assert_eq!(reply["error"]["code"], protocol::METHOD_NOT_FOUND);

    transport.close().await;
    timeout(WAIT, dispatch).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_send_applies_backpressure_to_stalled_client() {
    let (transport, base) = start().await;
    let client = reqwest::Client::new();
    // Keep the stream open but never read past the endpoint event
    let (_reader, _url) = connect(&client, &base).await;

    let payload = "x".repeat(64 * 1024);
    let mut accepted = 0;
    for i in 0..2000 {
        let msg = Message::response(Some(json!(i)), json!({ "payload": payload }));
        match timeout(Duration::from_millis(500), transport.send(&msg)).await {
            Ok(sent) => {
                sent.unwrap();
                accepted += 1;
            }
            Err(_) => break,
        }
    }
    assert!(accepted < 2000, "every send was accepted without the client reading");

    let blocked = {
        let transport = Arc::clone(&transport);
        tokio::spawn(async move { transport.send(&Message::notification("ping", None)).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    transport.close().await;

    let result = timeout(WAIT, blocked).await.unwrap().unwrap();
    assert!(result.is_err());
}
