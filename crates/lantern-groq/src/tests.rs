//! Snapshot and wire tests for the Groq client

#[cfg(test)]
mod snapshot_tests {
    use crate::{ChatMessage, CompletionProvider, Error, GenerationConfig, GroqClient, GroqConfig, RetryConfig};
    use insta::assert_yaml_snapshot;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Serve exactly one HTTP response and hand the raw request back to the test
    async fn respond_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(request);
        });

        (format!("http://{}", addr), rx)
    }

    /// Hang up on the first `drops` connections after reading their requests,
    /// then answer the next one with `200 OK`
    async fn respond_after_drops(drops: usize, body: &str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let seen = counter.fetch_add(1, Ordering::SeqCst) + 1;
                read_request(&mut socket).await;
                if seen <= drops {
                    drop(socket);
                    continue;
                }
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
                break;
            }
        });

        (format!("http://{}", addr), accepted)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client_for(api_url: &str) -> GroqClient {
        let config = GroqConfig::new("gsk_test_key").with_api_url(api_url);
        GroqClient::new(config).unwrap().with_retry(RetryConfig::no_retry())
    }

    fn messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("Who is Mira?"),
        ]
    }

    #[test]
    fn test_config_snapshot() {
        let config = GroqConfig::new("gsk_must_not_leak");

        assert_yaml_snapshot!(config, @r###"
        api_url: "https://api.groq.com/openai/v1"
        model: llama3-8b-8192
        timeout_secs: 30
        "###);
    }

    #[test]
    fn test_model_constants() {
        assert_eq!(GroqClient::LLAMA3_8B_8192, "llama3-8b-8192");
        assert_eq!(GroqClient::LLAMA_3_1_8B_INSTANT, "llama-3.1-8b-instant");
    }

    #[tokio::test]
    async fn test_success_returns_first_choice_and_sends_bearer() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Mira is the lantern keeper."}}],"usage":{"total_tokens":42}}"#;
        let (url, request_rx) = respond_once("200 OK", body).await;
        let client = client_for(&url);

        let result = client
            .complete(&messages(), &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(result.text, "Mira is the lantern keeper.");
        assert_eq!(result.tokens_used, Some(42));
        assert_eq!(result.model_id, "llama3-8b-8192");

        let request = request_rx.await.unwrap();
        let lowered = request.to_lowercase();
        assert!(lowered.starts_with("post /chat/completions"));
        assert!(lowered.contains("authorization: bearer gsk_test_key"));

        let json_start = request.find("\r\n\r\n").unwrap() + 4;
        let payload: serde_json::Value = serde_json::from_str(&request[json_start..]).unwrap();
        assert_eq!(payload["model"], "llama3-8b-8192");
        assert_eq!(payload["max_tokens"], 300);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "Who is Mira?");
    }

    #[tokio::test]
    async fn test_http_500_surfaces_status_and_body() {
        let (url, _request_rx) = respond_once(
            "500 Internal Server Error",
            r#"{"error":{"message":"upstream exploded"}}"#,
        )
        .await;
        let client = client_for(&url);

        let err = client
            .complete(&messages(), &GenerationConfig::default())
            .await
            .unwrap_err();
        match err {
            Error::Api { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("upstream exploded"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_errors_are_not_retried() {
        // A retry would hit a closed listener and turn the error into a network failure.
        let (url, _request_rx) = respond_once("429 Too Many Requests", r#"{"error":"slow down"}"#).await;
        let config = GroqConfig::new("k").with_api_url(&url);
        let client = GroqClient::new(config).unwrap();

        let err = client
            .complete(&messages(), &GenerationConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(429));
    }

    fn retrying_client(api_url: &str) -> GroqClient {
        let config = GroqConfig::new("gsk_test_key").with_api_url(api_url);
        GroqClient::new(config).unwrap().with_retry(RetryConfig {
            max_attempts: 2,
            backoff: Duration::from_millis(10),
        })
    }

    #[tokio::test]
    async fn test_dropped_connection_is_retried_once() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#;
        let (url, accepted) = respond_after_drops(1, body).await;
        let client = retrying_client(&url);

        let result = client
            .complete(&messages(), &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(result.text, "ok");
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let (url, accepted) = respond_after_drops(usize::MAX, "{}").await;
        let client = retrying_client(&url);

        let err = client
            .complete(&messages(), &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}", addr));
        let err = client
            .complete(&messages(), &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
