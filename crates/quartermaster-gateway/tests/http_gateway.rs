//! Integration tests for the HTTP gateway.
//!
//! Each test spins up a one-shot HTTP server on a random local port using a
//! bare `TcpListener`, so we see exactly what `HttpGateway` puts on the wire
//! without pulling in a server framework.

#[cfg(feature = "http")]
mod http {
    use quartermaster_gateway::{
        AccountStatusGateway, AuthGateway, GatewayConfig, HttpGateway,
        RefreshError, StatusCheckError,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves exactly one request with `status` and a JSON `body`.
    /// The join handle yields the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have addr");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("should accept");
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("should write response");
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{addr}/api"), handle)
    }

    /// Reads headers, then as many body bytes as Content-Length announces.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.expect("should read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn gateway(base_url: String) -> HttpGateway {
        HttpGateway::new(GatewayConfig::with_base_url(base_url))
            .expect("client should build")
    }

    #[tokio::test]
    async fn test_refresh_posts_bearer_and_returns_token() {
        let (base, server) = serve_once("200 OK", r#"{"token":"new.token.value"}"#).await;

        let token = gateway(base).refresh("old.token.value").await.expect("should refresh");

        assert_eq!(token, "new.token.value");
        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /api/auth/refresh-token"), "{request}");
        assert!(
            request.to_ascii_lowercase().contains("authorization: bearer old.token.value"),
            "{request}"
        );
    }

    #[tokio::test]
    async fn test_refresh_non_success_status_is_rejected() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"message":"expired"}"#).await;

        let result = gateway(base).refresh("t").await;

        assert!(matches!(result, Err(RefreshError::Rejected { status: 401 })));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_refresh_body_without_token_is_invalid_response() {
        let (base, server) = serve_once("200 OK", r#"{"ok":true}"#).await;

        let result = gateway(base).refresh("t").await;

        assert!(matches!(result, Err(RefreshError::InvalidResponse(_))));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_check_status_gets_with_bearer() {
        let (base, server) = serve_once("200 OK", r#"{"active":false}"#).await;

        let status = gateway(base).check_status("abc").await.expect("should check");

        assert!(!status.active);
        let request = server.await.expect("server task");
        assert!(request.starts_with("GET /api/auth/check-status"), "{request}");
        assert!(request.to_ascii_lowercase().contains("bearer abc"));
    }

    #[tokio::test]
    async fn test_check_status_server_error_is_rejected() {
        let (base, server) = serve_once("503 Service Unavailable", "{}").await;

        let result = gateway(base).check_status("abc").await;

        assert!(matches!(result, Err(StatusCheckError::Rejected { status: 503 })));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_check_status_unreachable_backend_is_transport_error() {
        // Bind then drop to get a port that nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = gateway(format!("http://{addr}/api")).check_status("abc").await;

        assert!(matches!(result, Err(StatusCheckError::Transport(_))));
    }
}
