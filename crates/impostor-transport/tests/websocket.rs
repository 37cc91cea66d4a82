//! Integration tests for the WebSocket transport.
//!
//! Each test binds to port 0 and connects a real `tokio-tungstenite`
//! client to whatever port the OS picked.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use impostor_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds a transport, connects one client, and returns both ends.
    async fn connected_pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have local addr");

        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let server_conn = server_handle.await.expect("task should complete");
        (server_conn, client)
    }

    #[tokio::test]
    async fn test_bind_port_zero_reports_real_port() {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_server_sends_text_frames() {
        let (server_conn, mut client) = connected_pair().await;
        assert!(server_conn.id().into_inner() > 0);

        server_conn
            .send(br#"{"type":"allReady"}"#)
            .await
            .expect("send should succeed");

        let msg = client.next().await.unwrap().unwrap();
        match msg {
            Message::Text(text) => assert_eq!(text.as_str(), r#"{"type":"allReady"}"#),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_receives_text_and_binary_frames() {
        let (server_conn, mut client) = connected_pair().await;

        client
            .send(Message::text(r#"{"type":"ready"}"#.to_string()))
            .await
            .unwrap();
        client
            .send(Message::binary(b"raw".to_vec()))
            .await
            .unwrap();

        let first = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(first, br#"{"type":"ready"}"#);
        let second = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(second, b"raw");
    }

    #[tokio::test]
    async fn test_send_is_not_blocked_by_pending_recv() {
        let (server_conn, mut client) = connected_pair().await;
        let server_conn = Arc::new(server_conn);

        // Park a reader on the connection; nothing will arrive for it.
        let reader = {
            let conn = Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        tokio::time::timeout(Duration::from_secs(2), server_conn.send(b"while reading"))
            .await
            .expect("send must not wait for recv")
            .expect("send should succeed");

        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"while reading");

        client.send(Message::Close(None)).await.unwrap();
        let received = reader.await.unwrap().unwrap();
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (server_conn, mut client) = connected_pair().await;

        client.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_close_from_server_side() {
        let (server_conn, mut client) = connected_pair().await;

        server_conn.close().await.expect("close should succeed");

        let msg = client.next().await;
        assert!(matches!(msg, Some(Ok(Message::Close(_))) | None));
    }
}
