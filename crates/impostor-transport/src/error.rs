/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame failed. The peer is most likely gone.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Binding or accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The TCP connection was accepted but the WebSocket upgrade failed.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}
