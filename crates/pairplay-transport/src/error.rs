/// Socket-level failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to send frame: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("failed to receive frame: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A binary frame whose bytes are not UTF-8 text.
    #[error("frame is not valid UTF-8")]
    InvalidFrame,

    /// Binding the listener, or accepting and upgrading a client, failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
