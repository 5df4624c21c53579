use axum::extract::ws::Message;
use camlink_core::{EndpointId, Role};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    QueueFull,

    #[error("connection closed")]
    Closed,
}

/// One connected camera or viewer socket, seen from the relay.
///
/// The socket itself is owned by its writer task; the registry only keeps
/// the sending half of that task's queue.
#[derive(Debug)]
pub struct Endpoint {
    pub id: EndpointId,
    pub role: Role,
    tx: mpsc::Sender<Message>,
    connected_at: Instant,
}

impl Endpoint {
    pub(crate) fn new(id: EndpointId, role: Role, tx: mpsc::Sender<Message>) -> Self {
        Self {
            id,
            role,
            tx,
            connected_at: Instant::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn connected_for(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }

    /// Enqueues without waiting. Messages leave in enqueue order.
    pub fn try_send(&self, msg: Message) -> Result<(), DeliveryError> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
