//! Connection registry and fan-out
//!
//! Every connected WebSocket client owns an unbounded queue; the
//! broadcaster keeps the sending halves keyed by connection id and pushes
//! each event into all of them. Delivery is fire-and-forget: nothing is
//! buffered for clients that connect later, and a queue whose receiver has
//! gone away is pruned on the next broadcast.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use super::events::{ServerEvent, WsMessage};

/// Opaque per-client identifier
pub type ConnectionId = String;

/// Sending half of a client's queue
pub type ClientSink = mpsc::UnboundedSender<WsMessage>;

/// Receiving half of a client's queue, drained by the socket task
pub type ClientQueue = mpsc::UnboundedReceiver<WsMessage>;

/// Broadcaster owning the set of connected clients
pub struct Broadcaster {
    connections: RwLock<HashMap<ConnectionId, ClientSink>>,
    sequence_counter: AtomicU64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            sequence_counter: AtomicU64::new(0),
        }
    }

    /// Register a new client and return its id and queue
    pub fn register(&self) -> (ConnectionId, ClientQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (self.register_sink(tx), rx)
    }

    /// Register an existing sink under a fresh id
    pub fn register_sink(&self, sink: ClientSink) -> ConnectionId {
        let id = uuid::Uuid::new_v4().to_string();
        self.connections.write().insert(id.clone(), sink);
        id
    }

    /// Remove a client. Returns false if the id was not registered.
    pub fn unregister(&self, id: &str) -> bool {
        self.connections.write().remove(id).is_some()
    }

    /// Deliver an event to every registered client
    ///
    /// Returns the number of clients the event was queued for. The write
    /// lock is held for the whole fan-out so concurrent broadcasts reach
    /// every client in the same order.
    pub fn broadcast_all(&self, event: ServerEvent) -> usize {
        let mut connections = self.connections.write();

        let msg = WsMessage {
            event,
            sequence_id: self.sequence_counter.fetch_add(1, Ordering::SeqCst),
            timestamp: chrono::Utc::now().timestamp(),
        };

        let before = connections.len();
        connections.retain(|id, sink| {
            let delivered = sink.send(msg.clone()).is_ok();
            if !delivered {
                debug!(connection_id = %id, "pruning closed connection");
            }
            delivered
        });
        let delivered = connections.len();

        debug!(
            event = msg.event.name(),
            sequence_id = msg.sequence_id,
            delivered,
            pruned = before - delivered,
            "broadcast"
        );
        delivered
    }

    /// Number of currently registered clients
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Whether a client id is currently registered
    pub fn is_connected(&self, id: &str) -> bool {
        self.connections.read().contains_key(id)
    }

    /// Sequence ID the next broadcast will carry
    pub fn current_sequence_id(&self) -> u64 {
        self.sequence_counter.load(Ordering::SeqCst)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
