//! Peer registry — connection identity and outbound delivery.
//!
//! Each connection is assigned a unique id at connect time: an incrementing
//! counter with a fixed prefix ("p1", "p2", …). That id is the canonical
//! entity-tagging key for the peer's Player and Avatar entities until
//! disconnect. A send failure means the peer's writer task is gone; it is
//! ignored here and surfaces as a disconnect from the read side
//! (transport-loss policy: no retry, nothing buffered beyond the channel).

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use vox_component::PlayerId;

/// One connected peer.
#[derive(Debug)]
struct Peer {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    /// Set once the settle delay has fired and the peer's player exists.
    joined: bool,
}

/// Maps connection ids to peers and owns the id counter.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    next_seq: u64,
    peers: HashMap<PlayerId, Peer>,
}

impl PeerRegistry {
    /// Create an empty registry. Ids start at "p1".
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_seq: 1,
            peers: HashMap::new(),
        }
    }

    /// Register a new connection and assign its id.
    pub fn register(&mut self, outbound: mpsc::UnboundedSender<Vec<u8>>) -> PlayerId {
        let id = PlayerId::from_seq(self.next_seq);
        self.next_seq += 1;
        self.peers.insert(
            id.clone(),
            Peer {
                outbound,
                joined: false,
            },
        );
        debug!(player_id = %id, peers = self.peers.len(), "peer registered");
        id
    }

    /// Remove a peer. Returns `true` if it was known.
    pub fn remove(&mut self, id: &PlayerId) -> bool {
        self.peers.remove(id).is_some()
    }

    /// Returns `true` if the peer is still connected.
    #[must_use]
    pub fn contains(&self, id: &PlayerId) -> bool {
        self.peers.contains_key(id)
    }

    /// Mark the peer's delayed join as completed.
    pub fn mark_joined(&mut self, id: &PlayerId) {
        if let Some(peer) = self.peers.get_mut(id) {
            peer.joined = true;
        }
    }

    /// Returns `true` if the peer's join has settled.
    #[must_use]
    pub fn is_joined(&self, id: &PlayerId) -> bool {
        self.peers.get(id).is_some_and(|p| p.joined)
    }

    /// Send a frame to one peer. Delivery failure is silently dropped.
    pub fn send_to(&self, id: &PlayerId, frame: Vec<u8>) {
        if let Some(peer) = self.peers.get(id) {
            let _ = peer.outbound.send(frame);
        }
    }

    /// Send a frame to every connected peer.
    pub fn broadcast(&self, frame: &[u8]) {
        for peer in self.peers.values() {
            let _ = peer.outbound.send(frame.to_vec());
        }
    }

    /// Send a frame to every peer except `except`.
    pub fn broadcast_except(&self, except: &PlayerId, frame: &[u8]) {
        for (id, peer) in &self.peers {
            if id != except {
                let _ = peer.outbound.send(frame.to_vec());
            }
        }
    }

    /// Number of connected peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Returns `true` if no peers are connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> (
        mpsc::UnboundedSender<Vec<u8>>,
        mpsc::UnboundedReceiver<Vec<u8>>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_ids_are_sequential_with_prefix() {
        let mut registry = PeerRegistry::new();
        let (tx, _rx) = peer();
        assert_eq!(registry.register(tx.clone()).as_str(), "p1");
        assert_eq!(registry.register(tx).as_str(), "p2");
    }

    #[test]
    fn test_ids_never_reused_after_disconnect() {
        let mut registry = PeerRegistry::new();
        let (tx, _rx) = peer();
        let first = registry.register(tx.clone());
        registry.remove(&first);
        let second = registry.register(tx);
        assert_eq!(second.as_str(), "p2");
    }

    #[test]
    fn test_send_to_and_broadcast_except() {
        let mut registry = PeerRegistry::new();
        let (tx1, mut rx1) = peer();
        let (tx2, mut rx2) = peer();
        let p1 = registry.register(tx1);
        let p2 = registry.register(tx2);

        registry.send_to(&p1, b"direct".to_vec());
        registry.broadcast_except(&p1, b"relay");

        assert_eq!(rx1.try_recv().unwrap(), b"direct");
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), b"relay");

        registry.broadcast_except(&p2, b"other");
        assert_eq!(rx1.try_recv().unwrap(), b"other");

        registry.broadcast(b"all");
        assert_eq!(rx1.try_recv().unwrap(), b"all");
        assert_eq!(rx2.try_recv().unwrap(), b"all");
    }

    #[test]
    fn test_send_to_dead_channel_is_silent() {
        let mut registry = PeerRegistry::new();
        let (tx, rx) = peer();
        let id = registry.register(tx);
        drop(rx);
        registry.send_to(&id, b"lost".to_vec());
    }

    #[test]
    fn test_joined_state() {
        let mut registry = PeerRegistry::new();
        let (tx, _rx) = peer();
        let id = registry.register(tx);
        assert!(!registry.is_joined(&id));
        registry.mark_joined(&id);
        assert!(registry.is_joined(&id));
    }
}
