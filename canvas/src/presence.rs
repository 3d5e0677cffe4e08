//! Peer presence: publish the local cursor, merge remote peers' last-known state.
//!
//! The channel is transport-agnostic. Outbound state goes through a
//! [`PresenceTransport`]; inbound payloads are handed to
//! [`PresenceChannel::receive`] by whatever delivers them. Nothing here is
//! acknowledged or retried, and a later payload for a peer simply replaces
//! the earlier one.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::camera::Point;
use crate::doc::Element;

/// Identifier a peer announces for itself.
pub type PeerId = String;

#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("presence payload codec failed: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("presence transport failed: {0}")]
    Transport(String),
}

/// What one peer shares about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerState {
    pub peer_id: PeerId,
    pub peer_name: String,
    /// CSS color used for the peer's cursor and drawing hint.
    pub peer_color: String,
    /// World-space cursor position.
    pub cursor_position: Point,
    /// The element the peer is currently drawing, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing_hint: Option<Element>,
}

/// Outbound side of the presence channel.
pub trait PresenceTransport {
    /// Deliver one encoded payload.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Transport`] if delivery failed.
    fn send(&mut self, payload: &str) -> Result<(), PresenceError>;
}

/// In the browser the host passes a JS callback that forwards the payload.
impl PresenceTransport for js_sys::Function {
    fn send(&mut self, payload: &str) -> Result<(), PresenceError> {
        self.call1(&JsValue::NULL, &JsValue::from_str(payload))
            .map(|_| ())
            .map_err(|e| PresenceError::Transport(format!("{e:?}")))
    }
}

#[derive(Debug, Clone)]
struct PeerEntry {
    state: PeerState,
    last_seen_ms: i64,
}

/// Local presence state plus the latest known state of every remote peer.
#[derive(Debug)]
pub struct PresenceChannel<T> {
    local: PeerState,
    transport: T,
    peers: HashMap<PeerId, PeerEntry>,
    stale_ms: i64,
}

impl<T: PresenceTransport> PresenceChannel<T> {
    /// Create a channel for the local peer.
    pub fn new(
        peer_id: impl Into<PeerId>,
        peer_name: impl Into<String>,
        peer_color: impl Into<String>,
        transport: T,
        stale_ms: i64,
    ) -> Self {
        Self {
            local: PeerState {
                peer_id: peer_id.into(),
                peer_name: peer_name.into(),
                peer_color: peer_color.into(),
                cursor_position: Point::default(),
                drawing_hint: None,
            },
            transport,
            peers: HashMap::new(),
            stale_ms,
        }
    }

    /// Update the local cursor and drawing hint, then send them once.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the transport fails. The local state is
    /// updated regardless.
    pub fn publish(&mut self, cursor: Point, hint: Option<Element>) -> Result<(), PresenceError> {
        self.local.cursor_position = cursor;
        self.local.drawing_hint = hint;
        let payload = serde_json::to_string(&self.local)?;
        self.transport.send(&payload)
    }

    /// Merge an inbound payload. Returns `false` for the channel's own echo.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Codec`] if the payload is not a valid peer state.
    pub fn receive(&mut self, payload: &str, now_ms: i64) -> Result<bool, PresenceError> {
        let state: PeerState = serde_json::from_str(payload)?;
        if state.peer_id == self.local.peer_id {
            return Ok(false);
        }
        self.peers.insert(state.peer_id.clone(), PeerEntry { state, last_seen_ms: now_ms });
        Ok(true)
    }

    /// Remote peers sorted by id.
    #[must_use]
    pub fn peers(&self) -> Vec<&PeerState> {
        let mut out: Vec<&PeerState> = self.peers.values().map(|e| &e.state).collect();
        out.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        out
    }

    /// Forget a peer. Returns `true` if it was known.
    pub fn remove_peer(&mut self, peer_id: &str) -> bool {
        self.peers.remove(peer_id).is_some()
    }

    /// Drop peers not heard from within the staleness window; returns their ids.
    pub fn prune_stale(&mut self, now_ms: i64) -> Vec<PeerId> {
        let stale_ms = self.stale_ms;
        let mut dropped: Vec<PeerId> = self
            .peers
            .iter()
            .filter(|(_, e)| now_ms - e.last_seen_ms > stale_ms)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &dropped {
            self.peers.remove(id);
        }
        dropped.sort();
        dropped
    }
}
