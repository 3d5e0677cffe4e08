use super::*;
use crate::doc::{ElementKind, Style};

#[derive(Debug, Default)]
struct Outbox {
    sent: Vec<String>,
    fail: bool,
}

impl PresenceTransport for Outbox {
    fn send(&mut self, payload: &str) -> Result<(), PresenceError> {
        if self.fail {
            return Err(PresenceError::Transport("offline".to_owned()));
        }
        self.sent.push(payload.to_owned());
        Ok(())
    }
}

fn channel() -> PresenceChannel<Outbox> {
    PresenceChannel::new("me", "Me", "#111111", Outbox::default(), 3000)
}

fn peer_payload(id: &str, x: f64) -> String {
    serde_json::to_string(&PeerState {
        peer_id: id.to_owned(),
        peer_name: format!("peer {id}"),
        peer_color: "#ff0000".to_owned(),
        cursor_position: Point::new(x, 0.0),
        drawing_hint: None,
    })
    .unwrap()
}

// =============================================================
// Publish
// =============================================================

#[test]
fn publish_sends_camel_case_state() {
    let mut ch = channel();
    ch.publish(Point::new(4.0, 5.0), None).unwrap();
    assert_eq!(ch.transport.sent.len(), 1);
    let value: serde_json::Value = serde_json::from_str(&ch.transport.sent[0]).unwrap();
    assert_eq!(value["peerId"], "me");
    assert_eq!(value["cursorPosition"], serde_json::json!({ "x": 4.0, "y": 5.0 }));
    assert!(value.get("drawingHint").is_none());
}

#[test]
fn publish_includes_drawing_hint() {
    let mut ch = channel();
    let hint = Element::new(ElementKind::Ellipse, Point::new(1.0, 1.0), Style::default());
    ch.publish(Point::new(1.0, 1.0), Some(hint.clone())).unwrap();
    let sent: PeerState = serde_json::from_str(&ch.transport.sent[0]).unwrap();
    assert_eq!(sent.drawing_hint.map(|h| h.id), Some(hint.id));
}

#[test]
fn publish_failure_still_updates_local_state() {
    let mut ch = PresenceChannel::new("me", "Me", "#111", Outbox { sent: vec![], fail: true }, 3000);
    let err = ch.publish(Point::new(9.0, 9.0), None).unwrap_err();
    assert!(matches!(err, PresenceError::Transport(_)));
    assert_eq!(ch.local.cursor_position, Point::new(9.0, 9.0));
}

// =============================================================
// Receive
// =============================================================

#[test]
fn receive_is_last_write_wins() {
    let mut ch = channel();
    assert!(ch.receive(&peer_payload("a", 1.0), 0).unwrap());
    assert!(ch.receive(&peer_payload("a", 7.0), 10).unwrap());
    let peers = ch.peers();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].cursor_position, Point::new(7.0, 0.0));
}

#[test]
fn receive_ignores_own_echo() {
    let mut ch = channel();
    assert!(!ch.receive(&peer_payload("me", 1.0), 0).unwrap());
    assert!(ch.peers().is_empty());
}

#[test]
fn receive_rejects_garbage() {
    let mut ch = channel();
    assert!(matches!(ch.receive("{\"peerId\": 3}", 0), Err(PresenceError::Codec(_))));
}

#[test]
fn peers_are_sorted_by_id() {
    let mut ch = channel();
    for id in ["c", "a", "b"] {
        ch.receive(&peer_payload(id, 0.0), 0).unwrap();
    }
    let ids: Vec<&str> = ch.peers().iter().map(|p| p.peer_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

// =============================================================
// Removal
// =============================================================

#[test]
fn remove_peer_reports_presence() {
    let mut ch = channel();
    ch.receive(&peer_payload("a", 0.0), 0).unwrap();
    assert!(ch.remove_peer("a"));
    assert!(!ch.remove_peer("a"));
}

#[test]
fn prune_stale_drops_silent_peers() {
    let mut ch = channel();
    ch.receive(&peer_payload("old", 0.0), 1_000).unwrap();
    ch.receive(&peer_payload("fresh", 0.0), 3_500).unwrap();
    assert_eq!(ch.prune_stale(4_500), vec!["old".to_owned()]);
    assert_eq!(ch.peers().len(), 1);
    assert!(ch.prune_stale(4_500).is_empty());
}
