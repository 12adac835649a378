use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tungstenite::protocol::Message;
use tungstenite::WebSocket;

use super::types::WsInMessage;
use crate::osc::types::TriggerAction;

/// Run the per-client read/write loop.
/// Reads JSON from the client, sends outbound messages from the broadcast channel.
pub fn run_client<S: Read + Write>(
    mut ws: WebSocket<S>,
    inbound_tx: Sender<WsInMessage>,
    outbound_rx: Receiver<String>,
    initial_state: String,
    shutdown: Arc<AtomicBool>,
    client_id: usize,
) {
    log::info!("WebSocket client {} connected", client_id);

    // Send initial full state
    if !initial_state.is_empty() {
        if ws.send(Message::text(initial_state)).is_err() {
            log::info!("WebSocket client {} disconnected on initial send", client_id);
            return;
        }
    }

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        // Try to read a message (50ms timeout)
        match ws.read() {
            Ok(Message::Text(text)) => {
                if let Some(msg) = parse_client_message(text.as_ref()) {
                    let _ = inbound_tx.try_send(msg);
                }
            }
            Ok(Message::Close(_)) => {
                log::info!("WebSocket client {} closed connection", client_id);
                break;
            }
            Ok(Message::Ping(data)) => {
                let _ = ws.send(Message::Pong(data));
            }
            Ok(_) => {} // Binary, Pong, etc.
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // Timeout — expected, continue to drain outbound
            }
            Err(e) => {
                log::debug!("WebSocket client {} read error: {e}", client_id);
                break;
            }
        }

        // Drain outbound messages
        let mut sent_any = false;
        for msg in outbound_rx.try_iter() {
            if msg.is_empty() {
                continue;
            }
            match ws.send(Message::text(msg)) {
                Ok(_) => sent_any = true,
                Err(e) => {
                    log::debug!("WebSocket client {} write error: {e}", client_id);
                    return;
                }
            }
        }

        if sent_any {
            if ws.flush().is_err() {
                break;
            }
        }
    }

    let _ = ws.close(None);
    log::info!("WebSocket client {} disconnected", client_id);
}

/// Parse a JSON message from the client into a WsInMessage.
fn parse_client_message(text: &str) -> Option<WsInMessage> {
    let v: serde_json::Value = serde_json::from_str(text).ok()?;
    let msg_type = v.get("type")?.as_str()?;

    match msg_type {
        "set_param" => {
            let name = v.get("name")?.as_str()?.to_string();
            let value = v.get("value")?.as_f64()? as f32;
            Some(WsInMessage::SetParam {
                name,
                value: value.clamp(0.0, 1.0),
            })
        }
        "trigger" => {
            let action = TriggerAction::from_slug(v.get("action")?.as_str()?)?;
            Some(WsInMessage::Trigger(action))
        }
        _ => {
            log::debug!("Unknown WS message type: {msg_type}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_set_param() {
        let json = r#"{"type":"set_param","name":"zoom","value":0.75}"#;
        match parse_client_message(json) {
            Some(WsInMessage::SetParam { name, value }) => {
                assert_eq!(name, "zoom");
                assert!((value - 0.75).abs() < 1e-6);
            }
            other => panic!("expected SetParam, got {:?}", other),
        }
    }

    #[test]
    fn parse_set_param_clamped() {
        let json = r#"{"type":"set_param","name":"zoom","value":1.5}"#;
        match parse_client_message(json) {
            Some(WsInMessage::SetParam { value, .. }) => {
                assert!((value - 1.0).abs() < 1e-6);
            }
            other => panic!("expected SetParam, got {:?}", other),
        }
    }

    #[test]
    fn parse_trigger() {
        for (action_str, expected) in [
            ("next_mesh", TriggerAction::NextMesh),
            ("prev_mesh", TriggerAction::PrevMesh),
            ("toggle_warp_edit", TriggerAction::ToggleWarpEdit),
            ("toggle_overlay", TriggerAction::ToggleOverlay),
            ("save_keyframe", TriggerAction::SaveKeyframe),
            ("toggle_split_v", TriggerAction::ToggleSplitVertical),
            ("toggle_split_h", TriggerAction::ToggleSplitHorizontal),
            ("reset_split", TriggerAction::ResetSplit),
            ("toggle_playback", TriggerAction::TogglePlayback),
        ] {
            let json = format!(r#"{{"type":"trigger","action":"{action_str}"}}"#);
            match parse_client_message(&json) {
                Some(WsInMessage::Trigger(action)) => assert_eq!(action, expected),
                other => panic!("expected Trigger({:?}), got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn parse_trigger_unknown_action_returns_none() {
        let json = r#"{"type":"trigger","action":"warp_speed"}"#;
        assert!(parse_client_message(json).is_none());
    }

    #[test]
    fn parse_set_param_missing_value_returns_none() {
        let json = r#"{"type":"set_param","name":"zoom"}"#;
        assert!(parse_client_message(json).is_none());
    }

    #[test]
    fn parse_unknown_type_returns_none() {
        let json = r#"{"type":"invalid_type"}"#;
        assert!(parse_client_message(json).is_none());
    }

    #[test]
    fn parse_invalid_json_returns_none() {
        assert!(parse_client_message("not json").is_none());
    }
}
