use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use rosc::{OscMessage, OscPacket, OscType};

use super::types::{OscInMessage, TriggerAction};

/// Spawn a UDP receiver thread that decodes OSC and sends parsed messages.
pub fn spawn_receiver(
    port: u16,
    tx: Sender<OscInMessage>,
) -> anyhow::Result<(Arc<AtomicBool>, JoinHandle<()>)> {
    let addr = format!("0.0.0.0:{port}");
    let socket = UdpSocket::bind(&addr)?;
    socket.set_read_timeout(Some(Duration::from_millis(100)))?;
    log::info!("OSC receiver listening on {addr}");

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();

    let handle = thread::Builder::new()
        .name("zenith-osc-rx".into())
        .spawn(move || {
            let mut buf = [0u8; 4096];
            while !shutdown_flag.load(Ordering::Relaxed) {
                match socket.recv_from(&mut buf) {
                    Ok((size, _addr)) => match rosc::decoder::decode_udp(&buf[..size]) {
                        Ok((_, packet)) => {
                            process_packet(&packet, &tx);
                        }
                        Err(e) => {
                            log::debug!("OSC decode error: {e}");
                        }
                    },
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        // Timeout — loop back and check shutdown flag
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {
                        // Windows-style timeout
                    }
                    Err(e) => {
                        log::error!("OSC recv error: {e}");
                        break;
                    }
                }
            }
            log::info!("OSC receiver thread shutting down");
        })?;

    Ok((shutdown, handle))
}

fn process_packet(packet: &OscPacket, tx: &Sender<OscInMessage>) {
    match packet {
        OscPacket::Message(msg) => {
            if let Some(parsed) = parse_osc_message(msg) {
                let _ = tx.try_send(parsed);
            }
        }
        OscPacket::Bundle(bundle) => {
            for p in &bundle.content {
                process_packet(p, tx);
            }
        }
    }
}

/// Extract the first float-ish value from OSC args.
fn first_float(args: &[OscType]) -> Option<f32> {
    args.first().and_then(|a| match a {
        OscType::Float(f) => Some(*f),
        OscType::Double(d) => Some(*d as f32),
        OscType::Int(i) => Some(*i as f32),
        OscType::Long(l) => Some(*l as f32),
        OscType::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    })
}

fn parse_osc_message(msg: &OscMessage) -> Option<OscInMessage> {
    let addr = &msg.addr;
    let parts: Vec<&str> = addr.split('/').collect();
    // parts[0] is always "" (leading slash)

    // All our addresses start with /zenith/
    if parts.len() < 3 || parts[1] != "zenith" {
        // Not our namespace — capture as Raw for learn mode
        let value = first_float(&msg.args).unwrap_or(1.0);
        return Some(OscInMessage::Raw {
            address: addr.clone(),
            value,
        });
    }

    match parts[2] {
        // /zenith/param/{name}
        "param" if parts.len() >= 4 => {
            let name = parts[3..].join("/");
            let value = first_float(&msg.args)?;
            Some(OscInMessage::Param { name, value })
        }

        // /zenith/trigger/{action_name}
        "trigger" if parts.len() >= 4 => match TriggerAction::from_slug(parts[3]) {
            Some(action) => Some(OscInMessage::Trigger(action)),
            None => {
                let value = first_float(&msg.args).unwrap_or(1.0);
                Some(OscInMessage::Raw {
                    address: addr.clone(),
                    value,
                })
            }
        },

        // Unknown /zenith/... address — capture as Raw
        _ => {
            let value = first_float(&msg.args).unwrap_or(1.0);
            Some(OscInMessage::Raw {
                address: addr.clone(),
                value,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[test]
    fn parses_param_address() {
        let m = msg("/zenith/param/zoom", vec![OscType::Float(0.7)]);
        match parse_osc_message(&m) {
            Some(OscInMessage::Param { name, value }) => {
                assert_eq!(name, "zoom");
                assert!((value - 0.7).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_trigger_address() {
        let m = msg("/zenith/trigger/next_mesh", vec![]);
        assert!(matches!(
            parse_osc_message(&m),
            Some(OscInMessage::Trigger(TriggerAction::NextMesh))
        ));
    }

    #[test]
    fn unknown_trigger_becomes_raw() {
        let m = msg("/zenith/trigger/warp_speed", vec![OscType::Float(1.0)]);
        assert!(matches!(
            parse_osc_message(&m),
            Some(OscInMessage::Raw { .. })
        ));
    }

    #[test]
    fn foreign_namespace_becomes_raw() {
        let m = msg("/touchosc/fader1", vec![OscType::Float(0.5)]);
        match parse_osc_message(&m) {
            Some(OscInMessage::Raw { address, value }) => {
                assert_eq!(address, "/touchosc/fader1");
                assert!((value - 0.5).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn int_and_bool_args_coerce_to_float() {
        let m = msg("/zenith/param/steps", vec![OscType::Int(1)]);
        assert!(matches!(
            parse_osc_message(&m),
            Some(OscInMessage::Param { value, .. }) if value == 1.0
        ));
        let m = msg("/zenith/param/invert", vec![OscType::Bool(true)]);
        assert!(matches!(
            parse_osc_message(&m),
            Some(OscInMessage::Param { value, .. }) if value == 1.0
        ));
    }

    #[test]
    fn param_without_value_is_dropped() {
        let m = msg("/zenith/param/zoom", vec![]);
        assert!(parse_osc_message(&m).is_none());
    }
}
