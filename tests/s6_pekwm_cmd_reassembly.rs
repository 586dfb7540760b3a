//! A `_PEKWM_CMD` client message sent across several 20-byte fragments is
//! reassembled and run as a shell command through the public
//! `handle_client_message` entry point, the same path a real X11 client
//! message would take.
mod support;

use pekwm_core::config::Config;
use pekwm_core::ewmh;
use pekwm_core::pure::geometry::Rect;
use pekwm_core::x::event::{ClientEventMask, ClientMessage};
use pekwm_core::Xid;
use support::{empty_state_with_config, FakeServer};

fn cmd_fragment(payload: &[u8], marker: u8) -> [u8; 20] {
    let mut data = [0u8; 20];
    let n = payload.len().min(19);
    data[..n].copy_from_slice(&payload[..n]);
    data[19] = marker;
    data
}

#[test]
fn single_message_command_runs_without_error() {
    const CMD_SINGLE: u8 = 0;
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut state = empty_state_with_config(Config::default());

    let data = cmd_fragment(b"true", CMD_SINGLE);
    let msg = ClientMessage::new(Xid(1), ClientEventMask::NoEventMask, "_PEKWM_CMD", data.into());

    ewmh::handle_client_message(&mut state, &server, &msg).unwrap();
}

#[test]
fn three_message_sequence_reassembles_before_running() {
    const CMD_FIRST: u8 = 1;
    const CMD_CONTINUATION: u8 = 2;
    const CMD_END: u8 = 3;
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut state = empty_state_with_config(Config::default());
    let sender = Xid(9);

    let first = cmd_fragment(b"tr", CMD_FIRST);
    let msg1 = ClientMessage::new(sender, ClientEventMask::NoEventMask, "_PEKWM_CMD", first.into());
    ewmh::handle_client_message(&mut state, &server, &msg1).unwrap();
    assert!(state.pekwm_cmd_buffers.contains_key(&sender), "first fragment should open a reassembly buffer");

    let middle = cmd_fragment(b"u", CMD_CONTINUATION);
    let msg2 = ClientMessage::new(sender, ClientEventMask::NoEventMask, "_PEKWM_CMD", middle.into());
    ewmh::handle_client_message(&mut state, &server, &msg2).unwrap();
    assert!(state.pekwm_cmd_buffers.contains_key(&sender));

    let last = cmd_fragment(b"e", CMD_END);
    let msg3 = ClientMessage::new(sender, ClientEventMask::NoEventMask, "_PEKWM_CMD", last.into());
    ewmh::handle_client_message(&mut state, &server, &msg3).unwrap();

    assert!(
        !state.pekwm_cmd_buffers.contains_key(&sender),
        "completed sequence should clear its reassembly buffer"
    );
}

#[test]
fn a_continuation_with_no_open_sequence_is_ignored_rather_than_erroring() {
    const CMD_CONTINUATION: u8 = 2;
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut state = empty_state_with_config(Config::default());

    let data = cmd_fragment(b"stray", CMD_CONTINUATION);
    let msg = ClientMessage::new(Xid(42), ClientEventMask::NoEventMask, "_PEKWM_CMD", data.into());

    ewmh::handle_client_message(&mut state, &server, &msg).unwrap();
    assert!(state.pekwm_cmd_buffers.is_empty());
}
