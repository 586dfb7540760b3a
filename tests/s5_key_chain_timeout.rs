//! A key chain left hanging resets once its timeout elapses, driven
//! through the real event loop against a queue of synthetic key presses.
mod support;

use std::thread::sleep;
use std::time::Duration;

use keysyms::XKeySym;
use pekwm_core::action::{Action, ActionEvent};
use pekwm_core::bindings::keys::{KeyContext, KeyPress, ModMask};
use pekwm_core::config::Config;
use pekwm_core::event_loop::EventLoop;
use pekwm_core::pure::geometry::Rect;
use pekwm_core::signal::Signals;
use pekwm_core::x::event::XEvent;
use support::{empty_state_with_config, FakeServer};

#[test]
fn abandoned_chain_resets_after_its_timeout_fires() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut state = empty_state_with_config(Config::default());
    state.keys.chain_timeout = Duration::from_millis(20);
    state.keys.bind_chain(
        KeyContext::Global,
        &[(ModMask::MOD4, XKeySym::XK_a), (ModMask::empty(), XKeySym::XK_b)],
        ActionEvent::single(Action::Exit),
    );

    let mut loop_ = EventLoop::new(Signals::install().unwrap());

    server.push_event(XEvent::KeyPress(KeyPress::new(ModMask::MOD4, XKeySym::XK_a)));
    loop_.step(&mut state, &server).unwrap();
    assert!(state.keys.is_mid_chain());
    assert!(state.key_chain_timeout.is_some());

    sleep(Duration::from_millis(40));
    loop_.step(&mut state, &server).unwrap();

    assert!(!state.keys.is_mid_chain(), "chain pointer should reset once the timeout fires");
    assert!(state.key_chain_timeout.is_none());
}

#[test]
fn completed_chain_runs_its_bound_action_and_stays_running() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut state = empty_state_with_config(Config::default());
    state.keys.bind_chain(
        KeyContext::Global,
        &[(ModMask::MOD4, XKeySym::XK_a), (ModMask::empty(), XKeySym::XK_b)],
        ActionEvent::single(Action::Exit),
    );

    let mut loop_ = EventLoop::new(Signals::install().unwrap());

    server.push_event(XEvent::KeyPress(KeyPress::new(ModMask::MOD4, XKeySym::XK_a)));
    loop_.step(&mut state, &server).unwrap();
    assert!(state.keys.is_mid_chain());

    server.push_event(XEvent::KeyPress(KeyPress::new(ModMask::empty(), XKeySym::XK_b)));
    loop_.step(&mut state, &server).unwrap();

    assert!(!state.keys.is_mid_chain());
    assert!(!state.running, "Action::Exit should have stopped the loop");
}
