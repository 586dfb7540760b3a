//! Dragging a client's tab onto another frame attaches it there and, if
//! the origin frame is emptied by the move, removes that frame entirely.
mod support;

use pekwm_core::bindings::keys::ModMask;
use pekwm_core::bindings::mouse::{MouseButton, MouseState};
use pekwm_core::config::Config;
use pekwm_core::handlers::GroupingDrag;
use pekwm_core::pure::geometry::{Point, Rect};
use pekwm_core::x::event::ButtonEvent;
use pekwm_core::Xid;
use support::{add_framed_client, empty_state_with_config, FakeServer};

fn release_at(id: Xid, abs: Point) -> ButtonEvent {
    ButtonEvent {
        id,
        state: MouseState::new(ModMask::empty(), MouseButton::Left),
        abs,
        relative: abs,
    }
}

#[test]
fn dropping_onto_another_frame_attaches_and_removes_the_empty_origin() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut state = empty_state_with_config(Config::default());

    let (origin_frame, client_id) = add_framed_client(&mut state, Xid(400), Rect::new(0, 0, 200, 150));
    let (dest_frame, _dest_client) = add_framed_client(&mut state, Xid(401), Rect::new(400, 400, 200, 150));

    let mut drag = GroupingDrag::new(client_id, origin_frame, Point::new(10, 10));
    drag.init(&server).unwrap();

    let ev = release_at(Xid(400), Point::new(450, 450));
    let outcome = drag.handle_button_release(&mut state, ev, &server).unwrap();

    assert!(outcome.is_terminal());
    assert!(!state.registry.contains(origin_frame), "emptied origin frame should be removed");

    let dest = state.registry.get(dest_frame).unwrap().as_frame().unwrap();
    assert!(dest.clients.contains(&client_id));

    let client = state.registry.get(client_id).unwrap().as_client().unwrap();
    assert_eq!(client.frame_id, Some(dest_frame));
}

#[test]
fn dropping_on_empty_space_leaves_the_frame_untouched() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut state = empty_state_with_config(Config::default());

    let (origin_frame, client_id) = add_framed_client(&mut state, Xid(410), Rect::new(0, 0, 200, 150));

    let mut drag = GroupingDrag::new(client_id, origin_frame, Point::new(10, 10));
    let ev = release_at(Xid(410), Point::new(1500, 900));
    drag.handle_button_release(&mut state, ev, &server).unwrap();

    assert!(state.registry.contains(origin_frame));
    let client = state.registry.get(client_id).unwrap().as_client().unwrap();
    assert_eq!(client.frame_id, Some(origin_frame));
}
