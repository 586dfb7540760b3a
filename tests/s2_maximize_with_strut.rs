//! Maximizing a frame respects a workarea shrunk by a registered strut.
mod support;

use pekwm_core::action::{Action, ActionEvent, ActionPerformed, StateAction};
use pekwm_core::config::Config;
use pekwm_core::dispatch;
use pekwm_core::pure::geometry::Rect;
use pekwm_core::{Strut, Xid};
use support::{add_framed_client, empty_state_with_config, FakeServer};

#[test]
fn maximized_vert_stops_above_a_bottom_strut() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut state = empty_state_with_config(Config::default());
    state.root_state_mut().struts = vec![Strut::new(0, 0, 0, 40)];

    let (frame_id, _client_id) = add_framed_client(&mut state, Xid(300), Rect::new(100, 100, 300, 200));

    dispatch::perform(
        &mut state,
        &server,
        ActionPerformed::new(frame_id, ActionEvent::single(Action::SetMaximizedVert(StateAction::Set)), None),
    )
    .unwrap();

    let g = state.registry.get(frame_id).unwrap().as_frame().unwrap().base.geometry;
    assert_eq!(g.y, 0);
    assert_eq!(g.y + g.h, 1040);
}

#[test]
fn maximized_horz_ignores_an_unrelated_top_strut() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut state = empty_state_with_config(Config::default());
    state.root_state_mut().struts = vec![Strut::new(0, 0, 20, 0)];

    let (frame_id, _client_id) = add_framed_client(&mut state, Xid(301), Rect::new(100, 100, 300, 200));

    dispatch::perform(
        &mut state,
        &server,
        ActionPerformed::new(frame_id, ActionEvent::single(Action::SetMaximizedHorz(StateAction::Set)), None),
    )
    .unwrap();

    let g = state.registry.get(frame_id).unwrap().as_frame().unwrap().base.geometry;
    assert_eq!(g.x, 0);
    assert_eq!(g.x + g.w, 1920);
    assert_eq!(g.y, 100, "vertical extent untouched by a horizontal maximize");
}
