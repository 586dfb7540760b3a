//! A newly mapped client lands fully inside an empty workarea.
mod support;

use pekwm_core::config::{Config, PlacementStrategy};
use pekwm_core::manage;
use pekwm_core::pure::geometry::Rect;
use pekwm_core::x::property::{MapState, WindowAttributes, WindowClass};
use pekwm_core::Xid;
use support::{empty_state_with_config, FakeServer};

#[test]
fn mouse_centered_placement_stays_inside_the_workarea() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let client = Xid(200);
    server.set_attrs(client, WindowAttributes::new(false, MapState::Viewable, WindowClass::InputOutput));
    server.set_geometry(client, Rect::new(0, 0, 300, 200));

    let mut config = Config::default();
    config.placement = vec![PlacementStrategy::MouseCentered];
    let mut state = empty_state_with_config(config);

    manage::handle_map_request(&mut state, &server, client).unwrap();

    let frame_id = state.registry.by_xid(client).and_then(|id| state.frame_of_client(id)).unwrap();
    let frame = state.registry.get(frame_id).unwrap().as_frame().unwrap();
    let g = frame.base.geometry;

    assert!(g.x + g.w <= 1920);
    assert!(g.y + g.h <= 1080);
    assert_eq!((g.w, g.h), (300, 200));
}

#[test]
fn cascade_placement_offsets_each_new_frame() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut config = Config::default();
    config.placement = vec![PlacementStrategy::Cascade];
    let mut state = empty_state_with_config(config);

    let first = Xid(201);
    server.set_attrs(first, WindowAttributes::new(false, MapState::Viewable, WindowClass::InputOutput));
    server.set_geometry(first, Rect::new(0, 0, 300, 200));
    manage::handle_map_request(&mut state, &server, first).unwrap();

    let second = Xid(202);
    server.set_attrs(second, WindowAttributes::new(false, MapState::Viewable, WindowClass::InputOutput));
    server.set_geometry(second, Rect::new(0, 0, 300, 200));
    manage::handle_map_request(&mut state, &server, second).unwrap();

    let first_frame = state.registry.by_xid(first).and_then(|id| state.frame_of_client(id)).unwrap();
    let second_frame = state.registry.by_xid(second).and_then(|id| state.frame_of_client(id)).unwrap();
    let g1 = state.registry.get(first_frame).unwrap().as_frame().unwrap().base.geometry;
    let g2 = state.registry.get(second_frame).unwrap().as_frame().unwrap().base.geometry;

    assert_eq!(g2.x, g1.x + 20);
    assert_eq!(g2.y, g1.y + 20);
}

#[test]
fn override_redirect_windows_are_mapped_but_not_managed() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let popup = Xid(210);
    server.set_attrs(popup, WindowAttributes::new(true, MapState::Viewable, WindowClass::InputOutput));
    let mut state = empty_state_with_config(Config::default());

    manage::handle_map_request(&mut state, &server, popup).unwrap();

    assert!(state.registry.by_xid(popup).is_none());
}
