//! Going fullscreen promotes a frame above docks when configured to, and
//! dropping fullscreen restores both the prior geometry and layer.
mod support;

use pekwm_core::action::{Action, ActionEvent, ActionPerformed, StateAction};
use pekwm_core::config::Config;
use pekwm_core::dispatch;
use pekwm_core::pure::geometry::Rect;
use pekwm_core::wo::Layer;
use pekwm_core::Xid;
use support::{add_framed_client, empty_state_with_config, FakeServer};

#[test]
fn fullscreen_promotes_layer_and_unset_restores_it() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut config = Config::default();
    config.fullscreen_above_on_raise = true;
    let mut state = empty_state_with_config(config);

    let (frame_id, _client_id) = add_framed_client(&mut state, Xid(500), Rect::new(100, 100, 300, 200));
    assert_eq!(state.registry.get(frame_id).unwrap().as_frame().unwrap().base.layer, Layer::Normal);

    dispatch::perform(
        &mut state,
        &server,
        ActionPerformed::new(frame_id, ActionEvent::single(Action::SetFullscreen(StateAction::Set)), None),
    )
    .unwrap();

    {
        let frame = state.registry.get(frame_id).unwrap().as_frame().unwrap();
        assert!(frame.base.fullscreen);
        assert_eq!(frame.base.layer, Layer::AboveDock);
        assert_eq!(frame.base.geometry, Rect::new(0, 0, 1920, 1080));
    }

    dispatch::perform(
        &mut state,
        &server,
        ActionPerformed::new(frame_id, ActionEvent::single(Action::SetFullscreen(StateAction::Unset)), None),
    )
    .unwrap();

    let frame = state.registry.get(frame_id).unwrap().as_frame().unwrap();
    assert!(!frame.base.fullscreen);
    assert_eq!(frame.base.layer, Layer::Normal);
    assert_eq!(frame.base.geometry, Rect::new(100, 100, 300, 200));
}

#[test]
fn fullscreen_leaves_layer_alone_when_promotion_is_disabled() {
    let server = FakeServer::new(vec![Rect::new(0, 0, 1920, 1080)]);
    let mut config = Config::default();
    config.fullscreen_above_on_raise = false;
    let mut state = empty_state_with_config(config);

    let (frame_id, _client_id) = add_framed_client(&mut state, Xid(501), Rect::new(100, 100, 300, 200));

    dispatch::perform(
        &mut state,
        &server,
        ActionPerformed::new(frame_id, ActionEvent::single(Action::SetFullscreen(StateAction::Set)), None),
    )
    .unwrap();

    let frame = state.registry.get(frame_id).unwrap().as_frame().unwrap();
    assert!(frame.base.fullscreen);
    assert_eq!(frame.base.layer, Layer::Normal);
}
