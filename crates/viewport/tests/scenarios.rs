use foundation::geo::LngLat;
use foundation::ids::MarkerId;
use pretty_assertions::assert_eq;
use runtime::frame::Frame;
use viewport::sim::{SimCall, SimRenderer};
use viewport::{
    CameraOptions, MapViewport, Marker, Selection, TransitionTag, ViewportCallbacks,
    ViewportConfig, ViewportProps,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cb {
    Highlight(Option<String>),
    OpenDetail(String),
    FocusConsumed(String),
}

#[derive(Debug, Default)]
struct Recorder(Vec<Cb>);

impl ViewportCallbacks for Recorder {
    fn on_highlight(&mut self, id: Option<&MarkerId>) {
        self.0.push(Cb::Highlight(id.map(|id| id.to_string())));
    }
    fn on_open_detail(&mut self, id: &MarkerId) {
        self.0.push(Cb::OpenDetail(id.to_string()));
    }
    fn on_focus_consumed(&mut self, id: &MarkerId) {
        self.0.push(Cb::FocusConsumed(id.to_string()));
    }
}

type View = MapViewport<SimRenderer, Recorder>;

fn markers() -> Vec<Marker> {
    vec![
        Marker::new("1", 51.924, 4.475),
        Marker::new("2", 51.925, 4.478),
    ]
}

fn props(highlighted: Option<&str>, focus: Option<&str>, header: f64) -> ViewportProps {
    ViewportProps {
        markers: markers(),
        selection: Selection {
            highlighted_id: highlighted.map(MarkerId::from),
            focus_id: focus.map(MarkerId::from),
            detail_id: None,
        },
        header_height_px: header,
    }
}

fn loaded_view() -> View {
    let mut view = MapViewport::new(
        SimRenderer::new(),
        ViewportConfig::default(),
        Recorder::default(),
    );
    view.on_load();
    view
}

fn eases(view: &View) -> Vec<CameraOptions> {
    view.map()
        .calls()
        .iter()
        .filter_map(|c| match c {
            SimCall::EaseTo(options) => Some(*options),
            _ => None,
        })
        .collect()
}

fn consumed(view: &View) -> usize {
    view.callbacks()
        .0
        .iter()
        .filter(|c| matches!(c, Cb::FocusConsumed(_)))
        .count()
}

fn finish(view: &mut View) {
    let tag = view.map_mut().finish_animation();
    view.on_move_end(tag);
}

#[test]
fn focus_with_header_animates_once_then_highlights_and_consumes() {
    let mut view = loaded_view();
    view.render(props(None, Some("1"), 64.0));

    let issued = eases(&view);
    assert_eq!(issued.len(), 1);
    assert!(issued[0].padding.top >= 64.0 + 0.1 * 800.0);
    assert_eq!(issued[0].center, LngLat::new(4.475, 51.924));
    assert!(issued[0].duration.0 >= 450);
    assert!(view.callbacks().0.is_empty());

    finish(&mut view);
    assert_eq!(
        view.callbacks().0,
        vec![
            Cb::Highlight(Some("1".to_string())),
            Cb::FocusConsumed("1".to_string()),
        ]
    );
    assert!(view.map().popup_visible());

    // Upstream echoes the highlight and clears the focus; re-renders repeat.
    for _ in 0..3 {
        view.render(props(Some("1"), None, 64.0));
    }
    assert_eq!(eases(&view).len(), 1);
    assert_eq!(view.callbacks().0.len(), 2);
}

#[test]
fn stale_focus_id_on_rerender_does_not_retrigger() {
    let mut view = loaded_view();
    view.render(props(None, Some("1"), 0.0));
    finish(&mut view);

    // Host has not cleared focus yet.
    view.render(props(Some("1"), Some("1"), 0.0));
    view.render(props(Some("1"), Some("1"), 0.0));
    assert_eq!(eases(&view).len(), 1);
    assert_eq!(consumed(&view), 1);
}

#[test]
fn toggling_highlight_reuses_one_popup() {
    let mut view = loaded_view();
    let mut visible = Vec::new();
    for highlighted in [Some("1"), None, Some("1")] {
        view.render(props(highlighted, None, 0.0));
        visible.push(view.map().popup_visible());
    }
    assert_eq!(visible, vec![true, false, true]);
    assert_eq!(view.map().popups_created(), 1);
    assert_eq!(view.metrics().counter("popup.constructed"), 1);
    assert!(eases(&view).is_empty());
}

#[test]
fn focusing_near_target_keeps_higher_zoom() {
    let mut view = loaded_view();
    view.map_mut().jump_to(LngLat::new(4.476, 51.9245), 16.5);
    view.render(props(None, Some("1"), 0.0));

    let issued = eases(&view);
    assert_eq!(issued.len(), 1);
    assert!(issued[0].zoom >= 16.5);
}

#[test]
fn focus_before_load_is_replayed_once_loaded() {
    let mut early = MapViewport::new(
        SimRenderer::new(),
        ViewportConfig::default(),
        Recorder::default(),
    );
    early.render(props(None, Some("1"), 64.0));
    assert!(eases(&early).is_empty());
    assert_eq!(consumed(&early), 0);

    early.on_load();
    early.render(props(None, Some("1"), 64.0));

    let mut late = loaded_view();
    late.render(props(None, Some("1"), 64.0));

    assert_eq!(eases(&early), eases(&late));
    assert_eq!(eases(&early).len(), 1);
}

#[test]
fn invalid_coordinates_consume_without_side_effects() {
    let mut view = loaded_view();
    let mut p = props(None, Some("bad"), 0.0);
    p.markers.push(Marker::new("bad", f64::NAN, 4.475));

    view.render(p.clone());
    view.render(p.clone());
    p.selection.highlighted_id = Some(MarkerId::new("bad"));
    view.render(p);

    assert!(eases(&view).is_empty());
    assert!(!view.map().popup_visible());
    assert_eq!(view.map().popups_created(), 0);
    assert_eq!(
        view.callbacks().0,
        vec![Cb::FocusConsumed("bad".to_string())]
    );
}

#[test]
fn newer_focus_supersedes_running_transition() {
    let mut view = loaded_view();
    view.render(props(None, Some("1"), 0.0));
    view.render(props(None, Some("2"), 0.0));
    assert_eq!(eases(&view).len(), 2);

    // The interrupted transition reports its end late; nothing happens.
    view.on_move_end(Some(TransitionTag(0)));
    assert_eq!(
        view.callbacks().0,
        vec![Cb::FocusConsumed("1".to_string())]
    );

    finish(&mut view);
    assert_eq!(
        view.callbacks().0,
        vec![
            Cb::FocusConsumed("1".to_string()),
            Cb::Highlight(Some("2".to_string())),
            Cb::FocusConsumed("2".to_string()),
        ]
    );
    assert_eq!(view.highlight(), Some(&MarkerId::new("2")));
}

#[test]
fn user_gesture_move_end_does_not_settle_focus() {
    let mut view = loaded_view();
    view.render(props(None, Some("1"), 0.0));
    view.on_move_end(None);
    assert!(view.callbacks().0.is_empty());
}

#[test]
fn style_reload_reattaches_exactly_once() {
    let mut view = loaded_view();
    view.render(props(None, None, 0.0));
    view.render(props(None, None, 0.0));

    view.map_mut().reload_style();
    view.on_style_load();
    view.render(props(None, None, 0.0));
    view.on_idle();

    let add_sources = view
        .map()
        .calls()
        .iter()
        .filter(|c| matches!(c, SimCall::AddSource(_)))
        .count();
    assert_eq!(add_sources, 2);
    assert_eq!(view.metrics().counter("style.attachments"), 2);
    assert_eq!(view.map().source_len("markers"), Some(2));
}

#[test]
fn focus_waits_for_style_readiness() {
    let mut view = MapViewport::new(
        SimRenderer::new(),
        ViewportConfig::default(),
        Recorder::default(),
    );
    view.map_mut().set_style_loaded(false);
    view.on_load();
    view.render(props(None, Some("1"), 0.0));
    assert!(view.map().calls().is_empty());

    view.map_mut().set_style_loaded(true);
    view.on_idle();
    assert_eq!(eases(&view).len(), 1);
}

#[test]
fn focus_waits_for_marker_data() {
    let mut view = loaded_view();
    let mut empty = props(None, Some("2"), 0.0);
    empty.markers.clear();
    view.render(empty);
    assert!(eases(&view).is_empty());

    view.render(props(None, Some("2"), 0.0));
    let issued = eases(&view);
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0].center, LngLat::new(4.478, 51.925));
}

#[test]
fn unknown_focus_target_is_consumed() {
    let mut view = loaded_view();
    view.render(props(None, Some("404"), 0.0));
    assert!(eases(&view).is_empty());
    assert_eq!(
        view.callbacks().0,
        vec![Cb::FocusConsumed("404".to_string())]
    );
}

#[test]
fn popup_waits_for_content_node() {
    let mut view = loaded_view();
    view.map_mut().set_popup_node_ready(false);
    view.render(props(Some("1"), None, 0.0));
    assert!(!view.map().popup_visible());

    view.on_frame(Frame::first());
    assert!(!view.map().popup_visible());

    view.map_mut().set_popup_node_ready(true);
    view.on_frame(Frame::first().next(16.0));
    assert!(view.map().popup_visible());
    assert!(view.map().popup_anchor().is_some());
    assert_eq!(view.map().popups_created(), 1);
}

#[test]
fn stale_anchor_retry_is_dropped() {
    let mut view = loaded_view();
    view.map_mut().set_popup_node_ready(false);
    view.render(props(Some("1"), None, 0.0));
    view.render(props(None, None, 0.0));

    view.map_mut().set_popup_node_ready(true);
    view.on_frame(Frame::first());
    assert!(!view.map().popup_visible());
}

#[test]
fn unmount_defers_popup_removal() {
    let mut view = loaded_view();
    view.render(props(Some("1"), Some("2"), 0.0));
    assert!(view.map().popup_visible());

    view.unmount();
    assert_eq!(view.map().popups_alive(), 1);
    assert!(!view.is_torn_down());

    // Late renderer events and renders are ignored.
    finish(&mut view);
    view.render(props(Some("2"), None, 0.0));
    assert!(view.callbacks().0.is_empty());

    view.on_frame(Frame::first());
    assert_eq!(view.map().popups_alive(), 0);
    assert!(view.is_torn_down());
    assert_eq!(view.metrics().counter("popup.removed"), 1);
}

#[test]
fn clicks_drive_highlight_and_detail() {
    let mut view = loaded_view();
    view.render(props(None, None, 0.0));

    view.on_marker_click(&MarkerId::new("2"));
    assert!(view.map().popup_visible());
    assert_eq!(view.map().popup_position(), Some(LngLat::new(4.478, 51.925)));

    view.on_popup_click();
    view.on_popup_closed();
    view.on_map_click();

    assert_eq!(
        view.callbacks().0,
        vec![
            Cb::Highlight(Some("2".to_string())),
            Cb::OpenDetail("2".to_string()),
            Cb::Highlight(None),
        ]
    );
    assert!(view.highlight().is_none());
    assert_eq!(view.map().popups_created(), 1);
}

#[test]
fn settled_highlight_survives_stale_render() {
    let mut view = loaded_view();
    view.render(props(None, Some("1"), 0.0));
    finish(&mut view);

    // Upstream has not processed on_highlight yet.
    view.render(props(None, None, 0.0));
    assert!(view.map().popup_visible());
    assert_eq!(view.highlight(), Some(&MarkerId::new("1")));
}

#[test]
fn focus_during_style_reload_supersedes_running_transition() {
    let mut view = loaded_view();
    view.render(props(None, Some("1"), 0.0));
    assert_eq!(eases(&view).len(), 1);

    view.map_mut().reload_style();
    view.map_mut().set_style_loaded(false);
    view.on_style_load();
    view.render(props(None, Some("2"), 0.0));

    // The first animation still completes on the renderer side.
    finish(&mut view);
    assert_eq!(
        view.callbacks().0,
        vec![Cb::FocusConsumed("1".to_string())]
    );
    assert!(view.highlight().is_none());

    view.map_mut().set_style_loaded(true);
    view.on_idle();
    let issued = eases(&view);
    assert_eq!(issued.len(), 2);
    assert_eq!(issued[1].center, LngLat::new(4.478, 51.925));

    finish(&mut view);
    assert_eq!(
        view.callbacks().0,
        vec![
            Cb::FocusConsumed("1".to_string()),
            Cb::Highlight(Some("2".to_string())),
            Cb::FocusConsumed("2".to_string()),
        ]
    );
    assert_eq!(view.highlight(), Some(&MarkerId::new("2")));
}

#[test]
fn refocus_on_framed_target_settles_without_animating() {
    let mut view = loaded_view();
    view.render(props(None, Some("1"), 0.0));
    finish(&mut view);
    view.render(props(Some("1"), None, 0.0));
    let before = view.callbacks().0.len();

    view.render(props(Some("1"), Some("1"), 0.0));

    assert_eq!(eases(&view).len(), 1);
    assert_eq!(view.metrics().counter("camera.skipped"), 1);
    assert_eq!(
        view.callbacks().0[before..].to_vec(),
        vec![
            Cb::Highlight(Some("1".to_string())),
            Cb::FocusConsumed("1".to_string()),
        ]
    );
    assert!(view.map().popup_visible());
}

#[test]
fn refocus_while_camera_moving_animates() {
    let mut view = loaded_view();
    view.render(props(None, Some("1"), 0.0));
    finish(&mut view);
    view.render(props(Some("1"), None, 0.0));

    view.map_mut().set_moving(true);
    view.render(props(Some("1"), Some("1"), 0.0));

    assert_eq!(eases(&view).len(), 2);
    assert_eq!(view.metrics().counter("camera.skipped"), 0);
    assert_eq!(consumed(&view), 1);

    finish(&mut view);
    assert_eq!(consumed(&view), 2);
}
