// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The document channel: readiness, malformed input, call generations,
//! pointer input, and geometry queries.

mod common;

use common::{TestWidget, make_ready, ready_with_box, view, view_with};
use kurbo::Point;
use serde_json::json;
use understory_embed::{NativeSource, SizingPolicy};
use understory_embed_protocol::{MessageKind, PointerKind, ProtocolError};
use understory_embed_surface::{Damage, PixelFormat, PixelRect, PixelSize};

#[test]
fn only_script_loaded_gets_through_before_ready() {
    let mut view = view();
    let child = view.add_with_id(TestWidget::new(40, 30), "box").unwrap();
    view.realize();
    view.handle_message(
        "embed_children_move_resize",
        &json!([{ "id": "box", "x": 9, "y": 9, "width": 90, "height": 90 }]),
    )
    .unwrap();
    view.handle_message("embed_children_init", &json!(["box"])).unwrap();
    assert_eq!(view.allocation(child), Some(PixelRect::new(0, 0, 40, 30)));
    assert!(view.sink().batches.is_empty());

    make_ready(&mut view);
    assert!(view.is_ready());
    view.handle_message("embed_children_init", &json!(["box"])).unwrap();
    assert_eq!(view.sink().visibility("box"), [true]);
}

#[test]
fn malformed_messages_are_rejected_and_the_channel_survives() {
    let (mut view, child) = ready_with_box();
    assert_eq!(
        view.handle_message("embed_position", &json!([1, 2])),
        Err(ProtocolError::UnexpectedPayload {
            kind: MessageKind::Position,
            expected: "object",
        })
    );
    assert!(matches!(
        view.handle_message("embed_position", &json!({ "id": "box" })),
        Err(ProtocolError::Malformed { .. })
    ));
    assert!(matches!(
        view.handle_message("embed_nonsense", &json!({})),
        Err(ProtocolError::UnknownMessage(_))
    ));
    assert!(matches!(
        view.handle_message("embed_child_draw", &json!({})),
        Err(ProtocolError::UnknownMessage(_))
    ));
    assert!(matches!(
        view.handle_message("other_script_loaded", &json!({})),
        Err(ProtocolError::UnknownMessage(_))
    ));

    // Bad entries are skipped, the rest of the batch applies.
    view.handle_message(
        "embed_update_positions",
        &json!([[1, 2], { "id": "box" }, { "id": "box", "x": 4, "y": 5 }]),
    )
    .unwrap();
    assert_eq!(view.allocation(child), Some(PixelRect::new(4, 5, 40, 30)));
}

#[test]
fn navigation_cancels_everything_in_flight() {
    let (mut view, child) = ready_with_box();
    view.set_child_visible(child, false);
    let before = view.sink().last_ticket().unwrap();
    assert!(view.on_call_finished(before, Ok(())));

    view.load_started();
    assert!(!view.is_ready());
    assert!(!view.on_call_finished(before, Err("ReferenceError: embed is not defined")));

    // Inert until the new page loads its script.
    view.set_child_visible(child, true);
    assert_eq!(view.sink().batches.len(), 1);

    make_ready(&mut view);
    view.handle_message("embed_children_init", &json!(["box"])).unwrap();
    let after = view.sink().last_ticket().unwrap();
    assert_ne!(after.scope(), before.scope());
    assert!(view.on_call_finished(after, Ok(())));
}

#[test]
fn a_newer_resize_supersedes_the_older_one() {
    let mut view = view_with(SizingPolicy::NativeAuthoritative, PixelFormat::Rgba8);
    let child = view.add_with_id(TestWidget::new(40, 30), "box").unwrap();
    make_ready(&mut view);
    view.realize();
    let visible = view.sink().last_ticket().unwrap();

    view.with_widget_mut(child, |w| w.preferred = PixelSize::new(50, 50));
    view.size_allocate();
    let first = view.sink().last_ticket().unwrap();
    assert_eq!(first.child(), Some(child));

    view.with_widget_mut(child, |w| w.preferred = PixelSize::new(60, 60));
    view.size_allocate();
    let second = view.sink().last_ticket().unwrap();

    assert!(!view.on_call_finished(first, Ok(())));
    assert!(view.on_call_finished(second, Ok(())));
    // Container-wide calls are unaffected by a child's resize.
    assert!(view.on_call_finished(visible, Ok(())));
}

#[test]
fn removal_cancels_the_childs_calls() {
    let (mut view, child) = ready_with_box();
    view.damage(child, &Damage::full(PixelSize::new(40, 30))).unwrap();
    let draw = view.sink().last_ticket().unwrap();
    view.remove(child).unwrap();
    assert!(!view.on_call_finished(draw, Ok(())));
}

#[test]
fn pointer_events_reach_the_named_child() {
    let (mut view, child) = ready_with_box();
    view.handle_message(
        "embed_pointer:box",
        &json!({ "press": true, "button": 1, "time": 10, "state": 4, "x": 3, "y": 4.5 }),
    )
    .unwrap();
    view.handle_message("embed_pointer:box", &json!({ "x": 5, "y": 6 })).unwrap();
    view.handle_message("embed_pointer:box", &json!({ "enter": false, "x": 0, "y": 0 }))
        .unwrap();

    let events = &view.widget(child).unwrap().pointer;
    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, [PointerKind::Press, PointerKind::Motion, PointerKind::Leave]);
    assert_eq!(events[0].button, Some(1));
    assert_eq!(events[0].time, 10);
    assert_eq!(events[0].position, Point::new(3.0, 4.5));
    assert!(events[0].is_button());

    // Unknown children are ignored; a channel without an id is not a channel.
    view.handle_message("embed_pointer:ghost", &json!({ "x": 1, "y": 1 })).unwrap();
    assert!(view.handle_message("embed_pointer", &json!({ "x": 1, "y": 1 })).is_err());
    assert_eq!(view.widget(child).unwrap().pointer.len(), 3);
}

#[test]
fn native_clicks_from_own_surfaces_are_suppressed() {
    let (mut view, child) = ready_with_box();
    let surface = view.surface(child).unwrap();
    let own = NativeSource::Surface(surface);
    assert!(view.should_suppress_native(own, PointerKind::Press));
    assert!(view.should_suppress_native(own, PointerKind::Release));
    assert!(!view.should_suppress_native(own, PointerKind::Motion));
    assert!(!view.should_suppress_native(own, PointerKind::Enter));
    assert!(!view.should_suppress_native(NativeSource::Container, PointerKind::Press));

    view.unrealize();
    assert!(!view.should_suppress_native(own, PointerKind::Press));
}

#[test]
fn picking_and_translation_follow_reported_positions() {
    let (mut view, child) = ready_with_box();
    let top = view.add_with_id(TestWidget::new(8, 8), "top").unwrap();
    view.handle_message(
        "embed_update_positions",
        &json!([{ "id": "box", "x": 10, "y": 20 }, { "id": "top", "x": 12, "y": 22 }]),
    )
    .unwrap();

    assert_eq!(view.pick(Point::new(10.0, 20.0)), Some(child));
    assert_eq!(view.pick(Point::new(50.0, 50.0)), Some(child));
    assert_eq!(view.pick(Point::new(13.0, 23.0)), Some(top));
    assert_eq!(view.pick(Point::new(51.0, 20.0)), None);

    assert_eq!(view.to_container(child, Point::new(1.0, 1.0)), Point::new(11.0, 21.0));
    assert_eq!(view.from_container(child, Point::new(11.0, 21.0)), Point::new(1.0, 1.0));

    let order: Vec<_> = view.paint_order().into_iter().map(|(c, _, rect)| (c, rect)).collect();
    assert_eq!(
        order,
        [
            (child, PixelRect::new(10, 20, 40, 30)),
            (top, PixelRect::new(12, 22, 8, 8)),
        ]
    );
    assert_eq!(view.child_for_surface(view.surface(top).unwrap()), Some(top));
}

#[test]
fn translation_without_a_surface_uses_the_allocation() {
    let mut view = view();
    let child = view.add_with_id(TestWidget::new(4, 4), "box").unwrap();
    make_ready(&mut view);
    view.handle_message("embed_position", &json!({ "id": "box", "x": 7, "y": 3 })).unwrap();
    assert_eq!(view.surface(child), None);
    assert_eq!(view.to_container(child, Point::ZERO), Point::new(7.0, 3.0));
    assert_eq!(view.pick(Point::new(7.0, 3.0)), None);
}
