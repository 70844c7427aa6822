// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Realizing, unrealizing, and mirroring visibility onto elements.

mod common;

use common::{TestWidget, make_ready, ready_with_box, view};
use understory_embed_protocol::ScriptCall;
use understory_embed_surface::{OffscreenSurface, PixelRect, PixelSize};

#[test]
fn realize_creates_one_surface_and_announces_once() {
    let mut view = view();
    let child = view.add_with_id(TestWidget::new(40, 30), "box").unwrap();
    make_ready(&mut view);
    view.realize();

    assert_eq!(view.backend().created(), 1);
    assert_eq!(view.surface_mut(child).unwrap().size(), PixelSize::new(40, 30));
    assert_eq!(view.allocation(child), Some(PixelRect::new(0, 0, 40, 30)));
    assert_eq!(view.sink().calls(), [ScriptCall::set_visible("box", true)]);

    // Realizing twice changes nothing.
    view.realize();
    assert_eq!(view.backend().created(), 1);
    assert_eq!(view.sink().batches.len(), 1);
}

#[test]
fn hidden_children_get_a_surface_but_no_announcement() {
    let mut view = view();
    let child = view.add_with_id(TestWidget::new(40, 30).hidden(), "box").unwrap();
    make_ready(&mut view);
    view.realize();
    assert!(view.surface(child).is_some());
    assert!(view.sink().batches.is_empty());
}

#[test]
fn nothing_is_announced_before_the_document_is_ready() {
    let mut view = view();
    view.add_with_id(TestWidget::new(40, 30), "box").unwrap();
    view.realize();
    assert_eq!(view.backend().created(), 1);
    assert!(view.sink().batches.is_empty());
}

#[test]
fn each_toggle_sends_exactly_one_call() {
    let (mut view, child) = ready_with_box();
    view.set_child_visible(child, false);
    view.set_child_visible(child, false);
    view.set_child_visible(child, true);
    assert_eq!(view.sink().visibility("box"), [false, true]);
    assert_eq!(view.sink().batches.len(), 2);
}

#[test]
fn changes_made_through_the_widget_are_mirrored() {
    let (mut view, child) = ready_with_box();
    view.with_widget_mut(child, |w| w.visible = false);
    assert_eq!(view.sink().visibility("box"), [false]);

    view.with_widget_mut(child, |w| w.visible = true);
    // Nothing changed since the last mirror.
    view.notify_visibility_changed(child);
    assert_eq!(view.sink().visibility("box"), [false, true]);
}

#[test]
fn toggles_while_not_ready_are_silent() {
    let mut view = view();
    let child = view.add_with_id(TestWidget::new(40, 30), "box").unwrap();
    view.realize();
    view.set_child_visible(child, false);
    view.set_child_visible(child, true);
    assert!(view.sink().batches.is_empty());
    assert!(view.widget(child).unwrap().visible);
}

#[test]
fn unidentified_children_are_never_mirrored() {
    let mut view = view();
    make_ready(&mut view);
    let child = view.add(TestWidget::new(4, 4)).unwrap();
    view.realize();
    view.set_child_visible(child, false);
    assert!(view.sink().batches.is_empty());
}

#[test]
fn unrealize_hides_elements_and_destroys_surfaces() {
    let (mut view, child) = ready_with_box();
    view.unrealize();
    assert_eq!(view.sink().visibility("box"), [false]);
    assert_eq!(view.surface(child), None);
    assert_eq!(view.backend().destroyed(), 1);
    assert!(!view.is_realized());

    view.realize();
    assert!(view.surface(child).is_some());
    assert_eq!(view.sink().visibility("box"), [false, true]);
    assert_eq!(view.backend().created(), 2);
}

#[test]
fn adding_to_a_realized_view_surfaces_immediately() {
    let (mut view, _) = ready_with_box();
    let second = view.add_with_id(TestWidget::new(8, 8), "second").unwrap();
    assert!(view.surface(second).is_some());
    assert_eq!(view.sink().visibility("second"), [true]);
    assert_eq!(view.backend().created(), 2);
}

#[test]
fn realize_uses_the_current_preferred_size() {
    let mut view = view();
    let child = view.add_with_id(TestWidget::new(40, 30), "box").unwrap();
    make_ready(&mut view);
    view.size_allocate();
    assert_eq!(view.allocation(child), Some(PixelRect::new(0, 0, 40, 30)));

    view.with_widget_mut(child, |w| w.preferred = PixelSize::new(60, 50));
    view.realize();
    assert_eq!(view.surface_mut(child).unwrap().size(), PixelSize::new(60, 50));
    assert_eq!(view.allocation(child), Some(PixelRect::new(0, 0, 60, 50)));
    assert_eq!(view.widget(child).unwrap().allocated.last(), Some(&PixelSize::new(60, 50)));
}
