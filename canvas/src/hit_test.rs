#![allow(clippy::float_cmp)]

use super::*;
use crate::elements::MediaType;

fn store_with(elements: &[(f64, f64, f64, f64)]) -> (ElementStore, Vec<ElementId>) {
    let mut store = ElementStore::new();
    let ids = elements
        .iter()
        .map(|&(x, y, w, h)| store.add(CanvasElement::new(MediaType::Image, "u", x, y, w, h), false))
        .collect();
    (store, ids)
}

// =============================================================
// ResizeHandle
// =============================================================

#[test]
fn resize_handle_all_variants_distinct() {
    for (i, a) in ResizeHandle::ALL.iter().enumerate() {
        for (j, b) in ResizeHandle::ALL.iter().enumerate() {
            assert_eq!(i == j, a == b);
        }
    }
}

#[test]
fn corner_handles_move_two_edges_and_edge_handles_one() {
    for h in ResizeHandle::ALL {
        let edges = [h.moves_left(), h.moves_right(), h.moves_top(), h.moves_bottom()]
            .iter()
            .filter(|m| **m)
            .count();
        let (fx, fy) = h.anchor();
        let is_corner = (fx == 0.0 || fx == 1.0) && (fy == 0.0 || fy == 1.0);
        assert_eq!(edges, if is_corner { 2 } else { 1 }, "{h:?}");
    }
}

#[test]
fn handle_cursor_names() {
    assert_eq!(ResizeHandle::Top.cursor(), "ns-resize");
    assert_eq!(ResizeHandle::Left.cursor(), "ew-resize");
    assert_eq!(ResizeHandle::BottomRight.cursor(), "nwse-resize");
    assert_eq!(ResizeHandle::TopRight.cursor(), "nesw-resize");
}

#[test]
fn handle_position_uses_anchor_fractions() {
    let el = CanvasElement::new(MediaType::Image, "u", 10.0, 20.0, 100.0, 50.0);
    assert_eq!(handle_position(&el, ResizeHandle::TopLeft), Point::new(10.0, 20.0));
    assert_eq!(handle_position(&el, ResizeHandle::Right), Point::new(110.0, 45.0));
    assert_eq!(handle_position(&el, ResizeHandle::Bottom), Point::new(60.0, 70.0));
}

// =============================================================
// hit_test
// =============================================================

#[test]
fn empty_store_hits_nothing() {
    let store = ElementStore::new();
    assert!(hit_test(Point::new(0.0, 0.0), &store, &Viewport::default()).is_none());
}

#[test]
fn body_hit_returns_element() {
    let (store, ids) = store_with(&[(0.0, 0.0, 100.0, 100.0)]);
    let hit = hit_test(Point::new(50.0, 50.0), &store, &Viewport::default()).unwrap();
    assert_eq!(hit, Hit { element_id: ids[0], part: HitPart::Body });
}

#[test]
fn topmost_element_wins() {
    let (store, ids) = store_with(&[(0.0, 0.0, 100.0, 100.0), (50.0, 50.0, 100.0, 100.0)]);
    let hit = hit_test(Point::new(75.0, 75.0), &store, &Viewport::default()).unwrap();
    assert_eq!(hit.element_id, ids[1]);
}

#[test]
fn handles_ignored_when_not_selected() {
    let (store, ids) = store_with(&[(0.0, 0.0, 100.0, 100.0)]);
    let hit = hit_test(Point::new(100.0, 100.0), &store, &Viewport::default()).unwrap();
    assert_eq!(hit, Hit { element_id: ids[0], part: HitPart::Body });
    assert!(hit_test(Point::new(104.0, 104.0), &store, &Viewport::default()).is_none());
}

#[test]
fn selected_handle_hit_within_radius() {
    let (mut store, ids) = store_with(&[(0.0, 0.0, 100.0, 100.0)]);
    store.select(Some(ids[0]));
    let hit = hit_test(Point::new(104.0, 104.0), &store, &Viewport::default()).unwrap();
    assert_eq!(hit.part, HitPart::ResizeHandle(ResizeHandle::BottomRight));
    let hit = hit_test(Point::new(-3.0, 50.0), &store, &Viewport::default()).unwrap();
    assert_eq!(hit.part, HitPart::ResizeHandle(ResizeHandle::Left));
}

#[test]
fn handle_radius_shrinks_in_world_when_zoomed_in() {
    let (mut store, ids) = store_with(&[(0.0, 0.0, 100.0, 100.0)]);
    store.select(Some(ids[0]));
    let zoomed = Viewport::new(Point::default(), 4.0);
    // 6 world units = 24 screen px at 4x, beyond the 8px slop.
    assert!(hit_test(Point::new(106.0, 106.0), &store, &zoomed).is_none());
    let hit = hit_test(Point::new(101.0, 101.0), &store, &zoomed).unwrap();
    assert_eq!(hit.part, HitPart::ResizeHandle(ResizeHandle::BottomRight));
}

#[test]
fn selected_controls_beat_overlapping_body() {
    let (mut store, ids) = store_with(&[(0.0, 0.0, 100.0, 100.0), (95.0, 95.0, 100.0, 100.0)]);
    store.select(Some(ids[0]));
    let hit = hit_test(Point::new(100.0, 100.0), &store, &Viewport::default()).unwrap();
    assert_eq!(hit, Hit { element_id: ids[0], part: HitPart::ResizeHandle(ResizeHandle::BottomRight) });
}

#[test]
fn delete_control_hit_on_selected() {
    let (mut store, ids) = store_with(&[(0.0, 0.0, 100.0, 100.0)]);
    store.select(Some(ids[0]));
    let vp = Viewport::default();
    let center = delete_control_position(store.get(&ids[0]).unwrap(), &vp);
    assert_eq!(center, Point::new(114.0, -14.0));
    let hit = hit_test(center, &store, &vp).unwrap();
    assert_eq!(hit.part, HitPart::DeleteControl);
}
