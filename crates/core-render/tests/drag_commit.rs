//! Drag bursts against a real store: intermediate frames stay render-only,
//! and only the quiesced value is persisted.

use core_model::{LayoutTemplate, Rect};
use core_render::{DragSession, LayoutFrame, ResizeDebouncer, render_layout};
use core_state::{LayoutStore, MemoryStorage};
use std::time::{Duration, Instant};

fn grid_handle(tree: &core_model::LayoutNode, group: &str) -> core_render::HandleRegion {
    let mut frame = LayoutFrame::new();
    render_layout(tree, "grid-4", Rect::viewport(100, 41), 10.0, &mut frame);
    frame
        .handles
        .into_iter()
        .find(|h| h.group_id == group)
        .expect("handle")
}

#[test]
fn rapid_drag_commits_once_with_final_value() {
    let storage = MemoryStorage::new();
    let mut store = LayoutStore::hydrate(Box::new(storage.clone()));
    let writes_before = storage.write_count();
    let mut debouncer = ResizeDebouncer::new(Duration::from_millis(300));

    let tree = store.resolve_active_tree("grid-4");
    let handle = grid_handle(&tree, "g4-left-group");
    let y = handle.rect.y;
    let drag = DragSession::begin(handle, 10, y, 10.0);

    let t0 = Instant::now();
    for i in 0..10u16 {
        let now = t0 + Duration::from_millis(u64::from(i) * 20);
        debouncer.record(now, drag.layout_name(), drag.group_id(), drag.sizes_at(10, y - i));
        debouncer.poll_expired(now, &mut store);
    }
    let last = t0 + Duration::from_millis(220);
    let final_sizes = drag.sizes_at(10, y - 12);
    debouncer.record(last, drag.layout_name(), drag.group_id(), final_sizes.clone());

    // intermediate values visible only through the preview
    let preview = debouncer.preview("grid-4", &store.resolve_active_tree("grid-4"));
    assert_eq!(
        preview.find_group("g4-left-group").unwrap().children()[0].default_size(),
        final_sizes.get("g4-0").copied()
    );
    assert!(!store.is_customized("grid-4"));
    assert_eq!(storage.write_count(), writes_before);

    assert_eq!(debouncer.poll_expired(last + Duration::from_millis(400), &mut store), 1);
    assert_eq!(storage.write_count(), writes_before + 1);
    let stored = store.resolve_active_tree("grid-4");
    let left = stored.find_group("g4-left-group").unwrap();
    assert_eq!(left.children()[0].default_size(), final_sizes.get("g4-0").copied());
    assert_eq!(left.children()[1].default_size(), final_sizes.get("g4-1").copied());
    // sibling subtree untouched
    assert_eq!(
        stored.find_group("g4-right-group"),
        LayoutTemplate::Grid4.tree().find_group("g4-right-group")
    );
}

#[test]
fn pending_resize_for_removed_group_is_dropped() {
    let mut store = LayoutStore::in_memory();
    let mut debouncer = ResizeDebouncer::new(Duration::from_millis(300));
    let t0 = Instant::now();
    debouncer.record(
        t0,
        "grid-4",
        "nonexistent-id",
        [("a".to_string(), 40.0)].into_iter().collect(),
    );
    debouncer.flush_all(&mut store);
    assert!(!store.is_customized("grid-4"));
    assert_eq!(debouncer.metrics().dropped_stale, 1);
}
