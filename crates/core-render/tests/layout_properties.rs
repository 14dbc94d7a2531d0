//! Property-based tests for size normalization and the recursive layout pass.

use core_model::{LayoutTemplate, Rect};
use core_render::layout::{LayoutFrame, render_layout};
use core_render::sizes::{allocate_cells, normalize_sizes};
use proptest::prelude::*;

fn size_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        (-50.0f64..200.0).prop_map(Some),
    ]
}

proptest! {
    // Normalized sizes always sum to 100 and respect a satisfiable minimum.
    #[test]
    fn normalized_sum_and_minimum(sizes in prop::collection::vec(size_strategy(), 1..8), min in 0.0f64..30.0) {
        let out = normalize_sizes(&sizes, min);
        prop_assert_eq!(out.len(), sizes.len());
        let total: f64 = out.iter().sum();
        prop_assert!((total - 100.0).abs() < 1e-6, "total {}", total);
        if min * (sizes.len() as f64) < 100.0 {
            for v in &out {
                prop_assert!(*v >= min - 1e-6, "{} < {}", v, min);
            }
        }
    }

    // Cell allocation is exact.
    #[test]
    fn allocation_is_exact(sizes in prop::collection::vec(1.0f64..100.0, 1..8), total in 0u16..500) {
        let cells = allocate_cells(&sizes, total);
        prop_assert_eq!(cells.iter().map(|c| u32::from(*c)).sum::<u32>(), u32::from(total));
    }

    // Every template tiles the viewport: panes plus gutters cover each cell once.
    #[test]
    fn panes_and_handles_tile_viewport(idx in 0usize..LayoutTemplate::ALL.len(), w in 8u16..160, h in 6u16..60) {
        let template = LayoutTemplate::ALL[idx];
        let mut frame = LayoutFrame::new();
        render_layout(&template.tree(), template.name(), Rect::viewport(w, h), 10.0, &mut frame);
        let mut covered = vec![0u8; w as usize * h as usize];
        let rects = frame
            .panes
            .iter()
            .map(|p| p.rect)
            .chain(frame.handles.iter().map(|h| h.rect));
        for r in rects {
            for y in r.y..r.y + r.height {
                for x in r.x..r.x + r.width {
                    covered[y as usize * w as usize + x as usize] += 1;
                }
            }
        }
        prop_assert!(covered.iter().all(|c| *c == 1));
    }
}
