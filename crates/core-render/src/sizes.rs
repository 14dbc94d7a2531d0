//! Pane size normalization and cell allocation.
//!
//! Persisted `defaultSize` values are percentages but nothing guarantees they
//! sum to 100 (hand-edited state, templates with omitted sizes, rounding from
//! drags). Every render normalizes them first so panes always tile the group
//! exactly.

/// Normalize a group's child sizes to percentages summing to 100.
///
/// * Missing, non-finite, or non-positive entries split whatever the known
///   entries leave over (or an equal share when nothing is left).
/// * A non-positive total degrades to an equal split.
/// * Every entry ends at or above `min_pct`; when `n * min_pct` cannot fit in
///   100 the split is equal.
pub fn normalize_sizes(sizes: &[Option<f64>], min_pct: f64) -> Vec<f64> {
    let n = sizes.len();
    if n == 0 {
        return Vec::new();
    }
    let equal = 100.0 / n as f64;
    let min_pct = if min_pct.is_finite() { min_pct.max(0.0) } else { 0.0 };
    if min_pct * n as f64 >= 100.0 {
        return vec![equal; n];
    }

    let known: f64 = sizes.iter().filter_map(|s| valid(*s)).sum();
    let missing = sizes.iter().filter(|s| valid(**s).is_none()).count();
    let fill = if missing == 0 {
        0.0
    } else if known < 100.0 {
        (100.0 - known) / missing as f64
    } else {
        equal
    };
    let raw: Vec<f64> = sizes.iter().map(|s| valid(*s).unwrap_or(fill)).collect();
    let total: f64 = raw.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return vec![equal; n];
    }
    let mut out: Vec<f64> = raw.iter().map(|v| v * 100.0 / total).collect();

    // Pin entries under the minimum, then rescale the free ones into what is
    // left. Each pass pins at least one more entry or terminates.
    let mut pinned = vec![false; n];
    loop {
        let mut changed = false;
        for (i, v) in out.iter().enumerate() {
            if !pinned[i] && *v < min_pct {
                pinned[i] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        let pinned_count = pinned.iter().filter(|p| **p).count();
        let free_budget = 100.0 - min_pct * pinned_count as f64;
        let free_total: f64 = out
            .iter()
            .zip(&pinned)
            .filter(|(_, p)| !**p)
            .map(|(v, _)| *v)
            .sum();
        for (v, p) in out.iter_mut().zip(&pinned) {
            if *p {
                *v = min_pct;
            } else if free_total > 0.0 {
                *v = *v * free_budget / free_total;
            }
        }
    }
    out
}

fn valid(size: Option<f64>) -> Option<f64> {
    size.filter(|v| v.is_finite() && *v > 0.0)
}

/// Split `total` cells proportionally to `pcts` using largest remainder, so
/// the parts always sum to exactly `total`. Ties go to the earlier child.
pub fn allocate_cells(pcts: &[f64], total: u16) -> Vec<u16> {
    if pcts.is_empty() {
        return Vec::new();
    }
    let sum: f64 = pcts.iter().sum();
    let sum = if sum > 0.0 { sum } else { 1.0 };
    let quotas: Vec<f64> = pcts
        .iter()
        .map(|p| p / sum * f64::from(total))
        .collect();
    let mut cells: Vec<u16> = quotas.iter().map(|q| q.floor() as u16).collect();
    let assigned: u32 = cells.iter().map(|c| u32::from(*c)).sum();
    let mut remaining = u32::from(total).saturating_sub(assigned);

    let mut order: Vec<usize> = (0..pcts.len()).collect();
    order.sort_by(|a, b| {
        let fa = quotas[*a] - quotas[*a].floor();
        let fb = quotas[*b] - quotas[*b].floor();
        fb.total_cmp(&fa).then(a.cmp(b))
    });
    for i in order.into_iter().cycle() {
        if remaining == 0 {
            break;
        }
        cells[i] += 1;
        remaining -= 1;
    }
    cells
}
