//! Row traversal patterns.
//!
//! Each pattern maps a block of `n` rows (index 0 nearest the entry
//! corner) to the order they are worked in. Every function returns a
//! permutation of `0..n`.

use crate::settings::{CenterSettings, Corner, RowPattern};

/// Works every `skip + 1`-th row, then returns for the skipped ones in
/// alternating passes until all rows are covered.
pub fn up_down_order(n: usize, skip: usize, leave_skipped_unworked: bool) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let stride = skip + 1;
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    let mut i = 0;
    while i < n {
        visited[i] = true;
        order.push(i);
        i += stride;
    }
    if leave_skipped_unworked {
        return order;
    }

    let mut upward = false;
    while order.len() < n {
        if upward {
            let Some(start) = (0..n).find(|&j| !visited[j]) else {
                break;
            };
            let mut i = start;
            while i < n {
                if !visited[i] {
                    visited[i] = true;
                    order.push(i);
                }
                i += stride;
            }
        } else {
            let Some(start) = (0..n).rev().find(|&j| !visited[j]) else {
                break;
            };
            let mut i = start as isize;
            while i >= 0 {
                if !visited[i as usize] {
                    visited[i as usize] = true;
                    order.push(i as usize);
                }
                i -= stride as isize;
            }
        }
        upward = !upward;
    }
    order
}

/// Outside-in interleave: first row, last row, second row, second to
/// last, ... ending in the middle.
pub fn spiral_order(n: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(n);
    if n == 0 {
        return order;
    }
    let mut lo = 0;
    let mut hi = n - 1;
    loop {
        order.push(lo);
        if lo == hi {
            break;
        }
        order.push(hi);
        lo += 1;
        if lo > hi - 1 {
            break;
        }
        hi -= 1;
    }
    order
}

/// Wide circular loops: skip back `k` rows, skip forward `k + 1`, and
/// shrink `k` whenever the next target is taken or out of range; once
/// `k` reaches zero the remaining rows are filled in ascending order.
pub fn circular_order(n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    let mut k = 4usize;
    if k >= n {
        k = n / 2;
    }
    let mut cur = if k < n { k } else { 0 };
    visited[cur] = true;
    order.push(cur);

    let mut skip_back = true;
    while order.len() < n {
        if k == 0 {
            let mut i = (cur + 1) % n;
            while order.len() < n {
                if !visited[i] {
                    visited[i] = true;
                    order.push(i);
                }
                i = (i + 1) % n;
            }
            break;
        }
        let target = if skip_back {
            cur.checked_sub(k)
        } else {
            let t = cur + k + 1;
            (t < n).then_some(t)
        };
        match target {
            Some(t) if !visited[t] => {
                visited[t] = true;
                order.push(t);
                cur = t;
                skip_back = !skip_back;
            }
            _ => {
                // dead end: shrink the loop, strictly, so this terminates
                let next_k = (n - order.len()) / 2;
                k = if next_k < k { next_k } else { k - 1 };
            }
        }
    }
    order
}

/// Counterclockwise lands permutations for land sizes 1..=24 (row 0 is
/// the first row of the land). Each entry works outward from the center
/// row so the unloading pipe always points to already-worked ground.
const LANDS_COUNTERCLOCKWISE: [&[usize]; 24] = [
    &[0],
    &[1, 0],
    &[1, 2, 0],
    &[2, 3, 1, 0],
    &[2, 3, 1, 4, 0],
    &[3, 4, 2, 5, 1, 0],
    &[3, 4, 2, 5, 1, 6, 0],
    &[4, 5, 3, 6, 2, 7, 1, 0],
    &[4, 5, 3, 6, 2, 7, 1, 8, 0],
    &[5, 6, 4, 7, 3, 8, 2, 9, 1, 0],
    &[5, 6, 4, 7, 3, 8, 2, 9, 1, 10, 0],
    &[6, 7, 5, 8, 4, 9, 3, 10, 2, 11, 1, 0],
    &[6, 7, 5, 8, 4, 9, 3, 10, 2, 11, 1, 12, 0],
    &[7, 8, 6, 9, 5, 10, 4, 11, 3, 12, 2, 13, 1, 0],
    &[7, 8, 6, 9, 5, 10, 4, 11, 3, 12, 2, 13, 1, 14, 0],
    &[8, 9, 7, 10, 6, 11, 5, 12, 4, 13, 3, 14, 2, 15, 1, 0],
    &[8, 9, 7, 10, 6, 11, 5, 12, 4, 13, 3, 14, 2, 15, 1, 16, 0],
    &[9, 10, 8, 11, 7, 12, 6, 13, 5, 14, 4, 15, 3, 16, 2, 17, 1, 0],
    &[9, 10, 8, 11, 7, 12, 6, 13, 5, 14, 4, 15, 3, 16, 2, 17, 1, 18, 0],
    &[10, 11, 9, 12, 8, 13, 7, 14, 6, 15, 5, 16, 4, 17, 3, 18, 2, 19, 1, 0],
    &[10, 11, 9, 12, 8, 13, 7, 14, 6, 15, 5, 16, 4, 17, 3, 18, 2, 19, 1, 20, 0],
    &[11, 12, 10, 13, 9, 14, 8, 15, 7, 16, 6, 17, 5, 18, 4, 19, 3, 20, 2, 21, 1, 0],
    &[11, 12, 10, 13, 9, 14, 8, 15, 7, 16, 6, 17, 5, 18, 4, 19, 3, 20, 2, 21, 1, 22, 0],
    &[12, 13, 11, 14, 10, 15, 9, 16, 8, 17, 7, 18, 6, 19, 5, 20, 4, 21, 3, 22, 2, 23, 1, 0],
];

/// Clockwise mirror of [`LANDS_COUNTERCLOCKWISE`].
const LANDS_CLOCKWISE: [&[usize]; 24] = [
    &[0],
    &[0, 1],
    &[1, 0, 2],
    &[1, 0, 2, 3],
    &[2, 1, 3, 0, 4],
    &[2, 1, 3, 0, 4, 5],
    &[3, 2, 4, 1, 5, 0, 6],
    &[3, 2, 4, 1, 5, 0, 6, 7],
    &[4, 3, 5, 2, 6, 1, 7, 0, 8],
    &[4, 3, 5, 2, 6, 1, 7, 0, 8, 9],
    &[5, 4, 6, 3, 7, 2, 8, 1, 9, 0, 10],
    &[5, 4, 6, 3, 7, 2, 8, 1, 9, 0, 10, 11],
    &[6, 5, 7, 4, 8, 3, 9, 2, 10, 1, 11, 0, 12],
    &[6, 5, 7, 4, 8, 3, 9, 2, 10, 1, 11, 0, 12, 13],
    &[7, 6, 8, 5, 9, 4, 10, 3, 11, 2, 12, 1, 13, 0, 14],
    &[7, 6, 8, 5, 9, 4, 10, 3, 11, 2, 12, 1, 13, 0, 14, 15],
    &[8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15, 0, 16],
    &[8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15, 0, 16, 17],
    &[9, 8, 10, 7, 11, 6, 12, 5, 13, 4, 14, 3, 15, 2, 16, 1, 17, 0, 18],
    &[9, 8, 10, 7, 11, 6, 12, 5, 13, 4, 14, 3, 15, 2, 16, 1, 17, 0, 18, 19],
    &[10, 9, 11, 8, 12, 7, 13, 6, 14, 5, 15, 4, 16, 3, 17, 2, 18, 1, 19, 0, 20],
    &[10, 9, 11, 8, 12, 7, 13, 6, 14, 5, 15, 4, 16, 3, 17, 2, 18, 1, 19, 0, 20, 21],
    &[11, 10, 12, 9, 13, 8, 14, 7, 15, 6, 16, 5, 17, 4, 18, 3, 19, 2, 20, 1, 21, 0, 22],
    &[11, 10, 12, 9, 13, 8, 14, 7, 15, 6, 16, 5, 17, 4, 18, 3, 19, 2, 20, 1, 21, 0, 22, 23],
];

/// Works the rows land by land; within each land the fixed permutation
/// for its size applies. A short tail land uses the entry for its own
/// row count.
pub fn lands_order(n: usize, rows_per_land: usize, clockwise: bool) -> Vec<usize> {
    let rows_per_land = rows_per_land.clamp(1, 24);
    let mut order = Vec::with_capacity(n);
    let mut start = 0;
    while start < n {
        let size = rows_per_land.min(n - start);
        let table = if clockwise {
            LANDS_CLOCKWISE[size - 1]
        } else {
            LANDS_COUNTERCLOCKWISE[size - 1]
        };
        order.extend(table.iter().map(|&i| start + i));
        start += size;
    }
    order
}

/// Whether the lands spiral runs clockwise for this entry corner and
/// pipe side.
pub fn lands_clockwise(entry: Corner, pipe_on_left_side: bool) -> bool {
    let counterclockwise = (entry.is_left() == entry.is_bottom()) ^ !pipe_on_left_side;
    !counterclockwise
}

/// The working order of a block's rows for the configured pattern, with
/// row 0 nearest the entry corner.
pub fn order_rows(n: usize, settings: &CenterSettings, entry: Corner) -> Vec<usize> {
    match settings.pattern {
        RowPattern::UpDown => up_down_order(
            n,
            settings.rows_to_skip,
            settings.leave_skipped_rows_unworked,
        ),
        RowPattern::Spiral => spiral_order(n),
        RowPattern::Circular => circular_order(n),
        RowPattern::Lands => lands_order(
            n,
            settings.rows_per_land,
            lands_clockwise(entry, settings.pipe_on_left_side),
        ),
    }
}
