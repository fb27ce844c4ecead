//! Weak-boundary dissolution.
//!
//! Operates on a boundary-coded label map (0 = boundary). Two regions
//! meeting at a boundary pixel merge when the pixel's edge strength exceeds
//! the weaker of their running minima by less than the threshold. Minima are
//! seeded from one pass over each region's own pixels and kept as running
//! minima across merges during the scan. After the union-find
//! flatten, surviving boundary pixels are resolved: an agreeing nonzero
//! 8-neighborhood absorbs the pixel, a disagreeing one donates its first
//! nonzero label in fixed scan order — a documented tie-break, not a
//! quality guarantee.

use crate::forest::Forest;
use crate::image::{ImageF32, LabelImage};
use log::debug;

/// Distinct-label scratch; a pixel has at most 8 neighbors.
const MAX_NEIGHBOR_LABELS: usize = 8;

/// Neighbor labels in fixed order: left, right, up, down, then the four
/// diagonals. Border clipping substitutes the pixel itself, as the scan
/// only consults nonzero entries.
#[inline]
fn neighbors8(buf: &[u32], w: usize, h: usize, x: usize, y: usize) -> [u32; 8] {
    let i = y * w + x;
    let l = if x == 0 { 0 } else { 1 };
    let r = if x + 1 == w { 0 } else { 1 };
    let u = if y == 0 { 0 } else { w };
    let d = if y + 1 == h { 0 } else { w };
    [
        buf[i - l],
        buf[i + r],
        buf[i - u],
        buf[i + d],
        buf[i - l - u],
        buf[i - l + d],
        buf[i + r - u],
        buf[i + r + d],
    ]
}

/// Merge regions separated only by weak boundaries.
/// Inputs are assumed shape-validated.
pub fn merge(labels: &LabelImage, edges: &ImageF32, threshold: f32) -> LabelImage {
    let (w, h) = (labels.w, labels.h);
    let s = &labels.data;
    let e = &edges.data;
    let regions = labels.max_label() as usize + 1;

    // Seed per-region minima over each region's own pixels.
    let mut min_e = vec![f32::INFINITY; regions];
    for (i, &l) in s.iter().enumerate() {
        let l = l as usize;
        if e[i] < min_e[l] {
            min_e[l] = e[i];
        }
    }

    let mut forest = Forest::new(regions);
    let mut merged = 0usize;
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if s[i] != 0 {
                continue;
            }
            let mut uniq = [0u32; MAX_NEIGHBOR_LABELS];
            let mut k = 0;
            for &n in neighbors8(s, w, h, x, y).iter() {
                if n != 0 && !uniq[..k].contains(&n) {
                    uniq[k] = n;
                    k += 1;
                }
            }
            for a in 0..k {
                for b in a + 1..k {
                    let ra = forest.find(uniq[a]);
                    let rb = forest.find(uniq[b]);
                    if ra == rb {
                        continue;
                    }
                    let lo = min_e[ra as usize].min(min_e[rb as usize]);
                    if e[i] - lo < threshold {
                        min_e[ra as usize] = lo;
                        min_e[rb as usize] = lo;
                        forest.union(ra, rb);
                        merged += 1;
                    }
                }
            }
        }
    }

    let (map, count) = forest.flatten(1);
    debug!("merge: thr={} unions={} regions={}", threshold, merged, count);

    let mut out = vec![0u32; w * h];
    for (dst, &l) in out.iter_mut().zip(s.iter()) {
        if l != 0 {
            *dst = map[l as usize];
        }
    }

    // Resolve leftover boundary pixels in place; earlier pixels in the scan
    // may already have been resolved and then feed later ones.
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if out[i] != 0 {
                continue;
            }
            for &n in neighbors8(&out, w, h, x, y).iter() {
                if n != 0 {
                    out[i] = n;
                    break;
                }
            }
        }
    }

    LabelImage::from_vec(w, h, out)
}
