//! Connectivity repair: one raster scan that splits disconnected components
//! sharing a label and renumbers the surviving regions consecutively from 1.
//!
//! A provisional id is minted whenever neither the left nor the top neighbor
//! carries the pixel's original label; when both carry it under different
//! provisional ids (the region wraps around), the two classes are unioned
//! with the smaller id as representative. A single flatten at the end turns
//! the forest into a direct relabeling. Every output label denotes exactly
//! one 4-connected component, so the pass also absorbs regions extinguished
//! by the relaxer.

use crate::forest::Forest;
use crate::image::LabelImage;

/// Canonicalize `labels` in place. Returns the number of output regions.
///
/// Deterministic and idempotent: a canonical map scans to itself.
pub fn canonicalize(labels: &mut LabelImage) -> u32 {
    let (w, h) = (labels.w, labels.h);
    if w == 0 || h == 0 {
        return 0;
    }
    let s = &labels.data;
    let mut prov = vec![0u32; w * h];
    let mut forest = Forest::new(1);

    prov[0] = forest.mint();
    for x in 1..w {
        prov[x] = if s[x] == s[x - 1] {
            prov[x - 1]
        } else {
            forest.mint()
        };
    }
    for y in 1..h {
        let row = y * w;
        prov[row] = if s[row] == s[row - w] {
            prov[row - w]
        } else {
            forest.mint()
        };
        for x in 1..w {
            let i = row + x;
            let (left, up) = (i - 1, i - w);
            prov[i] = if s[i] == s[left] {
                prov[left]
            } else if s[i] == s[up] {
                prov[up]
            } else {
                forest.mint()
            };
            // Region wraps around: left and top belong to the same original
            // label but carry different provisional ids.
            if prov[left] != prov[up] && s[i] == s[left] && s[i] == s[up] {
                prov[i] = forest.union(prov[left], prov[up]);
            }
        }
    }

    let (map, count) = forest.flatten(1);
    for (dst, &p) in labels.data.iter_mut().zip(prov.iter()) {
        *dst = map[p as usize];
    }
    count
}
