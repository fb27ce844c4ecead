//! Edge synthesis from a region affinity matrix.
//!
//! Converts pairwise region dissimilarity back into a pixel-level
//! edge-strength map over a boundary-coded label map: a boundary pixel is as
//! strong as the most dissimilar pair of regions meeting there; everything
//! else gets a fixed low floor.

use crate::image::{ImageF32, LabelImage};
use nalgebra::DMatrix;

/// Baseline non-edge likelihood written to every non-boundary pixel.
pub const EDGE_FLOOR: f32 = 0.01;

/// Synthesize an edge map from `labels` (0 = boundary) and the m×m affinity
/// matrix over labels 1..=m. Inputs are assumed shape-validated.
pub fn synthesize(labels: &LabelImage, affinity: &DMatrix<f32>) -> ImageF32 {
    let (w, h) = (labels.w, labels.h);
    let s = &labels.data;
    let mut out = ImageF32::filled(w, h, EDGE_FLOOR);

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if s[i] != 0 {
                continue;
            }
            // Distinct nonzero labels in the clipped 8-neighborhood.
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(w - 1);
            let y0 = y.saturating_sub(1);
            let y1 = (y + 1).min(h - 1);
            let mut near = [0u32; 8];
            let mut k = 0;
            for yi in y0..=y1 {
                for xi in x0..=x1 {
                    let n = s[yi * w + xi];
                    if n != 0 && !near[..k].contains(&n) {
                        near[k] = n;
                        k += 1;
                    }
                }
            }
            let mut strength = EDGE_FLOOR;
            for a in 0..k {
                for b in a + 1..k {
                    let (s1, s2) = (near[a] as usize - 1, near[b] as usize - 1);
                    strength = strength.max(1.0 - affinity[(s1, s2)]);
                }
            }
            out.data[i] = strength;
        }
    }
    out
}
