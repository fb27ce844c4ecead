//! Boundary skeleton extraction.
//!
//! Produces a boundary-coded copy of the label map: labels are shifted by +1
//! and 0 marks boundary pixels. Three row-parallel passes follow the seed
//! copy: a 4-connectivity pass that zeroes the stronger-edge side of every
//! differing axis pair, an 8-connectivity pass that guarantees diagonal
//! separation, and a single cleanup pass that re-absorbs isolated boundary
//! marks whose 8-neighborhood agrees on one label. Each pass reads the
//! previous pass's buffer and writes a fresh one, so the result does not
//! depend on the thread count. Border pixels keep their 4-connectivity
//! result (their 8-neighborhood is undefined).

use crate::error::SuperpixelError;
use crate::image::{ImageF32, LabelImage};
use crate::pipeline::build_pool;
use rayon::prelude::*;

#[inline]
fn inner_neighbors8(buf: &[u32], w: usize, i: usize) -> [u32; 8] {
    [
        buf[i - 1],
        buf[i + 1],
        buf[i - w],
        buf[i + w],
        buf[i - w - 1],
        buf[i - w + 1],
        buf[i + w - 1],
        buf[i + w + 1],
    ]
}

/// Extract the boundary skeleton. Inputs are assumed shape-validated.
pub fn extract(
    labels: &LabelImage,
    edges: &ImageF32,
    threads: usize,
) -> Result<LabelImage, SuperpixelError> {
    let (w, h) = (labels.w, labels.h);
    let s = &labels.data;
    let e = &edges.data;
    let pool = build_pool(threads)?;

    // Seed + 4-connectivity: of every differing axis pair, the side with the
    // strictly higher edge strength becomes boundary; on equal strength the
    // right/down side does.
    let mut first = vec![0u32; w * h];
    pool.install(|| {
        first.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let i = y * w + x;
                let (sp, ep) = (s[i], e[i]);
                let boundary = (x > 0 && s[i - 1] != sp && e[i - 1] <= ep)
                    || (x + 1 < w && s[i + 1] != sp && ep > e[i + 1])
                    || (y > 0 && s[i - w] != sp && e[i - w] <= ep)
                    || (y + 1 < h && s[i + w] != sp && ep > e[i + w]);
                *out = if boundary { 0 } else { sp + 1 };
            }
        });
    });

    // 8-connectivity: an interior pixel whose neighborhood holds a second
    // distinct nonzero label becomes boundary as well.
    let mut second = first.clone();
    pool.install(|| {
        second.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            if y == 0 || y + 1 == h {
                return;
            }
            for x in 1..w.saturating_sub(1) {
                let i = y * w + x;
                let t = first[i];
                if t == 0 {
                    continue;
                }
                if inner_neighbors8(&first, w, i)
                    .iter()
                    .any(|&n| n != 0 && n != t)
                {
                    row[x] = 0;
                }
            }
        });
    });

    // Cleanup: a boundary pixel whose nonzero neighbors all agree is spurious
    // and rejoins that label; disagreeing or isolated pixels stay boundary.
    let mut out = second.clone();
    pool.install(|| {
        out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            if y == 0 || y + 1 == h {
                return;
            }
            for x in 1..w.saturating_sub(1) {
                let i = y * w + x;
                if second[i] != 0 {
                    continue;
                }
                let mut agreed = 0u32;
                let mut ok = true;
                for &n in inner_neighbors8(&second, w, i).iter() {
                    if n == 0 {
                        continue;
                    }
                    if agreed == 0 {
                        agreed = n;
                    } else if n != agreed {
                        ok = false;
                        break;
                    }
                }
                if ok && agreed != 0 {
                    row[x] = agreed;
                }
            }
        });
    });

    Ok(LabelImage::from_vec(w, h, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_map_has_no_boundary() {
        let labels = LabelImage::from_vec(4, 4, vec![2; 16]);
        let edges = ImageF32::filled(4, 4, 0.5);
        let out = extract(&labels, &edges, 2).unwrap();
        assert!(out.data.iter().all(|&t| t == 3));
    }

    #[test]
    fn stronger_edge_side_becomes_boundary() {
        // Two vertical halves; the edge response sits on the left side of
        // the divide, so column 1 is zeroed and column 2 stays interior.
        let labels = LabelImage::from_vec(4, 3, vec![1, 1, 2, 2, 1, 1, 2, 2, 1, 1, 2, 2]);
        let mut edges = ImageF32::new(4, 3);
        for y in 0..3 {
            edges.set(1, y, 0.9);
            edges.set(2, y, 0.1);
        }
        let out = extract(&labels, &edges, 1).unwrap();
        for y in 0..3 {
            assert_eq!(out.get(1, y), 0, "column 1 should be boundary");
            assert_eq!(out.get(2, y), 3, "column 2 should stay interior");
            assert_eq!(out.get(0, y), 2);
            assert_eq!(out.get(3, y), 3);
        }
    }

    #[test]
    fn deep_interior_pixels_never_marked() {
        // 7x7, single foreign pixel in the corner; the center is two pixels
        // away from any differing label and must stay interior.
        let mut data = vec![1u32; 49];
        data[0] = 9;
        let labels = LabelImage::from_vec(7, 7, data);
        let edges = ImageF32::filled(7, 7, 0.5);
        let out = extract(&labels, &edges, 2).unwrap();
        assert_ne!(out.get(3, 3), 0);
        assert_ne!(out.get(5, 5), 0);
    }

    #[test]
    fn result_is_independent_of_thread_count() {
        let labels = LabelImage::from_vec(
            5,
            5,
            vec![
                1, 1, 1, 2, 2, //
                1, 1, 1, 2, 2, //
                1, 1, 3, 3, 3, //
                4, 4, 3, 3, 3, //
                4, 4, 3, 3, 3,
            ],
        );
        let mut edges = ImageF32::filled(5, 5, 0.2);
        edges.set(2, 2, 0.8);
        edges.set(3, 1, 0.7);
        let a = extract(&labels, &edges, 1).unwrap();
        let b = extract(&labels, &edges, 4).unwrap();
        assert_eq!(a.data, b.data);
    }
}
