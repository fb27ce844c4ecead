//! Ensemble-based region affinity estimation.
//!
//! For every coarse sample point on a stride grid, the current label map is
//! compacted into a small local lookup, each ensemble member's clusters are
//! tallied per local region with edge-aware pixel weights, and the tallies
//! feed shared numerator/denominator accumulators indexed by global region
//! pairs. Unlike the relaxer, accumulation races are not tolerated here:
//! each worker folds into private partial matrices that are reduced
//! deterministically after the parallel loop.

use crate::error::SuperpixelError;
use crate::image::{ImageF32, LabelImage};
use crate::pipeline::build_pool;
use log::debug;
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::time::Instant;

/// Coarse columns per parallel work unit.
const COLUMN_CHUNK: usize = 16;

/// Externally produced ensemble of local segmentation proposals.
///
/// A read-only 4-D block of u8 cluster ids indexed by
/// `[coarse-x, coarse-y, member, window-pixel]`: one g×g window per coarse
/// sample point on a stride grid, `members` proposals per point. Within a
/// window, pixels are stored column-major (`(wx)·g + wy`); a window whose
/// covered pixels all carry cluster id 0 is a trivial member (no split).
#[derive(Clone, Debug)]
pub struct SegmentationEnsemble {
    /// Window side length g (even).
    pub window: usize,
    /// Coarse sampling stride.
    pub stride: usize,
    /// Number of proposals per sample point.
    pub members: usize,
    /// Coarse grid extent along x.
    pub cols: usize,
    /// Coarse grid extent along y.
    pub rows: usize,
    data: Vec<u8>,
}

impl SegmentationEnsemble {
    /// Coarse grid extent for one image dimension; the producer pads the
    /// image to a multiple of 4 before sampling.
    pub fn grid_extent(dim: usize, stride: usize) -> usize {
        dim.div_ceil(4) * 4 / stride
    }

    /// Wrap an ensemble buffer produced for a `w × h` image, validating its
    /// length against the implied coarse grid.
    pub fn for_image(
        w: usize,
        h: usize,
        window: usize,
        stride: usize,
        members: usize,
        data: Vec<u8>,
    ) -> Result<Self, SuperpixelError> {
        if window == 0 || window % 2 != 0 {
            return Err(SuperpixelError::InvalidConfig {
                param: "window",
                reason: "must be positive and even",
            });
        }
        if stride == 0 {
            return Err(SuperpixelError::InvalidConfig {
                param: "stride",
                reason: "must be positive",
            });
        }
        if members == 0 {
            return Err(SuperpixelError::InvalidConfig {
                param: "members",
                reason: "must be positive",
            });
        }
        let cols = Self::grid_extent(w, stride);
        let rows = Self::grid_extent(h, stride);
        let expected = cols * rows * members * window * window;
        if data.len() != expected {
            return Err(SuperpixelError::DimensionMismatch {
                what: "segmentation ensemble buffer",
                expected: (expected, 1),
                found: (data.len(), 1),
            });
        }
        Ok(Self {
            window,
            stride,
            members,
            cols,
            rows,
            data,
        })
    }

    /// The g×g cluster-id window of member `t` at coarse point (cx, cy).
    #[inline]
    pub fn member_window(&self, cx: usize, cy: usize, t: usize) -> &[u8] {
        let win = self.window * self.window;
        let ind = cy + cx * self.rows + t * self.rows * self.cols;
        &self.data[ind * win..(ind + 1) * win]
    }
}

/// Worker-private accumulator: partial Sn/Sd plus window scratch.
struct Accum {
    sn: DMatrix<f32>,
    sd: DMatrix<f32>,
    /// First-seen global label per local index.
    lookup: Vec<u32>,
    /// Total window weight per local index.
    totals: Vec<f32>,
    /// Local index per window pixel.
    local: Vec<u32>,
    /// Per-(cluster, local index) weight tallies.
    cluster_w: Vec<f32>,
}

impl Accum {
    fn new(side: usize, window: usize) -> Self {
        Self {
            sn: DMatrix::zeros(side, side),
            sd: DMatrix::zeros(side, side),
            lookup: Vec::new(),
            totals: Vec::new(),
            local: vec![0; window * window],
            cluster_w: Vec::new(),
        }
    }

    /// Accumulate one window centered at (x, y), clipped at the borders.
    #[allow(clippy::too_many_arguments)]
    fn sample(
        &mut self,
        s: &[u32],
        wts: &[f32],
        ens: &SegmentationEnsemble,
        w: usize,
        h: usize,
        x: usize,
        y: usize,
    ) {
        let g = ens.window;
        let r = (g / 2) as isize;
        let x0 = (-(x as isize)).max(-r);
        let x1 = (w as isize - x as isize).min(r);
        let y0 = (-(y as isize)).max(-r);
        let y1 = (h as isize - y as isize).min(r);

        // Compact local relabeling; consecutive pixels usually share a
        // region, so the last local index is memoized.
        self.lookup.clear();
        self.totals.clear();
        let mut last = usize::MAX;
        for xi in x0..x1 {
            for yi in y0..y1 {
                let px = (x as isize + xi) as usize;
                let py = (y as isize + yi) as usize;
                let lbl = s[py * w + px];
                let li = if last != usize::MAX && self.lookup[last] == lbl {
                    last
                } else {
                    match self.lookup.iter().position(|&l| l == lbl) {
                        Some(i) => i,
                        None => {
                            self.lookup.push(lbl);
                            self.totals.push(0.0);
                            self.lookup.len() - 1
                        }
                    }
                };
                self.local[(xi + r) as usize * g + (yi + r) as usize] = li as u32;
                self.totals[li] += wts[py * w + px];
                last = li;
            }
        }
        let m1 = self.lookup.len();

        let (cx, cy) = (x / ens.stride, y / ens.stride);
        let mut trivial = 0usize;
        for t in 0..ens.members {
            let seg = ens.member_window(cx, cy, t);
            let mut max_id = 0u8;
            for xi in x0..x1 {
                for yi in y0..y1 {
                    let id = seg[(xi + r) as usize * g + (yi + r) as usize];
                    if id > max_id {
                        max_id = id;
                    }
                }
            }
            let clusters = max_id as usize + 1;
            if clusters == 1 {
                trivial += 1;
                continue;
            }

            self.cluster_w.clear();
            self.cluster_w.resize(clusters * m1, 0.0);
            for xi in x0..x1 {
                for yi in y0..y1 {
                    let wi = (xi + r) as usize * g + (yi + r) as usize;
                    let px = (x as isize + xi) as usize;
                    let py = (y as isize + yi) as usize;
                    let li = self.local[wi] as usize;
                    let c = seg[wi] as usize;
                    self.cluster_w[c * m1 + li] += wts[py * w + px];
                }
            }
            for c in 0..clusters {
                let col = &self.cluster_w[c * m1..(c + 1) * m1];
                for (i, &wi) in col.iter().enumerate() {
                    if wi == 0.0 {
                        continue;
                    }
                    let gi = self.lookup[i] as usize;
                    for (j, &wj) in col.iter().enumerate() {
                        self.sn[(gi, self.lookup[j] as usize)] += wi * wj;
                    }
                }
            }
        }

        // Trivial members co-cluster the whole window; crediting them into
        // Sn (rather than skipping) avoids biasing against uniform windows.
        if trivial > 0 {
            let f = trivial as f32;
            for (i, &ti) in self.totals.iter().enumerate() {
                let gi = self.lookup[i] as usize;
                for (j, &tj) in self.totals.iter().enumerate() {
                    self.sn[(gi, self.lookup[j] as usize)] += ti * tj * f;
                }
            }
        }
        // Every member contributes to the denominator regardless of outcome.
        let f = ens.members as f32;
        for (i, &ti) in self.totals.iter().enumerate() {
            let gi = self.lookup[i] as usize;
            for (j, &tj) in self.totals.iter().enumerate() {
                self.sd[(gi, self.lookup[j] as usize)] += ti * tj * f;
            }
        }
    }
}

/// Estimate the pairwise region affinity matrix.
/// Inputs are assumed shape-validated.
///
/// The returned matrix is m×m for labels 1..=m, symmetric, with entries in
/// [0, 1]. Entries whose accumulated denominator is zero stay 0.0 and mean
/// "no evidence" (the regions never co-occurred in a sampled window); the
/// diagonal is not computed.
pub fn estimate(
    labels: &LabelImage,
    edges: &ImageF32,
    ens: &SegmentationEnsemble,
    threads: usize,
) -> Result<DMatrix<f32>, SuperpixelError> {
    let (w, h) = (labels.w, labels.h);
    let m = labels.max_label() as usize;
    let side = m + 1; // accumulators keep a row for the boundary label 0

    // Steep down-weighting of pixels near strong edges; interior pixels
    // dominate the statistics.
    let wts: Vec<f32> = edges
        .data
        .iter()
        .map(|&e| 1.0 / (1.0 + ((e - 0.05) * 50.0).exp()))
        .collect();

    let pool = build_pool(threads)?;
    let t0 = Instant::now();
    let xs: Vec<usize> = (0..w).step_by(ens.stride).collect();
    // Fixed-size column chunks with a sequential final fold keep the
    // reduction order, and therefore the estimate, independent of the
    // thread count.
    let partials: Vec<(DMatrix<f32>, DMatrix<f32>)> = pool.install(|| {
        xs.par_chunks(COLUMN_CHUNK)
            .map(|chunk| {
                let mut acc = Accum::new(side, ens.window);
                for &x in chunk {
                    for y in (0..h).step_by(ens.stride) {
                        acc.sample(&labels.data, &wts, ens, w, h, x, y);
                    }
                }
                (acc.sn, acc.sd)
            })
            .collect()
    });
    let (sn, sd) = partials.into_iter().fold(
        (DMatrix::zeros(side, side), DMatrix::zeros(side, side)),
        |(n1, d1), (n2, d2)| (n1 + n2, d1 + d2),
    );
    debug!(
        "affinity: {} samples x {} members in {:.3}ms",
        xs.len() * h.div_ceil(ens.stride),
        ens.members,
        t0.elapsed().as_secs_f64() * 1e3
    );

    let mut a = DMatrix::zeros(m, m);
    for s in 1..=m {
        for t in 1..=m {
            if s == t {
                continue;
            }
            let d_st = sd[(s, t)];
            if d_st > 0.0 {
                let self_sim = sn[(s, s)] / sd[(s, s)] / 2.0 + sn[(t, t)] / sd[(t, t)] / 2.0;
                a[(s - 1, t - 1)] = 1.0 - (self_sim - sn[(s, t)] / d_st).max(0.0);
            }
        }
    }
    Ok(a)
}
