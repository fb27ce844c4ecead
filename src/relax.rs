//! Iterative boundary-pixel relabeling.
//!
//! Each pass visits every pixel that has at least one differing 4-neighbor
//! (interior-uniform pixels are skipped — this pruning carries the cost of a
//! pass) and moves it to whichever neighboring region minimizes a local
//! assignment cost. Passes repeat until a pass moves nothing or the
//! iteration cap is reached.
//!
//! Concurrency contract: columns are swept in parallel and the shared label
//! cells and region statistics are read and updated through relaxed atomics
//! with no mutual synchronization. One worker may observe another worker's
//! means one iteration stale; per-pass exactness is not the contract —
//! convergence across iterations is. Do not serialize this sweep.

use crate::error::SuperpixelError;
use crate::image::{FeatureImage, ImageF32, LabelImage};
use crate::pipeline::build_pool;
use crate::stats::RegionStats;
use log::debug;
use rayon::prelude::*;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Edge term used when every 4-neighbor already belongs to the candidate.
const NO_EDGE: f32 = 1e10;

/// Weights and limits for the relaxation sweep.
///
/// The cost of assigning a pixel to candidate region t is
/// `sigx·(Δx²+Δy²) + sigc·ΣΔf² − sige·e_t + sigs/count(t)`, where the deltas
/// are taken against t's running mean and `e_t` is the weakest edge toward a
/// neighbor outside t. `sigs/count(t)` penalizes growing already-small
/// regions, damping shrink/merge oscillation.
#[derive(Clone, Debug, Deserialize)]
pub struct RelaxOptions {
    /// Maximum number of full passes (>= 1).
    pub max_iters: u32,
    /// Worker cap for the parallel sweep (>= 1, clamped to the hardware).
    pub threads: usize,
    /// Spatial distance weight.
    pub sigx: f32,
    /// Feature distance weight.
    pub sigc: f32,
    /// Edge-strength reward weight.
    pub sige: f32,
    /// Small-region penalty weight.
    pub sigs: f32,
}

impl Default for RelaxOptions {
    fn default() -> Self {
        Self {
            max_iters: 8,
            threads: 4,
            sigx: 0.2,
            sigc: 2.0,
            sige: 1.0,
            sigs: 100.0,
        }
    }
}

impl RelaxOptions {
    pub(crate) fn validate(&self) -> Result<(), SuperpixelError> {
        if self.max_iters == 0 {
            return Err(SuperpixelError::InvalidConfig {
                param: "max_iters",
                reason: "must be positive",
            });
        }
        if self.threads == 0 {
            return Err(SuperpixelError::InvalidConfig {
                param: "threads",
                reason: "must be positive",
            });
        }
        for (param, v) in [
            ("sigx", self.sigx),
            ("sigc", self.sigc),
            ("sige", self.sige),
            ("sigs", self.sigs),
        ] {
            if !v.is_finite() {
                return Err(SuperpixelError::InvalidConfig {
                    param,
                    reason: "must be finite",
                });
            }
        }
        Ok(())
    }
}

/// Run the relaxation sweep in place. Returns the number of passes executed.
///
/// Inputs are assumed shape-validated (see `pipeline`).
pub fn relax(
    labels: &mut LabelImage,
    features: &FeatureImage,
    edges: &ImageF32,
    opts: &RelaxOptions,
) -> Result<u32, SuperpixelError> {
    let (w, h) = (labels.w, labels.h);
    let regions = labels.max_label() as usize + 1;
    let stats = RegionStats::from_labels(labels, features, regions);
    let dims = stats.dims();

    let cells: Vec<AtomicU32> = std::mem::take(&mut labels.data)
        .into_iter()
        .map(AtomicU32::new)
        .collect();

    let pool = build_pool(opts.threads)?;
    let t0 = Instant::now();
    let mut iters = 0u32;
    while iters < opts.max_iters {
        let moved = AtomicU32::new(0);
        pool.install(|| {
            (0..w).into_par_iter().for_each_init(
                || vec![0.0f32; dims],
                |vs, x| {
                    for y in 0..h {
                        relax_pixel(&cells, &stats, features, edges, opts, w, h, x, y, vs, &moved);
                    }
                },
            );
        });
        iters += 1;
        let moved = moved.into_inner();
        debug!(
            "relax: iter={} moved={} ({:.2}% of pixels)",
            iters,
            moved,
            100.0 * moved as f64 / (w * h) as f64
        );
        if moved == 0 {
            break;
        }
    }
    debug!("relax: done after {} iters in {:.3}ms", iters, t0.elapsed().as_secs_f64() * 1e3);

    labels.data = cells.into_iter().map(AtomicU32::into_inner).collect();
    Ok(iters)
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn relax_pixel(
    cells: &[AtomicU32],
    stats: &RegionStats,
    features: &FeatureImage,
    edges: &ImageF32,
    opts: &RelaxOptions,
    w: usize,
    h: usize,
    x: usize,
    y: usize,
    vs: &mut [f32],
    moved: &AtomicU32,
) {
    let at = |xx: usize, yy: usize| cells[yy * w + xx].load(Ordering::Relaxed);
    let s = at(x, y);

    // 4-neighborhood with border clamping to the pixel itself.
    let x0 = x.saturating_sub(1);
    let x1 = if x + 1 < w { x + 1 } else { x };
    let y0 = y.saturating_sub(1);
    let y1 = if y + 1 < h { y + 1 } else { y };
    let nbr = [at(x0, y), at(x1, y), at(x, y0), at(x, y1)];
    if nbr.iter().all(|&t| t == s) {
        return;
    }

    vs[0] = x as f32;
    vs[1] = y as f32;
    features.fill_vector(x, y, &mut vs[2..]);
    let es = [
        edges.get(x0, y),
        edges.get(x1, y),
        edges.get(x, y0),
        edges.get(x, y1),
    ];

    // Candidates in fixed scan order; ties keep the first minimal cost.
    let mut best: Option<(f32, u32)> = None;
    for &t in &nbr {
        if let Some((_, bt)) = best {
            if bt == t {
                continue;
            }
        }
        let mut e = NO_EDGE;
        for (j, &u) in nbr.iter().enumerate() {
            if u != t && es[j] < e {
                e = es[j];
            }
        }
        let dx = stats.mean_at(t, 0) - vs[0];
        let dy = stats.mean_at(t, 1) - vs[1];
        let mut df = 0.0f32;
        for (d, &vd) in vs.iter().enumerate().skip(2) {
            let dd = stats.mean_at(t, d) - vd;
            df += dd * dd;
        }
        let cost = opts.sigx * (dx * dx + dy * dy) + opts.sigc * df - opts.sige * e
            + opts.sigs / stats.count(t);
        if best.map_or(true, |(bc, _)| cost < bc) {
            best = Some((cost, t));
        }
    }

    if let Some((_, t)) = best {
        if t != s {
            stats.reassign(s, t, vs);
            cells[y * w + x].store(t, Ordering::Relaxed);
            moved.fetch_add(1, Ordering::Relaxed);
        }
    }
}
