//! Incremental per-region aggregates: pixel count and running mean of the
//! (x, y, features) vector.
//!
//! Storage is relaxed-ordering atomics (f32 bit-cast in `AtomicU32`) so the
//! relaxer's parallel sweep can read and update regions across workers
//! without mutual synchronization. Values read by one worker may be one
//! iteration stale relative to another worker's writes; the relaxer's
//! convergence contract tolerates that by design. A region's count may
//! transiently reach zero (extinguished region) — its mean becomes undefined
//! and is never chosen again until the region is repopulated.

use crate::image::{FeatureImage, LabelImage};
use std::sync::atomic::{AtomicU32, Ordering};

#[inline]
fn load(a: &AtomicU32) -> f32 {
    f32::from_bits(a.load(Ordering::Relaxed))
}

#[inline]
fn store(a: &AtomicU32, v: f32) {
    a.store(v.to_bits(), Ordering::Relaxed);
}

pub struct RegionStats {
    /// Length of the aggregated vector: 2 (position) + feature channels.
    dims: usize,
    /// Per-region pixel count, f32 bits.
    counts: Vec<AtomicU32>,
    /// Per-region running mean, `regions × dims`, f32 bits.
    means: Vec<AtomicU32>,
}

impl RegionStats {
    /// Accumulate counts and means over all pixels in one full pass.
    /// `regions` must exceed the largest label in `labels`.
    pub fn from_labels(labels: &LabelImage, features: &FeatureImage, regions: usize) -> Self {
        let dims = 2 + features.channels;
        let mut counts = vec![0.0f32; regions];
        let mut sums = vec![0.0f32; regions * dims];
        for y in 0..labels.h {
            for x in 0..labels.w {
                let r = labels.get(x, y) as usize;
                counts[r] += 1.0;
                let base = r * dims;
                sums[base] += x as f32;
                sums[base + 1] += y as f32;
                for c in 0..features.channels {
                    sums[base + 2 + c] += features.get(x, y, c);
                }
            }
        }
        for (r, &n) in counts.iter().enumerate() {
            if n > 0.0 {
                for d in 0..dims {
                    sums[r * dims + d] /= n;
                }
            }
        }
        Self {
            dims,
            counts: counts.into_iter().map(|v| AtomicU32::new(v.to_bits())).collect(),
            means: sums.into_iter().map(|v| AtomicU32::new(v.to_bits())).collect(),
        }
    }

    /// Number of tracked regions.
    pub fn regions(&self) -> usize {
        self.counts.len()
    }

    /// Length of the aggregated vector (2 + feature channels).
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Current pixel count of region `r`.
    #[inline]
    pub fn count(&self, r: u32) -> f32 {
        load(&self.counts[r as usize])
    }

    /// Component `d` of region `r`'s running mean.
    #[inline]
    pub fn mean_at(&self, r: u32, d: usize) -> f32 {
        load(&self.means[r as usize * self.dims + d])
    }

    /// Move one pixel carrying vector `v` from region `from` to region `to`,
    /// updating both counts and running means in place.
    ///
    /// The update is intentionally a plain load-compute-store on relaxed
    /// atomics; concurrent reassignments may interleave. See the module docs.
    pub fn reassign(&self, from: u32, to: u32, v: &[f32]) {
        debug_assert_eq!(v.len(), self.dims);
        let ns = load(&self.counts[from as usize]) - 1.0;
        store(&self.counts[from as usize], ns);
        let base = from as usize * self.dims;
        for (d, &vd) in v.iter().enumerate() {
            let m = &self.means[base + d];
            store(m, (load(m) * (ns + 1.0) - vd) / ns);
        }
        let nt = load(&self.counts[to as usize]) + 1.0;
        store(&self.counts[to as usize], nt);
        let base = to as usize * self.dims;
        for (d, &vd) in v.iter().enumerate() {
            let m = &self.means[base + d];
            store(m, (load(m) * (nt - 1.0) + vd) / nt);
        }
    }
}
