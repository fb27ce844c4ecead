//! Validated public operations.
//!
//! Each function checks shapes and parameters synchronously, allocates a
//! fresh output, and holds no state between calls.

use crate::affinity::{self, SegmentationEnsemble};
use crate::boundary;
use crate::canonical;
use crate::edges as edge_synth;
use crate::error::SuperpixelError;
use crate::image::{FeatureImage, ImageF32, ImageView, LabelImage};
use crate::merge as weak_merge;
use crate::relax::{self, RelaxOptions};
use log::debug;
use nalgebra::DMatrix;
use std::num::NonZeroUsize;

/// Bounded local worker pool: the caller's cap clamped to the hardware.
pub(crate) fn build_pool(threads: usize) -> Result<rayon::ThreadPool, SuperpixelError> {
    let hw = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.min(hw))
        .build()
        .map_err(|_| SuperpixelError::InvalidConfig {
            param: "threads",
            reason: "worker pool construction failed",
        })
}

fn ensure_nonempty(labels: &LabelImage) -> Result<(), SuperpixelError> {
    if labels.w == 0 || labels.h == 0 {
        return Err(SuperpixelError::EmptyInput);
    }
    Ok(())
}

fn ensure_same_shape<A, B>(what: &'static str, a: &A, b: &B) -> Result<(), SuperpixelError>
where
    A: ImageView,
    B: ImageView,
{
    if a.width() != b.width() || a.height() != b.height() {
        return Err(SuperpixelError::DimensionMismatch {
            what,
            expected: (a.width(), a.height()),
            found: (b.width(), b.height()),
        });
    }
    Ok(())
}

fn ensure_threads(threads: usize) -> Result<(), SuperpixelError> {
    if threads == 0 {
        return Err(SuperpixelError::InvalidConfig {
            param: "threads",
            reason: "must be positive",
        });
    }
    Ok(())
}

/// Relax pixel-to-region assignments, then repair connectivity and renumber
/// regions consecutively from 1.
///
/// A map with a single label spanning the whole grid short-circuits: the
/// relaxation has nothing to move and the output is the canonicalized copy.
pub fn relax_and_canonicalize(
    labels: &LabelImage,
    features: &FeatureImage,
    edges: &ImageF32,
    opts: &RelaxOptions,
) -> Result<LabelImage, SuperpixelError> {
    opts.validate()?;
    ensure_nonempty(labels)?;
    ensure_same_shape("edge map", labels, edges)?;
    if features.w != labels.w || features.h != labels.h {
        return Err(SuperpixelError::DimensionMismatch {
            what: "feature image",
            expected: (labels.w, labels.h),
            found: (features.w, features.h),
        });
    }

    let mut out = labels.clone();
    if out.is_uniform() {
        debug!("relax_and_canonicalize: uniform label map, skipping relaxation");
    } else {
        relax::relax(&mut out, features, edges, opts)?;
    }
    let regions = canonical::canonicalize(&mut out);
    debug!(
        "relax_and_canonicalize: {}x{} -> {} regions",
        labels.w, labels.h, regions
    );
    Ok(out)
}

/// Repair connectivity and renumber labels consecutively from 1, without
/// relaxation.
pub fn canonicalize_labels(labels: &LabelImage) -> Result<LabelImage, SuperpixelError> {
    ensure_nonempty(labels)?;
    let mut out = labels.clone();
    canonical::canonicalize(&mut out);
    Ok(out)
}

/// Extract a one-pixel-wide boundary skeleton; in the output, labels are
/// shifted by +1 and 0 marks boundary.
pub fn extract_boundaries(
    labels: &LabelImage,
    edges: &ImageF32,
    threads: usize,
) -> Result<LabelImage, SuperpixelError> {
    ensure_threads(threads)?;
    ensure_nonempty(labels)?;
    ensure_same_shape("edge map", labels, edges)?;
    boundary::extract(labels, edges, threads)
}

/// Dissolve boundaries weaker than `threshold` in a boundary-coded map
/// (0 = boundary) and renumber the surviving regions from 1.
///
/// `threshold` must not be NaN; +∞ merges every pair of regions that meet
/// at a boundary pixel.
pub fn merge_weak_boundaries(
    labels: &LabelImage,
    edges: &ImageF32,
    threshold: f32,
) -> Result<LabelImage, SuperpixelError> {
    if threshold.is_nan() {
        return Err(SuperpixelError::InvalidConfig {
            param: "threshold",
            reason: "must not be NaN",
        });
    }
    ensure_nonempty(labels)?;
    ensure_same_shape("edge map", labels, edges)?;
    Ok(weak_merge::merge(labels, edges, threshold))
}

/// Estimate the pairwise region affinity matrix from an ensemble of local
/// segmentation proposals.
///
/// The result is m×m for labels 1..=m, symmetric, entries in [0, 1];
/// entries with no accumulated evidence stay 0.0 and the diagonal is not
/// computed.
pub fn estimate_affinities(
    labels: &LabelImage,
    edges: &ImageF32,
    ensemble: &SegmentationEnsemble,
    threads: usize,
) -> Result<DMatrix<f32>, SuperpixelError> {
    ensure_threads(threads)?;
    ensure_nonempty(labels)?;
    ensure_same_shape("edge map", labels, edges)?;
    let cols = SegmentationEnsemble::grid_extent(labels.w, ensemble.stride);
    let rows = SegmentationEnsemble::grid_extent(labels.h, ensemble.stride);
    if ensemble.cols != cols || ensemble.rows != rows {
        return Err(SuperpixelError::DimensionMismatch {
            what: "segmentation ensemble",
            expected: (cols, rows),
            found: (ensemble.cols, ensemble.rows),
        });
    }
    affinity::estimate(labels, edges, ensemble, threads)
}

/// Synthesize a pixel-level edge map from a boundary-coded label map and
/// its affinity matrix.
pub fn synthesize_edges(
    labels: &LabelImage,
    affinity: &DMatrix<f32>,
) -> Result<ImageF32, SuperpixelError> {
    ensure_nonempty(labels)?;
    let m = labels.max_label() as usize;
    if affinity.nrows() != m || affinity.ncols() != m {
        return Err(SuperpixelError::DimensionMismatch {
            what: "affinity matrix",
            expected: (m, m),
            found: (affinity.nrows(), affinity.ncols()),
        });
    }
    Ok(edge_synth::synthesize(labels, affinity))
}
