#![doc = include_str!("../README.md")]

pub mod boundary;
pub mod canonical;
pub mod edges;
pub mod error;
pub mod image;
pub mod merge;
pub mod pipeline;
pub mod relax;
pub mod stats;

// “Expert” module – public, but its accumulator layout is an unstable internal.
pub mod affinity;

mod forest;

// --- High-level re-exports -------------------------------------------------

pub use crate::affinity::SegmentationEnsemble;
pub use crate::error::SuperpixelError;
pub use crate::image::{FeatureImage, ImageF32, LabelImage};
pub use crate::pipeline::{
    canonicalize_labels, estimate_affinities, extract_boundaries, merge_weak_boundaries,
    relax_and_canonicalize, synthesize_edges,
};
pub use crate::relax::RelaxOptions;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::affinity::SegmentationEnsemble;
    pub use crate::error::SuperpixelError;
    pub use crate::image::{FeatureImage, ImageF32, LabelImage};
    pub use crate::pipeline::{
        canonicalize_labels, estimate_affinities, extract_boundaries, merge_weak_boundaries,
        relax_and_canonicalize, synthesize_edges,
    };
    pub use crate::relax::RelaxOptions;
}
