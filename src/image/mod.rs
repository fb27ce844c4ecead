//! Owned array types shared by all pipeline stages.
//!
//! All buffers are row-major with `stride == width`; pixels are addressed
//! by `(x, y)`. `ImageF32` holds scalar maps (edge strength), `LabelImage`
//! holds region ids and `FeatureImage` holds a planar multi-channel feature
//! stack. The `ImageView` trait is the seam the shape-validation helpers
//! work against.

pub mod f32;
pub mod features;
pub mod label;
pub mod traits;

pub use self::f32::ImageF32;
pub use self::features::FeatureImage;
pub use self::label::LabelImage;
pub use self::traits::ImageView;
