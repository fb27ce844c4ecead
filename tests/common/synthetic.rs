use superpixel_refine::{FeatureImage, ImageF32, LabelImage, SegmentationEnsemble};

/// Square label map split into four quadrants labeled 1..4.
pub fn quadrant_labels(size: usize) -> LabelImage {
    assert!(size % 2 == 0, "quadrant map needs an even size");
    let half = size / 2;
    let mut data = vec![0u32; size * size];
    for y in 0..size {
        for x in 0..size {
            let q = (x >= half) as u32 + 2 * (y >= half) as u32;
            data[y * size + x] = q + 1;
        }
    }
    LabelImage::from_vec(size, size, data)
}

/// Single-channel feature image constant per quadrant.
pub fn quadrant_features(size: usize, values: [f32; 4]) -> FeatureImage {
    let half = size / 2;
    let mut img = FeatureImage::new(size, size, 1);
    for y in 0..size {
        for x in 0..size {
            let q = (x >= half) as usize + 2 * (y >= half) as usize;
            img.set(x, y, 0, values[q]);
        }
    }
    img
}

/// Uniform edge map.
pub fn flat_edges(w: usize, h: usize, v: f32) -> ImageF32 {
    ImageF32::filled(w, h, v)
}

/// Ensemble whose members are all trivial (one cluster per window).
pub fn trivial_ensemble(
    w: usize,
    h: usize,
    window: usize,
    stride: usize,
    members: usize,
) -> SegmentationEnsemble {
    let cols = SegmentationEnsemble::grid_extent(w, stride);
    let rows = SegmentationEnsemble::grid_extent(h, stride);
    let data = vec![0u8; cols * rows * members * window * window];
    SegmentationEnsemble::for_image(w, h, window, stride, members, data).unwrap()
}

/// Ensemble whose members all split every window vertically in half.
pub fn split_ensemble(
    w: usize,
    h: usize,
    window: usize,
    stride: usize,
    members: usize,
) -> SegmentationEnsemble {
    let cols = SegmentationEnsemble::grid_extent(w, stride);
    let rows = SegmentationEnsemble::grid_extent(h, stride);
    let win = window * window;
    let mut data = vec![0u8; cols * rows * members * win];
    for chunk in data.chunks_mut(win) {
        for wx in window / 2..window {
            for wy in 0..window {
                chunk[wx * window + wy] = 1;
            }
        }
    }
    SegmentationEnsemble::for_image(w, h, window, stride, members, data).unwrap()
}
