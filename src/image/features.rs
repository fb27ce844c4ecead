//! Owned planar multi-channel f32 image.
//!
//! Channels are stored back to back (`data[c*w*h + y*w + x]`), matching the
//! layout external feature extractors hand over. The reference pipeline uses
//! k = 3 color channels; any channel count (including 0) is accepted.
#[derive(Clone, Debug)]
pub struct FeatureImage {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of feature channels
    pub channels: usize,
    /// Backing storage, channel-major then row-major
    pub data: Vec<f32>,
}

impl FeatureImage {
    /// Construct a zero-initialized feature stack of size `w × h × channels`.
    pub fn new(w: usize, h: usize, channels: usize) -> Self {
        Self {
            w,
            h,
            channels,
            data: vec![0.0; w * h * channels],
        }
    }

    /// Wrap an existing planar buffer. Panics if the length is not
    /// `w · h · channels`.
    pub fn from_vec(w: usize, h: usize, channels: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            w * h * channels,
            "buffer length must equal w*h*channels"
        );
        Self {
            w,
            h,
            channels,
            data,
        }
    }

    #[inline]
    /// Get the value of channel `c` at (x, y).
    pub fn get(&self, x: usize, y: usize, c: usize) -> f32 {
        self.data[c * self.w * self.h + y * self.w + x]
    }

    #[inline]
    /// Set the value of channel `c` at (x, y).
    pub fn set(&mut self, x: usize, y: usize, c: usize, v: f32) {
        let i = c * self.w * self.h + y * self.w + x;
        self.data[i] = v;
    }

    /// Write the per-pixel feature vector at (x, y) into `out`
    /// (`out.len()` must equal `channels`).
    #[inline]
    pub fn fill_vector(&self, x: usize, y: usize, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.channels);
        let plane = self.w * self.h;
        let base = y * self.w + x;
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = self.data[c * plane + base];
        }
    }
}
